//! Configuration loading
//!
//! Reads settings from:
//! - `.cmg-help.yaml` / `.cmg-help.yml` / `cmg-help.yaml` (workspace)
//! - the same names in the home directory (user-level)

use crate::error::HelpError;
use crate::host::Theme;
use crate::loader::default_index_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_NAMES: [&str; 3] = [".cmg-help.yaml", ".cmg-help.yml", "cmg-help.yaml"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings consumed by the keyword service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Manual root containing `YYYY.NN` directories
    pub docs_root: Option<PathBuf>,

    /// Preferred manual version
    pub version: Option<String>,

    /// Preferred solver
    pub solver: Option<String>,

    /// Fallback order of the other solvers (empty = built-in order)
    pub solvers: Vec<String>,

    /// Keyword index file (default: `~/keywordData.json`)
    pub index_path: Option<PathBuf>,

    /// Hover lookups enabled
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Theme baked into rewritten pages when the host does not report one
    pub theme: Option<Theme>,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            docs_root: None,
            version: None,
            solver: None,
            solvers: Vec::new(),
            index_path: None,
            enabled: true,
            log_level: "warn".to_string(),
            theme: None,
        }
    }
}

impl HelpConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load configuration from the workspace, then the home directory.
    ///
    /// Falls back to defaults when no file exists.
    pub fn load_default(workspace_root: &Path) -> Result<Self, ConfigError> {
        for name in &CONFIG_NAMES {
            let path = workspace_root.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &CONFIG_NAMES {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        docs_root: Option<PathBuf>,
        index_path: Option<PathBuf>,
        version: Option<String>,
        solver: Option<String>,
    ) {
        if let Some(root) = docs_root {
            self.docs_root = Some(root);
        }
        if let Some(path) = index_path {
            self.index_path = Some(path);
        }
        if let Some(v) = version {
            self.version = Some(v);
        }
        if let Some(s) = solver {
            self.solver = Some(s);
        }
    }

    /// Index path, falling back to the home directory default.
    pub fn resolved_index_path(&self) -> Option<PathBuf> {
        self.index_path.clone().or_else(default_index_path)
    }

    /// Preferred solver, upper-cased.
    pub fn preferred_solver(&self) -> Option<String> {
        self.solver
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
    }

    /// Manual root, required for opening pages.
    pub fn require_docs_root(&self) -> Result<&Path, HelpError> {
        self.docs_root
            .as_deref()
            .ok_or(HelpError::ConfigMissing("docs_root"))
    }

    /// Requested version, trimmed.
    pub fn requested_version(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = HelpConfig::default();
        assert!(config.enabled);
        assert_eq!(config.log_level, "warn");
        assert!(config.solvers.is_empty());
        assert!(config.preferred_solver().is_none());
    }

    #[test]
    fn test_load_config_from_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.yaml");

        let yaml = r#"
docs_root: /opt/CMG/Manuals
version: "2020.10"
solver: imex
solvers: [GEM, STARS]
enabled: false
theme: dark
"#;
        fs::write(&config_path, yaml).unwrap();

        let config = HelpConfig::load(&config_path).unwrap();
        assert_eq!(config.docs_root, Some(PathBuf::from("/opt/CMG/Manuals")));
        assert_eq!(config.requested_version(), Some("2020.10"));
        assert_eq!(config.preferred_solver().as_deref(), Some("IMEX"));
        assert_eq!(config.solvers, vec!["GEM", "STARS"]);
        assert!(!config.enabled);
        assert_eq!(config.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_load_default_config_with_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".cmg-help.yaml"), "version: \"2021.10\"\n").unwrap();

        let config = HelpConfig::load_default(temp_dir.path()).unwrap();
        assert_eq!(config.requested_version(), Some("2021.10"));
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.yaml");
        fs::write(&config_path, "enabled: [not, a, bool]").unwrap();

        assert!(matches!(
            HelpConfig::load(&config_path),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_merge_cli() {
        let mut config = HelpConfig {
            version: Some("2019.10".to_string()),
            ..Default::default()
        };
        config.merge_cli(
            Some(PathBuf::from("/docs")),
            None,
            Some("2020.10".to_string()),
            None,
        );
        assert_eq!(config.docs_root, Some(PathBuf::from("/docs")));
        assert_eq!(config.requested_version(), Some("2020.10"));
        assert!(config.index_path.is_none());
    }

    #[test]
    fn test_require_docs_root() {
        let config = HelpConfig::default();
        assert!(matches!(
            config.require_docs_root(),
            Err(HelpError::ConfigMissing("docs_root"))
        ));
    }

    #[test]
    fn test_resolved_index_path_prefers_setting() {
        let config = HelpConfig {
            index_path: Some(PathBuf::from("/custom/index.json")),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_index_path(),
            Some(PathBuf::from("/custom/index.json"))
        );
    }
}
