//! Capabilities the editor host provides.
//!
//! The core never talks to an editor API directly. An integration implements
//! these traits (a webview panel, a hover provider, a command palette) and
//! hands them to [`KeywordService`](crate::KeywordService) and
//! [`register_commands`](crate::register_commands).

use crate::types::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Color scheme of the host, baked into rewritten pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    HighContrast,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "high-contrast" | "highcontrast" => Ok(Theme::HighContrast),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// Translates filesystem paths into URIs the viewer may load.
pub trait UriMapper {
    fn to_viewer_uri(&self, path: &Path) -> String;
}

/// A rewritten manual page ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPage {
    /// Panel title
    pub title: String,

    /// Page on disk
    pub path: PathBuf,

    /// Fragment to scroll to, without `#`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,

    /// Rewritten HTML
    pub html: String,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    /// Non-blocking information, e.g. a version substitution
    Info(String),

    /// The operation failed
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }
}

/// The viewer surface that shows manual pages.
pub trait DocumentationDisplay: UriMapper {
    /// Replace the viewer content with a page.
    fn show(&self, page: DocumentPage);

    /// Show a message to the user.
    fn notify(&self, notice: Notice);

    /// Bring the log output into view.
    fn reveal_logs(&self) {}

    /// Current host theme.
    fn theme(&self) -> Option<Theme> {
        None
    }
}

/// The word under the cursor and the line it sits on.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordQuery {
    pub word: String,
    pub line: String,
    pub range: Option<Range>,
}

/// Delivers the hover query on demand.
pub trait KeywordQuerySource {
    fn query(&self) -> Option<KeywordQuery>;
}

/// Callback registered under a command name.
pub type CommandHandler = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Registry of named commands.
pub trait CommandRegistry {
    fn register(&mut self, name: &str, handler: CommandHandler);
}

/// A command registry that keeps handlers in memory.
///
/// Used by the CLI and by tests; editor integrations forward to their own
/// registry instead.
#[derive(Default)]
pub struct InMemoryRegistry {
    handlers: BTreeMap<String, CommandHandler>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a command. Returns `false` when no handler is registered.
    pub fn execute(&self, name: &str, args: &[String]) -> bool {
        match self.handlers.get(name) {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl CommandRegistry for InMemoryRegistry {
    fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_theme_from_str() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("High-Contrast".parse::<Theme>(), Ok(Theme::HighContrast));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_registry_execute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut registry = InMemoryRegistry::new();
        registry.register(
            "test.command",
            Arc::new(move |args: &[String]| {
                counter.fetch_add(args.len(), Ordering::SeqCst);
            }),
        );

        assert!(registry.execute("test.command", &["a".to_string(), "b".to_string()]));
        assert!(!registry.execute("missing", &[]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.names(), vec!["test.command"]);
    }

    #[test]
    fn test_notice_message() {
        assert_eq!(Notice::Info("x".to_string()).message(), "x");
        assert_eq!(Notice::Error("y".to_string()).message(), "y");
    }
}
