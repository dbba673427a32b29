//! Load the keyword index JSON file.
//!
//! Loading is all-or-nothing: a document that fails to parse, or parses
//! without a `versions` table, never yields a partial index.

use crate::types::KeywordIndex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the index in the user's home directory.
pub const DEFAULT_INDEX_FILE: &str = "keywordData.json";

/// Errors that can occur when loading the keyword index.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The index file does not exist.
    #[error("keyword index not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the index file.
    #[error("failed to read {file}: {source}")]
    Read { file: PathBuf, source: io::Error },

    /// The index file is not valid JSON or lacks a `versions` table.
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to write the index file.
    #[error("failed to write {file}: {source}")]
    Write { file: PathBuf, source: io::Error },
}

/// Default index location, `~/keywordData.json`.
pub fn default_index_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_INDEX_FILE))
}

impl KeywordIndex {
    /// Load the index from a JSON file.
    ///
    /// Solver names and keywords are upper-cased before the index is
    /// returned.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
            file: path.to_path_buf(),
            source,
        })?;

        let index = Self::parse(&content).map_err(|source| LoadError::Parse {
            file: path.to_path_buf(),
            source,
        })?;

        info!(
            "Loaded keyword index from {} ({} versions, {} keywords)",
            path.display(),
            index.versions.len(),
            index.keyword_count()
        );
        Ok(index)
    }

    /// Parse an index from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        Self::parse(content)
    }

    fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let index: KeywordIndex = serde_json::from_str(content)?;
        Ok(index.normalize())
    }

    /// Write the index as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| LoadError::Parse {
            file: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| LoadError::Write {
            file: path.to_path_buf(),
            source,
        })?;
        debug!("Wrote keyword index to {}", path.display());
        Ok(())
    }
}
