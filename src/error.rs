//! Error taxonomy for documentation operations.
//!
//! Every failure ends up as a user-facing [`Notice`]; nothing is allowed to
//! escape to the host as a panic.

use crate::config::ConfigError;
use crate::host::Notice;
use crate::loader::LoadError;
use crate::protocol::ProtocolError;
use crate::target::TargetError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`KeywordService`](crate::KeywordService) operations.
#[derive(Error, Debug)]
pub enum HelpError {
    /// A required setting is absent.
    #[error("missing setting: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The keyword index file does not exist.
    #[error("keyword index not found: {0}")]
    IndexNotFound(PathBuf),

    /// The keyword index file could not be read or parsed.
    #[error("invalid keyword index: {0}")]
    IndexParse(String),

    /// No index is installed, e.g. after a failed reload.
    #[error("keyword index is not loaded")]
    IndexNotLoaded,

    /// The index has no version at all.
    #[error("no documentation version available for {0}")]
    VersionNotFound(String),

    /// The manual root has no `YYYY.NN` directory.
    #[error("no documentation version found under {0}")]
    NoDiskVersion(PathBuf),

    #[error("no documentation found for {0}")]
    KeywordNotFound(String),

    #[error("documentation file not found: {0}")]
    DocFileNotFound(PathBuf),

    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<LoadError> for HelpError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(path) => HelpError::IndexNotFound(path),
            other => HelpError::IndexParse(other.to_string()),
        }
    }
}

impl HelpError {
    /// Whether the failure is recoverable and shown as information.
    pub fn is_informational(&self) -> bool {
        matches!(self, HelpError::KeywordNotFound(_))
    }

    /// Convert into the notice shown to the user.
    pub fn to_notice(&self) -> Notice {
        if self.is_informational() {
            Notice::Info(self.to_string())
        } else {
            Notice::Error(self.to_string())
        }
    }
}
