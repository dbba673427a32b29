//! Messages posted by the viewer when a rewritten link is clicked.
//!
//! Anchors in a displayed page carry a command URI instead of a navigable
//! href:
//!
//! ```text
//! command:cmg-help.openDocumentation?%22..%2FContent%2Fwell.htm%22
//! ```
//!
//! The query is a percent-encoded JSON string holding the original href.
//! The injected script posts `{ "command": ..., "originalPath": ... }`, with
//! `command` being the URI minus its `command:` scheme and `originalPath` the
//! percent-encoded directory of the page being displayed.

use crate::commands::OPEN_DOCUMENTATION;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// URI scheme used for inert anchors.
pub const COMMAND_SCHEME: &str = "command:";

/// Errors produced while decoding a navigation message.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed navigation message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected command {0:?}")]
    UnknownCommand(String),

    #[error("command {0:?} has no target argument")]
    MissingArgument(String),

    #[error("invalid percent-encoding in {0:?}")]
    Encoding(String),
}

/// Message posted from the viewer to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationMessage {
    /// Command URI without the `command:` scheme
    pub command: String,

    /// Percent-encoded directory of the page that posted the message
    #[serde(default)]
    pub original_path: String,
}

impl NavigationMessage {
    /// Parse a message delivered as raw JSON.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the message the viewer script would post for an anchor href.
    pub fn from_click(href: &str, page_dir: &Path) -> Self {
        Self {
            command: href.strip_prefix(COMMAND_SCHEME).unwrap_or(href).to_string(),
            original_path: encode_component(&page_dir.to_string_lossy()),
        }
    }

    /// The decoded relative target carried by the command.
    pub fn relative_target(&self) -> Result<String, ProtocolError> {
        decode_command(&self.command)
    }

    /// Absolute target: the originating directory joined with the decoded
    /// relative path, with `.` and `..` resolved lexically.
    pub fn resolve_target(&self) -> Result<PathBuf, ProtocolError> {
        let relative = self.relative_target()?;
        let base = urlencoding::decode(&self.original_path)
            .map_err(|_| ProtocolError::Encoding(self.original_path.clone()))?;
        let joined = Path::new(&*base).join(crate::types::normalize_separators(&relative));
        Ok(normalize_path(&joined))
    }
}

/// Percent-encode a string the way `encodeURIComponent` does for the
/// characters that matter here.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the inert command URI for an href.
pub fn encode_command(target: &str) -> String {
    let json = serde_json::Value::String(target.to_string()).to_string();
    format!(
        "{}{}?{}",
        COMMAND_SCHEME,
        OPEN_DOCUMENTATION,
        encode_component(&json)
    )
}

/// Decode the target carried by a command, with or without its scheme.
pub fn decode_command(command: &str) -> Result<String, ProtocolError> {
    let command = command.strip_prefix(COMMAND_SCHEME).unwrap_or(command);
    let (name, argument) = command
        .split_once('?')
        .ok_or_else(|| ProtocolError::MissingArgument(command.to_string()))?;

    if name != OPEN_DOCUMENTATION {
        return Err(ProtocolError::UnknownCommand(name.to_string()));
    }

    let json = urlencoding::decode(argument)
        .map_err(|_| ProtocolError::Encoding(argument.to_string()))?;
    Ok(serde_json::from_str::<String>(&json)?)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
