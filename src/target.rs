//! Navigation target parsing.
//!
//! The open-documentation command receives one of three shapes and must tell
//! them apart before any lookup:
//! - a bare keyword: `WELL`
//! - a solver-qualified keyword: `IMEX|WELL`
//! - a manual page: `../Content/well_keyword.htm#top`

use crate::lookup::normalize_keyword;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while parsing a navigation target.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TargetError {
    #[error("empty documentation target")]
    Empty,

    #[error("expected SOLVER|KEYWORD, got {0:?}")]
    MalformedComposite(String),
}

/// What the user asked to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationTarget {
    /// Keyword resolved through the merged table.
    Keyword(String),

    /// Keyword with an explicit solver hint.
    SolverKeyword { solver: String, keyword: String },

    /// Direct reference to a manual page.
    File {
        /// Page path without the fragment
        path: PathBuf,
        /// `#fragment` without the `#`
        fragment: Option<String>,
        /// Display keyword derived from the file name
        keyword: String,
    },
}

impl NavigationTarget {
    /// Classify a raw target string.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetError::Empty);
        }

        if is_page_reference(raw) {
            return Ok(Self::parse_file(raw));
        }

        let parts = split_unescaped_pipe(raw);
        if parts.len() > 1 {
            return match parts.as_slice() {
                [solver, keyword] if !solver.trim().is_empty() && !keyword.trim().is_empty() => {
                    Ok(NavigationTarget::SolverKeyword {
                        solver: solver.trim().to_uppercase(),
                        keyword: normalize_keyword(keyword),
                    })
                }
                _ => Err(TargetError::MalformedComposite(raw.to_string())),
            };
        }

        Ok(NavigationTarget::Keyword(normalize_keyword(
            &parts.into_iter().next().unwrap_or_default(),
        )))
    }

    fn parse_file(raw: &str) -> Self {
        let (path, fragment) = match raw.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment.to_string())),
            None => (raw, None),
        };
        let path = PathBuf::from(crate::types::normalize_separators(path));
        let keyword = keyword_from_file(&path);

        NavigationTarget::File {
            path,
            fragment: fragment.filter(|f| !f.is_empty()),
            keyword,
        }
    }

    /// Keyword shown in the viewer title.
    pub fn display_keyword(&self) -> &str {
        match self {
            NavigationTarget::Keyword(keyword) => keyword,
            NavigationTarget::SolverKeyword { keyword, .. } => keyword,
            NavigationTarget::File { keyword, .. } => keyword,
        }
    }
}

/// Whether the path part of `raw`, without its fragment, names an HTML page.
fn is_page_reference(raw: &str) -> bool {
    let path = raw.split('#').next().unwrap_or_default();
    Path::new(&crate::types::normalize_separators(path))
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("htm") || e.eq_ignore_ascii_case("html"))
}

/// Derive a display keyword from a manual page path: the file stem up to
/// the first `_`, upper-cased.
pub fn keyword_from_file(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let head = stem.split('_').next().unwrap_or_default();
    normalize_keyword(head)
}

/// Split on `|` not preceded by a backslash, unescaping `\|`.
fn split_unescaped_pipe(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}
