//! Core types for keyword lookup.
//!
//! This module contains the data structures used throughout cmg-help:
//! - [`KeywordIndex`] - The parsed keyword index document
//! - [`KeywordRecord`] - Description and manual page for one keyword
//! - [`KeywordMatch`] - A lookup hit with the version and solver it came from
//! - [`HoverInfo`] - The hover result with formatted content
//! - [`Range`] - Source location for highlighting

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keywords of one solver, keyed by upper-case keyword.
pub type SolverTable = BTreeMap<String, KeywordRecord>;

/// Solver sections of one version, keyed by upper-case solver name.
pub type VersionEntry = BTreeMap<String, SolverTable>;

/// Root of the keyword index JSON document.
///
/// ```json
/// {
///   "prefix": "C:\\Program Files\\CMG\\Manuals\\2020.10",
///   "versions": {
///     "2020.10": {
///       "IMEX": {
///         "WELL": { "description": "...", "file": "IMEX\\Content\\well.htm" }
///       }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordIndex {
    /// Path hint written by the indexer. Not used for resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Version label (`YYYY.NN`) to solver sections.
    #[serde(alias = "version")]
    pub versions: BTreeMap<String, VersionEntry>,
}

impl KeywordIndex {
    /// Upper-case every solver name and keyword key.
    ///
    /// When two keys collapse onto the same normalized key, the one that
    /// sorts last in the original document wins.
    pub(crate) fn normalize(self) -> Self {
        let versions = self
            .versions
            .into_iter()
            .map(|(version, entry)| {
                let mut normalized = VersionEntry::new();
                for (solver, table) in entry {
                    let target = normalized.entry(solver.trim().to_uppercase()).or_default();
                    for (keyword, record) in table {
                        target.insert(crate::lookup::normalize_keyword(&keyword), record);
                    }
                }
                (version.trim().to_string(), normalized)
            })
            .collect();

        Self {
            prefix: self.prefix,
            versions,
        }
    }

    /// Version labels present in the index.
    pub fn version_labels(&self) -> Vec<String> {
        self.versions.keys().cloned().collect()
    }

    /// Solver sections of a version.
    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.get(version)
    }

    /// Total number of keyword records across all versions and solvers.
    pub fn keyword_count(&self) -> usize {
        self.versions
            .values()
            .flat_map(|entry| entry.values())
            .map(|table| table.len())
            .sum()
    }
}

/// Description and manual page for a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    /// Short description, may contain markup
    #[serde(default)]
    pub description: String,

    /// Manual page relative to `<docs_root>/<version>`, optionally with `#fragment`
    pub file: String,
}

impl KeywordRecord {
    /// The file path without its `#fragment` and with `/` separators.
    pub fn file_path(&self) -> String {
        let path = self.file.split('#').next().unwrap_or_default();
        normalize_separators(path)
    }

    /// The `#fragment` part of the file reference, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.file.split_once('#').map(|(_, fragment)| fragment)
    }
}

/// A successful keyword lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    /// Version the record was found in
    pub version: String,

    /// Solver section the record was found in
    pub solver: String,

    /// Normalized keyword
    pub keyword: String,

    /// The record itself
    pub record: KeywordRecord,
}

impl KeywordMatch {
    /// The `SOLVER|KEYWORD` composite key accepted by the target parser.
    pub fn composite_key(&self) -> String {
        format!("{}|{}", self.solver, self.keyword)
    }
}

/// Source range for highlighting.
///
/// All positions are 1-based (line 1, column 1 is the start).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// Hover information result.
///
/// Contains markdown-formatted content to display in a tooltip,
/// and optionally the source range to highlight.
#[derive(Debug, Clone, Serialize)]
pub struct HoverInfo {
    /// Markdown-formatted content
    pub contents: String,

    /// Range in source that this hover applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl HoverInfo {
    /// Create new hover info with content only.
    pub fn new(contents: String) -> Self {
        Self {
            contents,
            range: None,
        }
    }

    /// Add a source range to the hover info.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}

/// Convert Windows separators to `/`.
pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
