//! Version label ordering and resolution.
//!
//! Labels look like `2020.10`: a four digit year and a release number.
//! The most recent label is the one with the highest year, then the highest
//! release number.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

lazy_static! {
    static ref VERSION_PATTERN: Regex = Regex::new(r"^(\d{4})\.(\d+)$").unwrap();
}

/// A parsed `YYYY.NN` label.
///
/// Ordering is numeric; the label is displayed exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionLabel {
    pub year: u32,
    pub release: u32,
    label: String,
}

impl VersionLabel {
    /// Parse a label, returning `None` when it does not match `YYYY.NN`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let caps = VERSION_PATTERN.captures(label)?;
        Some(Self {
            year: caps[1].parse().ok()?,
            release: caps[2].parse().ok()?,
            label: label.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Outcome of resolving a requested version against the available ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VersionResolution {
    /// The requested version is available.
    Exact(String),

    /// The requested version is missing; the most recent one is used instead.
    Substituted { requested: String, resolved: String },
}

impl VersionResolution {
    /// The label to use.
    pub fn version(&self) -> &str {
        match self {
            VersionResolution::Exact(version) => version,
            VersionResolution::Substituted { resolved, .. } => resolved,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, VersionResolution::Substituted { .. })
    }
}

/// Compare two labels, most recent first.
///
/// Parseable labels come before unparseable ones. Unparseable labels are
/// ordered lexicographically among themselves.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (VersionLabel::parse(a), VersionLabel::parse(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sort labels most recent first.
pub fn sort_versions<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    labels.sort_by(|a, b| compare_versions(a, b));
    labels
}

/// Pick the version to use for `requested`.
///
/// Returns `None` only when nothing is available.
pub fn resolve_version(requested: &str, available: &[String]) -> Option<VersionResolution> {
    let requested = requested.trim();
    if available.iter().any(|v| v == requested) {
        return Some(VersionResolution::Exact(requested.to_string()));
    }

    let resolved = available
        .iter()
        .min_by(|a, b| compare_versions(a, b))?
        .clone();

    Some(VersionResolution::Substituted {
        requested: requested.to_string(),
        resolved,
    })
}

/// List the version directories directly under a manual root.
///
/// Only subdirectories named like `YYYY.NN` are returned, most recent first.
pub fn scan_disk_versions(root: &Path) -> io::Result<Vec<String>> {
    let mut versions = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if VersionLabel::parse(name).is_some() {
                versions.push(name.to_string());
            }
        }
    }

    Ok(sort_versions(versions))
}
