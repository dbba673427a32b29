//! Keyword index builder
//!
//! Scans an installed manual tree and extracts one record per keyword page:
//!
//! ```text
//! <root>/<version>/<SOLVER>/Content/**/*.htm
//! ```
//!
//! A keyword page names its keyword in `<span class="keyword">` and
//! describes it in the `<p>` elements following the `PURPOSE:` heading.

use crate::types::{KeywordIndex, KeywordRecord, SolverTable, VersionEntry};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Solvers indexed when none are given.
pub const DEFAULT_SOLVERS: [&str; 2] = ["IMEX", "GEM"];

/// Errors that can occur when building an index.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// The version directory does not exist.
    #[error("version directory not found: {0}")]
    MissingVersion(PathBuf),

    /// Failed to walk the manual tree.
    #[error("failed to scan {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Keyword and description extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub keyword: String,
    pub description: String,
}

/// Build an index for one manual version.
///
/// Solver directories that do not exist are skipped with a warning.
pub fn build_index<S: AsRef<str>>(
    docs_root: &Path,
    version: &str,
    solvers: &[S],
) -> Result<KeywordIndex, IndexerError> {
    let version_dir = docs_root.join(version);
    if !version_dir.is_dir() {
        return Err(IndexerError::MissingVersion(version_dir));
    }

    let mut entry = VersionEntry::new();
    for solver in solvers {
        let solver = solver.as_ref().trim().to_uppercase();
        let content = version_dir.join(&solver).join("Content");
        if !content.is_dir() {
            warn!("Skipping {}: {} does not exist", solver, content.display());
            continue;
        }

        let table = index_solver(&version_dir, &content)?;
        info!("Indexed {} keywords for {}", table.len(), solver);
        entry.insert(solver, table);
    }

    let mut versions = BTreeMap::new();
    versions.insert(version.to_string(), entry);

    Ok(KeywordIndex {
        prefix: Some(version_dir.display().to_string()),
        versions,
    })
}

fn index_solver(version_dir: &Path, content: &Path) -> Result<SolverTable, IndexerError> {
    let mut table = SolverTable::new();

    let walker = WalkDir::new(content)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Failed to read entry under {}: {}", content.display(), err);
                None
            }
        });

    for entry in walker {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_page(path) {
            continue;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to read {}: {}", path.display(), err);
                continue;
            }
        };

        let Some(page) = parse_page(&String::from_utf8_lossy(&bytes)) else {
            debug!("No keyword in {}", path.display());
            continue;
        };

        let relative = path
            .strip_prefix(version_dir)
            .map_err(|e| IndexerError::Walk {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        table.insert(
            page.keyword,
            KeywordRecord {
                description: page.description,
                file: relative.to_string_lossy().replace('\\', "/"),
            },
        );
    }

    Ok(table)
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("htm") || e.eq_ignore_ascii_case("html"))
}

/// Extract the keyword and its purpose from a manual page.
///
/// Returns `None` when the page names no keyword or has no purpose text.
pub fn parse_page(html: &str) -> Option<PageEntry> {
    let document = Html::parse_document(html);

    let keyword_selector = Selector::parse("span.keyword").ok()?;
    let keyword = document
        .select(&keyword_selector)
        .next()?
        .text()
        .collect::<String>();
    let keyword = keyword.trim().trim_matches('*').trim().to_uppercase();
    if keyword.is_empty() {
        return None;
    }

    let description = purpose(&document)?;
    if description.is_empty() {
        return None;
    }

    Some(PageEntry {
        keyword,
        description,
    })
}

fn purpose(document: &Html) -> Option<String> {
    let heading_selector = Selector::parse("h3").ok()?;
    let heading = document.select(&heading_selector).find(|h| {
        h.text()
            .collect::<String>()
            .trim()
            .eq_ignore_ascii_case("PURPOSE:")
    })?;

    let mut paragraphs = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        match sibling.value().name() {
            "h3" => break,
            "p" => {
                let text = sibling
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ");
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
            _ => {}
        }
    }

    Some(paragraphs.join(" "))
}
