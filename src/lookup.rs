//! Keyword lookup against the index.
//!
//! Keywords are matched exactly after trimming and upper-casing. There is no
//! prefix or fuzzy matching.

use crate::merge::KNOWN_SOLVERS;
use crate::types::{KeywordIndex, KeywordMatch, KeywordRecord, SolverTable, VersionEntry};
use crate::version::sort_versions;
use tracing::debug;

/// Normalize a keyword for lookup.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_uppercase()
}

/// Which part of the index a lookup searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupScope {
    /// One solver table of one version.
    Exact { version: String, solver: String },

    /// Every solver of one version.
    Version(String),

    /// Every version, most recent first, and every solver.
    Unscoped,
}

impl LookupScope {
    /// Pick the scope from optional version and solver arguments.
    ///
    /// A solver without a version searches that solver across all versions.
    pub fn from_parts(version: Option<&str>, solver: Option<&str>) -> Self {
        match (version, solver) {
            (Some(version), Some(solver)) => LookupScope::Exact {
                version: version.to_string(),
                solver: solver.to_string(),
            },
            (Some(version), None) => LookupScope::Version(version.to_string()),
            _ => LookupScope::Unscoped,
        }
    }
}

/// Solver names of an entry in search order: known solvers first in
/// [`KNOWN_SOLVERS`] order, then the rest alphabetically.
pub fn solver_order(entry: &VersionEntry) -> Vec<&str> {
    let mut solvers: Vec<&str> = KNOWN_SOLVERS
        .iter()
        .copied()
        .filter(|s| entry.contains_key(*s))
        .collect();
    solvers.extend(
        entry
            .keys()
            .map(String::as_str)
            .filter(|s| !KNOWN_SOLVERS.contains(s)),
    );
    solvers
}

/// Search the index for a keyword.
pub fn lookup(index: &KeywordIndex, keyword: &str, scope: &LookupScope) -> Option<KeywordMatch> {
    let keyword = normalize_keyword(keyword);
    if keyword.is_empty() {
        return None;
    }

    let found = search(index, scope, |table| table.get_key_value(&keyword));
    debug!(
        "lookup {} in {:?}: {}",
        keyword,
        scope,
        if found.is_some() { "hit" } else { "miss" }
    );
    found
}

/// Find the first record whose manual page has the given file name.
///
/// Fragments and directory separators in the stored path are ignored, and
/// the comparison is case-insensitive.
pub fn find_by_file(
    index: &KeywordIndex,
    file_name: &str,
    scope: &LookupScope,
) -> Option<KeywordMatch> {
    let wanted = file_name.to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    search(index, scope, |table| {
        table.iter().find(|(_, record)| {
            let path = record.file_path().to_lowercase();
            path.rsplit('/').next() == Some(wanted.as_str())
        })
    })
}

/// Visit the solver tables in scope order and return the first record `find`
/// picks out of one.
fn search<F>(index: &KeywordIndex, scope: &LookupScope, mut find: F) -> Option<KeywordMatch>
where
    F: for<'t> FnMut(&'t SolverTable) -> Option<(&'t String, &'t KeywordRecord)>,
{
    let versions: Vec<String> = match scope {
        LookupScope::Exact { version, .. } | LookupScope::Version(version) => {
            vec![version.trim().to_string()]
        }
        LookupScope::Unscoped => sort_versions(index.versions.keys().cloned()),
    };

    for version in versions {
        let Some(entry) = index.versions.get(&version) else {
            continue;
        };

        let solvers = match scope {
            LookupScope::Exact { solver, .. } => vec![solver.trim().to_uppercase()],
            _ => solver_order(entry).into_iter().map(String::from).collect(),
        };

        for solver in solvers {
            let Some(table) = entry.get(&solver) else {
                continue;
            };
            if let Some((keyword, record)) = find(table) {
                return Some(KeywordMatch {
                    version: version.clone(),
                    solver: solver.clone(),
                    keyword: keyword.clone(),
                    record: record.clone(),
                });
            }
        }
    }

    None
}
