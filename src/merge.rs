//! Solver precedence.
//!
//! A version entry holds one keyword table per solver. Hover lookups use a
//! single flattened table in which the preferred solver's records win over
//! every other solver's.

use crate::lookup::normalize_keyword;
use crate::types::{KeywordRecord, SolverTable, VersionEntry};

/// Solvers known to the manuals, in fallback order.
///
/// Among non-preferred solvers, later entries overwrite earlier ones.
pub const KNOWN_SOLVERS: [&str; 4] = ["CMG", "STARS", "GEM", "IMEX"];

/// Flattened keyword table for one (version, preferred solver) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    preferred: String,
    entries: std::collections::BTreeMap<String, (String, KeywordRecord)>,
}

impl MergedTable {
    /// Look up a keyword, returning the solver it came from and its record.
    pub fn get(&self, keyword: &str) -> Option<(&str, &KeywordRecord)> {
        self.entries
            .get(&normalize_keyword(keyword))
            .map(|(solver, record)| (solver.as_str(), record))
    }

    /// The solver whose records take precedence.
    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords in the table, sorted.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn apply(&mut self, solver: &str, table: &SolverTable) {
        for (keyword, record) in table {
            self.entries
                .insert(keyword.clone(), (solver.to_string(), record.clone()));
        }
    }
}

/// Merge a version entry using [`KNOWN_SOLVERS`] as the fallback order.
pub fn merge(entry: &VersionEntry, preferred: &str) -> MergedTable {
    merge_with_order(entry, preferred, &KNOWN_SOLVERS)
}

/// Merge a version entry with an explicit fallback order.
///
/// Solvers present in `entry` but absent from `order` are applied first,
/// alphabetically. Listed non-preferred solvers follow in list order, and
/// the preferred solver is applied last.
pub fn merge_with_order<S: AsRef<str>>(
    entry: &VersionEntry,
    preferred: &str,
    order: &[S],
) -> MergedTable {
    let preferred = preferred.trim().to_uppercase();
    let order: Vec<String> = order
        .iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .collect();

    let mut merged = MergedTable {
        preferred: preferred.clone(),
        entries: Default::default(),
    };

    // BTreeMap iteration is already alphabetical.
    for (solver, table) in entry {
        if *solver != preferred && !order.contains(solver) {
            merged.apply(solver, table);
        }
    }

    for solver in order.iter().filter(|s| **s != preferred) {
        if let Some(table) = entry.get(solver) {
            merged.apply(solver, table);
        }
    }

    if let Some(table) = entry.get(&preferred) {
        merged.apply(&preferred, table);
    }

    merged
}
