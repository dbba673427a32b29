//! Keyword service
//!
//! Owns the loaded index and everything derived from it. The derived state
//! lives in an immutable [`Snapshot`]; reloading builds a new snapshot and
//! swaps it in, so a reader holding the old one never sees a half-updated
//! table.

use crate::config::HelpConfig;
use crate::error::HelpError;
use crate::host::{DocumentPage, DocumentationDisplay, KeywordQuerySource, Notice};
use crate::lookup::{find_by_file, lookup, normalize_keyword, LookupScope};
use crate::merge::{merge_with_order, MergedTable, KNOWN_SOLVERS};
use crate::protocol::encode_command;
use crate::rewrite::{rewrite, RewriteOptions};
use crate::target::NavigationTarget;
use crate::types::{HoverInfo, KeywordIndex, KeywordMatch};
use crate::version::{resolve_version, scan_disk_versions, sort_versions, VersionResolution};
use arc_swap::ArcSwapOption;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// A manual page resolved from a navigation target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    /// Keyword shown in the viewer title
    pub keyword: String,

    /// Existing page on disk
    pub path: PathBuf,

    /// Fragment to scroll to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,

    /// Index record the page came from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<KeywordMatch>,
}

/// Summary of the loaded snapshot, for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub index_versions: Vec<String>,
    pub disk_versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_version: Option<VersionResolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_version: Option<VersionResolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_solver: Option<String>,
    pub keyword_count: usize,
    pub merged_count: usize,
    pub enabled: bool,
}

/// Immutable view of the index and the versions resolved for it.
#[derive(Debug)]
pub struct Snapshot {
    index: KeywordIndex,
    config: HelpConfig,
    index_version: Option<VersionResolution>,
    disk_versions: Vec<String>,
    disk_version: Option<VersionResolution>,
    merged: OnceLock<Option<MergedTable>>,
    notices: Vec<Notice>,
}

impl Snapshot {
    /// Build a snapshot from an already loaded index.
    pub fn build(index: KeywordIndex, config: HelpConfig) -> Self {
        let requested = config.requested_version().map(str::to_string);

        let disk_versions = match config.docs_root.as_deref() {
            Some(root) => scan_disk_versions(root).unwrap_or_else(|e| {
                warn!("Failed to scan {}: {}", root.display(), e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let index_versions = index.version_labels();
        let on_disk: Vec<String> = index_versions
            .iter()
            .filter(|v| disk_versions.contains(v))
            .cloned()
            .collect();
        let candidates = if on_disk.is_empty() {
            index_versions
        } else {
            on_disk
        };

        let index_version = resolve(requested.as_deref(), &candidates);
        let disk_version = resolve(requested.as_deref(), &disk_versions);

        let mut notices = Vec::new();
        for (scope, resolution) in [("index", &index_version), ("manuals", &disk_version)] {
            if let Some(VersionResolution::Substituted {
                requested,
                resolved,
            }) = resolution
            {
                info!(
                    "Version {} not found in {}, using {}",
                    requested, scope, resolved
                );
                notices.push(Notice::Info(format!(
                    "Documentation version {} not found in {}, using {}",
                    requested, scope, resolved
                )));
            }
        }

        Self {
            index,
            config,
            index_version,
            disk_versions,
            disk_version,
            merged: OnceLock::new(),
            notices,
        }
    }

    /// Load the configured index file and build a snapshot.
    pub fn load(config: HelpConfig) -> Result<Self, HelpError> {
        let path = config
            .resolved_index_path()
            .ok_or(HelpError::ConfigMissing("index_path"))?;
        let index = KeywordIndex::load(&path)?;
        if index.versions.is_empty() {
            return Err(HelpError::VersionNotFound(path.display().to_string()));
        }
        Ok(Self::build(index, config))
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn config(&self) -> &HelpConfig {
        &self.config
    }

    /// Version used for keyword lookups.
    pub fn index_version(&self) -> Option<&VersionResolution> {
        self.index_version.as_ref()
    }

    /// Version directory used for manual pages.
    pub fn disk_version(&self) -> Option<&VersionResolution> {
        self.disk_version.as_ref()
    }

    /// Version directories found under the manual root, most recent first.
    pub fn disk_versions(&self) -> &[String] {
        &self.disk_versions
    }

    /// Messages produced while building the snapshot.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Fallback order of solvers, from configuration or the built-in list.
    pub fn solver_order(&self) -> Vec<String> {
        if self.config.solvers.is_empty() {
            KNOWN_SOLVERS.iter().map(|s| s.to_string()).collect()
        } else {
            self.config.solvers.clone()
        }
    }

    /// Merged table for the resolved version, built on first use.
    pub fn merged(&self) -> Option<&MergedTable> {
        self.merged
            .get_or_init(|| {
                let version = self.index_version.as_ref()?.version();
                let entry = self.index.version(version)?;
                let preferred = self.config.preferred_solver().unwrap_or_default();
                debug!("Merging {} with preferred solver {:?}", version, preferred);
                Some(merge_with_order(entry, &preferred, &self.solver_order()))
            })
            .as_ref()
    }

    /// Look up a keyword in the merged table, then across the whole index.
    pub fn lookup_keyword(&self, keyword: &str) -> Option<KeywordMatch> {
        if let (Some(merged), Some(version)) = (self.merged(), self.index_version.as_ref()) {
            if let Some((solver, record)) = merged.get(keyword) {
                return Some(KeywordMatch {
                    version: version.version().to_string(),
                    solver: solver.to_string(),
                    keyword: normalize_keyword(keyword),
                    record: record.clone(),
                });
            }
        }
        lookup(&self.index, keyword, &LookupScope::Unscoped)
    }

    /// Look up a keyword with a solver hint.
    ///
    /// Searches the hinted solver in the resolved version, then in every
    /// version, then falls back to [`lookup_keyword`](Self::lookup_keyword).
    pub fn lookup_solver_keyword(&self, solver: &str, keyword: &str) -> Option<KeywordMatch> {
        if let Some(version) = self.index_version.as_ref() {
            let scope = LookupScope::from_parts(Some(version.version()), Some(solver));
            if let Some(hit) = lookup(&self.index, keyword, &scope) {
                return Some(hit);
            }
        }

        let solver = solver.trim().to_uppercase();
        sort_versions(self.index.versions.keys().cloned())
            .into_iter()
            .find_map(|version| {
                let scope = LookupScope::Exact {
                    version,
                    solver: solver.clone(),
                };
                lookup(&self.index, keyword, &scope)
            })
            .or_else(|| self.lookup_keyword(keyword))
    }

    /// Path of the manual page for a lookup hit.
    pub fn document_path(&self, hit: &KeywordMatch) -> Result<PathBuf, HelpError> {
        let root = self.config.require_docs_root()?;

        let version = if self.disk_versions.contains(&hit.version) {
            hit.version.clone()
        } else {
            self.disk_version
                .as_ref()
                .ok_or_else(|| HelpError::NoDiskVersion(root.to_path_buf()))?
                .version()
                .to_string()
        };

        Ok(root.join(version).join(hit.record.file_path()))
    }

    /// Map a navigation target to an existing manual page.
    pub fn resolve(&self, target: &NavigationTarget) -> Result<ResolvedDocument, HelpError> {
        match target {
            NavigationTarget::Keyword(keyword) => {
                let hit = self
                    .lookup_keyword(keyword)
                    .ok_or_else(|| HelpError::KeywordNotFound(keyword.clone()))?;
                self.document_for(hit)
            }
            NavigationTarget::SolverKeyword { solver, keyword } => {
                let hit = self
                    .lookup_solver_keyword(solver, keyword)
                    .ok_or_else(|| HelpError::KeywordNotFound(format!("{}|{}", solver, keyword)))?;
                self.document_for(hit)
            }
            NavigationTarget::File {
                path,
                fragment,
                keyword,
            } => self.resolve_file(path, fragment.as_deref(), keyword),
        }
    }

    fn document_for(&self, hit: KeywordMatch) -> Result<ResolvedDocument, HelpError> {
        let path = self.document_path(&hit)?;
        if !path.is_file() {
            return Err(HelpError::DocFileNotFound(path));
        }
        Ok(ResolvedDocument {
            keyword: hit.keyword.clone(),
            path,
            fragment: hit.record.fragment().map(str::to_string),
            matched: Some(hit),
        })
    }

    fn resolve_file(
        &self,
        path: &Path,
        fragment: Option<&str>,
        keyword: &str,
    ) -> Result<ResolvedDocument, HelpError> {
        let candidate = if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            match (&self.config.docs_root, &self.disk_version) {
                (Some(root), Some(version)) => Some(root.join(version.version()).join(path)),
                _ => None,
            }
        };

        if let Some(candidate) = candidate.filter(|c| c.is_file()) {
            return Ok(ResolvedDocument {
                keyword: keyword.to_string(),
                path: candidate,
                fragment: fragment.map(str::to_string),
                matched: None,
            });
        }

        // The page may have moved between manual versions; find it by name.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let by_keyword = self.lookup_keyword(keyword).filter(|hit| {
            hit.record
                .file_path()
                .to_lowercase()
                .ends_with(&file_name.to_lowercase())
        });
        let hit = by_keyword.or_else(|| find_by_file(&self.index, &file_name, &LookupScope::Unscoped));

        match hit {
            Some(hit) => {
                debug!("Resolved {} through index entry {}", path.display(), hit.keyword);
                let mut document = self.document_for(hit)?;
                if fragment.is_some() {
                    document.fragment = fragment.map(str::to_string);
                }
                Ok(document)
            }
            None => Err(HelpError::DocFileNotFound(path.to_path_buf())),
        }
    }
}

fn resolve(requested: Option<&str>, available: &[String]) -> Option<VersionResolution> {
    match requested {
        Some(requested) => resolve_version(requested, available),
        None => sort_versions(available.iter().cloned())
            .into_iter()
            .next()
            .map(VersionResolution::Exact),
    }
}

/// Keyword lookups, hover and documentation opening over a swappable
/// snapshot.
pub struct KeywordService {
    snapshot: ArcSwapOption<Snapshot>,
    enabled: AtomicBool,
}

impl KeywordService {
    /// Create a service with no index loaded.
    pub fn unloaded() -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            enabled: AtomicBool::new(true),
        }
    }

    /// Load the configured index.
    pub fn new(config: HelpConfig) -> Result<Self, HelpError> {
        let service = Self::unloaded();
        service.reload(config)?;
        Ok(service)
    }

    /// Create a service from an index already in memory.
    pub fn from_index(index: KeywordIndex, config: HelpConfig) -> Self {
        let service = Self::unloaded();
        service.install(Snapshot::build(index, config));
        service
    }

    /// Replace the snapshot with one built from `config`.
    ///
    /// On failure the current snapshot is dropped, so later lookups report
    /// [`HelpError::IndexNotLoaded`] instead of answering from stale data.
    pub fn reload(&self, config: HelpConfig) -> Result<Vec<Notice>, HelpError> {
        match Snapshot::load(config) {
            Ok(snapshot) => {
                let notices = snapshot.notices().to_vec();
                self.install(snapshot);
                Ok(notices)
            }
            Err(err) => {
                warn!("Keyword index reload failed: {}", err);
                self.snapshot.store(None);
                Err(err)
            }
        }
    }

    /// Swap in a new snapshot.
    pub fn install(&self, snapshot: Snapshot) {
        self.enabled.store(snapshot.config.enabled, Ordering::SeqCst);
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// The current snapshot, if an index is loaded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    fn require_snapshot(&self) -> Result<Arc<Snapshot>, HelpError> {
        self.snapshot().ok_or(HelpError::IndexNotLoaded)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Turn hover lookups on or off.
    pub fn set_enabled(&self, enabled: bool) {
        info!("Keyword hover {}", if enabled { "enabled" } else { "disabled" });
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Summary of the current snapshot, or `None` when nothing is loaded.
    pub fn snapshot_info(&self) -> Option<SnapshotInfo> {
        let snapshot = self.snapshot()?;
        Some(SnapshotInfo {
            index_versions: sort_versions(snapshot.index.versions.keys().cloned()),
            disk_versions: snapshot.disk_versions.clone(),
            index_version: snapshot.index_version.clone(),
            disk_version: snapshot.disk_version.clone(),
            preferred_solver: snapshot.config.preferred_solver(),
            keyword_count: snapshot.index.keyword_count(),
            merged_count: snapshot.merged().map_or(0, MergedTable::len),
            enabled: self.is_enabled(),
        })
    }

    /// Look up a keyword the way hover does.
    pub fn lookup(&self, keyword: &str) -> Result<KeywordMatch, HelpError> {
        self.require_snapshot()?
            .lookup_keyword(keyword)
            .ok_or_else(|| HelpError::KeywordNotFound(normalize_keyword(keyword)))
    }

    /// Hover content for the word under the cursor.
    ///
    /// Returns `None` when hover is disabled, no index is loaded, the
    /// cursor is on a `**` comment line, or the word is not a keyword.
    pub fn hover(&self, source: &dyn KeywordQuerySource) -> Option<HoverInfo> {
        if !self.is_enabled() {
            return None;
        }
        let query = source.query()?;
        if query.line.trim_start().starts_with("**") {
            return None;
        }

        let hit = self.snapshot()?.lookup_keyword(&query.word)?;
        let contents = format!(
            "{}\n\n[More Info]({})",
            hit.record.description.trim(),
            encode_command(&hit.composite_key())
        );

        let info = HoverInfo::new(contents);
        Some(match query.range {
            Some(range) => info.with_range(range),
            None => info,
        })
    }

    /// Resolve a raw target string to a manual page.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedDocument, HelpError> {
        let target = NavigationTarget::parse(raw)?;
        self.require_snapshot()?.resolve(&target)
    }

    /// Read and rewrite a resolved page for `display`.
    pub fn render(
        &self,
        document: &ResolvedDocument,
        display: &dyn DocumentationDisplay,
    ) -> Result<DocumentPage, HelpError> {
        let bytes = fs::read(&document.path).map_err(|source| HelpError::Io {
            path: document.path.clone(),
            source,
        })?;
        let html = String::from_utf8_lossy(&bytes);

        let theme = display
            .theme()
            .or_else(|| self.snapshot().and_then(|s| s.config.theme));
        let options = RewriteOptions {
            theme,
            ..RewriteOptions::default()
        };

        Ok(DocumentPage {
            title: format!("{} Documentation", document.keyword),
            path: document.path.clone(),
            fragment: document.fragment.clone(),
            html: rewrite(&html, &document.path, display, &options),
        })
    }

    /// Resolve, render and show a target.
    pub fn open_documentation(
        &self,
        raw: &str,
        display: &dyn DocumentationDisplay,
    ) -> Result<ResolvedDocument, HelpError> {
        let document = self.resolve(raw)?;
        let page = self.render(&document, display)?;
        info!("Opening {} ({})", document.keyword, document.path.display());
        display.show(page);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SourcePosition;
    use crate::host::UriMapper;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingDisplay {
        pages: Mutex<Vec<DocumentPage>>,
        notices: Mutex<Vec<Notice>>,
    }

    impl UriMapper for RecordingDisplay {
        fn to_viewer_uri(&self, path: &Path) -> String {
            format!("viewer:{}", path.display())
        }
    }

    impl DocumentationDisplay for RecordingDisplay {
        fn show(&self, page: DocumentPage) {
            self.pages.lock().unwrap().push(page);
        }

        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    const INDEX: &str = r#"{
        "versions": {
            "2020.10": {
                "IMEX": {
                    "WELL": {"description": "d", "file": "IMEX\\Content\\well.htm#top"}
                },
                "GEM": {
                    "WELL": {"description": "gem well", "file": "GEM\\Content\\well.htm"},
                    "ZMFVD": {"description": "gem only", "file": "GEM\\Content\\zmfvd.htm"}
                }
            }
        }
    }"#;

    fn manuals() -> TempDir {
        let temp = TempDir::new().unwrap();
        let imex = temp.path().join("2020.10/IMEX/Content");
        let gem = temp.path().join("2020.10/GEM/Content");
        fs::create_dir_all(&imex).unwrap();
        fs::create_dir_all(&gem).unwrap();
        fs::write(
            imex.join("well.htm"),
            r#"<html><body><a href="../../GEM/Content/zmfvd.htm">ZMFVD</a></body></html>"#,
        )
        .unwrap();
        fs::write(gem.join("zmfvd.htm"), "<p>zmfvd</p>").unwrap();
        temp
    }

    fn config(root: &Path, solver: &str) -> HelpConfig {
        HelpConfig {
            docs_root: Some(root.to_path_buf()),
            version: Some("2020.10".to_string()),
            solver: Some(solver.to_string()),
            ..Default::default()
        }
    }

    fn service(root: &Path, solver: &str) -> KeywordService {
        KeywordService::from_index(KeywordIndex::from_json(INDEX).unwrap(), config(root, solver))
    }

    #[test]
    fn test_lookup_prefers_configured_solver() {
        let temp = manuals();
        let hit = service(temp.path(), "IMEX").lookup("well").unwrap();
        assert_eq!(hit.solver, "IMEX");
        assert_eq!(hit.record.file, "IMEX\\Content\\well.htm#top");

        let hit = service(temp.path(), "GEM").lookup("well").unwrap();
        assert_eq!(hit.solver, "GEM");
    }

    #[test]
    fn test_lookup_with_missing_preferred_section() {
        let temp = manuals();
        let hit = service(temp.path(), "STARS").lookup("zmfvd").unwrap();
        assert_eq!(hit.solver, "GEM");
    }

    #[test]
    fn test_lookup_not_found() {
        let temp = manuals();
        let err = service(temp.path(), "IMEX").lookup("nope").unwrap_err();
        assert!(matches!(err, HelpError::KeywordNotFound(k) if k == "NOPE"));
    }

    #[test]
    fn test_unloaded_service() {
        let service = KeywordService::unloaded();
        assert!(matches!(service.lookup("WELL"), Err(HelpError::IndexNotLoaded)));
        assert!(service
            .hover(&SourcePosition::new("*WELL", 1, 2))
            .is_none());
    }

    #[test]
    fn test_failed_reload_clears_snapshot() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        assert!(service.lookup("WELL").is_ok());

        let missing = HelpConfig {
            index_path: Some(temp.path().join("missing.json")),
            ..Default::default()
        };
        let err = service.reload(missing).unwrap_err();
        assert!(matches!(err, HelpError::IndexNotFound(_)));
        assert!(matches!(service.lookup("WELL"), Err(HelpError::IndexNotLoaded)));
    }

    #[test]
    fn test_reload_from_file() {
        let temp = manuals();
        let index_path = temp.path().join("keywordData.json");
        fs::write(&index_path, INDEX).unwrap();

        let service = KeywordService::unloaded();
        let mut config = config(temp.path(), "GEM");
        config.index_path = Some(index_path);
        let notices = service.reload(config).unwrap();
        assert!(notices.is_empty());
        assert_eq!(service.lookup("WELL").unwrap().solver, "GEM");
    }

    #[test]
    fn test_index_without_versions() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("keywordData.json");
        fs::write(&index_path, r#"{"versions": {}}"#).unwrap();

        let config = HelpConfig {
            index_path: Some(index_path),
            ..Default::default()
        };
        assert!(matches!(
            KeywordService::new(config),
            Err(HelpError::VersionNotFound(_))
        ));
    }

    #[test]
    fn test_version_substitution_is_reported() {
        let temp = manuals();
        let mut config = config(temp.path(), "IMEX");
        config.version = Some("2099.01".to_string());
        let service =
            KeywordService::from_index(KeywordIndex::from_json(INDEX).unwrap(), config);

        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.index_version().unwrap().version(), "2020.10");
        assert!(snapshot.index_version().unwrap().is_substituted());
        assert_eq!(snapshot.notices().len(), 2);
        assert!(service.lookup("WELL").is_ok());
    }

    #[test]
    fn test_hover_contents() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        let info = service
            .hover(&SourcePosition::new("*WELL 1", 1, 3))
            .unwrap();
        assert!(info.contents.starts_with("d\n\n[More Info](command:cmg-help.openDocumentation?"));
        assert!(info.contents.contains("%22IMEX%7CWELL%22"));
        assert_eq!(info.range.unwrap().start_col, 2);
    }

    #[test]
    fn test_hover_disabled_and_comments() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        assert!(service
            .hover(&SourcePosition::new("** WELL comment", 1, 4))
            .is_none());

        service.set_enabled(false);
        assert!(service.hover(&SourcePosition::new("*WELL", 1, 2)).is_none());
        service.set_enabled(true);
        assert!(service.hover(&SourcePosition::new("*WELL", 1, 2)).is_some());
    }

    #[test]
    fn test_snapshot_info() {
        let temp = manuals();
        let info = service(temp.path(), "GEM").snapshot_info().unwrap();
        assert_eq!(info.index_versions, vec!["2020.10"]);
        assert_eq!(info.disk_versions, vec!["2020.10"]);
        assert_eq!(
            info.index_version,
            Some(VersionResolution::Exact("2020.10".to_string()))
        );
        assert_eq!(info.preferred_solver.as_deref(), Some("GEM"));
        assert_eq!(info.keyword_count, 3);
        assert_eq!(info.merged_count, 2);
        assert!(KeywordService::unloaded().snapshot_info().is_none());
    }

    #[test]
    fn test_config_disables_hover() {
        let temp = manuals();
        let mut config = config(temp.path(), "IMEX");
        config.enabled = false;
        let service =
            KeywordService::from_index(KeywordIndex::from_json(INDEX).unwrap(), config);
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_resolve_keyword_document() {
        let temp = manuals();
        let document = service(temp.path(), "IMEX").resolve("well").unwrap();
        assert_eq!(document.path, temp.path().join("2020.10/IMEX/Content/well.htm"));
        assert_eq!(document.fragment.as_deref(), Some("top"));
        assert_eq!(document.keyword, "WELL");
    }

    #[test]
    fn test_resolve_solver_hint() {
        let temp = manuals();
        let document = service(temp.path(), "IMEX").resolve("GEM|WELL");
        // GEM's well.htm is not on disk
        assert!(matches!(document, Err(HelpError::DocFileNotFound(_))));
    }

    #[test]
    fn test_resolve_relative_file() {
        let temp = manuals();
        let document = service(temp.path(), "IMEX")
            .resolve("GEM/Content/zmfvd.htm#x")
            .unwrap();
        assert_eq!(document.path, temp.path().join("2020.10/GEM/Content/zmfvd.htm"));
        assert_eq!(document.fragment.as_deref(), Some("x"));
        assert_eq!(document.keyword, "ZMFVD");
    }

    #[test]
    fn test_resolve_moved_file_by_name() {
        let temp = manuals();
        let stale = temp.path().join("2019.10/elsewhere/zmfvd.htm");
        let document = service(temp.path(), "IMEX")
            .resolve(&stale.to_string_lossy())
            .unwrap();
        assert_eq!(document.path, temp.path().join("2020.10/GEM/Content/zmfvd.htm"));
    }

    #[test]
    fn test_resolve_never_opens_non_html_file() {
        let temp = manuals();
        let secret = temp.path().join("secret.txt");
        fs::write(&secret, "not a page").unwrap();

        let raw = format!("{}#.htm", secret.display());
        let service = service(temp.path(), "IMEX");
        assert!(matches!(
            service.resolve(&raw),
            Err(HelpError::KeywordNotFound(_))
        ));

        let display = RecordingDisplay::default();
        assert!(service.open_documentation(&raw, &display).is_err());
        assert!(display.pages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_held_snapshot_survives_reload() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        let held = service.snapshot().unwrap();
        assert_eq!(held.merged().unwrap().get("WELL").unwrap().0, "IMEX");

        let replacement = KeywordIndex::from_json(
            r#"{"versions": {"2020.10": {"GEM": {
                "WELL": {"description": "replaced", "file": "GEM\\Content\\well.htm"}
            }}}}"#,
        )
        .unwrap();
        service.install(Snapshot::build(replacement, config(temp.path(), "GEM")));

        let (solver, record) = held.merged().unwrap().get("WELL").unwrap();
        assert_eq!(solver, "IMEX");
        assert_eq!(record.description, "d");
        assert!(held.merged().unwrap().get("ZMFVD").is_some());
        assert_eq!(held.lookup_keyword("WELL").unwrap().solver, "IMEX");

        let fresh = service.snapshot().unwrap();
        assert!(!Arc::ptr_eq(&held, &fresh));
        let (solver, record) = fresh.merged().unwrap().get("WELL").unwrap();
        assert_eq!(solver, "GEM");
        assert_eq!(record.description, "replaced");
        assert!(fresh.merged().unwrap().get("ZMFVD").is_none());
        assert_eq!(service.lookup("WELL").unwrap().record.description, "replaced");
    }

    #[test]
    fn test_missing_docs_root() {
        let service = KeywordService::from_index(
            KeywordIndex::from_json(INDEX).unwrap(),
            HelpConfig::default(),
        );
        assert!(matches!(
            service.resolve("WELL"),
            Err(HelpError::ConfigMissing("docs_root"))
        ));
    }

    #[test]
    fn test_no_disk_version() {
        let temp = TempDir::new().unwrap();
        let service = service(temp.path(), "IMEX");
        assert!(matches!(
            service.resolve("ZMFVD"),
            Err(HelpError::NoDiskVersion(_))
        ));
    }

    #[test]
    fn test_open_documentation_shows_page() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        let display = RecordingDisplay::default();

        service.open_documentation("WELL", &display).unwrap();

        let pages = display.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "WELL Documentation");
        assert!(pages[0]
            .html
            .contains("command:cmg-help.openDocumentation?%22..%2F..%2FGEM%2FContent%2Fzmfvd.htm%22"));
    }

    #[test]
    fn test_open_missing_keyword_shows_nothing() {
        let temp = manuals();
        let service = service(temp.path(), "IMEX");
        let display = RecordingDisplay::default();

        assert!(service.open_documentation("NOPE", &display).is_err());
        assert!(display.pages.lock().unwrap().is_empty());
    }
}
