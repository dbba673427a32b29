//! # cmg-help
//!
//! Keyword documentation for CMG reservoir simulator input decks.
//!
//! This library resolves deck keywords (`*WELL`, `*PTUBE1`, ...) against a
//! JSON keyword index and opens the matching page of the installed HTML
//! manuals. It's designed to be embedded in editor integrations, which
//! supply the viewer, hover and command surfaces through the traits in
//! [`host`].
//!
//! ## Features
//!
//! - Keyword index loading with solver and keyword normalization
//! - Version resolution with observable substitution
//! - Preferred-solver merge of IMEX, GEM, STARS and CMG sections
//! - Hover text with a link into the manuals
//! - Page rewriting so links keep working inside a sandboxed viewer
//! - Index building from an installed manual tree
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cmg_help::{HelpConfig, KeywordService, SourcePosition};
//!
//! let config = HelpConfig::load_default(workspace)?;
//! let service = KeywordService::new(config)?;
//!
//! if let Some(info) = service.hover(&SourcePosition::new("*WELL 1", 1, 3)) {
//!     println!("{}", info.contents);
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! cmg-help --docs-root "C:/Program Files/CMG/Manuals" lookup WELL
//! cmg-help open "IMEX|WELL" -o well.html
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod indexer;
mod loader;
pub mod lookup;
pub mod merge;
pub mod protocol;
pub mod rewrite;
pub mod service;
pub mod session;
pub mod target;
mod types;
pub mod version;

pub use commands::{register_commands, register_keyword_commands};
pub use config::{ConfigError, HelpConfig};
pub use context::{detect_keyword, SourcePosition};
pub use error::HelpError;
pub use host::{
    CommandHandler, CommandRegistry, DocumentPage, DocumentationDisplay, InMemoryRegistry,
    KeywordQuery, KeywordQuerySource, Notice, Theme, UriMapper,
};
pub use indexer::{build_index, IndexerError};
pub use loader::{default_index_path, LoadError, DEFAULT_INDEX_FILE};
pub use lookup::{find_by_file, lookup, LookupScope};
pub use merge::{merge, merge_with_order, MergedTable, KNOWN_SOLVERS};
pub use protocol::{NavigationMessage, ProtocolError};
pub use rewrite::RewriteOptions;
pub use service::{KeywordService, ResolvedDocument, Snapshot, SnapshotInfo};
pub use session::{NavigationSession, Navigator, SessionState};
pub use target::{NavigationTarget, TargetError};
pub use types::{
    HoverInfo, KeywordIndex, KeywordMatch, KeywordRecord, Range, SolverTable, VersionEntry,
};
pub use version::{resolve_version, VersionLabel, VersionResolution};
