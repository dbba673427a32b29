//! cmg-help CLI - keyword documentation for CMG simulator decks.
//!
//! # Usage
//!
//! ```bash
//! # Describe a keyword
//! cmg-help --docs-root /opt/CMG/Manuals lookup WELL
//!
//! # Hover at a position in a deck (or - for stdin)
//! cmg-help hover model.dat 12 3 --format plain
//!
//! # Write the rewritten manual page for a target
//! cmg-help open "IMEX|WELL" -o well.html
//!
//! # Show index and manual versions
//! cmg-help versions --format json
//!
//! # Build the keyword index from an installed manual tree
//! cmg-help --docs-root /opt/CMG/Manuals index 2022.10 -o keywordData.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use cmg_help::indexer::DEFAULT_SOLVERS;
use cmg_help::{
    build_index, DocumentPage, DocumentationDisplay, HelpConfig, KeywordService, Notice,
    SourcePosition, Theme, UriMapper,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cmg-help")]
#[command(about = "Keyword documentation for CMG simulator input decks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: .cmg-help.yaml in the current or home directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Manual root containing YYYY.NN directories
    #[arg(long, global = true)]
    docs_root: Option<PathBuf>,

    /// Keyword index file
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Manual version to use
    #[arg(long, global = true)]
    doc_version: Option<String>,

    /// Preferred solver
    #[arg(long, global = true)]
    solver: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a keyword
    Lookup {
        /// Keyword, with or without the leading *
        keyword: String,
    },
    /// Hover information at a position in a deck
    Hover {
        /// Deck file (or - for stdin)
        file: String,
        /// Line number (1-based)
        line: u32,
        /// Column number (1-based)
        column: u32,
    },
    /// Resolve a target and write the rewritten manual page
    Open {
        /// Keyword, SOLVER|KEYWORD, or page path
        target: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Color scheme baked into the page
        #[arg(long)]
        theme: Option<Theme>,
    },
    /// Show index and manual versions
    Versions,
    /// Build the keyword index from the manual tree
    Index {
        /// Manual version directory (YYYY.NN)
        version: String,
        /// Output file (default: the configured index path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Solver directories to scan (default: IMEX and GEM)
        #[arg(long = "scan")]
        scan: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Plain,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match cli.config {
        Some(ref path) => HelpConfig::load(path)?,
        None => HelpConfig::load_default(&std::env::current_dir()?)?,
    };
    config.merge_cli(cli.docs_root, cli.index, cli.doc_version, cli.solver);

    init_logging(cli.verbose, &config.log_level);

    match cli.command {
        Commands::Lookup { keyword } => {
            let service = load_service(config)?;
            let hit = service.lookup(&keyword)?;
            let output = match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&hit)?,
                format => render(
                    format,
                    &format!(
                        "### {}\n\n{}\n\n**{} {}**: `{}`",
                        hit.keyword,
                        hit.record.description,
                        hit.solver,
                        hit.version,
                        hit.record.file_path()
                    ),
                ),
            };
            println!("{}", output);
        }
        Commands::Hover { file, line, column } => {
            let service = load_service(config)?;
            let source = if file == "-" {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                fs::read_to_string(&file)?
            };

            debug!("Position: line {}, column {}", line, column);
            match service.hover(&SourcePosition::new(&source, line, column)) {
                Some(info) => {
                    let output = match cli.format {
                        OutputFormat::Json => serde_json::to_string_pretty(&info)?,
                        format => render(format, &info.contents),
                    };
                    println!("{}", output);
                }
                None => {
                    if cli.verbose {
                        eprintln!("No keyword documentation at this position");
                    }
                }
            }
        }
        Commands::Open {
            target,
            output,
            theme,
        } => {
            let service = load_service(config)?;
            let display = CliDisplay::new(theme);
            let document = service.open_documentation(&target, &display)?;
            let page = display
                .page
                .into_inner()
                .ok_or("no page was produced")?;

            match output {
                Some(ref path) => {
                    fs::write(path, &page.html)?;
                    if cli.verbose {
                        eprintln!("Wrote {} to {}", document.path.display(), path.display());
                    }
                }
                None if cli.format != OutputFormat::Json => print!("{}", page.html),
                None => {}
            }
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
        }
        Commands::Versions => {
            let service = load_service(config)?;
            let info = service.snapshot_info().ok_or("keyword index is not loaded")?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("Index versions: {}", info.index_versions.join(", "));
            println!("Manual versions: {}", info.disk_versions.join(", "));
            if let Some(version) = &info.index_version {
                println!("Using index version: {}", version.version());
            }
            if let Some(version) = &info.disk_version {
                println!("Using manual version: {}", version.version());
            }
            if let Some(solver) = &info.preferred_solver {
                println!("Preferred solver: {}", solver);
            }
            println!(
                "Keywords: {} ({} after merge)",
                info.keyword_count, info.merged_count
            );
        }
        Commands::Index {
            version,
            output,
            scan,
        } => {
            let root = config.require_docs_root()?;
            let solvers: Vec<String> = if !scan.is_empty() {
                scan
            } else if !config.solvers.is_empty() {
                config.solvers.clone()
            } else {
                DEFAULT_SOLVERS.iter().map(|s| s.to_string()).collect()
            };

            let index = build_index(root, &version, solvers.as_slice())?;
            let path = output
                .or_else(|| config.resolved_index_path())
                .ok_or("no index path configured")?;
            index.save(&path)?;

            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&index)?);
            } else {
                println!(
                    "Indexed {} keywords into {}",
                    index.keyword_count(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, level: &str) {
    let default = if verbose { "debug" } else { level };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_service(config: HelpConfig) -> Result<KeywordService, cmg_help::HelpError> {
    let service = KeywordService::unloaded();
    for notice in service.reload(config)? {
        eprintln!("Note: {}", notice.message());
    }
    Ok(service)
}

fn render(format: OutputFormat, markdown: &str) -> String {
    match format {
        OutputFormat::Plain => plain_text(markdown),
        _ => markdown.to_string(),
    }
}

/// Collects the page shown by the service and prints notices to stderr.
struct CliDisplay {
    theme: Option<Theme>,
    page: RefCell<Option<DocumentPage>>,
}

impl CliDisplay {
    fn new(theme: Option<Theme>) -> Self {
        Self {
            theme,
            page: RefCell::new(None),
        }
    }
}

impl UriMapper for CliDisplay {
    fn to_viewer_uri(&self, path: &Path) -> String {
        let path = path.to_string_lossy().replace('\\', "/");
        let encoded = path
            .split('/')
            .map(|segment| {
                if is_drive(segment) {
                    segment.to_string()
                } else {
                    urlencoding::encode(segment).into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        if encoded.starts_with('/') {
            format!("file://{}", encoded)
        } else {
            format!("file:///{}", encoded)
        }
    }
}

/// `C:` style drive prefix.
fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl DocumentationDisplay for CliDisplay {
    fn show(&self, page: DocumentPage) {
        *self.page.borrow_mut() = Some(page);
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Info(message) => eprintln!("Note: {}", message),
            Notice::Error(message) => eprintln!("Error: {}", message),
        }
    }

    fn theme(&self) -> Option<Theme> {
        self.theme
    }
}

lazy_static! {
    /// `[text](target)` links, as written by hover.
    static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap();
}

/// Plain text for the markdown emitted by `lookup` and `hover`: the keyword
/// heading, bold source labels, code spans and command links.
fn plain_text(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| {
            let line = line.strip_prefix("### ").unwrap_or(line);
            let line = LINK.replace_all(line, "$1");
            line.replace("**", "").replace('`', "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lookup_output() {
        let plain = plain_text("### WELL\n\nDefines a well.\n\n**IMEX 2020.10**: `IMEX/Content/well.htm`");
        assert_eq!(plain, "WELL\n\nDefines a well.\n\nIMEX 2020.10: IMEX/Content/well.htm");
    }

    #[test]
    fn test_plain_hover_output() {
        let md = "Defines a well.\n\n[More Info](command:cmg-help.openDocumentation?%22IMEX%7CWELL%22)";
        assert_eq!(plain_text(md), "Defines a well.\n\nMore Info");
    }

    #[test]
    fn test_plain_keeps_description_text() {
        // Descriptions are prose; only the markup added by lookup and hover goes.
        let md = "#WELL and [1,2] ranges (see below)";
        assert_eq!(plain_text(md), md);
    }

    #[test]
    fn test_cli_uri_escapes_reserved_characters() {
        let display = CliDisplay::new(None);
        assert_eq!(
            display.to_viewer_uri(Path::new("/opt/100%/style.css")),
            "file:///opt/100%25/style.css"
        );
        assert_eq!(
            display.to_viewer_uri(Path::new("/opt/a?b/style.css")),
            "file:///opt/a%3Fb/style.css"
        );
        assert_eq!(
            display.to_viewer_uri(Path::new("/opt/Manuais/Simulação/style.css")),
            "file:///opt/Manuais/Simula%C3%A7%C3%A3o/style.css"
        );
        assert_eq!(
            display.to_viewer_uri(Path::new("/opt/well#1.htm")),
            "file:///opt/well%231.htm"
        );
    }

    #[test]
    fn test_cli_uri_mapping() {
        let display = CliDisplay::new(None);
        assert_eq!(
            display.to_viewer_uri(Path::new("/opt/CMG Manuals/style.css")),
            "file:///opt/CMG%20Manuals/style.css"
        );
        assert_eq!(
            display.to_viewer_uri(Path::new("C:\\CMG\\style.css")),
            "file:///C:/CMG/style.css"
        );
    }
}
