//! Command wiring
//!
//! Registers the plugin's commands with a host [`CommandRegistry`]. Handlers
//! report failures through the display and never return errors to the host.

use crate::host::{CommandRegistry, DocumentationDisplay, Notice};
use crate::service::KeywordService;
use crate::session::Navigator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens documentation for a raw target (keyword, `SOLVER|KEYWORD`, or page).
pub const OPEN_DOCUMENTATION: &str = "cmg-help.openDocumentation";

/// Turns hover lookups on.
pub const ENABLE: &str = "cmg-help.enable";

/// Turns hover lookups off.
pub const DISABLE: &str = "cmg-help.disable";

/// Brings the log output into view.
pub const SHOW_LOGS: &str = "cmg-help.showLogs";

/// Register the commands and return the navigator that owns the viewer
/// session. Hosts forward viewer messages to
/// [`Navigator::handle_message`].
pub fn register_commands(
    registry: &mut dyn CommandRegistry,
    service: Arc<KeywordService>,
    display: Arc<dyn DocumentationDisplay + Send + Sync>,
) -> Arc<Navigator> {
    let navigator = Arc::new(Navigator::new(service, display));

    let open = Arc::clone(&navigator);
    registry.register(
        OPEN_DOCUMENTATION,
        Arc::new(move |args: &[String]| match args.first() {
            Some(target) => {
                // Failures were already reported by the navigator.
                let _ = open.open(target);
            }
            None => {
                warn!("{} called without a target", OPEN_DOCUMENTATION);
                open.display()
                    .notify(Notice::Error("No documentation target given".to_string()));
            }
        }),
    );

    let enable = Arc::clone(&navigator);
    registry.register(
        ENABLE,
        Arc::new(move |_: &[String]| {
            enable.service().set_enabled(true);
            enable
                .display()
                .notify(Notice::Info("Keyword help enabled".to_string()));
        }),
    );

    let disable = Arc::clone(&navigator);
    registry.register(
        DISABLE,
        Arc::new(move |_: &[String]| {
            disable.service().set_enabled(false);
            disable
                .display()
                .notify(Notice::Info("Keyword help disabled".to_string()));
        }),
    );

    let logs = Arc::clone(&navigator);
    registry.register(
        SHOW_LOGS,
        Arc::new(move |_: &[String]| logs.display().reveal_logs()),
    );

    navigator
}

/// Command name that opens one keyword directly, e.g.
/// `cmg-help.openWELLDocumentation`.
pub fn keyword_command(keyword: &str) -> String {
    format!("cmg-help.open{}Documentation", keyword)
}

/// Register one command per keyword of the merged table.
///
/// Returns the number of commands registered; zero when no index is loaded.
pub fn register_keyword_commands(
    registry: &mut dyn CommandRegistry,
    navigator: &Arc<Navigator>,
) -> usize {
    let Some(snapshot) = navigator.service().snapshot() else {
        return 0;
    };
    let Some(merged) = snapshot.merged() else {
        return 0;
    };

    let mut count = 0;
    for keyword in merged.keywords() {
        let target = keyword.to_string();
        let navigator = Arc::clone(navigator);
        registry.register(
            &keyword_command(keyword),
            Arc::new(move |_: &[String]| {
                let _ = navigator.open(&target);
            }),
        );
        count += 1;
    }
    debug!("Registered {} keyword commands", count);
    count
}
