//! Navigation between manual pages inside the viewer.
//!
//! A session starts when a page is opened and follows the links the user
//! clicks. Each click arrives as a [`NavigationMessage`]; the session
//! resolves it against the directory of the page that sent it and asks the
//! service to open the result.

use crate::config::HelpConfig;
use crate::error::HelpError;
use crate::host::DocumentationDisplay;
use crate::protocol::NavigationMessage;
use crate::service::{KeywordService, ResolvedDocument};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Where a session is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A page is shown.
    Displaying(PathBuf),

    /// A click is being resolved.
    Resolving(NavigationMessage),
}

/// One viewer panel following links.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    state: SessionState,
}

impl NavigationSession {
    /// Open `raw` and start a session on the resulting page.
    pub fn open(
        service: &KeywordService,
        raw: &str,
        display: &dyn DocumentationDisplay,
    ) -> Result<Self, HelpError> {
        let document = service.open_documentation(raw, display)?;
        Ok(Self::displaying(document.path))
    }

    /// A session already showing `path`.
    pub fn displaying(path: PathBuf) -> Self {
        Self {
            state: SessionState::Displaying(path),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The page currently shown.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Displaying(path) => Some(path),
            SessionState::Resolving(_) => None,
        }
    }

    /// Follow a clicked link.
    ///
    /// On failure the user is notified and the session stays on the page it
    /// was showing.
    pub fn handle_message(
        &mut self,
        service: &KeywordService,
        message: NavigationMessage,
        display: &dyn DocumentationDisplay,
    ) -> Result<ResolvedDocument, HelpError> {
        let previous = match std::mem::replace(
            &mut self.state,
            SessionState::Resolving(message.clone()),
        ) {
            SessionState::Displaying(path) => Some(path),
            SessionState::Resolving(_) => None,
        };

        let outcome = message
            .resolve_target()
            .map_err(HelpError::from)
            .and_then(|target| {
                debug!("Following link to {}", target.display());
                service.open_documentation(&target.to_string_lossy(), display)
            });

        match outcome {
            Ok(document) => {
                self.state = SessionState::Displaying(document.path.clone());
                Ok(document)
            }
            Err(err) => {
                warn!("Navigation failed: {}", err);
                display.notify(err.to_notice());
                if let Some(path) = previous {
                    self.state = SessionState::Displaying(path);
                }
                Err(err)
            }
        }
    }
}

/// The viewer panel shared between command handlers and the host's
/// message callback.
pub struct Navigator {
    service: Arc<KeywordService>,
    display: Arc<dyn DocumentationDisplay + Send + Sync>,
    session: Mutex<Option<NavigationSession>>,
}

impl Navigator {
    pub fn new(
        service: Arc<KeywordService>,
        display: Arc<dyn DocumentationDisplay + Send + Sync>,
    ) -> Self {
        Self {
            service,
            display,
            session: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &KeywordService {
        &self.service
    }

    pub fn display(&self) -> &dyn DocumentationDisplay {
        self.display.as_ref()
    }

    /// Reload the index and report version substitutions to the display.
    pub fn reload(&self, config: HelpConfig) -> Result<(), HelpError> {
        match self.service.reload(config) {
            Ok(notices) => {
                for notice in notices {
                    self.display.notify(notice);
                }
                Ok(())
            }
            Err(err) => {
                self.display.notify(err.to_notice());
                Err(err)
            }
        }
    }

    /// Open a target in a fresh session, replacing any previous one.
    ///
    /// Failures are reported to the display and returned. The display is
    /// called without the session lock held.
    pub fn open(&self, raw: &str) -> Result<ResolvedDocument, HelpError> {
        match self.service.open_documentation(raw, self.display()) {
            Ok(document) => {
                *self.lock() = Some(NavigationSession::displaying(document.path.clone()));
                Ok(document)
            }
            Err(err) => {
                warn!("Failed to open {}: {}", raw, err);
                self.display.notify(err.to_notice());
                Err(err)
            }
        }
    }

    /// Route a message posted by the viewer to the current session.
    ///
    /// The session is resolved on a copy; the lock is only taken to read it
    /// and to store the outcome.
    pub fn handle_message(&self, message: NavigationMessage) -> Result<ResolvedDocument, HelpError> {
        let current = self.lock().clone();
        let had_session = current.is_some();
        // A closed panel starts over from the message target.
        let mut session = current.unwrap_or_else(|| NavigationSession {
            state: SessionState::Resolving(message.clone()),
        });

        let outcome = session.handle_message(&self.service, message, self.display());
        if outcome.is_ok() || had_session {
            *self.lock() = Some(session);
        }
        outcome
    }

    /// Parse a raw JSON message and route it.
    pub fn handle_json(&self, json: &str) -> Result<ResolvedDocument, HelpError> {
        match NavigationMessage::from_json(json) {
            Ok(message) => self.handle_message(message),
            Err(err) => {
                let err = HelpError::from(err);
                self.display.notify(err.to_notice());
                Err(err)
            }
        }
    }

    /// Page shown by the current session.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock()
            .as_ref()
            .and_then(|s| s.current_path().map(Path::to_path_buf))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<NavigationSession>> {
        // A panic while holding the lock leaves a valid state behind.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
