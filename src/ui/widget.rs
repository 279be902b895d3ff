use crate::config::{Config, ReopenPolicy};
use crate::error::IntakeError;
use crate::events::{LifecycleState, WidgetSignal};
use crate::llm::Assistant;
use crate::session::SessionManager;
use crate::transcript::{Turn, TurnId};
use std::sync::Arc;

/// Read-only state handed to whatever renders the widget
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub is_open: bool,
    pub turns: Vec<Turn>,
    pub lifecycle_state: Option<LifecycleState>,
    pub accepts_submission: bool,
}

/// The chat widget as seen by the page around it.
///
/// Whether the widget is open is exactly whether the manager holds a session;
/// there is no separate visibility flag.
pub struct IntakeWidget {
    manager: SessionManager,
    reopen_policy: ReopenPolicy,
}

impl IntakeWidget {
    pub fn new(assistant: Arc<dyn Assistant>, config: &Config) -> Self {
        Self::from_manager(SessionManager::new(assistant, config), config.reopen_policy)
    }

    pub fn from_manager(manager: SessionManager, reopen_policy: ReopenPolicy) -> Self {
        Self {
            manager,
            reopen_policy,
        }
    }

    /// Dispatch an inbound signal
    pub fn handle(&mut self, signal: WidgetSignal) -> Result<(), IntakeError> {
        match signal {
            WidgetSignal::OpenWidget { starter_text } => self.open_widget(&starter_text),
            WidgetSignal::CloseWidget => {
                self.close_widget();
                Ok(())
            }
            WidgetSignal::SubmitText { text } => self.submit_text(&text).map(|_| ()),
        }
    }

    /// Open with optional starter text. While already open, the reopen
    /// policy decides between replacing the conversation and continuing it.
    pub fn open_widget(&mut self, starter_text: &str) -> Result<(), IntakeError> {
        if self.manager.is_open() {
            match self.reopen_policy {
                ReopenPolicy::Replace => {
                    tracing::debug!("replacing open conversation");
                    self.manager.close();
                }
                ReopenPolicy::Append => {
                    if starter_text.trim().is_empty() {
                        return Ok(());
                    }
                    return self.manager.submit(starter_text).map(|_| ());
                }
            }
        }
        self.manager.open(starter_text)
    }

    pub fn close_widget(&mut self) {
        self.manager.close();
    }

    pub fn submit_text(&mut self, text: &str) -> Result<TurnId, IntakeError> {
        self.manager.submit(text)
    }

    /// Stop waiting for the current reply
    pub fn stop(&mut self) -> Result<bool, IntakeError> {
        self.manager.cancel()
    }

    pub fn poll(&mut self) -> Result<usize, IntakeError> {
        self.manager.poll()
    }

    pub async fn resolve_next(&mut self) -> Result<TurnId, IntakeError> {
        self.manager.resolve_next().await
    }

    pub fn is_open(&self) -> bool {
        self.manager.is_open()
    }

    pub fn reopen_policy(&self) -> ReopenPolicy {
        self.reopen_policy
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Snapshot for rendering. Replies that have arrived are not reflected until
    /// [`IntakeWidget::poll`] or [`IntakeWidget::resolve_next`] applies them, so call
    /// `poll()` before each render.
    pub fn view(&self) -> WidgetView {
        WidgetView {
            is_open: self.manager.is_open(),
            turns: self
                .manager
                .transcript()
                .map(|transcript| transcript.all().to_vec())
                .unwrap_or_default(),
            lifecycle_state: self.manager.lifecycle_state(),
            accepts_submission: self.manager.accepts_submission(),
        }
    }
}

impl Drop for IntakeWidget {
    fn drop(&mut self) {
        self.manager.close();
    }
}
