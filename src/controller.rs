//! Request lifecycle controller.
//!
//! Owns at most one outstanding request to the remote assistant. `send`
//! spawns the call and returns immediately; the outcome arrives later as a
//! [`Resolution`] on the channel handed out by [`RequestController::new`].
//! The owner feeds each resolution back through [`RequestController::settle`],
//! which is what moves the controller back to idle.

use crate::error::{IntakeError, RemoteError};
use crate::events::ControllerPhase;
use crate::llm::{Assistant, AssistantReply, AssistantRequest};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifies one request to the remote assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned by `send` before the request has resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHandle {
    pub request_id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(AssistantReply),
    Failed(RemoteError),
}

/// Single resolution event for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub request_id: RequestId,
    pub outcome: Outcome,
}

struct InFlight {
    request_id: RequestId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct RequestController {
    assistant: Arc<dyn Assistant>,
    timeout: Duration,
    in_flight: Option<InFlight>,
    resolution_tx: mpsc::UnboundedSender<Resolution>,
    phase_tx: watch::Sender<ControllerPhase>,
}

impl RequestController {
    pub fn new(
        assistant: Arc<dyn Assistant>,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Resolution>) {
        let (resolution_tx, resolution_rx) = mpsc::unbounded_channel();
        let (phase_tx, _) = watch::channel(ControllerPhase::Idle);

        let controller = Self {
            assistant,
            timeout,
            in_flight: None,
            resolution_tx,
            phase_tx,
        };
        (controller, resolution_rx)
    }

    /// Start a request. Must be called from within a tokio runtime.
    pub fn send(&mut self, request: AssistantRequest) -> Result<RequestHandle, IntakeError> {
        if self.in_flight.is_some() {
            return Err(IntakeError::ConcurrentRequest);
        }

        let request_id = RequestId::new();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_request(
            Arc::clone(&self.assistant),
            request,
            self.timeout,
            request_id,
            cancel.clone(),
            self.resolution_tx.clone(),
        ));

        self.in_flight = Some(InFlight {
            request_id,
            cancel,
            task,
        });
        self.transition(ControllerPhase::Sending);
        tracing::debug!(%request_id, "request sent");

        Ok(RequestHandle { request_id })
    }

    /// Accept a resolution from the channel. Returns false for stale
    /// resolutions that no longer match the in-flight request.
    pub fn settle(&mut self, resolution: &Resolution) -> bool {
        let is_current = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.request_id == resolution.request_id);
        if !is_current {
            tracing::debug!(request_id = %resolution.request_id, "ignoring stale resolution");
            return false;
        }

        self.in_flight = None;
        match &resolution.outcome {
            Outcome::Resolved(_) => self.transition(ControllerPhase::Resolved),
            Outcome::Failed(err) => {
                tracing::warn!(request_id = %resolution.request_id, kind = %err.kind, "request failed: {}", err.message);
                self.transition(ControllerPhase::Failed);
            }
        }
        self.transition(ControllerPhase::Idle);
        true
    }

    /// Abort the in-flight request, if any. Idempotent.
    pub fn cancel(&mut self) -> Option<RequestId> {
        let in_flight = self.in_flight.take()?;
        in_flight.cancel.cancel();
        in_flight.task.abort();

        self.transition(ControllerPhase::Cancelled);
        self.transition(ControllerPhase::Idle);
        tracing::debug!(request_id = %in_flight.request_id, "request cancelled");
        Some(in_flight.request_id)
    }

    pub fn phase(&self) -> ControllerPhase {
        *self.phase_tx.borrow()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|in_flight| in_flight.request_id)
    }

    /// Observe phase transitions
    pub fn subscribe(&self) -> watch::Receiver<ControllerPhase> {
        self.phase_tx.subscribe()
    }

    fn transition(&self, phase: ControllerPhase) {
        let previous = self.phase_tx.send_replace(phase);
        tracing::trace!(from = %previous, to = %phase, "controller transition");
    }
}

impl Drop for RequestController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_request(
    assistant: Arc<dyn Assistant>,
    request: AssistantRequest,
    timeout: Duration,
    request_id: RequestId,
    cancel: CancellationToken,
    resolution_tx: mpsc::UnboundedSender<Resolution>,
) {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = tokio::time::timeout(timeout, assistant.reply(request)) => match result {
            Ok(Ok(reply)) => Outcome::Resolved(reply),
            Ok(Err(err)) => Outcome::Failed(err),
            Err(_) => Outcome::Failed(RemoteError::timeout(format!(
                "No reply within {} seconds",
                timeout.as_secs()
            ))),
        },
    };

    // The receiver only disappears when the owner is gone.
    let _ = resolution_tx.send(Resolution {
        request_id,
        outcome,
    });
}
