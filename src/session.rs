use crate::config::Config;
use crate::controller::{Outcome, RequestController, RequestId, Resolution};
use crate::error::IntakeError;
use crate::events::{ControllerPhase, LifecycleState, TurnRole, TurnStatus};
use crate::llm::{Assistant, AssistantRequest, ContextMessage};
use crate::prompts;
use crate::transcript::{Transcript, Turn, TurnId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// One open conversation, from widget-open to widget-close
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    transcript: Transcript,
    active_request: Option<ActiveRequest>,
    lifecycle_state: LifecycleState,
    /// Server-issued id that ties follow-ups to the same back-end history
    conversation_id: Option<String>,
    opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveRequest {
    request_id: RequestId,
    turn_id: TurnId,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Transcript::new(),
            active_request: None,
            lifecycle_state: LifecycleState::Idle,
            conversation_id: None,
            opened_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle_state
    }

    pub fn active_request_id(&self) -> Option<RequestId> {
        self.active_request.map(|active| active.request_id)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Completed user and assistant turns, oldest first
    fn context(&self) -> Vec<ContextMessage> {
        self.transcript
            .all()
            .iter()
            .filter(|turn| turn.role != TurnRole::SystemError && turn.status == TurnStatus::Complete)
            .map(|turn| ContextMessage {
                role: turn.role,
                text: turn.text.clone(),
            })
            .collect()
    }
}

/// Session manager: the only entry point for opening, submitting and closing.
///
/// Entry points take `&mut self`, so they serialize against each other and
/// against resolution handling. Share across threads behind a mutex.
pub struct SessionManager {
    controller: RequestController,
    resolutions: mpsc::UnboundedReceiver<Resolution>,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(assistant: Arc<dyn Assistant>, config: &Config) -> Self {
        Self::with_timeout(assistant, config.request_timeout())
    }

    pub fn with_timeout(assistant: Arc<dyn Assistant>, timeout: Duration) -> Self {
        let (controller, resolutions) = RequestController::new(assistant, timeout);
        Self {
            controller,
            resolutions,
            session: None,
        }
    }

    /// Create a fresh session, submitting `starter_text` when it is not blank
    pub fn open(&mut self, starter_text: &str) -> Result<(), IntakeError> {
        if self.session.is_some() {
            return Err(IntakeError::AlreadyOpen);
        }

        let session = Session::new();
        tracing::info!(session_id = %session.id, "conversation opened");
        self.session = Some(session);

        if !starter_text.trim().is_empty() {
            self.submit(starter_text)?;
        }
        Ok(())
    }

    /// Append a user turn and its pending reply, then send the request.
    /// Returns the id of the user turn.
    pub fn submit(&mut self, user_text: &str) -> Result<TurnId, IntakeError> {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(IntakeError::EmptyInput);
        }

        let session = self.session.as_mut().ok_or(IntakeError::SessionNotOpen)?;
        if session.lifecycle_state == LifecycleState::AwaitingResponse {
            return Err(IntakeError::RequestInFlight);
        }

        let request = AssistantRequest {
            conversation_id: session.conversation_id.clone(),
            context: session.context(),
            text: text.to_string(),
        };
        let handle = self.controller.send(request)?;

        let appended = session
            .transcript
            .append(Turn::user(text))
            .and_then(|user_id| {
                let turn_id = session.transcript.append(Turn::pending_assistant())?;
                Ok((user_id, turn_id))
            });
        let (user_id, turn_id) = match appended {
            Ok(ids) => ids,
            Err(err) => {
                self.controller.cancel();
                return Err(err.into());
            }
        };

        session.active_request = Some(ActiveRequest {
            request_id: handle.request_id,
            turn_id,
        });
        session.lifecycle_state = LifecycleState::AwaitingResponse;
        tracing::debug!(session_id = %session.id, request_id = %handle.request_id, "message submitted");

        Ok(user_id)
    }

    /// Stop waiting for the current reply without closing the conversation.
    /// Returns false when nothing was in flight.
    pub fn cancel(&mut self) -> Result<bool, IntakeError> {
        let Some(request_id) = self.controller.cancel() else {
            return Ok(false);
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let Some(active) = session.active_request.filter(|a| a.request_id == request_id) else {
            return Ok(false);
        };

        session.active_request = None;
        session.lifecycle_state = LifecycleState::Idle;
        session.transcript.update_status(
            active.turn_id,
            TurnStatus::Failed,
            Some(prompts::CANCELLED_REASON.to_string()),
        )?;
        tracing::info!(session_id = %session.id, %request_id, "reply cancelled");
        Ok(true)
    }

    /// Cancel any in-flight request and discard the session. Idempotent.
    pub fn close(&mut self) {
        self.controller.cancel();
        while self.resolutions.try_recv().is_ok() {}

        if let Some(session) = self.session.take() {
            tracing::info!(
                session_id = %session.id,
                turns = session.transcript.len(),
                "conversation closed"
            );
        }
    }

    /// Apply every resolution that has already arrived, without waiting.
    pub fn poll(&mut self) -> Result<usize, IntakeError> {
        let mut applied = 0;
        while let Ok(resolution) = self.resolutions.try_recv() {
            if self.apply(resolution)?.is_some() {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Wait for the in-flight request to resolve and apply it. Returns the
    /// resolved assistant turn. Pends forever while nothing is in flight, so
    /// it composes with `tokio::select!`.
    pub async fn resolve_next(&mut self) -> Result<TurnId, IntakeError> {
        loop {
            let Some(resolution) = self.resolutions.recv().await else {
                // The controller holds the sender for as long as we live.
                std::future::pending::<()>().await;
                continue;
            };
            if let Some(turn_id) = self.apply(resolution)? {
                return Ok(turn_id);
            }
        }
    }

    fn apply(&mut self, resolution: Resolution) -> Result<Option<TurnId>, IntakeError> {
        if !self.controller.settle(&resolution) {
            return Ok(None);
        }

        let Some(session) = self.session.as_mut() else {
            tracing::warn!(request_id = %resolution.request_id, "dropping reply for a closed conversation");
            return Ok(None);
        };
        let Some(active) = session
            .active_request
            .filter(|active| active.request_id == resolution.request_id)
        else {
            tracing::warn!(request_id = %resolution.request_id, "dropping reply for an inactive request");
            return Ok(None);
        };
        session.active_request = None;

        match resolution.outcome {
            Outcome::Resolved(reply) => {
                session.transcript.update_status(
                    active.turn_id,
                    TurnStatus::Complete,
                    Some(reply.text),
                )?;
                if reply.conversation_id.is_some() {
                    session.conversation_id = reply.conversation_id;
                }
                session.lifecycle_state = LifecycleState::Idle;
            }
            Outcome::Failed(err) => {
                session.transcript.update_status(
                    active.turn_id,
                    TurnStatus::Failed,
                    Some(prompts::FAILED_REASON.to_string()),
                )?;
                session
                    .transcript
                    .append(Turn::system_error(prompts::retry_notice(&err.user_message())))?;
                session.lifecycle_state = LifecycleState::Error;
            }
        }

        Ok(Some(active.turn_id))
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.session.as_ref().map(Session::transcript)
    }

    pub fn lifecycle_state(&self) -> Option<LifecycleState> {
        self.session.as_ref().map(Session::lifecycle_state)
    }

    /// Whether a `submit` would currently be accepted
    pub fn accepts_submission(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.lifecycle_state.accepts_submission())
    }

    pub fn controller_phase(&self) -> ControllerPhase {
        self.controller.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ControllerPhase> {
        self.controller.subscribe()
    }
}
