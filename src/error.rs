//! Error types for the intake session.
//!
//! Three families live here: input errors returned synchronously to the
//! widget, remote errors that end up as conversation content, and transcript
//! invariant violations that abort the triggering call.

use crate::events::TurnStatus;
use crate::transcript::TurnId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Errors returned by session entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// Submitted text was empty after trimming
    #[error("Message is empty")]
    EmptyInput,

    /// `open` was called while a session already exists
    #[error("A conversation is already open")]
    AlreadyOpen,

    /// `submit` was called with no open session
    #[error("No conversation is open")]
    SessionNotOpen,

    /// `submit` was called while the previous reply is still pending
    #[error("Still waiting for the previous reply")]
    RequestInFlight,

    /// The controller was asked to send while already sending
    #[error("A request is already in flight")]
    ConcurrentRequest,

    /// A transcript invariant was breached
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl IntakeError {
    /// Errors the caller recovers from by adjusting its own behaviour.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::AlreadyOpen | Self::SessionNotOpen | Self::RequestInFlight
        )
    }

    /// Contract breaches that never happen under correct usage.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Transcript(_) | Self::ConcurrentRequest)
    }
}

/// Transcript contract breaches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Turn {0} already exists in the transcript")]
    DuplicateId(TurnId),

    #[error("Turn {0} not found in the transcript")]
    NotFound(TurnId),

    #[error("Turn {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TurnId,
        from: TurnStatus,
        to: TurnStatus,
    },
}

/// Machine-readable kind of a remote failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RemoteErrorKind {
    Network,
    Timeout,
    InvalidResponse,
    RateLimited,
    ServerError,
}

/// Failure reported by the remote assistant or the transport in front of it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Timeout, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::InvalidResponse, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::RateLimited, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::ServerError, message)
    }

    /// Text shown to the visitor in the conversation.
    pub fn user_message(&self) -> String {
        match self.kind {
            RemoteErrorKind::Network => {
                "We couldn't reach our assistant. Please check your connection and try again."
                    .to_string()
            }
            RemoteErrorKind::Timeout => {
                "The assistant took too long to respond. Please try again.".to_string()
            }
            RemoteErrorKind::InvalidResponse => {
                "The assistant sent a reply we couldn't read. Please try again.".to_string()
            }
            RemoteErrorKind::RateLimited => {
                "We're getting a lot of requests right now. Please wait a moment and try again."
                    .to_string()
            }
            RemoteErrorKind::ServerError => {
                format!("Something went wrong on our side: {}", self.message)
            }
        }
    }
}
