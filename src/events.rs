use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Inbound signals from the widget's collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetSignal {
    /// Search bar submitted a query or a suggestion chip was clicked.
    /// Empty starter text opens a blank conversation.
    OpenWidget { starter_text: String },

    /// Explicit close action
    CloseWidget,

    /// Follow-up typed inside the open widget
    SubmitText { text: String },
}

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TurnRole {
    User,
    Assistant,
    SystemError,
}

/// Resolution status of an assistant turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TurnStatus {
    Pending,
    Complete,
    Failed,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnStatus::Pending)
    }
}

/// Session-level state exposed for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LifecycleState {
    #[default]
    Idle,
    AwaitingResponse,
    Error,
}

impl LifecycleState {
    /// A past failure does not lock the conversation.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, LifecycleState::AwaitingResponse)
    }
}

/// Phases of the request lifecycle controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ControllerPhase {
    #[default]
    Idle,
    Sending,
    Resolved,
    Failed,
    Cancelled,
}
