//! Plain-text rendering of the widget for a terminal

use crate::events::{LifecycleState, TurnRole, TurnStatus};
use crate::transcript::{Turn, TurnId};
use crate::ui::widget::WidgetView;
use std::collections::HashSet;

const ASSISTANT_NAME: &str = "Ola";

/// Render one turn as it should appear once settled
pub fn render_turn(turn: &Turn) -> String {
    match (turn.role, turn.status) {
        (TurnRole::User, _) => format!("👤 You: {}", turn.text),
        (TurnRole::Assistant, TurnStatus::Pending) => format!("⚖️  {ASSISTANT_NAME} is typing..."),
        (TurnRole::Assistant, TurnStatus::Complete) => format!("⚖️  {ASSISTANT_NAME}: {}", turn.text),
        (TurnRole::Assistant, TurnStatus::Failed) => {
            format!("⚖️  {ASSISTANT_NAME} (no reply): {}", turn.text)
        }
        (TurnRole::SystemError, _) => format!("⚠️  {}", turn.text),
    }
}

pub fn render_status(state: Option<LifecycleState>) -> &'static str {
    match state {
        None => "closed",
        Some(LifecycleState::Idle) => "ready",
        Some(LifecycleState::AwaitingResponse) => "waiting for reply",
        Some(LifecycleState::Error) => "last message failed, you can try again",
    }
}

/// Emits each turn once, plus a one-time typing indicator for pending replies
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed: HashSet<TurnId>,
    indicated: HashSet<TurnId>,
    was_open: bool,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines not yet shown for this view
    pub fn new_lines(&mut self, view: &WidgetView) -> Vec<String> {
        let mut lines = Vec::new();

        if self.was_open && !view.is_open {
            lines.push("-- chat closed --".to_string());
        }
        if !self.was_open && view.is_open {
            lines.push("-- chat opened --".to_string());
        }
        self.was_open = view.is_open;

        for turn in &view.turns {
            if self.printed.contains(&turn.id) {
                continue;
            }
            if turn.is_pending() {
                if self.indicated.insert(turn.id) {
                    lines.push(render_turn(turn));
                }
                // Later turns wait until this reply settles.
                break;
            }
            self.printed.insert(turn.id);
            lines.push(render_turn(turn));
        }

        lines
    }
}
