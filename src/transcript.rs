//! Ordered, append-only log of conversation turns

use crate::error::TranscriptError;
use crate::events::{TurnRole, TurnStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Opaque turn identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single utterance in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: TurnRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Insertion position, assigned by the transcript on append
    pub seq: u64,
    pub status: TurnStatus,
}

impl Turn {
    fn new(role: TurnRole, text: String, status: TurnStatus) -> Self {
        Self {
            id: TurnId::new(),
            role,
            text,
            created_at: Utc::now(),
            seq: 0,
            status,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text.into(), TurnStatus::Complete)
    }

    /// Placeholder for a reply that has not arrived yet
    pub fn pending_assistant() -> Self {
        Self::new(TurnRole::Assistant, String::new(), TurnStatus::Pending)
    }

    pub fn system_error(text: impl Into<String>) -> Self {
        Self::new(TurnRole::SystemError, text.into(), TurnStatus::Complete)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TurnStatus::Pending
    }
}

/// Ordered history of turns for one session
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    index: HashMap<TurnId, usize>,
    next_seq: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end
    pub fn append(&mut self, mut turn: Turn) -> Result<TurnId, TranscriptError> {
        if self.index.contains_key(&turn.id) {
            return Err(TranscriptError::DuplicateId(turn.id));
        }

        turn.seq = self.next_seq;
        self.next_seq += 1;

        let id = turn.id;
        self.index.insert(id, self.turns.len());
        self.turns.push(turn);
        Ok(id)
    }

    /// Resolve a pending turn. Terminal turns are immutable.
    pub fn update_status(
        &mut self,
        id: TurnId,
        new_status: TurnStatus,
        new_text: Option<String>,
    ) -> Result<(), TranscriptError> {
        let position = *self.index.get(&id).ok_or(TranscriptError::NotFound(id))?;
        let turn = &mut self.turns[position];

        if !turn.is_pending() || !new_status.is_terminal() {
            return Err(TranscriptError::InvalidTransition {
                id,
                from: turn.status,
                to: new_status,
            });
        }

        turn.status = new_status;
        if let Some(text) = new_text {
            turn.text = text;
        }
        Ok(())
    }

    /// Read-only view in insertion order
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.index.get(&id).map(|&position| &self.turns[position])
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
