//! Conversational intake session for the OpenLaw chat widget.
//!
//! [`session::SessionManager`] owns one conversation at a time: it records
//! turns in a [`transcript::Transcript`] and hands requests to a
//! [`controller::RequestController`], which keeps at most one call to the
//! remote [`llm::Assistant`] in flight. [`ui::IntakeWidget`] is the surface
//! the surrounding page talks to.

pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod transcript;
pub mod ui;

pub use config::{Config, ReopenPolicy};
pub use error::{IntakeError, RemoteError, RemoteErrorKind, TranscriptError};
pub use events::{LifecycleState, TurnRole, TurnStatus, WidgetSignal};
pub use session::SessionManager;
pub use ui::IntakeWidget;
