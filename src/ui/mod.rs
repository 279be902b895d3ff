//! Terminal rendition of the chat widget

pub mod commands;
pub mod render;
pub mod widget;

pub use commands::{get_help_text, parse_input, InputLine, ParsedCommand, SlashCommand};
pub use render::{render_status, render_turn, TranscriptPrinter};
pub use widget::{IntakeWidget, WidgetView};
