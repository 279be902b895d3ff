use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a line with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Open the widget, optionally with starter text
    Open,
    /// Pick a suggestion chip by number
    Suggest,
    /// Stop waiting for the current reply
    Stop,
    /// Close the widget
    Close,
    /// Exit the application
    Quit,
    /// Show help
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based chip position for `/suggest N`
    pub fn suggestion_position(&self) -> Option<usize> {
        if self.command != SlashCommand::Suggest {
            return None;
        }
        self.argument()?.trim().parse().ok()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Open => "open the chat, optionally with a first message",
            SlashCommand::Suggest => "open the chat with suggestion N",
            SlashCommand::Stop => "stop waiting for the current reply",
            SlashCommand::Close => "close the chat and discard the conversation",
            SlashCommand::Quit => "exit",
            SlashCommand::Help => "show available commands",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// What a line typed into the terminal widget means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Command(ParsedCommand),
    Message(String),
    Blank,
}

pub fn parse_input(line: &str) -> InputLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputLine::Blank;
    }
    match parse_slash_command(trimmed) {
        Some(command) => InputLine::Command(command),
        None => InputLine::Message(trimmed.to_string()),
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            "s" | "chip" => Some(SlashCommand::Suggest),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }
    help.push_str("\nAnything else you type is sent to the assistant.");
    help
}
