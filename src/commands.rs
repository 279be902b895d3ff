use crate::config::Config;
use crate::error::IntakeError;
use crate::events::WidgetSignal;
use crate::llm::HttpAssistant;
use crate::prompts;
use crate::ui::{
    get_help_text, parse_input, render_status, InputLine, IntakeWidget, SlashCommand,
    TranscriptPrinter,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub fn list_suggestions() {
    println!("💡 Suggestions:");
    for (i, suggestion) in prompts::SUGGESTIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }
}

pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{rendered}");
    Ok(())
}

/// Run the chat widget against stdin/stdout until `/quit` or end of input
pub async fn chat(config: Config, starter_text: Option<String>) -> Result<()> {
    let assistant = Arc::new(HttpAssistant::new(&config)?);
    let mut widget = IntakeWidget::new(assistant, &config);
    let mut printer = TranscriptPrinter::new();

    println!("⚖️  OpenLaw intake. {} Type /help for commands.", prompts::SEARCH_PLACEHOLDER);
    widget
        .handle(WidgetSignal::OpenWidget {
            starter_text: starter_text.unwrap_or_default(),
        })
        .context("Failed to open chat")?;
    print_lines(&mut printer, &widget);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match handle_line(&mut widget, &line) {
                    Ok(LineOutcome::Continue) => {}
                    Ok(LineOutcome::Quit) => break,
                    Err(err) if err.is_input_error() => println!("ℹ️  {err}"),
                    Err(err) => return Err(err).context("Chat session failed"),
                }
            }
            resolved = widget.resolve_next() => {
                resolved.context("Chat session failed")?;
            }
        }
        print_lines(&mut printer, &widget);
    }

    widget.handle(WidgetSignal::CloseWidget)?;
    print_lines(&mut printer, &widget);
    Ok(())
}

enum LineOutcome {
    Continue,
    Quit,
}

fn handle_line(widget: &mut IntakeWidget, line: &str) -> Result<LineOutcome, IntakeError> {
    let command = match parse_input(line) {
        InputLine::Blank => return Ok(LineOutcome::Continue),
        InputLine::Message(text) => {
            if !widget.is_open() {
                println!("ℹ️  The chat is closed. Use /open to start a new conversation.");
                return Ok(LineOutcome::Continue);
            }
            widget.handle(WidgetSignal::SubmitText { text })?;
            return Ok(LineOutcome::Continue);
        }
        InputLine::Command(command) => command,
    };

    match command.command {
        SlashCommand::Open => widget.handle(WidgetSignal::OpenWidget {
            starter_text: command.argument().unwrap_or_default().to_string(),
        })?,
        SlashCommand::Suggest => match command.suggestion_position().and_then(prompts::suggestion) {
            Some(text) => widget.handle(WidgetSignal::OpenWidget {
                starter_text: text.to_string(),
            })?,
            None => list_suggestions(),
        },
        SlashCommand::Stop => {
            if !widget.stop()? {
                println!("ℹ️  Nothing to stop.");
            }
        }
        SlashCommand::Close => widget.handle(WidgetSignal::CloseWidget)?,
        SlashCommand::Quit => return Ok(LineOutcome::Quit),
        SlashCommand::Help => {
            println!("{}", get_help_text());
            println!("Status: {}", render_status(widget.view().lifecycle_state));
        }
    }
    Ok(LineOutcome::Continue)
}

fn print_lines(printer: &mut TranscriptPrinter, widget: &IntakeWidget) {
    for line in printer.new_lines(&widget.view()) {
        println!("{line}");
    }
}
