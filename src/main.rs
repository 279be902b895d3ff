use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openlaw_intake::config::Config;
use openlaw_intake::{commands, prompts};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openlaw-intake")]
#[command(version)]
#[command(about = "Chat with the OpenLaw intake assistant", long_about = None)]
struct Cli {
    /// Read configuration from this file instead of ~/.openlaw/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat, optionally seeded with a search query or suggestion
    Chat {
        /// Search bar query used as the first message
        #[arg(long, conflicts_with = "suggestion")]
        query: Option<String>,

        /// Suggestion chip number (see `suggestions`)
        #[arg(long)]
        suggestion: Option<usize>,
    },
    /// List the suggestion chips
    Suggestions,
    /// Print the effective configuration
    Config,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("openlaw_intake=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Commands::Chat {
        query: None,
        suggestion: None,
    }) {
        Commands::Chat { query, suggestion } => {
            let starter = match suggestion {
                Some(position) => Some(
                    prompts::suggestion(position)
                        .with_context(|| format!("No suggestion number {position}"))?
                        .to_string(),
                ),
                None => query.as_deref().and_then(prompts::search_starter),
            };
            commands::chat(config, starter).await
        }
        Commands::Suggestions => {
            commands::list_suggestions();
            Ok(())
        }
        Commands::Config => commands::show_config(&config),
    }
}
