//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use palaver_core::client::ChatClient;
use palaver_core::config::{self, API_URL_ENV};
use palaver_core::{interrupt, logging};

mod commands;

#[derive(Parser)]
#[command(name = "palaver")]
#[command(version)]
#[command(about = "Terminal chat client for a remote chat service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the chat service
    #[arg(long, global = true, value_name = "URL", env = API_URL_ENV)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Chat interactively (full-screen, or line by line when not on a terminal)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// The message to send
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Continue an existing conversation
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
    },
    /// Delete a conversation on the service
    Delete {
        /// The conversation to delete
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the config file is broken.
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(config.log_level.as_deref());
    interrupt::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    let api_url = config.resolve_api_url(cli.api_url.as_deref())?;
    let client = ChatClient::new(&api_url, config.request_timeout())?;
    tracing::info!(api_url = %api_url, "chat service resolved");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(config, client).await,
        Commands::Send {
            message,
            conversation,
        } => commands::send::run(config, client, &message, conversation.as_deref()).await,
        Commands::Delete { id } => commands::delete::run(&client, &id).await,
        Commands::Config { .. } => Ok(()),
    }
}
