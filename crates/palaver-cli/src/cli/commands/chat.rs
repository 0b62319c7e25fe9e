//! Chat command handler.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use palaver_core::client::ChatClient;
use palaver_core::config::Config;

use crate::modes;

pub async fn run(config: &Config, client: ChatClient) -> Result<()> {
    let interactive = std::io::stdin().is_terminal() && std::io::stderr().is_terminal();

    if interactive && modes::TUI_ENABLED {
        modes::run_interactive_chat(config, client)
            .await
            .context("interactive chat failed")
    } else {
        modes::line::run(config, client).await
    }
}
