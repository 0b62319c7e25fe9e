//! Runtime execution modes.
//!
//! - `line`: stdin/stdout chat for pipes and dumb terminals
//! - `tui`: full-screen interactive terminal UI (optional feature)

pub mod line;

#[cfg(feature = "tui")]
pub use palaver_tui::run_interactive_chat;

/// Whether this build can run the full-screen UI.
pub const TUI_ENABLED: bool = cfg!(feature = "tui");

#[cfg(not(feature = "tui"))]
pub async fn run_interactive_chat(
    _config: &palaver_core::config::Config,
    _client: palaver_core::client::ChatClient,
) -> anyhow::Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").");
}
