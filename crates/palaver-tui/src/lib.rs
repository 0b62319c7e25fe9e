//! Full-screen TUI for Palaver.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr, stdin};

use anyhow::Result;
pub use features::{input, transcript};
use palaver_core::client::ChatClient;
use palaver_core::config::Config;
use palaver_core::controller::await_cleanups;
use palaver_core::interrupt::{self, InterruptedError};
pub use runtime::TuiRuntime;

/// Runs the interactive chat until the user quits.
///
/// # Errors
/// Returns an error if stdin/stderr are not terminals or terminal I/O fails.
pub async fn run_interactive_chat(config: &Config, client: ChatClient) -> Result<()> {
    if !stdin().is_terminal() || !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Pipe input to `palaver chat` or use `palaver send <MESSAGE>` instead."
        );
    }

    // Shown until the alternate screen takes over, and again after it closes.
    let mut err = stderr();
    writeln!(err, "Palaver Chat")?;
    writeln!(err, "Service: {}", client.base_url())?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(config, client)?;
    let result = runtime.run();
    let deletes = runtime.take_pending_deletes();
    drop(runtime);

    await_cleanups(deletes, config.cleanup_grace()).await;
    result?;
    exit_result(interrupt::is_interrupted())?;

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}

/// A session ended by a termination signal reports `InterruptedError`.
fn exit_result(interrupted: bool) -> Result<()> {
    if interrupted {
        return Err(InterruptedError.into());
    }
    Ok(())
}
