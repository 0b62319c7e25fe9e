//! One-shot send command.

use anyhow::{Result, bail};
use palaver_core::client::ChatClient;
use palaver_core::config::Config;
use palaver_core::controller::{ChatController, SubmitOutcome};

pub async fn run(
    config: &Config,
    client: ChatClient,
    message: &str,
    conversation: Option<&str>,
) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message must not be empty");
    }

    let mut controller = ChatController::new(client, config.cleanup_grace());
    if let Some(id) = conversation {
        controller.resume(id);
    }

    let outcome = controller.submit_message(message).await;
    // A reply under a new id supersedes the resumed conversation; let its delete land.
    controller.settle_cleanups().await;

    match outcome {
        SubmitOutcome::Replied(reply) => {
            println!("{reply}");
            if let Some(id) = controller.state().conversation_id() {
                eprintln!("conversation: {id}");
            }
            Ok(())
        }
        SubmitOutcome::Failed(error) => bail!(error),
        SubmitOutcome::Ignored => bail!("Message was not sent"),
    }
}
