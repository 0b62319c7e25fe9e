//! Delete command handler.

use anyhow::{Context, Result};
use palaver_core::client::ChatClient;

pub async fn run(client: &ChatClient, id: &str) -> Result<()> {
    client
        .delete_conversation(id)
        .await
        .with_context(|| format!("delete conversation {id}"))?;
    println!("Deleted conversation {id}");
    Ok(())
}
