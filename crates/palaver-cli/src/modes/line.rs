//! Line mode: one message per stdin line, replies on stdout.

use std::io::{Write, stdout};

use anyhow::Result;
use palaver_core::client::ChatClient;
use palaver_core::config::Config;
use palaver_core::controller::{ChatController, SubmitOutcome};
use palaver_core::interrupt::{self, InterruptedError};
use tokio::io::{AsyncBufReadExt, BufReader};

/// What a single input line asks for.
#[derive(Debug, PartialEq, Eq)]
enum LineCommand<'a> {
    Blank,
    Quit,
    Delete,
    Message(&'a str),
}

impl<'a> LineCommand<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Blank,
            ":q" | "/quit" => Self::Quit,
            "/delete" => Self::Delete,
            _ => Self::Message(line),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run(config: &Config, client: ChatClient) -> Result<()> {
    let mut out = stdout();
    writeln!(out, "Palaver Chat")?;
    writeln!(out, "{}", config.title)?;
    writeln!(out, "{}", config.greeting)?;
    writeln!(out, ":q to quit")?;
    out.flush()?;

    let mut controller = ChatController::new(client, config.cleanup_grace());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result: Result<()> = loop {
        let step = async {
            match lines.next_line().await? {
                Some(line) => handle_line(&mut controller, &line, &mut out).await,
                None => Ok(Flow::Quit),
            }
        };
        let flow = tokio::select! {
            () = interrupt::wait_for_interrupt() => break Err(InterruptedError.into()),
            flow = step => flow,
        };
        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    tracing::info!("line mode finished, unloading session");
    controller.unload().await;

    if result.is_ok() {
        writeln!(out, "Goodbye!")?;
    }
    result
}

async fn handle_line(
    controller: &mut ChatController,
    line: &str,
    out: &mut impl Write,
) -> Result<Flow> {
    match LineCommand::parse(line) {
        LineCommand::Blank => {}
        LineCommand::Quit => return Ok(Flow::Quit),
        LineCommand::Delete => match controller.delete_conversation().await {
            Some(error) => writeln!(out, "Error: {error}")?,
            None => writeln!(out, "Chat cleared.")?,
        },
        LineCommand::Message(text) => match controller.submit_message(text).await {
            SubmitOutcome::Replied(reply) => writeln!(out, "Bot: {reply}")?,
            SubmitOutcome::Failed(error) => writeln!(out, "Error: {error}")?,
            SubmitOutcome::Ignored => {}
        },
    }
    out.flush()?;
    Ok(Flow::Continue)
}
