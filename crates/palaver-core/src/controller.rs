//! Sequential driver for the session reducer.
//!
//! `ChatController` runs each `SessionEffect` as soon as the reducer emits
//! it, awaiting sends and deletes in place. Cleanup deletes are spawned and
//! only waited on (briefly) by `unload`. Used by line mode and one-shot
//! commands; the TUI runs the same effects concurrently from its event loop.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::ChatClient;
use crate::session::{self, Message, SessionEffect, SessionEvent, SessionState};

/// Result of a single submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or a send was already in flight.
    Ignored,
    /// The service replied with this text.
    Replied(String),
    /// The send failed; carries the displayed error.
    Failed(String),
}

pub struct ChatController {
    state: SessionState,
    client: ChatClient,
    cleanup_grace: Duration,
    cleanups: Vec<JoinHandle<()>>,
}

impl ChatController {
    pub fn new(client: ChatClient, cleanup_grace: Duration) -> Self {
        Self {
            state: SessionState::new(),
            client,
            cleanup_grace,
            cleanups: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    /// Seeds the conversation id, e.g. to continue a conversation started elsewhere.
    pub fn resume(&mut self, conversation_id: &str) {
        let effects = session::update(
            &mut self.state,
            SessionEvent::Resume {
                conversation_id: conversation_id.to_string(),
            },
        );
        debug_assert!(effects.is_empty());
    }

    /// Sends `text` and waits for the outcome.
    pub async fn submit_message(&mut self, text: &str) -> SubmitOutcome {
        let before = self.state.messages().len();
        self.state.draft = text.to_string();
        self.dispatch(SessionEvent::Submit {
            text: text.to_string(),
        })
        .await;

        if self.state.messages().len() == before {
            return SubmitOutcome::Ignored;
        }
        if let Some(error) = self.state.error() {
            return SubmitOutcome::Failed(error.to_string());
        }
        match self.state.messages().last() {
            Some(message) if message.sender() == session::Sender::Bot => {
                SubmitOutcome::Replied(message.text().to_string())
            }
            _ => SubmitOutcome::Ignored,
        }
    }

    /// Clears the chat and deletes the conversation on the service.
    ///
    /// Returns the error shown to the user, if the delete failed.
    pub async fn delete_conversation(&mut self) -> Option<String> {
        self.dispatch(SessionEvent::DeleteRequested).await;
        self.state.error().map(str::to_string)
    }

    /// Runs the unload cleanup, allowing pending cleanups at most the grace period.
    pub async fn unload(&mut self) {
        self.dispatch(SessionEvent::Unload).await;
        self.settle_cleanups().await;
    }

    /// Waits (at most the grace period) for cleanups of superseded conversations.
    ///
    /// The current conversation is left alone so it can be resumed later.
    pub async fn settle_cleanups(&mut self) {
        let handles = std::mem::take(&mut self.cleanups);
        await_cleanups(handles, self.cleanup_grace).await;
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let mut queue: VecDeque<SessionEffect> = session::update(&mut self.state, event).into();

        while let Some(effect) = queue.pop_front() {
            let Some(event) = self.execute(effect).await else {
                continue;
            };
            queue.extend(session::update(&mut self.state, event));
        }
    }

    async fn execute(&mut self, effect: SessionEffect) -> Option<SessionEvent> {
        match effect {
            SessionEffect::SendMessage {
                task,
                cancel,
                request,
            } => {
                let result = tokio::select! {
                    () = cancel.cancelled() => return None,
                    result = self.client.send_message(&request) => result,
                };
                Some(SessionEvent::SendCompleted { task, result })
            }
            SessionEffect::DeleteConversation {
                task,
                conversation_id,
            } => {
                let result = self.client.delete_conversation(&conversation_id).await;
                Some(SessionEvent::DeleteCompleted { task, result })
            }
            SessionEffect::CleanupConversation { conversation_id } => {
                self.cleanups.retain(|handle| !handle.is_finished());
                self.cleanups
                    .push(spawn_cleanup(self.client.clone(), conversation_id));
                None
            }
            SessionEffect::CancelSend { token } => {
                token.cancel();
                None
            }
            SessionEffect::ScrollToLatest => None,
        }
    }
}

/// Spawns a fire-and-forget conversation delete. Failures are only logged.
pub fn spawn_cleanup(client: ChatClient, conversation_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client.delete_conversation(&conversation_id).await {
            Ok(()) => tracing::debug!(conversation_id = %conversation_id, "conversation cleaned up"),
            Err(e) => {
                tracing::debug!(conversation_id = %conversation_id, error = %e, "cleanup failed");
            }
        }
    })
}

/// Waits for spawned cleanups, giving up after `grace`.
pub async fn await_cleanups(handles: Vec<JoinHandle<()>>, grace: Duration) {
    if handles.is_empty() {
        return;
    }
    let wait = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(grace, wait).await.is_err() {
        tracing::debug!(
            grace_ms = grace.as_millis(),
            "cleanup still in flight at exit"
        );
    }
}
