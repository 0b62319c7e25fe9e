//! Conversation session state machine.
//!
//! `update` is the single place `SessionState` changes. It never performs
//! I/O: network calls are described as `SessionEffect`s and executed by a
//! runtime (the TUI event loop or `ChatController`), whose outcomes come back
//! as `SessionEvent`s.
//!
//! ```text
//! Idle ──submit──▶ Sending ──ok──▶ Idle
//!                     │
//!                     └──fail──▶ ErrorShown ──submit──▶ Sending
//! any ──delete──▶ Idle (cleared)
//! ```

pub mod task;

pub use task::{TaskId, TaskSeq, TaskState};
use tokio_util::sync::CancellationToken;

use crate::client::{ChatReply, ChatRequest, ServiceResult};

/// Prefix of the error shown after a failed send; the cause follows in parentheses.
pub const SEND_ERROR_PREFIX: &str =
    "An error occurred while fetching the response. Please try again.";

/// Error shown after a failed delete.
pub const DELETE_ERROR: &str = "Failed to delete conversation. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Whether a user message reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

/// One transcript entry. Text and sender are fixed once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    sender: Sender,
    status: DeliveryStatus,
}

impl Message {
    fn user(text: String) -> Self {
        Self {
            text,
            sender: Sender::User,
            status: DeliveryStatus::Pending,
        }
    }

    fn bot(text: String) -> Self {
        Self {
            text,
            sender: Sender::Bot,
            status: DeliveryStatus::Delivered,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }
}

/// Derived controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    ErrorShown,
}

/// Server-side outcome of the most recent conversation delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupStatus {
    #[default]
    NotRequested,
    Pending,
    Acknowledged,
    Failed,
}

#[derive(Debug, Default)]
pub struct SessionState {
    messages: Vec<Message>,
    conversation_id: Option<String>,
    error: Option<String>,
    cleanup: CleanupStatus,
    /// Index into `messages` of the user message awaiting a reply.
    pending: Option<usize>,
    seq: TaskSeq,
    send: TaskState,
    delete: TaskState,

    /// Uncommitted input text. Front ends edit it directly.
    pub draft: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cleanup(&self) -> CleanupStatus {
        self.cleanup
    }

    /// True exactly while a send is in flight.
    pub fn is_loading(&self) -> bool {
        self.send.is_running()
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Sending
        } else if self.error.is_some() {
            Phase::ErrorShown
        } else {
            Phase::Idle
        }
    }

    /// Returns whether `text` would be accepted by a submit right now.
    pub fn can_submit(&self, text: &str) -> bool {
        !self.is_loading() && !text.trim().is_empty()
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    /// User submitted `text`.
    Submit { text: String },
    /// A send finished.
    SendCompleted {
        task: TaskId,
        result: ServiceResult<ChatReply>,
    },
    /// User asked to clear the chat.
    DeleteRequested,
    /// A delete finished.
    DeleteCompleted {
        task: TaskId,
        result: ServiceResult<()>,
    },
    /// The session is going away (quit or termination signal).
    Unload,
    /// Continue an existing conversation. Ignored if one is already set.
    Resume { conversation_id: String },
}

/// Work for the runtime. Completion of `SendMessage` and `DeleteConversation`
/// must be reported back with the same task id.
#[derive(Debug)]
pub enum SessionEffect {
    SendMessage {
        task: TaskId,
        cancel: CancellationToken,
        request: ChatRequest,
    },
    DeleteConversation {
        task: TaskId,
        conversation_id: String,
    },
    /// Fire-and-forget delete; the outcome is never reported.
    CleanupConversation { conversation_id: String },
    CancelSend { token: CancellationToken },
    /// The message list changed; bring the newest entry into view.
    ScrollToLatest,
}

/// Applies an event to the session and returns the effects to run.
pub fn update(state: &mut SessionState, event: SessionEvent) -> Vec<SessionEffect> {
    match event {
        SessionEvent::Submit { text } => handle_submit(state, text),
        SessionEvent::SendCompleted { task, result } => handle_send_completed(state, task, result),
        SessionEvent::DeleteRequested => handle_delete_requested(state),
        SessionEvent::DeleteCompleted { task, result } => {
            handle_delete_completed(state, task, result)
        }
        SessionEvent::Unload => handle_unload(state),
        SessionEvent::Resume { conversation_id } => {
            if state.conversation_id.is_none()
                && !state.is_loading()
                && !conversation_id.trim().is_empty()
            {
                state.conversation_id = Some(conversation_id);
            }
            vec![]
        }
    }
}

fn handle_submit(state: &mut SessionState, text: String) -> Vec<SessionEffect> {
    if state.is_loading() {
        tracing::debug!("submit ignored while a send is in flight");
        return vec![];
    }
    if text.trim().is_empty() {
        return vec![];
    }

    state.error = None;
    state.messages.push(Message::user(text.clone()));
    state.pending = Some(state.messages.len() - 1);

    let task = state.seq.next_id();
    let cancel = CancellationToken::new();
    state.send.start(task, Some(cancel.clone()));

    vec![
        SessionEffect::SendMessage {
            task,
            cancel,
            request: ChatRequest {
                message: text,
                conversation_id: state.conversation_id.clone(),
            },
        },
        SessionEffect::ScrollToLatest,
    ]
}

fn handle_send_completed(
    state: &mut SessionState,
    task: TaskId,
    result: ServiceResult<ChatReply>,
) -> Vec<SessionEffect> {
    if !state.send.finish_if_active(task) {
        tracing::debug!(task = task.0, "discarding stale send result");
        return vec![];
    }

    let delivered = result.is_ok();
    if let Some(message) = state.pending.take().and_then(|i| state.messages.get_mut(i)) {
        message.status = if delivered {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Failed
        };
    }
    state.draft.clear();

    let mut effects = Vec::new();
    match result {
        Ok(reply) => {
            state.messages.push(Message::bot(reply.reply));
            if !reply.conversation_id.is_empty() {
                let previous = state.conversation_id.replace(reply.conversation_id);
                if let Some(previous) = previous
                    && state.conversation_id.as_deref() != Some(previous.as_str())
                {
                    tracing::info!(conversation_id = %previous, "conversation superseded");
                    effects.push(SessionEffect::CleanupConversation {
                        conversation_id: previous,
                    });
                }
            }
        }
        Err(e) => {
            tracing::warn!(kind = %e.kind, error = %e, "send failed");
            state.error = Some(format!("{SEND_ERROR_PREFIX} ({e})"));
        }
    }

    effects.push(SessionEffect::ScrollToLatest);
    effects
}

fn handle_delete_requested(state: &mut SessionState) -> Vec<SessionEffect> {
    let mut effects = Vec::new();

    if let Some(token) = state.send.abandon() {
        effects.push(SessionEffect::CancelSend { token });
        state.draft.clear();
    }

    state.messages.clear();
    state.pending = None;
    state.error = None;

    if let Some(conversation_id) = state.conversation_id.take() {
        let task = state.seq.next_id();
        state.delete.start(task, None);
        state.cleanup = CleanupStatus::Pending;
        effects.push(SessionEffect::DeleteConversation {
            task,
            conversation_id,
        });
    }

    effects.push(SessionEffect::ScrollToLatest);
    effects
}

fn handle_delete_completed(
    state: &mut SessionState,
    task: TaskId,
    result: ServiceResult<()>,
) -> Vec<SessionEffect> {
    if !state.delete.finish_if_active(task) {
        tracing::debug!(task = task.0, "discarding superseded delete result");
        return vec![];
    }

    match result {
        Ok(()) => state.cleanup = CleanupStatus::Acknowledged,
        Err(e) => {
            tracing::warn!(kind = %e.kind, error = %e, "conversation delete failed");
            state.cleanup = CleanupStatus::Failed;
            state.error = Some(DELETE_ERROR.to_string());
        }
    }
    vec![]
}

fn handle_unload(state: &mut SessionState) -> Vec<SessionEffect> {
    let mut effects = Vec::new();

    if let Some(token) = state.send.abandon() {
        effects.push(SessionEffect::CancelSend { token });
    }
    state.pending = None;
    state.messages.clear();

    if let Some(conversation_id) = state.conversation_id.take() {
        effects.push(SessionEffect::CleanupConversation { conversation_id });
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ServiceError, ServiceErrorKind};

    fn reply(text: &str, id: &str) -> ServiceResult<ChatReply> {
        Ok(ChatReply {
            reply: text.to_string(),
            conversation_id: id.to_string(),
        })
    }

    fn failure(message: &str) -> ServiceResult<ChatReply> {
        Err(ServiceError::new(ServiceErrorKind::Timeout, message))
    }

    /// Submits `text` and returns the task id of the resulting send.
    fn submit(state: &mut SessionState, text: &str) -> TaskId {
        let effects = update(
            state,
            SessionEvent::Submit {
                text: text.to_string(),
            },
        );
        match effects.first() {
            Some(SessionEffect::SendMessage { task, .. }) => *task,
            other => panic!("expected SendMessage, got {other:?}"),
        }
    }

    fn state_with_conversation(id: &str) -> SessionState {
        let mut state = SessionState::new();
        let task = submit(&mut state, "hello");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("hi", id),
            },
        );
        state
    }

    fn snapshot(state: &SessionState) -> (Vec<Message>, Option<String>, bool) {
        (
            state.messages.clone(),
            state.error.clone(),
            state.is_loading(),
        )
    }

    #[test]
    fn test_submit_appends_user_message_before_response() {
        let mut state = SessionState::new();
        let effects = update(
            &mut state,
            SessionEvent::Submit {
                text: "Hello".to_string(),
            },
        );

        assert_eq!(state.messages().len(), 1);
        let message = &state.messages()[0];
        assert_eq!(message.text(), "Hello");
        assert_eq!(message.sender(), Sender::User);
        assert_eq!(message.status(), DeliveryStatus::Pending);
        assert!(state.is_loading());
        assert_eq!(state.phase(), Phase::Sending);

        assert_eq!(effects.len(), 2);
        match &effects[0] {
            SessionEffect::SendMessage { request, .. } => {
                assert_eq!(request.message, "Hello");
                assert_eq!(request.conversation_id, None);
            }
            other => panic!("unexpected effect {other:?}"),
        }
        assert!(matches!(effects[1], SessionEffect::ScrollToLatest));
    }

    #[test]
    fn test_blank_submit_is_noop() {
        for text in ["", "   ", "\t\n"] {
            let mut state = SessionState::new();
            state.error = Some("previous".to_string());
            let before = snapshot(&state);

            let effects = update(
                &mut state,
                SessionEvent::Submit {
                    text: text.to_string(),
                },
            );

            assert!(effects.is_empty());
            assert_eq!(snapshot(&state), before);
        }
    }

    #[test]
    fn test_successful_send_appends_bot_reply() {
        let mut state = SessionState::new();
        state.draft = "Hello".to_string();
        let task = submit(&mut state, "Hello");

        let effects = update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("R", "C"),
            },
        );

        let messages = state.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), "Hello");
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[0].status(), DeliveryStatus::Delivered);
        assert_eq!(messages[1].text(), "R");
        assert_eq!(messages[1].sender(), Sender::Bot);
        assert_eq!(state.conversation_id(), Some("C"));
        assert!(!state.is_loading());
        assert_eq!(state.error(), None);
        assert!(state.draft.is_empty());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(matches!(effects.as_slice(), [SessionEffect::ScrollToLatest]));
    }

    #[test]
    fn test_failed_send_keeps_user_message_and_sets_error() {
        let mut state = SessionState::new();
        state.draft = "Hello".to_string();
        let task = submit(&mut state, "Hello");

        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: failure("timeout"),
            },
        );

        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].sender(), Sender::User);
        assert_eq!(state.messages()[0].status(), DeliveryStatus::Failed);
        assert!(!state.is_loading());
        let error = state.error().unwrap();
        assert!(error.contains("timeout"), "got: {error}");
        assert!(error.starts_with(SEND_ERROR_PREFIX));
        assert_eq!(state.conversation_id(), None);
        assert!(state.draft.is_empty());
        assert_eq!(state.phase(), Phase::ErrorShown);
    }

    #[test]
    fn test_failed_send_does_not_touch_conversation_id() {
        let mut state = state_with_conversation("abc");
        let task = submit(&mut state, "again");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: failure("boom"),
            },
        );
        assert_eq!(state.conversation_id(), Some("abc"));
    }

    #[test]
    fn test_submit_after_error_clears_error() {
        let mut state = SessionState::new();
        let task = submit(&mut state, "one");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: failure("boom"),
            },
        );
        assert_eq!(state.phase(), Phase::ErrorShown);

        submit(&mut state, "two");
        assert_eq!(state.error(), None);
        assert_eq!(state.phase(), Phase::Sending);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_submit_while_loading_is_ignored() {
        let mut state = SessionState::new();
        submit(&mut state, "first");
        let before = snapshot(&state);

        let effects = update(
            &mut state,
            SessionEvent::Submit {
                text: "second".to_string(),
            },
        );

        assert!(effects.is_empty());
        assert_eq!(snapshot(&state), before);
        assert!(!state.can_submit("second"));
    }

    #[test]
    fn test_send_includes_current_conversation_id() {
        let mut state = state_with_conversation("abc");
        let effects = update(
            &mut state,
            SessionEvent::Submit {
                text: "next".to_string(),
            },
        );
        match &effects[0] {
            SessionEffect::SendMessage { request, .. } => {
                assert_eq!(request.conversation_id.as_deref(), Some("abc"));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_delete_with_conversation_resets_and_issues_delete() {
        let mut state = state_with_conversation("abc");
        let effects = update(&mut state, SessionEvent::DeleteRequested);

        assert!(state.messages().is_empty());
        assert_eq!(state.conversation_id(), None);
        assert_eq!(state.error(), None);
        assert_eq!(state.cleanup(), CleanupStatus::Pending);

        let deletes: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                SessionEffect::DeleteConversation {
                    conversation_id, ..
                } => Some(conversation_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(deletes, vec!["abc"]);
    }

    #[test]
    fn test_delete_failure_keeps_state_cleared() {
        let mut state = state_with_conversation("abc");
        let effects = update(&mut state, SessionEvent::DeleteRequested);
        let task = match &effects[0] {
            SessionEffect::DeleteConversation { task, .. } => *task,
            other => panic!("unexpected effect {other:?}"),
        };

        update(
            &mut state,
            SessionEvent::DeleteCompleted {
                task,
                result: Err(ServiceError::http_status(500, "")),
            },
        );

        assert!(state.messages().is_empty());
        assert_eq!(state.conversation_id(), None);
        assert_eq!(state.error(), Some(DELETE_ERROR));
        assert_eq!(state.cleanup(), CleanupStatus::Failed);
    }

    #[test]
    fn test_delete_success_acknowledges_cleanup() {
        let mut state = state_with_conversation("abc");
        let effects = update(&mut state, SessionEvent::DeleteRequested);
        let task = match &effects[0] {
            SessionEffect::DeleteConversation { task, .. } => *task,
            other => panic!("unexpected effect {other:?}"),
        };

        update(
            &mut state,
            SessionEvent::DeleteCompleted {
                task,
                result: Ok(()),
            },
        );

        assert_eq!(state.cleanup(), CleanupStatus::Acknowledged);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_delete_without_conversation_makes_no_call() {
        let mut state = SessionState::new();
        let task = submit(&mut state, "hello");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: failure("down"),
            },
        );
        assert_eq!(state.conversation_id(), None);

        let effects = update(&mut state, SessionEvent::DeleteRequested);

        assert!(state.messages().is_empty());
        assert_eq!(state.error(), None);
        assert_eq!(state.cleanup(), CleanupStatus::NotRequested);
        assert!(effects.iter().all(|e| matches!(e, SessionEffect::ScrollToLatest)));
    }

    #[test]
    fn test_delete_while_sending_cancels_and_discards_late_result() {
        let mut state = state_with_conversation("abc");
        state.draft = "pending text".to_string();
        let effects = update(
            &mut state,
            SessionEvent::Submit {
                text: "pending text".to_string(),
            },
        );
        let (task, cancel) = match &effects[0] {
            SessionEffect::SendMessage { task, cancel, .. } => (*task, cancel.clone()),
            other => panic!("unexpected effect {other:?}"),
        };

        let effects = update(&mut state, SessionEvent::DeleteRequested);
        assert!(!state.is_loading());
        assert!(state.draft.is_empty());
        let token = effects
            .iter()
            .find_map(|e| match e {
                SessionEffect::CancelSend { token } => Some(token.clone()),
                _ => None,
            })
            .unwrap();
        token.cancel();
        assert!(cancel.is_cancelled());

        let late = update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("late", "zzz"),
            },
        );
        assert!(late.is_empty());
        assert!(state.messages().is_empty());
        assert_eq!(state.conversation_id(), None);
    }

    #[test]
    fn test_older_delete_failure_is_not_surfaced() {
        let mut state = state_with_conversation("first");
        let effects = update(&mut state, SessionEvent::DeleteRequested);
        let first_delete = match &effects[0] {
            SessionEffect::DeleteConversation { task, .. } => *task,
            other => panic!("unexpected effect {other:?}"),
        };

        let task = submit(&mut state, "again");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("ok", "second"),
            },
        );
        update(&mut state, SessionEvent::DeleteRequested);

        update(
            &mut state,
            SessionEvent::DeleteCompleted {
                task: first_delete,
                result: Err(ServiceError::http_status(500, "")),
            },
        );
        assert_eq!(state.error(), None);
        assert_eq!(state.cleanup(), CleanupStatus::Pending);
    }

    #[test]
    fn test_unload_with_conversation_emits_one_cleanup() {
        let mut state = state_with_conversation("abc");
        let effects = update(&mut state, SessionEvent::Unload);

        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            SessionEffect::CleanupConversation { conversation_id } if conversation_id == "abc"
        ));

        // A second unload has nothing left to clean up.
        assert!(update(&mut state, SessionEvent::Unload).is_empty());
    }

    #[test]
    fn test_unload_without_conversation_emits_nothing() {
        let mut state = SessionState::new();
        assert!(update(&mut state, SessionEvent::Unload).is_empty());
    }

    #[test]
    fn test_rotation_cleans_up_superseded_conversation() {
        let mut state = state_with_conversation("old");
        let task = submit(&mut state, "next");

        let effects = update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("hi", "new"),
            },
        );

        assert_eq!(state.conversation_id(), Some("new"));
        assert!(effects.iter().any(|e| matches!(
            e,
            SessionEffect::CleanupConversation { conversation_id } if conversation_id == "old"
        )));
    }

    #[test]
    fn test_same_conversation_id_is_not_cleaned_up() {
        let mut state = state_with_conversation("abc");
        let task = submit(&mut state, "next");

        let effects = update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("hi", "abc"),
            },
        );

        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, SessionEffect::CleanupConversation { .. }))
        );
    }

    #[test]
    fn test_resume_seeds_conversation_once() {
        let mut state = SessionState::new();
        update(
            &mut state,
            SessionEvent::Resume {
                conversation_id: "abc".to_string(),
            },
        );
        assert_eq!(state.conversation_id(), Some("abc"));

        update(
            &mut state,
            SessionEvent::Resume {
                conversation_id: "other".to_string(),
            },
        );
        assert_eq!(state.conversation_id(), Some("abc"));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut state = SessionState::new();
        let task = submit(&mut state, "Hello");
        update(
            &mut state,
            SessionEvent::SendCompleted {
                task,
                result: reply("Hi there", "abc123"),
            },
        );

        let texts: Vec<_> = state
            .messages()
            .iter()
            .map(|m| (m.text(), m.sender()))
            .collect();
        assert_eq!(
            texts,
            vec![("Hello", Sender::User), ("Hi there", Sender::Bot)]
        );
        assert_eq!(state.conversation_id(), Some("abc123"));

        let effects = update(&mut state, SessionEvent::DeleteRequested);
        let task = match &effects[0] {
            SessionEffect::DeleteConversation {
                task,
                conversation_id,
            } => {
                assert_eq!(conversation_id, "abc123");
                *task
            }
            other => panic!("unexpected effect {other:?}"),
        };
        update(
            &mut state,
            SessionEvent::DeleteCompleted {
                task,
                result: Ok(()),
            },
        );

        assert!(state.messages().is_empty());
        assert_eq!(state.conversation_id(), None);
    }
}
