//! Effect handlers: the network calls behind `UiEffect`s.
//!
//! Each handler is a plain async function returning the event to feed back
//! into the reducer, or `None` when there is nothing to report.

use palaver_core::client::{ChatClient, ChatRequest};
use palaver_core::session::{SessionEvent, TaskId};
use tokio_util::sync::CancellationToken;

use crate::events::UiEvent;

/// Posts a message. A cancelled send reports nothing.
pub async fn send_message(
    client: ChatClient,
    task: TaskId,
    cancel: CancellationToken,
    request: ChatRequest,
) -> Option<UiEvent> {
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(task = task.0, "send cancelled");
            return None;
        }
        result = client.send_message(&request) => result,
    };
    if let Err(e) = &result {
        tracing::warn!(kind = %e.kind, error = %e, "send failed");
    }
    Some(UiEvent::Session(SessionEvent::SendCompleted { task, result }))
}

/// Deletes a conversation the user asked to clear.
pub async fn delete_conversation(
    client: ChatClient,
    task: TaskId,
    conversation_id: String,
) -> Option<UiEvent> {
    let result = client.delete_conversation(&conversation_id).await;
    if let Err(e) = &result {
        tracing::warn!(conversation_id = %conversation_id, error = %e, "delete failed");
    }
    Some(UiEvent::Session(SessionEvent::DeleteCompleted { task, result }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_cancelled_send_reports_nothing() {
        // Nothing listens here; the cancelled branch must win without a request.
        let client = ChatClient::new("http://127.0.0.1:9/api/chat", Some(Duration::from_secs(5)))
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ChatRequest {
            message: "hi".to_string(),
            conversation_id: None,
        };
        assert!(send_message(client, TaskId(1), cancel, request).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_reports_error() {
        let client = ChatClient::new("http://127.0.0.1:9/api/chat", Some(Duration::from_secs(5)))
            .unwrap();
        let event = delete_conversation(client, TaskId(2), "c-1".to_string()).await;
        let Some(UiEvent::Session(SessionEvent::DeleteCompleted { task, result })) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(task, TaskId(2));
        assert!(result.is_err());
    }
}
