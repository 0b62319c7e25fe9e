//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer decides when to send, delete or cancel; the runtime only spawns
//! the requests and calls `cancel()` on the provided tokens.

use palaver_core::client::ChatRequest;
use palaver_core::session::TaskId;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Post a message; the result comes back as `SessionEvent::SendCompleted`.
    SendMessage {
        task: TaskId,
        cancel: CancellationToken,
        request: ChatRequest,
    },

    /// Delete a conversation; the result comes back as `SessionEvent::DeleteCompleted`.
    DeleteConversation {
        task: TaskId,
        conversation_id: String,
    },

    /// Fire-and-forget delete of a conversation that is no longer shown.
    CleanupConversation { conversation_id: String },

    /// Cancel an in-flight request.
    CancelTask { token: CancellationToken },
}
