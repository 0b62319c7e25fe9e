//! Task identity for the session's async network calls.
//!
//! Every send or delete gets a `TaskId` from the session's `TaskSeq`. A task's
//! completion is only applied while it is still the active task in its slot,
//! so results that arrive after the slot moved on are dropped.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// One in-flight slot (stored in `SessionState`, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    active: Option<TaskId>,
    cancel: Option<CancellationToken>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<TaskId> {
        self.active
    }

    pub fn start(&mut self, id: TaskId, cancel: Option<CancellationToken>) {
        self.active = Some(id);
        self.cancel = cancel;
    }

    /// Clears the slot if `id` is the active task. Returns whether it was.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
            self.cancel = None;
        }
        ok
    }

    /// Abandons the active task, handing back its cancellation token.
    pub fn abandon(&mut self) -> Option<CancellationToken> {
        self.active = None;
        self.cancel.take()
    }
}
