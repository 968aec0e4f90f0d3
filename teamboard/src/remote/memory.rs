//! In-process remote store for tests and offline replays.
//!
//! Every call is recorded as a [`MutationRequest`], including calls that
//! fail because a failure was injected with [`RecordingRemote::set_failure`].

use parking_lot::Mutex;

use teamboard_proto::mutation::{MutationRequest, Scope};
use teamboard_proto::task::{Task, TaskId, TaskUpdate};

use super::{RemoteError, RemoteStore};

/// Remote store that records calls instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    requests: Mutex<Vec<MutationRequest>>,
    failure: Mutex<Option<String>>,
}

impl RecordingRemote {
    /// A store that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every call with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let remote = Self::new();
        remote.set_failure(Some(reason.into()));
        remote
    }

    /// Sets or clears the injected failure.
    pub fn set_failure(&self, reason: Option<String>) {
        *self.failure.lock() = reason;
    }

    /// Returns a copy of every recorded call, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<MutationRequest> {
        self.requests.lock().clone()
    }

    /// Drains the recorded calls.
    pub fn take_requests(&self) -> Vec<MutationRequest> {
        std::mem::take(&mut *self.requests.lock())
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn record(&self, request: MutationRequest) -> Result<(), RemoteError> {
        tracing::debug!(kind = request.kind(), scope = %request.scope(), "remote call recorded");
        self.requests.lock().push(request);
        match self.failure.lock().as_ref() {
            Some(reason) => Err(RemoteError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

impl RemoteStore for RecordingRemote {
    async fn apply_task_diff(
        &self,
        scope: &Scope,
        creates: &[Task],
        updates: &[TaskUpdate],
        removes: &[TaskId],
    ) -> Result<(), RemoteError> {
        self.record(MutationRequest::ApplyDiff {
            scope: scope.clone(),
            creates: creates.to_vec(),
            updates: updates.to_vec(),
            removes: removes.to_vec(),
        })
    }

    async fn reorder_tasks(
        &self,
        scope: &Scope,
        ordered_task_ids: &[TaskId],
    ) -> Result<(), RemoteError> {
        self.record(MutationRequest::Reorder {
            scope: scope.clone(),
            ordered_task_ids: ordered_task_ids.to_vec(),
        })
    }
}
