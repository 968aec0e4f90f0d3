//! Remote store that hands encoded mutation frames to a transport worker.
//!
//! The worker owning the real connection drains the receiver returned by
//! [`ChannelRemote::new`] and decodes each frame with
//! [`teamboard_proto::codec::decode`]. A send completes once the frame is
//! queued, not once the remote has committed it.

use tokio::sync::mpsc;

use teamboard_proto::codec;
use teamboard_proto::mutation::{MutationRequest, Scope};
use teamboard_proto::task::{Task, TaskId, TaskUpdate};

use super::{RemoteError, RemoteStore};

/// Channel-backed [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct ChannelRemote {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelRemote {
    /// Creates the remote and the frame receiver for the transport worker.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    async fn send(&self, request: &MutationRequest) -> Result<(), RemoteError> {
        let frame = codec::encode(request)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| RemoteError::Disconnected)
    }
}

impl RemoteStore for ChannelRemote {
    async fn apply_task_diff(
        &self,
        scope: &Scope,
        creates: &[Task],
        updates: &[TaskUpdate],
        removes: &[TaskId],
    ) -> Result<(), RemoteError> {
        self.send(&MutationRequest::ApplyDiff {
            scope: scope.clone(),
            creates: creates.to_vec(),
            updates: updates.to_vec(),
            removes: removes.to_vec(),
        })
        .await
    }

    async fn reorder_tasks(
        &self,
        scope: &Scope,
        ordered_task_ids: &[TaskId],
    ) -> Result<(), RemoteError> {
        self.send(&MutationRequest::Reorder {
            scope: scope.clone(),
            ordered_task_ids: ordered_task_ids.to_vec(),
        })
        .await
    }
}
