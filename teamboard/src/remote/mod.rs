//! Remote data store boundary.
//!
//! Defines the [`RemoteStore`] trait the reconciler issues mutations
//! through. Concrete implementations include:
//! - [`memory::RecordingRemote`]: in-process store that records every call
//! - [`channel::ChannelRemote`]: hands encoded frames to a transport worker

pub mod channel;
pub mod memory;

use teamboard_proto::codec::CodecError;
use teamboard_proto::mutation::Scope;
use teamboard_proto::task::{Task, TaskId, TaskUpdate};

/// Errors that can occur during remote mutation calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote store rejected the call.
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// The connection to the remote store is gone.
    #[error("remote store disconnected")]
    Disconnected,

    /// The request could not be encoded for transport.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Async mutation interface of the remote data store.
///
/// Only the input and output shapes matter to this layer; the wire format
/// belongs to the implementation.
pub trait RemoteStore: Send + Sync {
    /// Apply creates, updates and removes as one atomic batch.
    fn apply_task_diff(
        &self,
        scope: &Scope,
        creates: &[Task],
        updates: &[TaskUpdate],
        removes: &[TaskId],
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Replace the scope's task order with `ordered_task_ids`.
    fn reorder_tasks(
        &self,
        scope: &Scope,
        ordered_task_ids: &[TaskId],
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;
}
