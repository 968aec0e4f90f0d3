//! Task list reconciliation against the remote store.
//!
//! Turns a locally edited task list into the minimal mutation batch that
//! expresses the edit: [`normalize`] projects tasks into a comparable form,
//! [`diff`] partitions ids into creates, updates, removes and unchanged
//! rows, and [`Reconciler`] issues the batch and the optional reorder call.

pub mod diff;
pub mod normalize;
pub mod reconcile;

pub use diff::{TaskDiff, diff};
pub use normalize::{ComparableAssignee, ComparableTask, normalize};
pub use reconcile::{ReconcileOutcome, ReconcilePlan, Reconciler, ScopeTarget};

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur while reconciling a task list.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No workspace or project is bound for the requested scope.
    #[error("no active workspace or project is bound")]
    ScopeUnavailable,
    /// A remote create/update/remove/reorder call was rejected.
    #[error("remote {operation} failed: {source}")]
    RemoteMutationFailed {
        /// Which remote operation failed.
        operation: &'static str,
        /// Underlying remote error.
        source: RemoteError,
    },
}
