//! Reconciliation of an edited task list against the remote store.
//!
//! A reconciliation is planned synchronously (scope check, diff, reorder
//! policy) and executed asynchronously. Content changes go out as one
//! batched apply-diff call; reordering is a separate call issued only when
//! the scope permits it. Remote failures are logged and reported through
//! the [`Notifier`] and never propagate to the caller. Local state is not
//! rolled back on failure.
//!
//! Reconciliations for the same scope are not queued or coalesced here:
//! two overlapping edits each produce their own calls.

use std::sync::Arc;

use tokio::task::JoinHandle;

use teamboard_proto::mutation::{MutationRequest, Scope};
use teamboard_proto::page::PageStatus;
use teamboard_proto::project::ProjectId;
use teamboard_proto::task::Task;

use super::SyncError;
use super::diff::{TaskDiff, diff};
use crate::notify::Notifier;
use crate::remote::{RemoteError, RemoteStore};

/// Which list a reconciliation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTarget {
    /// The workspace-wide task list, with its current paging status.
    Workspace {
        /// Paging status of the workspace task query.
        status: PageStatus,
    },
    /// A single project's task list.
    Project {
        /// Project the list belongs to.
        project_id: ProjectId,
    },
}

impl ScopeTarget {
    /// Whether a reorder call may be issued for this target.
    ///
    /// The workspace list can only be reordered once every page is loaded,
    /// because the full order is unknown before that. Project lists are
    /// always fully loaded.
    #[must_use]
    pub const fn reorder_permitted(&self) -> bool {
        match self {
            Self::Workspace { status } => status.is_drained(),
            Self::Project { .. } => true,
        }
    }
}

/// Remote calls a reconciliation will issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Resolved scope for the calls.
    pub scope: Scope,
    /// The computed diff.
    pub diff: TaskDiff,
    /// Whether the reorder call is issued.
    pub reorder: bool,
}

impl ReconcilePlan {
    /// The requests this plan issues, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<MutationRequest> {
        let mut requests = Vec::with_capacity(2);
        if !self.diff.is_content_empty() {
            requests.push(MutationRequest::ApplyDiff {
                scope: self.scope.clone(),
                creates: self.diff.creates.clone(),
                updates: self.diff.updates.clone(),
                removes: self.diff.removes.clone(),
            });
        }
        if self.reorder {
            requests.push(MutationRequest::Reorder {
                scope: self.scope.clone(),
                ordered_task_ids: self.diff.next_order.clone(),
            });
        }
        requests
    }
}

/// Result of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every call succeeded.
    Committed {
        /// Number of remote calls made.
        calls: usize,
    },
    /// A call failed; later calls of the same plan were skipped.
    Failed {
        /// The operation that failed.
        operation: &'static str,
    },
}

/// Issues remote mutations for edited task lists.
pub struct Reconciler<R> {
    remote: Arc<R>,
    notifier: Notifier,
    workspace_slug: Option<String>,
}

impl<R: RemoteStore> Reconciler<R> {
    /// Creates an unbound reconciler.
    #[must_use]
    pub const fn new(remote: Arc<R>, notifier: Notifier) -> Self {
        Self {
            remote,
            notifier,
            workspace_slug: None,
        }
    }

    /// Binds (or unbinds) the active workspace.
    pub fn bind_workspace(&mut self, slug: Option<String>) {
        self.workspace_slug = slug.filter(|s| !s.is_empty());
    }

    /// The bound workspace slug.
    #[must_use]
    pub fn workspace_slug(&self) -> Option<&str> {
        self.workspace_slug.as_deref()
    }

    fn resolve_scope(&self, target: &ScopeTarget) -> Result<Scope, SyncError> {
        let workspace_slug = self
            .workspace_slug
            .clone()
            .ok_or(SyncError::ScopeUnavailable)?;
        match target {
            ScopeTarget::Workspace { .. } => Ok(Scope::Workspace { workspace_slug }),
            ScopeTarget::Project { project_id } if project_id.as_str().is_empty() => {
                Err(SyncError::ScopeUnavailable)
            }
            ScopeTarget::Project { project_id } => Ok(Scope::Project {
                workspace_slug,
                project_public_id: project_id.clone(),
            }),
        }
    }

    /// Plans the remote calls needed to move `previous` to `next`.
    ///
    /// Returns `Ok(None)` when nothing needs to be sent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeUnavailable`] if no workspace is bound or
    /// the project target has no id.
    pub fn plan(
        &self,
        target: &ScopeTarget,
        previous: &[Task],
        next: &[Task],
    ) -> Result<Option<ReconcilePlan>, SyncError> {
        let scope = self.resolve_scope(target)?;
        let diff = diff(previous, next);
        let reorder =
            target.reorder_permitted() && diff.order_changed && !diff.next_order.is_empty();

        if diff.is_content_empty() && !reorder {
            tracing::debug!(
                %scope,
                order_changed = diff.order_changed,
                "reconcile is a no-op"
            );
            return Ok(None);
        }

        tracing::debug!(
            %scope,
            creates = diff.creates.len(),
            updates = diff.updates.len(),
            removes = diff.removes.len(),
            reorder,
            "reconcile planned"
        );
        Ok(Some(ReconcilePlan {
            scope,
            diff,
            reorder,
        }))
    }

    /// Plans and executes a reconciliation, waiting for the remote calls.
    ///
    /// Remote failures are reported through the notifier and surface here
    /// only as [`ReconcileOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeUnavailable`] if no scope is bound.
    pub async fn reconcile(
        &self,
        target: &ScopeTarget,
        previous: &[Task],
        next: &[Task],
    ) -> Result<Option<ReconcileOutcome>, SyncError> {
        let Some(plan) = self.plan(target, previous, next)? else {
            return Ok(None);
        };
        Ok(Some(execute(&*self.remote, &self.notifier, plan).await))
    }
}

impl<R: RemoteStore + 'static> Reconciler<R> {
    /// Plans a reconciliation and spawns its execution without waiting.
    ///
    /// Returns `Ok(None)` for a no-op, in which case nothing is spawned.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeUnavailable`] immediately if no scope is bound.
    pub fn dispatch(
        &self,
        target: &ScopeTarget,
        previous: &[Task],
        next: &[Task],
    ) -> Result<Option<JoinHandle<ReconcileOutcome>>, SyncError> {
        let Some(plan) = self.plan(target, previous, next)? else {
            return Ok(None);
        };
        let remote = Arc::clone(&self.remote);
        let notifier = self.notifier.clone();
        Ok(Some(tokio::spawn(async move {
            execute(&*remote, &notifier, plan).await
        })))
    }
}

/// Issues the plan's calls: apply-diff first, then reorder.
async fn execute<R: RemoteStore>(
    remote: &R,
    notifier: &Notifier,
    plan: ReconcilePlan,
) -> ReconcileOutcome {
    let ReconcilePlan {
        scope,
        diff,
        reorder,
    } = plan;
    let mut calls = 0;

    if !diff.is_content_empty() {
        calls += 1;
        if let Err(source) = remote
            .apply_task_diff(&scope, &diff.creates, &diff.updates, &diff.removes)
            .await
        {
            return report_failure(notifier, &scope, "apply_task_diff", source);
        }
    }

    if reorder {
        calls += 1;
        if let Err(source) = remote.reorder_tasks(&scope, &diff.next_order).await {
            return report_failure(notifier, &scope, "reorder_tasks", source);
        }
    }

    tracing::debug!(%scope, calls, "reconcile committed");
    ReconcileOutcome::Committed { calls }
}

fn report_failure(
    notifier: &Notifier,
    scope: &Scope,
    operation: &'static str,
    source: RemoteError,
) -> ReconcileOutcome {
    let error = SyncError::RemoteMutationFailed { operation, source };
    tracing::warn!(%scope, error = %error, "task mutation failed, local state kept");
    notifier.error(format!("Couldn't save task changes: {error}"));
    ReconcileOutcome::Failed { operation }
}
