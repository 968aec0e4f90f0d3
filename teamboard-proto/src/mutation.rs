//! Remote mutation shapes.
//!
//! The remote store exposes two task mutations per scope: an atomic
//! "apply diff" batch carrying creates, updates and removes together, and a
//! separate reorder call carrying the full ordered id list.

use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::task::{Task, TaskId, TaskUpdate};

/// The boundary under which a task list is diffed and mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Every task visible to the workspace's members.
    Workspace {
        /// Slug of the bound workspace.
        workspace_slug: String,
    },
    /// The tasks of a single project.
    Project {
        /// Slug of the bound workspace.
        workspace_slug: String,
        /// Project the batch applies to.
        project_public_id: ProjectId,
    },
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Workspace { workspace_slug } => write!(f, "workspace:{workspace_slug}"),
            Self::Project {
                workspace_slug,
                project_public_id,
            } => write!(f, "project:{workspace_slug}/{project_public_id}"),
        }
    }
}

/// A single remote mutation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationRequest {
    /// Atomic batch of creates, updates and removes.
    ApplyDiff {
        /// Scope the batch applies to.
        scope: Scope,
        /// New rows, in next-list order.
        creates: Vec<Task>,
        /// Whole-row replacements.
        updates: Vec<TaskUpdate>,
        /// Ids to delete.
        removes: Vec<TaskId>,
    },
    /// Replace the scope's ordering with the given id sequence.
    Reorder {
        /// Scope being reordered.
        scope: Scope,
        /// Full next order.
        ordered_task_ids: Vec<TaskId>,
    },
}

impl MutationRequest {
    /// Scope of the call.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        match self {
            Self::ApplyDiff { scope, .. } | Self::Reorder { scope, .. } => scope,
        }
    }

    /// Short operation name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ApplyDiff { .. } => "apply_task_diff",
            Self::Reorder { .. } => "reorder_tasks",
        }
    }
}
