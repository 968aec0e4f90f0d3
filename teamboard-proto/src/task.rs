//! Task model shared between the workspace client and the remote store.
//!
//! A [`Task`] is owned by whichever scope (workspace or project) it was
//! fetched under. Its identity is the [`TaskId`], which stays stable across
//! edits. Server-created tasks carry server ids; rows created locally before
//! the first round-trip get a client-minted id from [`TaskId::generate`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project::ProjectId;

/// Unique identifier for a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing (usually server-assigned) identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh time-ordered client-side identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns `true` for a row that has not been given an id yet.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The member a task is assigned to.
///
/// `user_id` is absent on tasks created before assignee ids were tracked;
/// those tasks are identified by their display fields alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    /// Member id, when known.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar URL or initials token.
    #[serde(default)]
    pub avatar: String,
}

/// A task row as the client edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable task identity. Empty for a row not yet given one.
    #[serde(default)]
    pub id: TaskId,
    /// Task title as typed by the user.
    #[serde(default)]
    pub title: String,
    /// Who the task is assigned to.
    #[serde(default)]
    pub assignee: Assignee,
    /// Due date in milliseconds since the Unix epoch.
    #[serde(default)]
    pub due_date_epoch_ms: Option<i64>,
    /// Whether the task has been checked off.
    #[serde(default)]
    pub completed: bool,
    /// Owning project, for tasks that belong to one.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl Task {
    /// Creates a task with the given id and title and every other field empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(id),
            title: title.into(),
            assignee: Assignee::default(),
            due_date_epoch_ms: None,
            completed: false,
            project_id: None,
        }
    }
}

/// Whole-row update for an existing task.
///
/// The remote update operation replaces every field, so this carries the
/// full next state rather than a field-level patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// Which task is being replaced.
    pub task_id: TaskId,
    /// Next title.
    pub title: String,
    /// Next assignee.
    pub assignee: Assignee,
    /// Next due date.
    pub due_date_epoch_ms: Option<i64>,
    /// Next completion state.
    pub completed: bool,
    /// Next owning project.
    pub project_id: Option<ProjectId>,
}

impl From<&Task> for TaskUpdate {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            assignee: task.assignee.clone(),
            due_date_epoch_ms: task.due_date_epoch_ms,
            completed: task.completed,
            project_id: task.project_id.clone(),
        }
    }
}
