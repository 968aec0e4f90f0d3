//! Comparable projection of tasks.
//!
//! Two tasks normalize equal iff they are the same for sync purposes.
//! Optional text is coerced so that a missing value and an empty string
//! compare equal, and titles are compared trimmed.

use teamboard_proto::project::ProjectId;
use teamboard_proto::task::{Assignee, Task, TaskId};

/// How an assignee is identified for comparison.
///
/// Tasks created before assignee ids were tracked carry only display
/// fields; those compare byte-exact on `(name, avatar)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComparableAssignee {
    /// Nobody is assigned.
    Unassigned,
    /// Identified by member id.
    User(String),
    /// Legacy assignee without an id.
    Display {
        /// Display name, untrimmed.
        name: String,
        /// Avatar, untrimmed.
        avatar: String,
    },
}

/// Normalized task used only for equality testing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparableTask {
    /// Task identity.
    pub id: TaskId,
    /// Trimmed title.
    pub title: String,
    /// Assignee identity.
    pub assignee: ComparableAssignee,
    /// Due date.
    pub due_date_epoch_ms: Option<i64>,
    /// Completion state.
    pub completed: bool,
    /// Owning project id, `None` when absent or empty.
    pub project_id: Option<String>,
}

/// Projects a task into its comparable form.
#[must_use]
pub fn normalize(task: &Task) -> ComparableTask {
    ComparableTask {
        id: task.id.clone(),
        title: task.title.trim().to_string(),
        assignee: normalize_assignee(&task.assignee),
        due_date_epoch_ms: task.due_date_epoch_ms,
        completed: task.completed,
        project_id: non_empty(task.project_id.as_ref().map(ProjectId::as_str)),
    }
}

fn normalize_assignee(assignee: &Assignee) -> ComparableAssignee {
    if let Some(user_id) = non_empty(assignee.user_id.as_deref()) {
        return ComparableAssignee::User(user_id);
    }
    if assignee.name.is_empty() && assignee.avatar.is_empty() {
        ComparableAssignee::Unassigned
    } else {
        ComparableAssignee::Display {
            name: assignee.name.clone(),
            avatar: assignee.avatar.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
