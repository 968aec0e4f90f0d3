//! Pending highlight requests.
//!
//! A pending highlight is created elsewhere in the UI (for example by
//! clicking a mention) and asks the client to switch to a project view,
//! scroll a task or file row into view, and flash it once the row exists.

use serde::{Deserialize, Serialize};

use crate::project::{FileTab, ProjectId};
use crate::task::TaskId;

/// What the highlight points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HighlightTarget {
    /// A task row.
    Task {
        /// Task to flash.
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
    /// A file row, optionally on a specific tab.
    File {
        /// File name to match.
        #[serde(rename = "fileName")]
        file_name: String,
        /// Tab to switch to first; when absent the first name match wins.
        #[serde(default, rename = "fileTab")]
        file_tab: Option<FileTab>,
    },
}

impl HighlightTarget {
    /// Human label used in user-facing messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Task { .. } => "Task",
            Self::File { .. } => "File",
        }
    }
}

/// A cross-view request to scroll to and flash a row once it is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHighlight {
    /// Project whose view owns the row.
    pub project_id: ProjectId,
    /// The row to flash.
    #[serde(flatten)]
    pub target: HighlightTarget,
}

impl PendingHighlight {
    /// Highlight a task in the given project.
    pub fn task(project_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            project_id: ProjectId::new(project_id),
            target: HighlightTarget::Task {
                task_id: TaskId::new(task_id),
            },
        }
    }

    /// Highlight a file in the given project, optionally on a specific tab.
    pub fn file(
        project_id: impl Into<String>,
        file_name: impl Into<String>,
        file_tab: Option<&str>,
    ) -> Self {
        Self {
            project_id: ProjectId::new(project_id),
            target: HighlightTarget::File {
                file_name: file_name.into(),
                file_tab: file_tab.map(FileTab::new),
            },
        }
    }
}
