//! Projects, project files, and the workspace bootstrap snapshot.

use serde::{Deserialize, Serialize};

/// Public identifier of a project, as it appears in URLs and batch payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wraps a project public id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A project inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Public id.
    pub id: ProjectId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Archived projects live under the archive views.
    #[serde(default)]
    pub archived: bool,
}

impl Project {
    /// Creates an active (non-archived) project.
    pub fn active(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
            archived: false,
        }
    }

    /// Creates an archived project.
    pub fn archived(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            archived: true,
            ..Self::active(id, name)
        }
    }
}

/// A file-tab inside a project view (e.g. "documents", "designs").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTab(String);

impl FileTab {
    /// Wraps a tab name.
    pub fn new(tab: impl Into<String>) -> Self {
        Self(tab.into())
    }

    /// Returns the tab name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file listed under a project tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// File name as shown in the list.
    pub name: String,
    /// Which tab the file is listed under.
    pub tab: FileTab,
}

impl ProjectFile {
    /// Creates a file entry.
    pub fn new(name: impl Into<String>, tab: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tab: FileTab::new(tab),
        }
    }
}

/// The signed-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    /// Member id.
    pub user_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Snapshot returned by the bootstrap fetch.
///
/// Seeds the initial scope and lets the client notice a server-side change
/// of the active workspace slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    /// Slug of the active workspace, if the viewer has one.
    pub workspace_slug: Option<String>,
    /// The signed-in member.
    pub viewer: Viewer,
}
