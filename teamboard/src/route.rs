//! Route parsing and validation against partially loaded project data.
//!
//! The validator is re-run on every location or data change. For project
//! routes it distinguishes "not loaded yet" from "genuinely absent": while
//! the project list is still loading its first page and the target is not
//! in the cached snapshot, the route stays in [`RouteState::Loading`] with
//! no redirect and no notification.
//!
//! A missing target redirects to a fallback view and emits one
//! notification. The last pathname that produced a notification is
//! remembered, so re-evaluating the same invalid pathname redirects again
//! silently, while a different invalid pathname notifies again.

use teamboard_proto::page::Page;
use teamboard_proto::project::{Project, ProjectId};

use crate::cache::SnapshotCache;
use crate::notify::Notification;

/// A recognised navigational location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/tasks`, the default view.
    Tasks,
    /// `/archive`, the archived project list.
    Archive,
    /// `/projects/<id>`
    Project(ProjectId),
    /// `/archive/<id>`
    ArchiveProject(ProjectId),
    /// `/settings`
    Settings,
    /// `/search`
    Search,
}

impl Route {
    /// Parses a URL pathname. Returns `None` for unroutable paths.
    ///
    /// One trailing slash is tolerated; empty segments anywhere else are not.
    #[must_use]
    pub fn parse(pathname: &str) -> Option<Self> {
        let trimmed = pathname.strip_suffix('/').unwrap_or(pathname);
        let segments: Vec<&str> = trimmed.strip_prefix('/')?.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        match segments.as_slice() {
            ["tasks"] => Some(Self::Tasks),
            ["archive"] => Some(Self::Archive),
            ["settings"] => Some(Self::Settings),
            ["search"] => Some(Self::Search),
            ["projects", id] => Some(Self::Project(ProjectId::new(*id))),
            ["archive", id] => Some(Self::ArchiveProject(ProjectId::new(*id))),
            _ => None,
        }
    }

    /// Canonical pathname for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Tasks => "/tasks".to_string(),
            Self::Archive => "/archive".to_string(),
            Self::Settings => "/settings".to_string(),
            Self::Search => "/search".to_string(),
            Self::Project(id) => format!("/projects/{id}"),
            Self::ArchiveProject(id) => format!("/archive/{id}"),
        }
    }

    /// The project a project-type route targets.
    #[must_use]
    pub const fn project_id(&self) -> Option<&ProjectId> {
        match self {
            Self::Project(id) | Self::ArchiveProject(id) => Some(id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Where invalid routes are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFallbacks {
    /// Target for missing projects and unroutable paths.
    pub default_view: String,
    /// Target for missing archived projects.
    pub archive_view: String,
}

impl Default for RouteFallbacks {
    fn default() -> Self {
        Self {
            default_view: Route::Tasks.path(),
            archive_view: Route::Archive.path(),
        }
    }
}

/// Validation state of the current pathname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// Not evaluated since the pathname changed.
    Unchecked,
    /// The project list is still loading its first page.
    Loading,
    /// The route's target exists (or the route has no target).
    Valid,
    /// The route was redirected away.
    Invalid,
}

/// What the caller should do after an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Keep the current location.
    Stay,
    /// Navigate to `to`, showing `notice` if present.
    Redirect {
        /// Pathname to navigate to.
        to: String,
        /// Notification to show, if any.
        notice: Option<Notification>,
    },
}

/// Project data a route is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ProjectLookup<'a> {
    /// Current result of the project list query.
    pub live: &'a Page<Project>,
    /// Cached settled pages of the project list.
    pub cache: &'a SnapshotCache<Project>,
    /// Cache key of the project list (the workspace slug).
    pub scope_id: &'a str,
}

impl ProjectLookup<'_> {
    fn find(&self, id: &ProjectId) -> Option<&Project> {
        self.cache
            .find(self.scope_id, self.live, |project| &project.id == id)
    }
}

/// Re-entrant validator for the current location.
#[derive(Debug, Clone)]
pub struct RouteValidator {
    fallbacks: RouteFallbacks,
    pathname: Option<String>,
    state: RouteState,
    last_redirected: Option<String>,
}

impl RouteValidator {
    /// Creates a validator with the given fallbacks.
    #[must_use]
    pub const fn new(fallbacks: RouteFallbacks) -> Self {
        Self {
            fallbacks,
            pathname: None,
            state: RouteState::Unchecked,
            last_redirected: None,
        }
    }

    /// State of the most recently evaluated pathname.
    #[must_use]
    pub const fn state(&self) -> RouteState {
        self.state
    }

    /// The most recently evaluated pathname.
    #[must_use]
    pub fn pathname(&self) -> Option<&str> {
        self.pathname.as_deref()
    }

    /// Forgets every evaluation, including the notification guard.
    pub fn reset(&mut self) {
        self.pathname = None;
        self.state = RouteState::Unchecked;
        self.last_redirected = None;
    }

    /// Evaluates `pathname` against the project data.
    pub fn evaluate(&mut self, pathname: &str, projects: ProjectLookup<'_>) -> RouteDecision {
        if self.pathname.as_deref() != Some(pathname) {
            self.pathname = Some(pathname.to_string());
            self.state = RouteState::Unchecked;
        }

        let Some(route) = Route::parse(pathname) else {
            tracing::info!(pathname, to = %self.fallbacks.default_view, "unroutable path");
            self.state = RouteState::Invalid;
            return RouteDecision::Redirect {
                to: self.fallbacks.default_view.clone(),
                notice: None,
            };
        };

        let (id, wants_archived) = match &route {
            Route::Project(id) => (id, false),
            Route::ArchiveProject(id) => (id, true),
            _ => {
                self.state = RouteState::Valid;
                return RouteDecision::Stay;
            }
        };

        if let Some(project) = projects.find(id) {
            if project.archived == wants_archived {
                self.state = RouteState::Valid;
                return RouteDecision::Stay;
            }
            let canonical = if project.archived {
                Route::ArchiveProject(id.clone())
            } else {
                Route::Project(id.clone())
            };
            tracing::info!(pathname, to = %canonical, "canonicalizing archival state");
            self.state = RouteState::Valid;
            return RouteDecision::Redirect {
                to: canonical.path(),
                notice: None,
            };
        }

        if !projects.live.is_settled() {
            tracing::debug!(pathname, "project list loading, deferring validation");
            self.state = RouteState::Loading;
            return RouteDecision::Stay;
        }

        self.state = RouteState::Invalid;
        let (to, message) = if wants_archived {
            (&self.fallbacks.archive_view, "Archived project not found")
        } else {
            (&self.fallbacks.default_view, "Project not found")
        };
        let notice = if self.last_redirected.as_deref() == Some(pathname) {
            None
        } else {
            self.last_redirected = Some(pathname.to_string());
            Some(Notification::error(message))
        };
        tracing::info!(pathname, to = %to, notified = notice.is_some(), "route target missing");
        RouteDecision::Redirect {
            to: to.clone(),
            notice,
        }
    }
}

impl Default for RouteValidator {
    fn default() -> Self {
        Self::new(RouteFallbacks::default())
    }
}
