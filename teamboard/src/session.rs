//! Event-driven session driver.
//!
//! Wires the snapshot caches, the route validator, the highlight
//! coordinator and the reconciler into one tokio task. The caller feeds
//! data and user intents in as [`SessionCommand`]s and applies the
//! resulting [`SessionEvent`]s to the view.
//!
//! # Architecture
//!
//! ```text
//! view  ─── SessionCommand ──→  session task  ──→ RemoteStore (spawned calls)
//!       ←── SessionEvent  ────      │
//!                                   └─ sleeps until the next highlight deadline
//! ```
//!
//! Every piece of state is owned by the session task, so no locking is
//! involved. Remote mutations run as separate tasks; their failures come
//! back through the notification channel and are forwarded as
//! [`SessionEvent::Notify`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use teamboard_proto::highlight::{HighlightTarget, PendingHighlight};
use teamboard_proto::page::Page;
use teamboard_proto::project::{Bootstrap, FileTab, Project, ProjectFile, ProjectId, Viewer};
use teamboard_proto::task::Task;

use crate::cache::SnapshotCache;
use crate::highlight::{HighlightCoordinator, HighlightEffect, HighlightTimings, ProjectView};
use crate::notify::{Notification, Notifier};
use crate::remote::RemoteStore;
use crate::route::{ProjectLookup, RouteDecision, RouteFallbacks, RouteValidator};
use crate::sync::{Reconciler, ScopeTarget, SyncError};

/// Upper bound on redirects followed for a single evaluation.
const MAX_REDIRECTS: usize = 4;

/// Settings for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity of the command, event and notification channels.
    pub channel_capacity: usize,
    /// Highlight timeout and flash durations.
    pub highlight: HighlightTimings,
    /// Redirect targets for invalid routes.
    pub routes: RouteFallbacks,
    /// Workspace bound before the first bootstrap arrives.
    pub workspace_slug: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            highlight: HighlightTimings::default(),
            routes: RouteFallbacks::default(),
            workspace_slug: None,
        }
    }
}

/// Which task list an edit applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskList {
    /// The workspace-wide list.
    Workspace,
    /// One project's list.
    Project(ProjectId),
}

/// Inputs to the session.
#[derive(Debug)]
pub enum SessionCommand {
    /// The bootstrap snapshot arrived or changed.
    Bootstrap(Bootstrap),
    /// The location changed.
    Navigate(String),
    /// New result of the workspace task query.
    WorkspaceTasks(Page<Task>),
    /// New result of a project task query.
    ProjectTasks {
        /// Project the page belongs to.
        project_id: ProjectId,
        /// The page.
        page: Page<Task>,
    },
    /// New result of the project list query.
    Projects(Page<Project>),
    /// New result of a project file query.
    ProjectFiles {
        /// Project the page belongs to.
        project_id: ProjectId,
        /// The page.
        page: Page<ProjectFile>,
    },
    /// Scroll to and flash a row once it is available.
    RequestHighlight(PendingHighlight),
    /// The user edited a task list.
    EditTasks {
        /// The edited list.
        list: TaskList,
        /// The list as the user now sees it.
        next: Vec<Task>,
        /// Receives `Err` immediately if no scope is bound.
        reply: Option<oneshot::Sender<Result<(), SyncError>>>,
    },
    /// Acknowledged once every earlier command has been handled and its
    /// events queued.
    Flush(oneshot::Sender<()>),
    /// Stop the session.
    Shutdown,
}

/// Outputs of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Navigate to another location.
    Redirect {
        /// Target pathname.
        to: String,
    },
    /// Show a notification.
    Notify {
        /// The notification.
        notification: Notification,
    },
    /// Switch to a project view.
    OpenProject {
        /// Project to open.
        project_id: ProjectId,
    },
    /// Switch the active file tab.
    SelectFileTab {
        /// Tab to select.
        tab: FileTab,
    },
    /// Scroll a row into centered view.
    ScrollIntoView {
        /// Row to scroll to.
        target: HighlightTarget,
    },
    /// Toggle a row's flash state.
    Flash {
        /// Row to flash.
        target: HighlightTarget,
        /// Whether the flash is on.
        on: bool,
    },
    /// The pending highlight is gone.
    HighlightCleared,
}

impl From<HighlightEffect> for SessionEvent {
    fn from(effect: HighlightEffect) -> Self {
        match effect {
            HighlightEffect::OpenProject(project_id) => Self::OpenProject { project_id },
            HighlightEffect::SelectFileTab(tab) => Self::SelectFileTab { tab },
            HighlightEffect::ScrollIntoView(target) => Self::ScrollIntoView { target },
            HighlightEffect::Flash { target, on } => Self::Flash { target, on },
            HighlightEffect::Notify(notification) => Self::Notify { notification },
            HighlightEffect::Cleared => Self::HighlightCleared,
        }
    }
}

/// Errors returned by [`SessionHandle`] helpers.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("session closed")]
    Closed,
    /// The edit was rejected before any remote call.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Channels and task handle of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::Receiver<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Sends a command to the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Submits an edited list and waits until it is dispatched.
    ///
    /// Remote failures are not reported here; they arrive later as
    /// [`SessionEvent::Notify`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Sync`] if no scope is bound, or
    /// [`SessionError::Closed`] if the session has stopped.
    pub async fn edit_tasks(&self, list: TaskList, next: Vec<Task>) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::EditTasks {
            list,
            next,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }

    /// Waits until every command sent so far has been handled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn flush(&self) -> Result<(), SessionError> {
        let (done, rx) = oneshot::channel();
        self.send(SessionCommand::Flush(done)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Waits for the next event. Returns `None` once the session has stopped.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Returns an event if one is already queued.
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Stops the session and returns the events it emitted while stopping.
    pub async fn shutdown(mut self) -> Vec<SessionEvent> {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        let mut tail = Vec::new();
        while let Some(event) = self.events.recv().await {
            tail.push(event);
        }
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "session task ended abnormally");
        }
        tail
    }
}

/// Spawns the session task on the current tokio runtime.
pub fn spawn_session<R: RemoteStore + 'static>(
    config: SessionConfig,
    remote: Arc<R>,
) -> SessionHandle {
    let capacity = config.channel_capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (evt_tx, evt_rx) = mpsc::channel(capacity);
    let (notifier, notice_rx) = Notifier::channel(capacity);

    let state = SessionState::new(&config, remote, notifier);
    let task = tokio::spawn(run(state, cmd_rx, notice_rx, evt_tx));

    SessionHandle {
        commands: cmd_tx,
        events: evt_rx,
        task,
    }
}

async fn run<R: RemoteStore + 'static>(
    mut state: SessionState<R>,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut notices: mpsc::Receiver<Notification>,
    events: mpsc::Sender<SessionEvent>,
) {
    tracing::debug!("session started");
    loop {
        let deadline = state.next_deadline();
        // Due timers go first so their events precede those of commands
        // arriving at the same instant.
        let batch = tokio::select! {
            biased;
            () = wait_for(deadline) => state.tick(Instant::now()),
            Some(notification) = notices.recv() => vec![SessionEvent::Notify { notification }],
            command = commands.recv() => match command {
                Some(SessionCommand::Shutdown) | None => {
                    let tail = state.shutdown();
                    emit(&events, tail).await;
                    break;
                }
                Some(command) => state.handle(command, Instant::now()),
            },
        };
        if !emit(&events, batch).await {
            tracing::debug!("event receiver dropped, stopping session");
            break;
        }
    }
    tracing::debug!("session stopped");
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn emit(events: &mpsc::Sender<SessionEvent>, batch: Vec<SessionEvent>) -> bool {
    for event in batch {
        if events.send(event).await.is_err() {
            return false;
        }
    }
    true
}

fn workspace_key(slug: &str) -> String {
    format!("workspace:{slug}")
}

fn project_key(project_id: &ProjectId) -> String {
    format!("project:{project_id}")
}

/// Rows an edit or highlight sees for a task list: the last unsettled
/// edit, else the live or cached rows.
fn shown_tasks<'a>(
    optimistic: &'a HashMap<String, Vec<Task>>,
    cache: &'a SnapshotCache<Task>,
    key: &str,
    live: &'a Page<Task>,
) -> &'a [Task] {
    optimistic
        .get(key)
        .map_or_else(|| cache.resolve(key, live), Vec::as_slice)
}

/// Everything the session task owns.
struct SessionState<R> {
    reconciler: Reconciler<R>,
    workspace_slug: Option<String>,
    viewer: Option<Viewer>,
    pathname: Option<String>,

    workspace_tasks: Page<Task>,
    project_tasks: HashMap<ProjectId, Page<Task>>,
    projects: Page<Project>,
    project_files: HashMap<ProjectId, Page<ProjectFile>>,

    task_cache: SnapshotCache<Task>,
    /// Last dispatched list per task cache key, for lists whose live page
    /// has not settled yet.
    optimistic: HashMap<String, Vec<Task>>,
    project_cache: SnapshotCache<Project>,
    file_cache: SnapshotCache<ProjectFile>,

    routes: RouteValidator,
    highlight: HighlightCoordinator,
}

impl<R: RemoteStore + 'static> SessionState<R> {
    fn new(config: &SessionConfig, remote: Arc<R>, notifier: Notifier) -> Self {
        let mut state = Self {
            reconciler: Reconciler::new(remote, notifier),
            workspace_slug: None,
            viewer: None,
            pathname: None,
            workspace_tasks: Page::loading(),
            project_tasks: HashMap::new(),
            projects: Page::loading(),
            project_files: HashMap::new(),
            task_cache: SnapshotCache::new(),
            optimistic: HashMap::new(),
            project_cache: SnapshotCache::new(),
            file_cache: SnapshotCache::new(),
            routes: RouteValidator::new(config.routes.clone()),
            highlight: HighlightCoordinator::new(config.highlight),
        };
        let mut ignored = Vec::new();
        state.bind_workspace(config.workspace_slug.clone(), &mut ignored);
        state
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.highlight.next_deadline()
    }

    fn handle(&mut self, command: SessionCommand, now: Instant) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        match command {
            SessionCommand::Bootstrap(bootstrap) => {
                tracing::debug!(viewer = %bootstrap.viewer.user_id, "bootstrap received");
                self.viewer = Some(bootstrap.viewer);
                let slug = bootstrap.workspace_slug.filter(|s| !s.is_empty());
                self.bind_workspace(slug, &mut out);
                self.revalidate(&mut out);
            }
            SessionCommand::Navigate(pathname) => {
                self.pathname = Some(pathname);
                self.revalidate(&mut out);
            }
            SessionCommand::WorkspaceTasks(page) => {
                if let Some(slug) = &self.workspace_slug {
                    let key = workspace_key(slug);
                    if self.task_cache.set(&key, &page) {
                        self.optimistic.remove(&key);
                    }
                }
                self.workspace_tasks = page;
            }
            SessionCommand::ProjectTasks { project_id, page } => {
                let key = project_key(&project_id);
                if self.task_cache.set(&key, &page) {
                    self.optimistic.remove(&key);
                }
                self.project_tasks.insert(project_id.clone(), page);
                self.feed_highlight(&project_id, now, &mut out);
            }
            SessionCommand::Projects(page) => {
                if let Some(slug) = &self.workspace_slug {
                    self.project_cache.set(slug, &page);
                }
                self.projects = page;
                self.revalidate(&mut out);
            }
            SessionCommand::ProjectFiles { project_id, page } => {
                self.file_cache.set(project_id.as_str(), &page);
                self.project_files.insert(project_id.clone(), page);
                self.feed_highlight(&project_id, now, &mut out);
            }
            SessionCommand::RequestHighlight(highlight) => {
                let project_id = highlight.project_id.clone();
                out.extend(
                    self.highlight
                        .request(highlight, now)
                        .into_iter()
                        .map(SessionEvent::from),
                );
                self.feed_highlight(&project_id, now, &mut out);
            }
            SessionCommand::EditTasks { list, next, reply } => {
                let result = self.edit_tasks(&list, next, now, &mut out);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                } else if let Err(e) = result {
                    tracing::warn!(error = %e, "unacknowledged edit rejected");
                }
            }
            SessionCommand::Flush(done) => {
                let _ = done.send(());
            }
            SessionCommand::Shutdown => out.extend(self.shutdown()),
        }
        out
    }

    fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.highlight
            .tick(now)
            .into_iter()
            .map(SessionEvent::from)
            .collect()
    }

    fn shutdown(&mut self) -> Vec<SessionEvent> {
        self.highlight
            .teardown()
            .into_iter()
            .map(SessionEvent::from)
            .collect()
    }

    fn bind_workspace(&mut self, slug: Option<String>, out: &mut Vec<SessionEvent>) {
        if slug == self.workspace_slug {
            return;
        }
        tracing::info!(
            from = self.workspace_slug.as_deref().unwrap_or("-"),
            to = slug.as_deref().unwrap_or("-"),
            "binding workspace"
        );
        self.task_cache.bind_workspace(slug.as_deref());
        self.project_cache.bind_workspace(slug.as_deref());
        self.file_cache.bind_workspace(slug.as_deref());
        self.optimistic.clear();

        self.workspace_tasks = Page::loading();
        self.project_tasks.clear();
        self.projects = Page::loading();
        self.project_files.clear();

        self.reconciler.bind_workspace(slug.clone());
        self.routes.reset();
        out.extend(self.highlight.teardown().into_iter().map(SessionEvent::from));
        self.workspace_slug = slug;
    }

    fn revalidate(&mut self, out: &mut Vec<SessionEvent>) {
        for _ in 0..MAX_REDIRECTS {
            let Some(pathname) = self.pathname.clone() else {
                return;
            };
            let lookup = ProjectLookup {
                live: &self.projects,
                cache: &self.project_cache,
                scope_id: self.workspace_slug.as_deref().unwrap_or_default(),
            };
            match self.routes.evaluate(&pathname, lookup) {
                RouteDecision::Stay => return,
                RouteDecision::Redirect { to, notice } => {
                    if let Some(notification) = notice {
                        out.push(SessionEvent::Notify { notification });
                    }
                    if to == pathname {
                        return;
                    }
                    out.push(SessionEvent::Redirect { to: to.clone() });
                    self.pathname = Some(to);
                }
            }
        }
        tracing::warn!(
            pathname = self.pathname.as_deref().unwrap_or("-"),
            "redirect chain did not settle"
        );
    }

    fn feed_highlight(&mut self, project_id: &ProjectId, now: Instant, out: &mut Vec<SessionEvent>) {
        if self
            .highlight
            .pending()
            .is_none_or(|pending| &pending.project_id != project_id)
        {
            return;
        }
        let no_tasks = Page::loading();
        let no_files = Page::loading();
        let live_tasks = self.project_tasks.get(project_id).unwrap_or(&no_tasks);
        let live_files = self.project_files.get(project_id).unwrap_or(&no_files);
        let view = ProjectView {
            project_id,
            tasks: shown_tasks(
                &self.optimistic,
                &self.task_cache,
                &project_key(project_id),
                live_tasks,
            ),
            files: self.file_cache.resolve(project_id.as_str(), live_files),
        };
        out.extend(
            self.highlight
                .on_data(&view, now)
                .into_iter()
                .map(SessionEvent::from),
        );
    }

    fn edit_tasks(
        &mut self,
        list: &TaskList,
        next: Vec<Task>,
        now: Instant,
        out: &mut Vec<SessionEvent>,
    ) -> Result<(), SyncError> {
        let slug = self.workspace_slug.clone().unwrap_or_default();
        let (target, key) = match list {
            TaskList::Workspace => (
                ScopeTarget::Workspace {
                    status: self.workspace_tasks.status,
                },
                workspace_key(&slug),
            ),
            TaskList::Project(project_id) => (
                ScopeTarget::Project {
                    project_id: project_id.clone(),
                },
                project_key(project_id),
            ),
        };

        let no_tasks = Page::loading();
        let live = match list {
            TaskList::Workspace => &self.workspace_tasks,
            TaskList::Project(project_id) => self.project_tasks.get(project_id).unwrap_or(&no_tasks),
        };
        let previous = shown_tasks(&self.optimistic, &self.task_cache, &key, live).to_vec();

        // Spawned calls are detached; failures come back as notifications.
        drop(self.reconciler.dispatch(&target, &previous, &next)?);

        // Optimistic: the edited list is shown even if the remote later rejects it.
        let page = match list {
            TaskList::Workspace => &mut self.workspace_tasks,
            TaskList::Project(project_id) => self.project_tasks.entry(project_id.clone()).or_default(),
        };
        page.results.clone_from(&next);
        if self.task_cache.set(&key, page) {
            self.optimistic.remove(&key);
        } else {
            // Held until a settled page for the same list replaces it.
            tracing::debug!(
                key = %key,
                rows = next.len(),
                "list still loading, keeping edit as baseline"
            );
            self.optimistic.insert(key, next);
        }

        if let TaskList::Project(project_id) = list {
            self.feed_highlight(project_id, now, out);
        }
        Ok(())
    }
}
