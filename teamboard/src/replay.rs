//! Scripted session replays.
//!
//! A replay script is a JSON document with a list of steps. Each step
//! feeds one command into a session backed by a [`RecordingRemote`] and
//! collects the events the session emitted for it:
//!
//! ```json
//! { "steps": [
//!     { "bootstrap": { "workspaceSlug": "acme", "viewer": { "userId": "u1", "name": "Ada" } } },
//!     { "navigate": "/projects/p1" },
//!     { "projects": { "results": [], "status": "Exhausted" } },
//!     { "sleep_ms": 5000 }
//! ] }
//! ```
//!
//! Edited rows without an `id` are new drafts and get a fresh
//! [`TaskId::generate`] id each time they appear.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use teamboard_proto::highlight::PendingHighlight;
use teamboard_proto::mutation::MutationRequest;
use teamboard_proto::page::Page;
use teamboard_proto::project::{Bootstrap, Project, ProjectFile, ProjectId};
use teamboard_proto::task::{Task, TaskId};

use crate::remote::memory::RecordingRemote;
use crate::session::{SessionCommand, SessionConfig, SessionError, SessionEvent, TaskList, spawn_session};

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    /// Deliver a bootstrap snapshot.
    Bootstrap(Bootstrap),
    /// Change the location.
    Navigate(String),
    /// Deliver a workspace task page.
    WorkspaceTasks(Page<Task>),
    /// Deliver a project task page.
    ProjectTasks {
        /// Project the page belongs to.
        project_id: ProjectId,
        /// The page.
        page: Page<Task>,
    },
    /// Deliver a project list page.
    Projects(Page<Project>),
    /// Deliver a project file page.
    ProjectFiles {
        /// Project the page belongs to.
        project_id: ProjectId,
        /// The page.
        page: Page<ProjectFile>,
    },
    /// Request a highlight.
    Highlight(PendingHighlight),
    /// Edit the workspace task list.
    EditWorkspace(Vec<Task>),
    /// Edit a project task list.
    EditProject {
        /// Project whose list is edited.
        project_id: ProjectId,
        /// The edited list.
        next: Vec<Task>,
    },
    /// Make the remote reject calls with this reason, or accept them again.
    FailRemote(Option<String>),
    /// Let time pass.
    SleepMs(u64),
}

/// A replay script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    /// Steps in order.
    pub steps: Vec<ReplayStep>,
}

/// Everything observed while replaying a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayLog {
    /// Events in emission order, tagged with the 0-based step that produced them.
    pub events: Vec<(usize, SessionEvent)>,
    /// Every request the remote received, including rejected ones.
    pub requests: Vec<MutationRequest>,
    /// Edits rejected before reaching the remote.
    pub rejected: Vec<String>,
}

/// Runs `script` through a fresh session.
///
/// The session's event channel must be able to hold every event a single
/// step produces; `config.channel_capacity` bounds it.
///
/// # Errors
///
/// Returns [`SessionError::Closed`] if the session stops unexpectedly.
pub async fn run(script: ReplayScript, config: SessionConfig) -> Result<ReplayLog, SessionError> {
    let remote = Arc::new(RecordingRemote::new());
    let mut session = spawn_session(config, Arc::clone(&remote));
    let mut log = ReplayLog::default();

    for (index, step) in script.steps.into_iter().enumerate() {
        tracing::debug!(step = index, "replay step");
        let command = match step {
            ReplayStep::SleepMs(ms) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                None
            }
            ReplayStep::FailRemote(reason) => {
                remote.set_failure(reason);
                None
            }
            ReplayStep::EditWorkspace(next) => {
                edit(&session, TaskList::Workspace, next, &mut log).await?;
                None
            }
            ReplayStep::EditProject { project_id, next } => {
                edit(&session, TaskList::Project(project_id), next, &mut log).await?;
                None
            }
            ReplayStep::Bootstrap(bootstrap) => Some(SessionCommand::Bootstrap(bootstrap)),
            ReplayStep::Navigate(pathname) => Some(SessionCommand::Navigate(pathname)),
            ReplayStep::WorkspaceTasks(page) => Some(SessionCommand::WorkspaceTasks(page)),
            ReplayStep::ProjectTasks { project_id, page } => {
                Some(SessionCommand::ProjectTasks { project_id, page })
            }
            ReplayStep::Projects(page) => Some(SessionCommand::Projects(page)),
            ReplayStep::ProjectFiles { project_id, page } => {
                Some(SessionCommand::ProjectFiles { project_id, page })
            }
            ReplayStep::Highlight(highlight) => Some(SessionCommand::RequestHighlight(highlight)),
        };
        if let Some(command) = command {
            session.send(command).await?;
        }
        // Give detached remote calls a chance to report back.
        tokio::task::yield_now().await;
        session.flush().await?;
        while let Some(event) = session.try_next_event() {
            log.events.push((index, event));
        }
    }

    let last = log.events.last().map_or(0, |(index, _)| *index);
    for event in session.shutdown().await {
        log.events.push((last, event));
    }
    log.requests = remote.take_requests();
    Ok(log)
}

async fn edit(
    session: &crate::session::SessionHandle,
    list: TaskList,
    mut next: Vec<Task>,
    log: &mut ReplayLog,
) -> Result<(), SessionError> {
    for task in next.iter_mut().filter(|task| task.id.is_unassigned()) {
        task.id = TaskId::generate();
        tracing::debug!(id = %task.id, title = %task.title, "drafted task");
    }
    match session.edit_tasks(list, next).await {
        Ok(()) => Ok(()),
        Err(SessionError::Sync(e)) => {
            log.rejected.push(e.to_string());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
