//! Integration tests for the session driver.
//!
//! Runs a real session task on a paused tokio clock so highlight timeouts
//! and flash holds elapse deterministically.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use teamboard::notify::Notification;
use teamboard::remote::memory::RecordingRemote;
use teamboard::session::{
    SessionCommand, SessionConfig, SessionError, SessionEvent, SessionHandle, TaskList,
    spawn_session,
};
use teamboard::sync::SyncError;
use teamboard_proto::highlight::{HighlightTarget, PendingHighlight};
use teamboard_proto::mutation::MutationRequest;
use teamboard_proto::page::Page;
use teamboard_proto::project::{Bootstrap, Project, ProjectFile, ProjectId, Viewer};
use teamboard_proto::task::{Task, TaskId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn start() -> (SessionHandle, Arc<RecordingRemote>) {
    let remote = Arc::new(RecordingRemote::new());
    let session = spawn_session(SessionConfig::default(), Arc::clone(&remote));
    (session, remote)
}

fn bootstrap(slug: &str) -> SessionCommand {
    SessionCommand::Bootstrap(Bootstrap {
        workspace_slug: Some(slug.to_string()),
        viewer: Viewer {
            user_id: "u1".to_string(),
            name: "Ada".to_string(),
        },
    })
}

/// Sends `commands`, waits for them to be handled, and returns the events.
async fn step(session: &mut SessionHandle, commands: Vec<SessionCommand>) -> Vec<SessionEvent> {
    for command in commands {
        session.send(command).await.unwrap();
    }
    session.flush().await.unwrap();
    drain(session)
}

fn drain(session: &mut SessionHandle) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = session.try_next_event() {
        events.push(event);
    }
    events
}

fn notices(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Notify { notification } => Some(notification.message.clone()),
            _ => None,
        })
        .collect()
}

fn task_target(id: &str) -> HighlightTarget {
    HighlightTarget::Task {
        task_id: TaskId::new(id),
    }
}

// ===========================================================================
// Highlight
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn missing_task_highlight_times_out_once() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::RequestHighlight(PendingHighlight::task("p1", "missing")),
        ],
    )
    .await;
    assert_eq!(
        events,
        vec![SessionEvent::OpenProject {
            project_id: ProjectId::new("p1")
        }]
    );

    tokio::time::sleep(Duration::from_millis(4999)).await;
    assert!(step(&mut session, vec![]).await.is_empty());

    tokio::time::sleep(Duration::from_millis(1)).await;
    let events = step(&mut session, vec![]).await;
    assert_eq!(
        events,
        vec![
            SessionEvent::Notify {
                notification: Notification::error(
                    "Task could not be found. It may have been moved or deleted."
                )
            },
            SessionEvent::HighlightCleared,
        ]
    );

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(step(&mut session, vec![]).await.is_empty());
    assert!(session.shutdown().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn task_highlight_resolves_when_rows_arrive() {
    let (mut session, _) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::RequestHighlight(PendingHighlight::task("p1", "t2")),
        ],
    )
    .await;

    tokio::time::sleep(Duration::from_millis(4000)).await;
    let events = step(
        &mut session,
        vec![SessionCommand::ProjectTasks {
            project_id: ProjectId::new("p1"),
            page: Page::exhausted(vec![Task::new("t1", "A"), Task::new("t2", "B")]),
        }],
    )
    .await;
    assert_eq!(
        events,
        vec![
            SessionEvent::ScrollIntoView {
                target: task_target("t2")
            },
            SessionEvent::Flash {
                target: task_target("t2"),
                on: true
            },
        ]
    );

    // Past the original 5000 ms timeout: no error, the flash is still held.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(step(&mut session, vec![]).await.is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = step(&mut session, vec![]).await;
    assert_eq!(
        events,
        vec![
            SessionEvent::Flash {
                target: task_target("t2"),
                on: false
            },
            SessionEvent::HighlightCleared,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn file_highlight_switches_tab_then_flashes_after_delay() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::RequestHighlight(PendingHighlight::file("p1", "a.pdf", Some("docs"))),
            SessionCommand::ProjectFiles {
                project_id: ProjectId::new("p1"),
                page: Page::exhausted(vec![ProjectFile::new("a.pdf", "docs")]),
            },
        ],
    )
    .await;
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::OpenProject { .. }, SessionEvent::SelectFileTab { tab }] if tab.as_str() == "docs"
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = step(&mut session, vec![]).await;
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::ScrollIntoView { .. }, SessionEvent::Flash { on: true, .. }]
    ));

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let events = step(&mut session, vec![]).await;
    assert_eq!(events.last(), Some(&SessionEvent::HighlightCleared));
}

#[tokio::test(start_paused = true)]
async fn second_highlight_supersedes_first() {
    let (mut session, _) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::RequestHighlight(PendingHighlight::task("p1", "old")),
        ],
    )
    .await;

    tokio::time::sleep(Duration::from_millis(3000)).await;
    let events = step(
        &mut session,
        vec![SessionCommand::RequestHighlight(PendingHighlight::task(
            "p2", "new",
        ))],
    )
    .await;
    assert_eq!(events[0], SessionEvent::HighlightCleared);

    // The first timeout would have fired here.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(notices(&step(&mut session, vec![]).await).is_empty());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(notices(&step(&mut session, vec![]).await).len(), 1);
}

// ===========================================================================
// Routes
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn loading_project_route_stays_put() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::Navigate("/projects/p1".to_string()),
            SessionCommand::Projects(Page::loading()),
        ],
    )
    .await;
    assert!(events.is_empty());

    let events = step(
        &mut session,
        vec![SessionCommand::Projects(Page::partial(vec![Project::active(
            "p1", "Launch",
        )]))],
    )
    .await;
    assert!(events.is_empty());
}

#[tokio::test(start_paused = true)]
async fn route_notice_fires_once_per_distinct_invalid_path() {
    let (mut session, _) = start();
    let projects = || SessionCommand::Projects(Page::exhausted(vec![Project::active("p1", "Launch")]));

    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            projects(),
            SessionCommand::Navigate("/projects/gone".to_string()),
        ],
    )
    .await;
    assert_eq!(notices(&events), vec!["Project not found"]);
    assert!(events.contains(&SessionEvent::Redirect {
        to: "/tasks".to_string()
    }));

    // Navigating back to the same invalid path redirects silently.
    let events = step(
        &mut session,
        vec![
            SessionCommand::Navigate("/projects/gone".to_string()),
            projects(),
        ],
    )
    .await;
    assert!(notices(&events).is_empty());
    assert!(events.contains(&SessionEvent::Redirect {
        to: "/tasks".to_string()
    }));

    let events = step(
        &mut session,
        vec![SessionCommand::Navigate("/archive/also-gone".to_string())],
    )
    .await;
    assert_eq!(notices(&events), vec!["Archived project not found"]);
    assert!(events.contains(&SessionEvent::Redirect {
        to: "/archive".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn archived_project_route_is_canonicalized() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::Projects(Page::exhausted(vec![Project::archived("p1", "Old")])),
            SessionCommand::Navigate("/projects/p1/".to_string()),
        ],
    )
    .await;
    assert_eq!(
        events,
        vec![SessionEvent::Redirect {
            to: "/archive/p1".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn deleted_project_is_not_revived_from_cache() {
    let (mut session, _) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::Projects(Page::exhausted(vec![Project::active("p1", "Launch")])),
            SessionCommand::Projects(Page::exhausted(vec![])),
        ],
    )
    .await;
    let events = step(
        &mut session,
        vec![SessionCommand::Navigate("/projects/p1".to_string())],
    )
    .await;
    assert_eq!(notices(&events), vec!["Project not found"]);
}

#[tokio::test(start_paused = true)]
async fn malformed_path_redirects_silently() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::Projects(Page::exhausted(vec![Project::active("p1", "Launch")])),
            SessionCommand::Navigate("//projects//p1".to_string()),
        ],
    )
    .await;
    assert_eq!(
        events,
        vec![SessionEvent::Redirect {
            to: "/tasks".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_path_redirects_silently() {
    let (mut session, _) = start();
    let events = step(
        &mut session,
        vec![bootstrap("acme"), SessionCommand::Navigate("/nowhere".to_string())],
    )
    .await;
    assert_eq!(
        events,
        vec![SessionEvent::Redirect {
            to: "/tasks".to_string()
        }]
    );
}

// ===========================================================================
// Workspace and edits
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn workspace_change_drops_cached_projects() {
    let (mut session, _) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::Projects(Page::exhausted(vec![Project::active("p1", "Launch")])),
            SessionCommand::Navigate("/projects/p1".to_string()),
        ],
    )
    .await;

    // The new workspace's project list is still loading: acme's cached p1
    // must not validate the route, and no redirect happens yet.
    let events = step(&mut session, vec![bootstrap("globex")]).await;
    assert!(events.is_empty());

    let events = step(
        &mut session,
        vec![SessionCommand::Projects(Page::exhausted(vec![]))],
    )
    .await;
    assert_eq!(notices(&events), vec!["Project not found"]);
}

#[tokio::test(start_paused = true)]
async fn edit_before_bootstrap_is_rejected() {
    let (session, remote) = start();
    let result = session
        .edit_tasks(TaskList::Workspace, vec![Task::new("t1", "A")])
        .await;
    assert!(matches!(
        result,
        Err(SessionError::Sync(SyncError::ScopeUnavailable))
    ));
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_edit_surfaces_as_notification() {
    let remote = Arc::new(RecordingRemote::failing("offline"));
    let mut session = spawn_session(SessionConfig::default(), Arc::clone(&remote));
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::WorkspaceTasks(Page::exhausted(vec![Task::new("t1", "A")])),
        ],
    )
    .await;

    session
        .edit_tasks(TaskList::Workspace, vec![Task::new("t1", "B")])
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), session.next_event())
        .await
        .unwrap()
        .unwrap();
    match event {
        SessionEvent::Notify { notification } => {
            assert!(notification.message.contains("offline"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(remote.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn successive_edits_diff_against_optimistic_state() {
    let (mut session, remote) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::WorkspaceTasks(Page::exhausted(vec![Task::new("t1", "A")])),
        ],
    )
    .await;

    let first = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    session
        .edit_tasks(TaskList::Workspace, first.clone())
        .await
        .unwrap();
    // Same list again: nothing new to send.
    session.edit_tasks(TaskList::Workspace, first).await.unwrap();
    session.flush().await.unwrap();
    for _ in 0..16 {
        if remote.call_count() >= 2 {
            break;
        }
        tokio::task::yield_now().await;
    }

    let kinds: Vec<&str> = remote.requests().iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec!["apply_task_diff", "reorder_tasks"]);
}

async fn wait_for_calls(remote: &RecordingRemote, count: usize) {
    for _ in 0..16 {
        if remote.call_count() >= count {
            break;
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn edits_while_list_reloads_do_not_resend_rows() {
    let (mut session, remote) = start();
    step(
        &mut session,
        vec![
            bootstrap("acme"),
            SessionCommand::WorkspaceTasks(Page::exhausted(vec![Task::new("t1", "A")])),
            SessionCommand::WorkspaceTasks(Page::loading()),
        ],
    )
    .await;

    session
        .edit_tasks(
            TaskList::Workspace,
            vec![Task::new("t1", "A"), Task::new("t2", "B")],
        )
        .await
        .unwrap();
    session
        .edit_tasks(
            TaskList::Workspace,
            vec![Task::new("t1", "A"), Task::new("t2", "B"), Task::new("t3", "C")],
        )
        .await
        .unwrap();
    session.flush().await.unwrap();
    wait_for_calls(&remote, 2).await;

    let created: Vec<Vec<TaskId>> = remote
        .requests()
        .iter()
        .map(|request| match request {
            MutationRequest::ApplyDiff { creates, .. } => {
                creates.iter().map(|t| t.id.clone()).collect()
            }
            MutationRequest::Reorder { .. } => panic!("reorder while the list is loading"),
        })
        .collect();
    assert_eq!(
        created,
        vec![vec![TaskId::new("t2")], vec![TaskId::new("t3")]]
    );
}

#[tokio::test(start_paused = true)]
async fn project_edits_before_first_page_update_the_drafted_row() {
    let (mut session, remote) = start();
    step(&mut session, vec![bootstrap("acme")]).await;
    let list = TaskList::Project(ProjectId::new("p1"));

    session
        .edit_tasks(list.clone(), vec![Task::new("t1", "A")])
        .await
        .unwrap();
    session
        .edit_tasks(list, vec![Task::new("t1", "A2")])
        .await
        .unwrap();
    session.flush().await.unwrap();
    wait_for_calls(&remote, 3).await;

    let requests = remote.requests();
    assert_eq!(requests.len(), 3);
    assert!(matches!(
        &requests[0],
        MutationRequest::ApplyDiff { creates, .. } if creates == &vec![Task::new("t1", "A")]
    ));
    assert_eq!(requests[1].kind(), "reorder_tasks");
    assert!(matches!(
        &requests[2],
        MutationRequest::ApplyDiff { creates, updates, .. }
            if creates.is_empty() && updates.len() == 1 && updates[0].title == "A2"
    ));
}
