//! Integration tests for task list reconciliation.
//!
//! Drives `Reconciler` against `RecordingRemote` and `ChannelRemote` and
//! checks the exact requests each edit produces.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::redundant_clone)]

use std::sync::Arc;

use teamboard::notify::{Notifier, Severity};
use teamboard::remote::channel::ChannelRemote;
use teamboard::remote::memory::RecordingRemote;
use teamboard::sync::{ReconcileOutcome, Reconciler, ScopeTarget, SyncError};
use teamboard_proto::codec;
use teamboard_proto::mutation::{MutationRequest, Scope};
use teamboard_proto::page::PageStatus;
use teamboard_proto::project::ProjectId;
use teamboard_proto::task::{Assignee, Task, TaskId, TaskUpdate};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn workspace(status: PageStatus) -> ScopeTarget {
    ScopeTarget::Workspace { status }
}

fn acme() -> Scope {
    Scope::Workspace {
        workspace_slug: "acme".to_string(),
    }
}

fn ids(raw: &[&str]) -> Vec<TaskId> {
    raw.iter().map(|id| TaskId::new(*id)).collect()
}

fn reconciler<R: teamboard::remote::RemoteStore>(
    remote: &Arc<R>,
) -> (Reconciler<R>, tokio::sync::mpsc::Receiver<teamboard::notify::Notification>) {
    let (notifier, rx) = Notifier::channel(16);
    let mut reconciler = Reconciler::new(Arc::clone(remote), notifier);
    reconciler.bind_workspace(Some("acme".to_string()));
    (reconciler, rx)
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn workspace_edit_sends_batch_then_reorder() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    let next = vec![
        Task::new("t2", "B"),
        Task::new("t1", "A-edited"),
        Task::new("t3", "C"),
    ];
    let outcome = reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &previous, &next)
        .await
        .unwrap();
    assert_eq!(outcome, Some(ReconcileOutcome::Committed { calls: 2 }));

    assert_eq!(
        remote.take_requests(),
        vec![
            MutationRequest::ApplyDiff {
                scope: acme(),
                creates: vec![Task::new("t3", "C")],
                updates: vec![TaskUpdate::from(&Task::new("t1", "A-edited"))],
                removes: vec![],
            },
            MutationRequest::Reorder {
                scope: acme(),
                ordered_task_ids: ids(&["t2", "t1", "t3"]),
            },
        ]
    );
}

#[tokio::test]
async fn removal_reorders_with_remaining_ids() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    let next = vec![Task::new("t1", "A")];
    reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &previous, &next)
        .await
        .unwrap();

    let requests = remote.take_requests();
    assert_eq!(requests.len(), 2);
    assert!(matches!(
        &requests[0],
        MutationRequest::ApplyDiff { removes, creates, updates, .. }
            if removes == &ids(&["t2"]) && creates.is_empty() && updates.is_empty()
    ));
    assert!(matches!(
        &requests[1],
        MutationRequest::Reorder { ordered_task_ids, .. } if ordered_task_ids == &ids(&["t1"])
    ));
}

#[tokio::test]
async fn unchanged_list_makes_zero_calls() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let list = vec![Task::new("t1", "A"), Task::new("t2", "A")];
    let outcome = reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &list, &list.clone())
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn cosmetic_edits_make_zero_calls() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let mut before = Task::new("t1", "Write docs");
    before.assignee = Assignee {
        user_id: Some("u1".to_string()),
        name: "Ada".to_string(),
        avatar: "a.png".to_string(),
    };
    let mut after = before.clone();
    after.title = "  Write docs ".to_string();
    // Display fields are ignored once a member id is known.
    after.assignee.name = "Ada Lovelace".to_string();

    reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &[before], &[after])
        .await
        .unwrap();
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn partially_loaded_workspace_sends_content_only() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    let next = vec![Task::new("t2", "B"), Task::new("t1", "A2")];
    let outcome = reconciler
        .reconcile(&workspace(PageStatus::CanLoadMore), &previous, &next)
        .await
        .unwrap();

    assert_eq!(outcome, Some(ReconcileOutcome::Committed { calls: 1 }));
    assert_eq!(remote.requests()[0].kind(), "apply_task_diff");
}

#[tokio::test]
async fn project_scope_carries_project_id() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);

    let target = ScopeTarget::Project {
        project_id: ProjectId::new("p9"),
    };
    reconciler
        .reconcile(&target, &[], &[Task::new("t1", "A")])
        .await
        .unwrap();

    for request in remote.requests() {
        assert_eq!(
            request.scope(),
            &Scope::Project {
                workspace_slug: "acme".to_string(),
                project_public_id: ProjectId::new("p9"),
            }
        );
    }
}

// ===========================================================================
// Errors
// ===========================================================================

#[tokio::test]
async fn unbound_workspace_rejects_immediately() {
    let remote = Arc::new(RecordingRemote::new());
    let (notifier, mut rx) = Notifier::channel(4);
    let reconciler = Reconciler::new(Arc::clone(&remote), notifier);

    let result = reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &[], &[Task::new("t1", "A")])
        .await;
    assert!(matches!(result, Err(SyncError::ScopeUnavailable)));
    assert!(reconciler
        .dispatch(&workspace(PageStatus::Exhausted), &[], &[Task::new("t1", "A")])
        .is_err());
    assert_eq!(remote.call_count(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_apply_skips_reorder_and_notifies() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, mut rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    let next = vec![Task::new("t2", "B")];

    let plan = reconciler
        .plan(&workspace(PageStatus::Exhausted), &previous, &next)
        .unwrap()
        .unwrap();
    assert_eq!(plan.requests().len(), 2);

    remote.set_failure(Some("conflict".to_string()));
    let outcome = reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &previous, &next)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Some(ReconcileOutcome::Failed {
            operation: "apply_task_diff"
        })
    );

    assert_eq!(remote.call_count(), 1);
    let toast = rx.recv().await.unwrap();
    assert_eq!(toast.severity, Severity::Error);
    assert!(toast.message.starts_with("Couldn't save task changes"));
    assert!(toast.message.contains("conflict"));
}

/// Known gap: a rejected mutation leaves the optimistic list in place and
/// nothing is sent to restore the previous state.
#[tokio::test]
async fn rejected_mutation_is_not_rolled_back() {
    let remote = Arc::new(RecordingRemote::failing("offline"));
    let (reconciler, mut rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A")];
    let next = vec![Task::new("t1", "B")];
    reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &previous, &next)
        .await
        .unwrap();

    assert!(rx.recv().await.is_some());
    // Only the failed forward call was attempted; no compensating call follows.
    assert_eq!(remote.call_count(), 1);
    assert!(matches!(
        &remote.requests()[0],
        MutationRequest::ApplyDiff { updates, .. } if updates[0].title == "B"
    ));
}

#[tokio::test]
async fn overlapping_dispatches_are_not_coalesced() {
    let remote = Arc::new(RecordingRemote::new());
    let (reconciler, _rx) = reconciler(&remote);
    let target = workspace(PageStatus::Exhausted);

    let base = vec![Task::new("t1", "A")];
    let first = vec![Task::new("t1", "B")];
    let second = vec![Task::new("t1", "C")];

    let a = reconciler.dispatch(&target, &base, &first).unwrap().unwrap();
    let b = reconciler.dispatch(&target, &base, &second).unwrap().unwrap();
    a.await.unwrap();
    b.await.unwrap();
    assert_eq!(remote.call_count(), 2);
}

// ===========================================================================
// Channel transport
// ===========================================================================

#[tokio::test]
async fn channel_remote_emits_decodable_frames() {
    let (remote, mut frames) = ChannelRemote::new(8);
    let remote = Arc::new(remote);
    let (reconciler, _rx) = reconciler(&remote);

    let previous = vec![Task::new("t1", "A"), Task::new("t2", "B")];
    let next = vec![Task::new("t2", "B"), Task::new("t1", "A")];
    reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &previous, &next)
        .await
        .unwrap();

    let frame = frames.recv().await.unwrap();
    assert_eq!(
        codec::decode(&frame).unwrap(),
        MutationRequest::Reorder {
            scope: acme(),
            ordered_task_ids: ids(&["t2", "t1"]),
        }
    );
    assert!(frames.try_recv().is_err());
}

#[tokio::test]
async fn closed_channel_reports_disconnect() {
    let (remote, frames) = ChannelRemote::new(1);
    drop(frames);
    let remote = Arc::new(remote);
    let (reconciler, mut rx) = reconciler(&remote);

    let outcome = reconciler
        .reconcile(&workspace(PageStatus::Exhausted), &[], &[Task::new("t1", "A")])
        .await
        .unwrap();
    assert!(matches!(outcome, Some(ReconcileOutcome::Failed { .. })));
    assert!(rx.recv().await.unwrap().message.contains("disconnected"));
}
