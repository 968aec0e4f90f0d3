//! Diff between the last-known server list and a locally edited list.
//!
//! Every id seen in either list lands in exactly one of four buckets:
//! created, updated, removed, or unchanged. Order is tracked separately as
//! plain sequence inequality, so a pure reorder is visible even when no row
//! changed.

use std::collections::{HashMap, HashSet};

use teamboard_proto::task::{Task, TaskId, TaskUpdate};

use super::normalize::{ComparableTask, normalize};

/// The minimal description of how `next` differs from `previous`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDiff {
    /// Rows whose id is new, in `next` order.
    pub creates: Vec<Task>,
    /// Rows present in both lists whose comparable form changed.
    pub updates: Vec<TaskUpdate>,
    /// Ids present only in `previous`, in `previous` order.
    pub removes: Vec<TaskId>,
    /// `true` iff the id sequences differ in length or at any position.
    pub order_changed: bool,
    /// The full id sequence of `next`.
    pub next_order: Vec<TaskId>,
}

impl TaskDiff {
    /// Returns `true` when there is nothing to create, update or remove.
    #[must_use]
    pub fn is_content_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }

    /// Returns `true` when neither content nor order changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_content_empty() && !self.order_changed
    }
}

/// Last-write-wins index of a list by id.
fn index(tasks: &[Task]) -> HashMap<&TaskId, (&Task, ComparableTask)> {
    tasks
        .iter()
        .map(|task| (&task.id, (task, normalize(task))))
        .collect()
}

/// Computes the diff from `previous` to `next`.
///
/// Duplicate ids within one list are a caller error; the last occurrence
/// wins and each id is reported at most once.
#[must_use]
pub fn diff(previous: &[Task], next: &[Task]) -> TaskDiff {
    let prev_index = index(previous);
    let next_index = index(next);

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut seen: HashSet<&TaskId> = HashSet::with_capacity(next.len());

    for task in next {
        if !seen.insert(&task.id) {
            continue;
        }
        let Some((latest, comparable)) = next_index.get(&task.id) else {
            continue;
        };
        match prev_index.get(&task.id) {
            None => creates.push((*latest).clone()),
            Some((_, before)) if before != comparable => updates.push(TaskUpdate::from(*latest)),
            Some(_) => {}
        }
    }

    let mut removed: HashSet<&TaskId> = HashSet::new();
    let removes = previous
        .iter()
        .filter(|task| !next_index.contains_key(&task.id) && removed.insert(&task.id))
        .map(|task| task.id.clone())
        .collect();

    let order_changed = previous.len() != next.len()
        || previous.iter().zip(next).any(|(before, after)| before.id != after.id);

    TaskDiff {
        creates,
        updates,
        removes,
        order_changed,
        next_order: next.iter().map(|task| task.id.clone()).collect(),
    }
}
