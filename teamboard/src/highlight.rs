//! Pending highlight coordination.
//!
//! A [`HighlightCoordinator`] owns at most one pending highlight and the
//! three timers that govern it: the resolution timeout, the file pre-flash
//! delay, and the flash hold. It never polls. Resolution is attempted each
//! time the caller reports new data through [`HighlightCoordinator::on_data`],
//! and timers advance through [`HighlightCoordinator::tick`]. Every call
//! returns the [`HighlightEffect`]s the view must apply.
//!
//! A pending highlight always ends: either the row resolves and its flash
//! hold expires, or the timeout fires an error notification. A new request
//! cancels every timer of the one it supersedes.

use std::time::Duration;

use tokio::time::Instant;

use teamboard_proto::highlight::{HighlightTarget, PendingHighlight};
use teamboard_proto::project::{FileTab, ProjectFile, ProjectId};
use teamboard_proto::task::Task;

use crate::notify::Notification;
use crate::timer::{self, TimerSlot};

/// Durations governing a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTimings {
    /// How long to wait for the row to appear.
    pub timeout: Duration,
    /// Flash duration for task rows.
    pub task_flash: Duration,
    /// Delay before flashing a file row, letting a tab switch render.
    pub file_flash_delay: Duration,
    /// Flash duration for file rows.
    pub file_flash_hold: Duration,
}

impl Default for HighlightTimings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            task_flash: Duration::from_millis(1600),
            file_flash_delay: Duration::from_millis(50),
            file_flash_hold: Duration::from_millis(1600),
        }
    }
}

/// Something the view must do on behalf of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightEffect {
    /// Switch to the project's view.
    OpenProject(ProjectId),
    /// Switch the active file tab.
    SelectFileTab(FileTab),
    /// Scroll the row into centered view.
    ScrollIntoView(HighlightTarget),
    /// Toggle the flash state of a row.
    Flash {
        /// Row to flash.
        target: HighlightTarget,
        /// Whether the flash is turned on or off.
        on: bool,
    },
    /// Show a notification.
    Notify(Notification),
    /// The pending highlight is gone.
    Cleared,
}

/// Rows currently loaded for one project view.
#[derive(Debug, Clone, Copy)]
pub struct ProjectView<'a> {
    /// Project the rows belong to.
    pub project_id: &'a ProjectId,
    /// Loaded task rows.
    pub tasks: &'a [Task],
    /// Loaded file rows.
    pub files: &'a [ProjectFile],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    PreFlash,
    Flashing,
}

#[derive(Debug, Clone)]
struct Active {
    highlight: PendingHighlight,
    phase: Phase,
}

/// Drives one pending highlight at a time.
#[derive(Debug, Clone)]
pub struct HighlightCoordinator {
    timings: HighlightTimings,
    active: Option<Active>,
    timeout: TimerSlot,
    flash_delay: TimerSlot,
    flash_hold: TimerSlot,
}

impl HighlightCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub const fn new(timings: HighlightTimings) -> Self {
        Self {
            timings,
            active: None,
            timeout: TimerSlot::idle(),
            flash_delay: TimerSlot::idle(),
            flash_hold: TimerSlot::idle(),
        }
    }

    /// The highlight currently pending, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingHighlight> {
        self.active.as_ref().map(|active| &active.highlight)
    }

    /// The earliest armed timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        timer::earliest(&[&self.timeout, &self.flash_delay, &self.flash_hold])
    }

    /// Starts a new highlight, superseding any pending one.
    pub fn request(&mut self, highlight: PendingHighlight, now: Instant) -> Vec<HighlightEffect> {
        let mut effects = self.supersede();

        tracing::debug!(
            project_id = %highlight.project_id,
            target = highlight.target.label(),
            "highlight requested"
        );
        effects.push(HighlightEffect::OpenProject(highlight.project_id.clone()));
        if let HighlightTarget::File {
            file_tab: Some(tab),
            ..
        } = &highlight.target
        {
            effects.push(HighlightEffect::SelectFileTab(tab.clone()));
        }

        self.timeout.arm(now, self.timings.timeout);
        self.active = Some(Active {
            highlight,
            phase: Phase::Waiting,
        });
        effects
    }

    /// Tries to resolve the pending highlight against newly arrived rows.
    pub fn on_data(&mut self, view: &ProjectView<'_>, now: Instant) -> Vec<HighlightEffect> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if active.phase != Phase::Waiting || &active.highlight.project_id != view.project_id {
            return Vec::new();
        }
        if !resolves(&active.highlight.target, view) {
            return Vec::new();
        }

        self.timeout.cancel();
        let target = active.highlight.target.clone();
        tracing::info!(
            project_id = %view.project_id,
            target = target.label(),
            "highlight target resolved"
        );
        match target {
            HighlightTarget::Task { .. } => {
                active.phase = Phase::Flashing;
                self.flash_hold.arm(now, self.timings.task_flash);
                vec![
                    HighlightEffect::ScrollIntoView(target.clone()),
                    HighlightEffect::Flash { target, on: true },
                ]
            }
            HighlightTarget::File { .. } => {
                active.phase = Phase::PreFlash;
                self.flash_delay.arm(now, self.timings.file_flash_delay);
                Vec::new()
            }
        }
    }

    /// Fires every timer whose deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Vec<HighlightEffect> {
        let mut effects = Vec::new();

        if self.timeout.fire(now) {
            if let Some(active) = self.active.take() {
                let label = active.highlight.target.label();
                tracing::warn!(
                    project_id = %active.highlight.project_id,
                    target = label,
                    "highlight target never appeared"
                );
                effects.push(HighlightEffect::Notify(Notification::error(format!(
                    "{label} could not be found. It may have been moved or deleted."
                ))));
                effects.push(HighlightEffect::Cleared);
            }
            self.cancel_timers();
            return effects;
        }

        if self.flash_delay.fire(now) {
            if let Some(active) = self.active.as_mut() {
                active.phase = Phase::Flashing;
                let target = active.highlight.target.clone();
                self.flash_hold.arm(now, self.timings.file_flash_hold);
                effects.push(HighlightEffect::ScrollIntoView(target.clone()));
                effects.push(HighlightEffect::Flash { target, on: true });
            }
        }

        if self.flash_hold.fire(now) {
            if let Some(active) = self.active.take() {
                tracing::debug!(project_id = %active.highlight.project_id, "highlight finished");
                effects.push(HighlightEffect::Flash {
                    target: active.highlight.target,
                    on: false,
                });
                effects.push(HighlightEffect::Cleared);
            }
        }

        effects
    }

    /// Cancels every timer and drops the pending highlight.
    pub fn teardown(&mut self) -> Vec<HighlightEffect> {
        self.supersede()
    }

    fn supersede(&mut self) -> Vec<HighlightEffect> {
        self.cancel_timers();
        let Some(previous) = self.active.take() else {
            return Vec::new();
        };
        tracing::debug!(project_id = %previous.highlight.project_id, "highlight superseded");
        let mut effects = Vec::with_capacity(2);
        if previous.phase == Phase::Flashing {
            effects.push(HighlightEffect::Flash {
                target: previous.highlight.target,
                on: false,
            });
        }
        effects.push(HighlightEffect::Cleared);
        effects
    }

    const fn cancel_timers(&mut self) {
        self.timeout.cancel();
        self.flash_delay.cancel();
        self.flash_hold.cancel();
    }
}

impl Default for HighlightCoordinator {
    fn default() -> Self {
        Self::new(HighlightTimings::default())
    }
}

fn resolves(target: &HighlightTarget, view: &ProjectView<'_>) -> bool {
    match target {
        HighlightTarget::Task { task_id } => view.tasks.iter().any(|task| &task.id == task_id),
        HighlightTarget::File {
            file_name,
            file_tab,
        } => view.files.iter().any(|file| {
            &file.name == file_name && file_tab.as_ref().is_none_or(|tab| &file.tab == tab)
        }),
    }
}
