//! Cancellable timer slots.
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming an armed slot
//! replaces its deadline, and [`TimerSlot::cancel`] clears it, so every
//! state transition that supersedes a timer cancels it explicitly. The
//! owner polls [`TimerSlot::fire`] with the current time; the driver loop
//! sleeps until the earliest [`TimerSlot::deadline`] across its slots.

use std::time::Duration;

use tokio::time::Instant;

/// A single optional deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    /// An idle slot.
    #[must_use]
    pub const fn idle() -> Self {
        Self { deadline: None }
    }

    /// Arms the slot to fire `after` from `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    /// Clears the pending deadline, if any.
    pub const fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns the pending deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the deadline if it has passed. Returns `true` exactly once per arming.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of the given deadlines.
#[must_use]
pub fn earliest(slots: &[&TimerSlot]) -> Option<Instant> {
    slots.iter().filter_map(|slot| slot.deadline()).min()
}
