//! # Eligibility schedule: when a maintenance task wants to run.
//!
//! [`Schedule`] is a tagged variant over the three eligibility policies:
//!
//! - [`Schedule::Always`] — eligible on every tick (duplicate-enqueue
//!   prevention still applies via the task's `confirmed` flag);
//! - [`Schedule::Periodic`] — probabilistic window relative to the last run;
//! - [`Schedule::Daily`] — a 24h periodic window additionally clamped into
//!   an hour-of-day range.
//!
//! Each variant provides `compute_window`, `check_eligible`, `in_window`,
//! and `past_window` over explicit state, so the policies stay independently
//! testable and the run-state record needs no virtual dispatch.
//!
//! ## The window
//! A [`Window`] holds the absolute elapsed-time bounds derived from the
//! policy parameters and the last run. Before `min` the task never fires;
//! past `max` it always fires; in between it fires probabilistically so that
//! load spreads across ticks and instances (see
//! [`periodic::check_eligible`](super::periodic)).

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use super::daily::Daily;
use super::periodic::{self, Periodic};

/// Absolute eligibility bounds relative to a task's last run.
///
/// Invariant: `min <= max`. Policy computations clamp to restore the
/// invariant when hour-of-day adjustment would invert the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// Elapsed time before which the task is never eligible.
    pub min: TimeDelta,
    /// Elapsed time past which the task is force-eligible.
    pub max: TimeDelta,
}

impl Window {
    /// The empty window: force-eligible immediately.
    pub fn zero() -> Window {
        Window {
            min: TimeDelta::zero(),
            max: TimeDelta::zero(),
        }
    }
}

/// Eligibility policy for one task.
#[derive(Clone, Debug)]
pub enum Schedule {
    /// Eligible on every tick.
    Always,
    /// Probabilistic window relative to the last run.
    Periodic(Periodic),
    /// 24h window clamped into an hour-of-day range.
    Daily(Daily),
}

impl Schedule {
    /// Computes the eligibility window for a task last run at `last_run`.
    ///
    /// Recomputed whenever `last_run` changes.
    pub fn compute_window(&self, last_run: DateTime<Utc>) -> Window {
        match self {
            Schedule::Always => Window::zero(),
            Schedule::Periodic(p) => p.compute_window(),
            Schedule::Daily(d) => d.compute_window(last_run),
        }
    }

    /// Evaluates the eligibility predicate for this tick.
    ///
    /// `current_prob` is the running probability state carried between
    /// ticks; it is reset to 1.0 whenever the window is recomputed.
    pub(crate) fn check_eligible(
        &self,
        now: DateTime<Utc>,
        last_run: DateTime<Utc>,
        window: &Window,
        current_prob: &mut f64,
        rng: &mut impl Rng,
    ) -> bool {
        match self {
            Schedule::Always => true,
            Schedule::Periodic(_) | Schedule::Daily(_) => {
                periodic::check_eligible(window, now - last_run, current_prob, rng)
            }
        }
    }

    /// Returns true iff `now` falls strictly inside the eligibility window.
    ///
    /// The daily policy additionally reports true when the window has been
    /// missed but the current wall-clock hour still lies inside its
    /// hour-of-day range (late-run catch-up).
    pub fn in_window(
        &self,
        now: DateTime<Utc>,
        last_run: DateTime<Utc>,
        window: &Window,
    ) -> bool {
        match self {
            Schedule::Always => true,
            Schedule::Periodic(_) => periodic::in_window(window, now - last_run),
            Schedule::Daily(d) => d.in_window(now, last_run, window),
        }
    }

    /// Returns true iff `now` lies past the window's upper bound.
    pub fn past_window(
        &self,
        now: DateTime<Utc>,
        last_run: DateTime<Utc>,
        window: &Window,
    ) -> bool {
        match self {
            Schedule::Always => false,
            Schedule::Periodic(_) | Schedule::Daily(_) => {
                periodic::past_window(window, now - last_run)
            }
        }
    }
}
