//! # Daily eligibility: a 24h window clamped into hour-of-day bounds.
//!
//! A daily task is a periodic task with a fixed 24h period whose window is
//! additionally constrained to an `[hour_min, hour_max)` range on the day
//! after the last run:
//!
//! - the window opens no earlier than `hour_min:00` of that day;
//! - the forced run lands no later than 30 minutes before `hour_max:00`,
//!   so it completes before the hour range closes.
//!
//! When the window has been missed entirely (a long outage), `in_window`
//! still reports true while the wall clock is inside the hour range, so a
//! late catch-up run stays within the operator's chosen hours.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use super::periodic::{self, Periodic};
use super::schedule::Window;

/// Parameters of a daily task: hour-of-day bounds and window fractions.
///
/// Hours are kept in `0..=23` and ordered; fractions default to 0.5–1.5 of
/// the 24h period.
#[derive(Clone, Copy, Debug)]
pub struct Daily {
    /// First hour of the day (inclusive) the task may run in.
    pub hour_min: u8,
    /// Hour of the day (exclusive) by which the run must have started.
    pub hour_max: u8,
    /// Window start as a fraction of the 24h period.
    pub window_min: f32,
    /// Window end as a fraction of the 24h period.
    pub window_max: f32,
}

impl Daily {
    /// The fixed period of a daily task.
    pub const PERIOD: Duration = Duration::from_secs(86_400);

    /// Creates a daily policy covering the whole day (hours 0–23).
    pub fn new() -> Self {
        Self {
            hour_min: 0,
            hour_max: 23,
            window_min: 0.5,
            window_max: 1.5,
        }
    }

    /// Returns the policy restricted to the given hour-of-day bounds.
    ///
    /// Hours are clamped into `0..=23` and ordered.
    pub fn with_hours(mut self, min: u8, max: u8) -> Self {
        let (min, max) = (min.min(23), max.min(23));
        self.hour_min = min.min(max);
        self.hour_max = min.max(max);
        self
    }

    /// Returns the policy with the given window fractions, ordered.
    pub fn with_window(mut self, min: f32, max: f32) -> Self {
        self.window_min = min.min(max);
        self.window_max = min.max(max);
        self
    }

    /// Derives the elapsed-time window: the 24h periodic window, clamped
    /// into the hour bounds on the day after `last_run`.
    pub fn compute_window(&self, last_run: DateTime<Utc>) -> Window {
        let base = Periodic {
            period: Self::PERIOD,
            window_min: self.window_min,
            window_max: self.window_max,
        };
        let mut w = base.compute_window();
        let day = (last_run + TimeDelta::days(1)).date_naive();

        // window opens no earlier than hour_min:00 on the day after the run
        if let Some(open) = day.and_hms_opt(u32::from(self.hour_min), 0, 0) {
            let open = open.and_utc();
            if last_run + w.min < open {
                w.min = open - last_run;
            }
        }

        // the forced run must start before the hour range closes; keep a
        // 30 minute buffer ahead of hour_max:00
        if let Some(close) = day.and_hms_opt(u32::from(self.hour_max), 0, 0) {
            let close = close.and_utc() - TimeDelta::minutes(30);
            if last_run + w.max > close {
                w.max = close - last_run;
            }
        }

        if w.max < w.min {
            w.min = w.max;
        }
        w
    }

    /// In-window test with late-run catch-up: past the window, the task is
    /// still considered in-window while the wall-clock hour lies inside the
    /// hour bounds.
    pub(crate) fn in_window(
        &self,
        now: DateTime<Utc>,
        last_run: DateTime<Utc>,
        window: &Window,
    ) -> bool {
        if periodic::in_window(window, now - last_run) {
            return true;
        }
        let hour = now.hour() as u8;
        periodic::past_window(window, now - last_run)
            && self.hour_min <= hour
            && hour < self.hour_max
    }
}

impl Default for Daily {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_upper_bound_clamps_to_half_hour_before_close() {
        // last run on day D at 14:00, hour window (2, 6): the forced run
        // must land no later than D+1 05:30
        let last_run = at(2024, 3, 10, 14, 0);
        let w = Daily::new().with_hours(2, 6).compute_window(last_run);
        assert_eq!(last_run + w.max, at(2024, 3, 11, 5, 30));
    }

    #[test]
    fn test_upper_bound_unclamped_when_already_inside() {
        // last run at 00:00 with the full-day default: 1.5 days later is
        // D+1 12:00, well before the 22:30 close
        let last_run = at(2024, 3, 10, 0, 0);
        let w = Daily::new().compute_window(last_run);
        assert_eq!(last_run + w.max, at(2024, 3, 11, 12, 0));
    }

    #[test]
    fn test_lower_bound_pulled_forward_to_opening_hour() {
        // last run at 04:00, hours (6, 23): the unadjusted window would
        // open at 16:00 the same day, before D+1 06:00
        let last_run = at(2024, 3, 10, 4, 0);
        let w = Daily::new().with_hours(6, 23).compute_window(last_run);
        assert_eq!(last_run + w.min, at(2024, 3, 11, 6, 0));
    }

    #[test]
    fn test_inverted_clamp_collapses_window() {
        // last run at 23:00 with hours (2, 6): the unadjusted open (D+1
        // 11:00) lies past the clamped close (D+1 05:30); the window
        // collapses instead of inverting
        let last_run = at(2024, 3, 10, 23, 0);
        let w = Daily::new().with_hours(2, 6).compute_window(last_run);
        assert_eq!(w.min, w.max);
        assert_eq!(last_run + w.max, at(2024, 3, 11, 5, 30));
    }

    #[test]
    fn test_missed_window_catch_up_inside_hours() {
        let policy = Daily::new().with_hours(2, 6);
        let last_run = at(2024, 3, 1, 0, 0);
        let w = policy.compute_window(last_run);

        // days past the window, 03:00 wall clock: catch-up applies
        assert!(policy.in_window(at(2024, 3, 5, 3, 0), last_run, &w));
        // same lateness at 07:00: outside the hour bounds
        assert!(!policy.in_window(at(2024, 3, 5, 7, 0), last_run, &w));
        // hour_max is exclusive
        assert!(!policy.in_window(at(2024, 3, 5, 6, 0), last_run, &w));
    }

    #[test]
    fn test_hours_clamped_and_ordered() {
        let d = Daily::new().with_hours(30, 4);
        assert_eq!(d.hour_min, 4);
        assert_eq!(d.hour_max, 23);
    }
}
