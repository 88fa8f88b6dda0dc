//! # Periodic eligibility: the probabilistic-window predicate.
//!
//! A periodic task declares a period `P` and window fractions `[a, b]`.
//! Relative to its last run it is:
//!
//! ```text
//! elapsed < a·P          never eligible
//! a·P <= elapsed <= b·P  probabilistically eligible (see below)
//! elapsed > b·P          force-eligible (hard deadline)
//! ```
//!
//! ## The probabilistic window
//! Let `p(t) = 1 − (t − min) / (max − min)` — the probability that the task
//! *should not yet* have fired, decaying linearly from 1 at the window start
//! to 0 at the window end. The predicate is evaluated once per tick; to make
//! the *cumulative* probability of having fired by time `t` equal `1 − p(t)`,
//! each tick draws with the conditional probability of firing now given that
//! no earlier tick fired:
//!
//! ```text
//! cond = p(t) / current_prob        // probability of NOT firing this check
//! fire with probability 1 − cond
//! current_prob = p(t)               // carried to the next tick
//! ```
//!
//! Every individual draw has low firing probability, but certainty is
//! reached by `max`: past the window the check returns true without
//! consulting the random source. The jitter spreads load across ticks and
//! across cooperating instances instead of firing at a fixed offset.
//!
//! ## Anomalies
//! - `elapsed < 0` — the clock moved backwards; not eligible, never forces.
//! - `current_prob < p(t)` — probability state should only decrease inside
//!   one window; not eligible this tick, state untouched. Heals on a later
//!   tick once the recomputed `p` falls below the carried value.

use std::time::Duration;

use chrono::TimeDelta;
use rand::Rng;

use super::schedule::Window;

/// Parameters of a periodic task: period and window fractions.
///
/// The window fractions are kept ordered (`window_min <= window_max`).
#[derive(Clone, Copy, Debug)]
pub struct Periodic {
    /// Nominal interval between runs.
    pub period: Duration,
    /// Window start as a fraction of `period`.
    pub window_min: f32,
    /// Window end as a fraction of `period`.
    pub window_max: f32,
}

impl Periodic {
    /// Creates a periodic policy with the default window fractions 0.5–1.5.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            window_min: 0.5,
            window_max: 1.5,
        }
    }

    /// Returns the policy with the given window fractions, ordered.
    pub fn with_window(mut self, min: f32, max: f32) -> Self {
        self.window_min = min.min(max);
        self.window_max = min.max(max);
        self
    }

    /// Derives the absolute elapsed-time window from period × fractions.
    pub fn compute_window(&self) -> Window {
        let period = self.period.as_secs_f64();
        Window {
            min: TimeDelta::seconds((period * f64::from(self.window_min)) as i64),
            max: TimeDelta::seconds((period * f64::from(self.window_max)) as i64),
        }
    }
}

/// Evaluates the periodic predicate for one tick.
///
/// `current_prob` carries the probability state between ticks within one
/// window; callers reset it to 1.0 whenever the window is recomputed.
pub(crate) fn check_eligible(
    window: &Window,
    elapsed: TimeDelta,
    current_prob: &mut f64,
    rng: &mut impl Rng,
) -> bool {
    if elapsed < TimeDelta::zero() {
        // clock went backwards; skip quietly rather than forcing a run
        return false;
    }
    if elapsed < window.min {
        // insufficient time elapsed to test
        return false;
    }
    if elapsed > window.max {
        // too much time has passed, force the run
        return true;
    }
    if window.max <= window.min {
        // degenerate window (hour-of-day clamping collapsed it)
        return true;
    }

    let span = (window.max - window.min).num_seconds() as f64;
    let into = (elapsed - window.min).num_seconds() as f64;
    let prob = 1.0 - into / span;

    if *current_prob < prob {
        // probability state should only decrease within one window
        return false;
    }

    // conditional probability of not firing on this check, given that no
    // earlier check fired; should be nearly one
    let conditional = prob / *current_prob;
    let fired = rng.random::<f64>() > conditional;
    *current_prob = prob;
    fired
}

/// Returns true iff `elapsed` lies strictly inside the window.
pub(crate) fn in_window(window: &Window, elapsed: TimeDelta) -> bool {
    if elapsed < TimeDelta::zero() {
        return false;
    }
    elapsed > window.min && elapsed < window.max
}

/// Returns true iff `elapsed` lies strictly past the window's upper bound.
pub(crate) fn past_window(window: &Window, elapsed: TimeDelta) -> bool {
    elapsed > window.max
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn window(min_secs: i64, max_secs: i64) -> Window {
        Window {
            min: TimeDelta::seconds(min_secs),
            max: TimeDelta::seconds(max_secs),
        }
    }

    #[test]
    fn test_compute_window_scales_period() {
        let w = Periodic::new(Duration::from_secs(3600)).compute_window();
        assert_eq!(w.min, TimeDelta::seconds(1800));
        assert_eq!(w.max, TimeDelta::seconds(5400));
    }

    #[test]
    fn test_with_window_orders_fractions() {
        let p = Periodic::new(Duration::from_secs(60)).with_window(1.2, 0.8);
        assert_eq!(p.window_min, 0.8);
        assert_eq!(p.window_max, 1.2);
    }

    #[test]
    fn test_below_window_never_fires_regardless_of_rng() {
        let w = window(600, 1200);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut prob = 1.0;
            assert!(!check_eligible(&w, TimeDelta::seconds(599), &mut prob, &mut rng));
            assert_eq!(prob, 1.0, "state must not change below the window");
        }
    }

    #[test]
    fn test_past_window_always_fires_regardless_of_rng() {
        let w = window(600, 1200);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut prob = 1.0;
            assert!(check_eligible(&w, TimeDelta::seconds(1201), &mut prob, &mut rng));
        }
    }

    #[test]
    fn test_negative_elapsed_is_soft_anomaly() {
        let w = window(600, 1200);
        let mut rng = StdRng::seed_from_u64(1);
        let mut prob = 1.0;
        assert!(!check_eligible(&w, TimeDelta::seconds(-5), &mut prob, &mut rng));
        assert_eq!(prob, 1.0);
    }

    #[test]
    fn test_degenerate_window_forces_at_bound() {
        let w = window(600, 600);
        let mut rng = StdRng::seed_from_u64(1);
        let mut prob = 1.0;
        assert!(check_eligible(&w, TimeDelta::seconds(600), &mut prob, &mut rng));
    }

    #[test]
    fn test_probability_state_tracks_p() {
        let w = window(600, 1200);
        let mut rng = StdRng::seed_from_u64(3);
        let mut prob = 1.0;
        // elapsed 750s into a 600..1200 window: p = 1 - 150/600 = 0.75
        check_eligible(&w, TimeDelta::seconds(750), &mut prob, &mut rng);
        assert!((prob - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_bookkeeping_anomaly_skips_and_preserves_state() {
        let w = window(600, 1200);
        let mut rng = StdRng::seed_from_u64(3);
        // carried probability below the recomputed p: corrupted state
        let mut prob = 0.3;
        assert!(!check_eligible(&w, TimeDelta::seconds(750), &mut prob, &mut rng));
        assert_eq!(prob, 0.3, "anomaly branch must not update state");
        // once elapsed advances far enough that p drops under the carried
        // value, the check proceeds normally again and updates the state
        let mut prob2 = 0.3;
        check_eligible(&w, TimeDelta::seconds(1080), &mut prob2, &mut rng);
        assert!((prob2 - 0.2).abs() < 1e-9, "state heals once p falls below carry");
    }

    /// Walks tick sequences through the window and checks that the
    /// empirical cumulative trigger probability by elapsed time `t`
    /// converges to `1 − p(t)`.
    #[test]
    fn test_cumulative_trigger_probability_converges() {
        let w = window(600, 1200);
        let tick = 60;
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);

        for (target, expected) in [(900_i64, 0.5_f64), (1140, 0.9)] {
            let trials = 4000;
            let mut fired_by_target = 0;
            for _ in 0..trials {
                let mut prob = 1.0;
                let mut elapsed = 600;
                while elapsed <= target {
                    if check_eligible(&w, TimeDelta::seconds(elapsed), &mut prob, &mut rng) {
                        fired_by_target += 1;
                        break;
                    }
                    elapsed += tick;
                }
            }
            let empirical = f64::from(fired_by_target) / f64::from(trials);
            assert!(
                (empirical - expected).abs() < 0.05,
                "elapsed {target}: empirical {empirical} vs expected {expected}"
            );
        }
    }

    #[test]
    fn test_in_window_is_strict() {
        let w = window(600, 1200);
        assert!(!in_window(&w, TimeDelta::seconds(600)));
        assert!(in_window(&w, TimeDelta::seconds(601)));
        assert!(in_window(&w, TimeDelta::seconds(1199)));
        assert!(!in_window(&w, TimeDelta::seconds(1200)));
        assert!(!in_window(&w, TimeDelta::seconds(-1)));
    }

    #[test]
    fn test_past_window_is_strict() {
        let w = window(600, 1200);
        assert!(!past_window(&w, TimeDelta::seconds(1200)));
        assert!(past_window(&w, TimeDelta::seconds(1201)));
    }
}
