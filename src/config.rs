//! # Global runtime configuration.
//!
//! [`Config`] defines the keeper's behavior: tick cadence, event bus
//! capacity, shutdown grace period, and the seed for the probabilistic
//! eligibility draws.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use upkeep::Config;
//!
//! let mut cfg = Config::default();
//! cfg.tick_interval = Duration::from_secs(30);
//! cfg.grace = Duration::from_secs(10);
//!
//! assert_eq!(cfg.tick_interval, Duration::from_secs(30));
//! ```

use std::time::Duration;

/// Global configuration for the keeper runtime.
///
/// Controls tick cadence, bus capacity, shutdown grace, and RNG seeding.
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval between eligibility passes. The probabilistic window
    /// predicate is evaluated once per tick, so this bounds scheduling
    /// precision. `Duration::ZERO` disables the internal ticker entirely;
    /// the caller then drives [`Keeper::tick`](crate::Keeper::tick) itself.
    pub tick_interval: Duration,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Maximum time `shutdown()` waits for workers to finish their current
    /// item before reporting them as stuck.
    pub grace: Duration,
    /// Seed for the eligibility RNG. `None` seeds from the OS, which is what
    /// production wants; tests pin a seed for deterministic draws.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `tick_interval = 60s`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    /// - `rng_seed = None` (seeded from the OS)
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
            rng_seed: None,
        }
    }
}
