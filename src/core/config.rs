//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! ## Clamped values
//! - `capacity = 0` → 1 (a channel needs at least one slot)
//! - `bus_capacity = 0` → 1

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `capacity`: slots in the supervised channel (min 1; clamped)
/// - `idle`: idle window of the consumer loop
/// - `grace`: how long producers get to stop once the loop has ended (`0s` = no wait)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
/// - `close_when_drained`: close the channel as soon as every producer has finished
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling clamping across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of items the channel buffers before offers are rejected.
    pub capacity: usize,

    /// Idle window: the loop terminates when no item arrives for this long.
    pub idle: Duration,

    /// Maximum time to wait for producers after the consumer loop has ended.
    ///
    /// Producers are cancelled and the channel is closed first; producers
    /// still running after `grace` are aborted and reported as stuck
    /// (`RuntimeError::GraceExceeded`).
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow listeners that lag behind more than `bus_capacity` events skip
    /// the older ones.
    pub bus_capacity: usize,

    /// Close the channel once every producer has returned.
    ///
    /// With `true` the loop ends with `source-closed` right after the last
    /// producer finishes; with `false` it waits out its idle window and ends
    /// with `idle-timeout`.
    pub close_when_drained: bool,
}

impl Config {
    /// Returns the channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `capacity = 64`
    /// - `idle = 1s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `close_when_drained = false`
    fn default() -> Self {
        Self {
            capacity: 64,
            idle: Duration::from_secs(1),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            close_when_drained: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacities_are_clamped() {
        let cfg = Config {
            capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
