//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] centralized settings for one supervisor.
//!
//! ## Sentinel values
//! - `deadline = 0s` → no deadline timer

use std::time::Duration;

/// Configuration for a [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `deadline`: Group lifetime limit; when it elapses the group is stopped (`0s` = none)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Deadline after which the group is stopped, measured from `start()`.
    ///
    /// The deadline only triggers the normal stop path; it does not bound how
    /// long units take to return once stopping.
    pub deadline: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns the deadline as an `Option`.
    ///
    /// - `None` → no deadline timer
    /// - `Some(d)` → the group is stopped `d` after start
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.deadline == Duration::ZERO {
            None
        } else {
            Some(self.deadline)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with the given deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `deadline = 0s` (no deadline)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            deadline: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}
