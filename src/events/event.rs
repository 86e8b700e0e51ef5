//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Unit events**: unit lifecycle (starting, stopped, failed, panicked, stop requested)
//! - **Group events**: shutdown requested, hooks, all units stopped
//! - **Subscriber events**: delivery problems inside the fan-out itself
//!
//! The [`Event`] struct carries additional metadata such as timestamps, unit
//! name and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use groupvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::UnitFailed)
//!     .with_unit("http")
//!     .with_reason("bind: address in use");
//!
//! assert_eq!(ev.kind, EventKind::UnitFailed);
//! assert_eq!(ev.unit.as_deref(), Some("http"));
//! assert_eq!(ev.reason.as_deref(), Some("bind: address in use"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Unit lifecycle events ===
    /// Unit task launched.
    ///
    /// Sets:
    /// - `unit`: unit name
    UnitStarting,

    /// Unit `run` returned `Ok(())`.
    ///
    /// Sets:
    /// - `unit`: unit name
    UnitStopped,

    /// Unit `run` returned an error.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `reason`: error message
    UnitFailed,

    /// Unit panicked inside `run` or `request_stop`.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `reason`: panic message
    UnitPanicked,

    /// `request_stop` issued for a unit.
    ///
    /// Sets:
    /// - `unit`: unit name
    StopRequested,

    // === Group events ===
    /// Group shutdown started.
    ///
    /// Sets:
    /// - `reason`: trigger (`cancelled`, `deadline`, or the signal name)
    /// - `timeout_ms`: configured deadline (deadline trigger only)
    ShutdownRequested,

    /// A lifecycle hook panicked.
    ///
    /// Sets:
    /// - `unit`: hook name
    /// - `reason`: panic message
    HookFailed,

    /// All units joined and after-stop hooks ran; the group is stopped.
    AllStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the unit (or hook/subscriber), if applicable.
    pub unit: Option<Arc<str>>,
    /// Human-readable reason (errors, panic messages, shutdown trigger, ...).
    pub reason: Option<Arc<str>>,
    /// Deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            unit: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::UnitStarting);
        let b = Event::new(EventKind::UnitStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_saturates() {
        let ev = Event::new(EventKind::ShutdownRequested).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
