//! # Event subscribers for the groupvisor runtime.
//!
//! ## Architecture
//! ```text
//! unit task ── publish(Event) ──► Bus ──► forwarder ──► SubscriberSet::emit(&Event)
//!                                                          ┌─────────┼─────────┐
//!                                                          ▼         ▼         ▼
//!                                                      [queue 1] [queue 2] [queue N]
//!                                                          │         │         │
//!                                                       on_event  on_event  on_event
//! ```
//!
//! Implement [`Subscribe`] for metrics, alerting or audit trails. The optional
//! [`LogWriter`] (feature `logging`) renders events through `tracing`.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
