//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: unit tasks, the shutdown listener, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's forwarder (fans out to `SubscriberSet`) and
//!   anyone holding a receiver from [`Supervisor::events`](crate::Supervisor::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
