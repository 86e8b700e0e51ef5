//! # groupvisor
//!
//! **Groupvisor** is a process-group lifecycle supervisor for async Rust.
//!
//! It starts a set of independently defined long-running units together,
//! stops all of them as soon as one exits or an external trigger fires
//! (explicit stop, OS signal, deadline, parent cancellation), and reports a
//! single aggregated outcome to the waiting caller.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  StopFnUnit  │   │  TokenUnit   │   │ ChannelUnit  │
//!     │ (run + stop) │   │   (token)    │   │ (closed rx)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (Ready ─► Started ─► Stopped)                         │
//! │  - OrderedRegistry of units, pre-start and after-stop hooks       │
//! │  - shared CancellationToken (child of an optional parent)         │
//! │  - first error / first panic slots, finished latch                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  UnitHandle  │   │  UnitHandle  │   │  UnitHandle  │   │
//!     │ (child token)│   │ (child token)│   │ (child token)│   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ UnitStarting     │ UnitStopped      │ UnitPanicked    │ ShutdownRequested
//!      │ UnitFailed       │ StopRequested    │ ...             │ AllStopped
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                     sub1.on   sub2.on   subN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! register_unit / register_hook / register_signal      (Ready only)
//!
//! start()
//!   ├─► PreStart hooks (in order)
//!   ├─► state = Started
//!   ├─► spawn every unit (registration order)
//!   └─► spawn shutdown listener
//!
//! first of { stop(), any unit returns, deadline, OS signal, parent cancel }
//!   ├─► cancel shared token
//!   ├─► request_stop() on every unit, concurrently
//!   ├─► join every unit task
//!   ├─► AfterStop hooks (in order)
//!   └─► state = Stopped, finished latch set
//!
//! wait()  ──► resume first panic | Err(first unit error) | Ok(())
//! ```
//!
//! ## Features
//! | Area               | Description                                                    | Key types / traits                            |
//! |--------------------|----------------------------------------------------------------|-----------------------------------------------|
//! | **Supervision**    | Start, stop and wait for a group of units.                     | [`Supervisor`], [`State`]                     |
//! | **Units**          | Three ready-made unit shapes, or implement the trait yourself. | [`Unit`], [`StopFnUnit`], [`TokenUnit`], [`ChannelUnit`] |
//! | **Hooks**          | Callbacks before start and after every unit stopped.           | [`HookPhase`]                                 |
//! | **Triggers**       | OS signals, deadline, parent token.                            | [`Signal`], [`SupervisorBuilder`]             |
//! | **Subscriber API** | Observe lifecycle events.                                      | [`Subscribe`], [`Event`], [`EventKind`]       |
//! | **Errors**         | Typed errors for units and the aggregated outcome.             | [`UnitError`], [`SupervisorError`]            |
//! | **Configuration**  | Deadline and bus sizing.                                       | [`SupervisorConfig`]                          |
//! | **Default group**  | Process-wide instance with free functions.                     | [`global`]                                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use groupvisor::{ChannelUnit, Closed, Supervisor, SupervisorConfig, TokenUnit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig::default().with_deadline(Duration::from_millis(50));
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn groupvisor::Subscribe>> = vec![Arc::new(groupvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn groupvisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(cfg).with_subscribers(subs).build();
//!
//!     sup.register_unit("ticker", TokenUnit::arc(|token: CancellationToken| async move {
//!         token.cancelled().await;
//!         Ok(())
//!     }))
//!     .register_unit("watcher", ChannelUnit::arc(|mut closed: Closed| async move {
//!         let _ = closed.wait_for(|c| *c).await;
//!         Ok(())
//!     }))
//!     .after_stop_hook("flush", || println!("all units stopped"));
//!
//!     // the deadline stops the group
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod subscribers;
mod units;

pub mod global;

// ---- Public re-exports ----

pub use core::{
    HookPhase, OrderedRegistry, Signal, State, Supervisor, SupervisorBuilder, SupervisorConfig,
};
pub use error::{SupervisorError, UnitError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use units::{ChannelUnit, Closed, StopFnUnit, TokenUnit, Unit, UnitRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
