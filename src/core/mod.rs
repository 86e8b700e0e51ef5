//! Runtime core: registration, lifecycle and shutdown.
//!
//! The public entry point is [`Supervisor`], which launches a group of units
//! together, stops them together and aggregates their outcome.
//!
//! Internal modules:
//! - [`supervisor`]: state machine, shutdown listener, result aggregation;
//! - [`handle`]: runs and stops one unit with panic isolation and event publishing;
//! - [`hooks`]: pre-start and after-stop callbacks;
//! - [`shutdown`]: cross-platform OS signal listening;
//! - [`fault`]: captured panics and their replay on waiters;
//! - [`registry`]: insertion-ordered name → value map.

mod builder;
mod config;
mod fault;
mod handle;
mod hooks;
mod registry;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use hooks::HookPhase;
pub use registry::OrderedRegistry;
pub use shutdown::Signal;
pub use supervisor::{State, Supervisor};

pub(crate) use fault::panic_message;
