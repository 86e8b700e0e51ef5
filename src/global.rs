//! # Process-wide default supervisor.
//!
//! A lazily created [`Supervisor`] with default configuration, plus free
//! functions that delegate 1:1 to it. Useful for binaries that run one group
//! for their whole lifetime; libraries should create their own instance.
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use groupvisor::{Signal, TokenUnit, global};
//!
//! #[tokio::main]
//! async fn main() {
//!     global::register_signal([Signal::Interrupt, Signal::Terminate]);
//!     global::register_unit("worker", TokenUnit::arc(|token: CancellationToken| async move {
//!         token.cancelled().await;
//!         Ok(())
//!     }));
//!
//!     if let Err(err) = global::run().await {
//!         eprintln!("group failed: {err}");
//!     }
//! }
//! ```

use std::sync::OnceLock;
use std::time::Duration;

use crate::core::{Signal, Supervisor};
use crate::error::SupervisorError;
use crate::units::UnitRef;

static DEFAULT: OnceLock<Supervisor> = OnceLock::new();

/// Returns the process-wide supervisor, creating it on first use.
pub fn default() -> &'static Supervisor {
    DEFAULT.get_or_init(Supervisor::default)
}

/// See [`Supervisor::register_unit`].
pub fn register_unit(name: impl Into<String>, unit: UnitRef) -> &'static Supervisor {
    default().register_unit(name, unit)
}

/// See [`Supervisor::register_signal`].
pub fn register_signal(signals: impl IntoIterator<Item = Signal>) -> &'static Supervisor {
    default().register_signal(signals)
}

/// See [`Supervisor::pre_start_hook`].
pub fn pre_start_hook<F>(name: impl Into<String>, action: F) -> &'static Supervisor
where
    F: FnOnce() + Send + 'static,
{
    default().pre_start_hook(name, action)
}

/// See [`Supervisor::after_stop_hook`].
pub fn after_stop_hook<F>(name: impl Into<String>, action: F) -> &'static Supervisor
where
    F: FnOnce() + Send + 'static,
{
    default().after_stop_hook(name, action)
}

/// See [`Supervisor::start`].
pub fn start() {
    default().start()
}

/// See [`Supervisor::stop`].
pub fn stop() {
    default().stop()
}

/// See [`Supervisor::wait`].
pub async fn wait() -> Result<(), SupervisorError> {
    default().wait().await
}

/// See [`Supervisor::wait_timeout`].
pub async fn wait_timeout(timeout: Duration) -> Result<(), SupervisorError> {
    default().wait_timeout(timeout).await
}

/// See [`Supervisor::run`].
pub async fn run() -> Result<(), SupervisorError> {
    default().run().await
}

/// See [`Supervisor::shutdown`].
pub async fn shutdown() -> Result<(), SupervisorError> {
    default().shutdown().await
}

/// See [`Supervisor::shutdown_timeout`].
pub async fn shutdown_timeout(timeout: Duration) -> Result<(), SupervisorError> {
    default().shutdown_timeout(timeout).await
}

/// See [`Supervisor::error`].
pub fn error() -> Option<SupervisorError> {
    default().error()
}

/// See [`Supervisor::is_stopped`].
pub fn is_stopped() -> bool {
    default().is_stopped()
}
