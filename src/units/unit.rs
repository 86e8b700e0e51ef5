//! # Unit abstraction.
//!
//! A [`Unit`] is one long-running workload supervised as part of a group.
//! The supervisor drives every unit through the same three capabilities:
//!
//! ```text
//! start():   bind_cancellation(child_token)   (exactly once, before launch)
//!            spawn(run())                      (one task per unit)
//! shutdown:  request_stop()                    (exactly once, concurrently with siblings)
//!            child_token.cancel()
//! ```
//!
//! Standard shapes are provided by [`StopFnUnit`](crate::StopFnUnit),
//! [`TokenUnit`](crate::TokenUnit) and [`ChannelUnit`](crate::ChannelUnit);
//! implement the trait directly for anything else.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;

/// Shared handle to a unit (`Arc<dyn Unit>`).
pub type UnitRef = Arc<dyn Unit>;

/// # Supervised, stoppable unit of work.
///
/// # Example
/// ```
/// use std::sync::OnceLock;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use groupvisor::{Unit, UnitError};
///
/// #[derive(Default)]
/// struct Ticker {
///     token: OnceLock<CancellationToken>,
/// }
///
/// #[async_trait]
/// impl Unit for Ticker {
///     fn bind_cancellation(&self, token: CancellationToken) {
///         let _ = self.token.set(token);
///     }
///
///     async fn run(&self) -> Result<(), UnitError> {
///         let token = self.token.get().ok_or(UnitError::Unbound)?;
///         token.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Unit: Send + Sync + 'static {
    /// Stores the unit's cancellation token so `run` can observe it.
    ///
    /// Called once by the supervisor at start, before `run`.
    fn bind_cancellation(&self, token: CancellationToken);

    /// Executes the workload until it completes or observes cancellation.
    ///
    /// An `Err` is recorded as the group's failure (first one wins). Returning,
    /// for any reason, triggers shutdown of the whole group.
    async fn run(&self) -> Result<(), UnitError>;

    /// Asks the workload to stop.
    ///
    /// Called once during group shutdown, concurrently with the other units.
    /// Must return promptly. Defaults to a no-op for units driven purely by
    /// their cancellation token.
    async fn request_stop(&self) {}
}
