//! # Callback-pair unit (`StopFnUnit`)
//!
//! [`StopFnUnit`] pairs a run closure with a separate stop closure. The stop
//! closure is invoked once during group shutdown and is expected to make the
//! run future return (close a listener, flip a flag, send on a channel, ...).
//! The unit ignores its cancellation token: only the stop closure ends it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio::sync::Notify;
//! use groupvisor::{StopFnUnit, UnitRef};
//!
//! let notify = Arc::new(Notify::new());
//! let (wait, wake) = (notify.clone(), notify.clone());
//!
//! let unit: UnitRef = StopFnUnit::arc(
//!     move || {
//!         let wait = wait.clone();
//!         async move {
//!             wait.notified().await;
//!             Ok(())
//!         }
//!     },
//!     move || {
//!         let wake = wake.clone();
//!         async move { wake.notify_one() }
//!     },
//! );
//! # let _ = unit;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::units::unit::Unit;

/// Unit made of a run closure and a stop closure.
pub struct StopFnUnit<R, S> {
    run: R,
    stop: S,
}

impl<R, RF, S, SF> StopFnUnit<R, S>
where
    R: Fn() -> RF + Send + Sync + 'static,
    RF: Future<Output = Result<(), UnitError>> + Send + 'static,
    S: Fn() -> SF + Send + Sync + 'static,
    SF: Future<Output = ()> + Send + 'static,
{
    /// Creates a new callback-pair unit.
    ///
    /// Prefer [`StopFnUnit::arc`] when you immediately need a [`UnitRef`](crate::UnitRef).
    pub fn new(run: R, stop: S) -> Self {
        Self { run, stop }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(run: R, stop: S) -> Arc<Self> {
        Arc::new(Self::new(run, stop))
    }
}

#[async_trait]
impl<R, RF, S, SF> Unit for StopFnUnit<R, S>
where
    R: Fn() -> RF + Send + Sync + 'static,
    RF: Future<Output = Result<(), UnitError>> + Send + 'static,
    S: Fn() -> SF + Send + Sync + 'static,
    SF: Future<Output = ()> + Send + 'static,
{
    fn bind_cancellation(&self, _token: CancellationToken) {}

    async fn run(&self) -> Result<(), UnitError> {
        (self.run)().await
    }

    async fn request_stop(&self) {
        (self.stop)().await
    }
}
