//! # Cancellation-bound unit (`TokenUnit`)
//!
//! [`TokenUnit`] wraps a closure `F: Fn(CancellationToken) -> Fut`. The closure
//! receives the unit's bound token and must return once it is cancelled.
//! `request_stop` is a no-op: cancellation alone drives shutdown.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use groupvisor::{TokenUnit, UnitRef, UnitError};
//!
//! let ticker: UnitRef = TokenUnit::arc(|token: CancellationToken| async move {
//!     while !token.is_cancelled() {
//!         tokio::select! {
//!             _ = token.cancelled() => break,
//!             _ = tokio::time::sleep(Duration::from_millis(250)) => { /* tick */ }
//!         }
//!     }
//!     Ok::<_, UnitError>(())
//! });
//! # let _ = ticker;
//! ```

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::units::unit::Unit;

/// Unit driven by a [`CancellationToken`].
pub struct TokenUnit<F> {
    token: OnceLock<CancellationToken>,
    f: F,
}

impl<F, Fut> TokenUnit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    /// Creates a new cancellation-bound unit.
    pub fn new(f: F) -> Self {
        Self {
            token: OnceLock::new(),
            f,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Unit for TokenUnit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn bind_cancellation(&self, token: CancellationToken) {
        let _ = self.token.set(token);
    }

    async fn run(&self) -> Result<(), UnitError> {
        let token = self.token.get().cloned().ok_or(UnitError::Unbound)?;
        (self.f)(token).await
    }
}
