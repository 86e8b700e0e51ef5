//! # Channel-bound unit (`ChannelUnit`)
//!
//! [`ChannelUnit`] wraps a closure `F: Fn(Closed) -> Fut` that receives a
//! read-only "closed" notification channel instead of a token. The channel
//! holds `false` while the unit should keep running and flips to `true` once
//! the unit's cancellation token fires. Semantically identical to
//! [`TokenUnit`](crate::TokenUnit).
//!
//! ```text
//! run():
//!   (tx, rx) = watch::channel(false)
//!   select {
//!     f(rx) completes      → return its result
//!     token.cancelled()    → tx.send(true), then keep awaiting f(rx)
//!   }
//! ```
//!
//! ## Example
//! ```rust
//! use groupvisor::{ChannelUnit, Closed, UnitRef};
//!
//! let unit: UnitRef = ChannelUnit::arc(|mut closed: Closed| async move {
//!     let _ = closed.wait_for(|c| *c).await;
//!     Ok(())
//! });
//! # let _ = unit;
//! ```

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::units::unit::Unit;

/// Receiving side of a unit's "closed" notification channel.
///
/// Becomes `true` when the unit must stop. Clone it freely.
pub type Closed = watch::Receiver<bool>;

/// Unit driven by a closed-notification channel.
pub struct ChannelUnit<F> {
    token: OnceLock<CancellationToken>,
    f: F,
}

impl<F, Fut> ChannelUnit<F>
where
    F: Fn(Closed) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    /// Creates a new channel-bound unit.
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
impl<F, Fut> Unit for ChannelUnit<F>
where
    F: Fn(Closed) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn bind_cancellation(&self, token: CancellationToken) {
        let _ = self.token.set(token);
    }

    async fn run(&self) -> Result<(), UnitError> {
        let token = self.token.get().cloned().ok_or(UnitError::Unbound)?;
        let (tx, rx) = watch::channel(token.is_cancelled());

        let work = (self.f)(rx);
        tokio::pin!(work);

        tokio::select! {
            res = &mut work => return res,
            _ = token.cancelled() => {
                // Receivers may already be gone; the work future decides when to return.
                let _ = tx.send(true);
            }
        }
        work.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_flips_on_cancel() {
        let unit = ChannelUnit::arc(|mut closed: Closed| async move {
            assert!(!*closed.borrow());
            closed
                .wait_for(|c| *c)
                .await
                .map_err(|_| UnitError::fail("sender dropped early"))?;
            Ok(())
        });
        let token = CancellationToken::new();
        unit.bind_cancellation(token.clone());

        let runner = unit.clone();
        let join = tokio::spawn(async move { runner.run().await });
        tokio::task::yield_now().await;
        token.cancel();
        assert!(join.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn already_cancelled_starts_closed() {
        let unit = ChannelUnit::new(|closed: Closed| async move {
            if *closed.borrow() {
                Ok(())
            } else {
                Err(UnitError::fail("expected closed"))
            }
        });
        let token = CancellationToken::new();
        token.cancel();
        unit.bind_cancellation(token);
        assert!(unit.run().await.is_ok());
    }

    #[tokio::test]
    async fn early_return_is_forwarded() {
        let unit = ChannelUnit::new(|_closed: Closed| async { Err(UnitError::fail("early")) });
        unit.bind_cancellation(CancellationToken::new());
        let err = unit.run().await.unwrap_err();
        assert_eq!(err.to_string(), "execution failed: early");
    }
}
