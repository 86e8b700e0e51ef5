//! # Per-unit handle: run and stop one unit with panic isolation.
//!
//! [`UnitHandle`] wraps one registered [`Unit`] with its name, its child
//! cancellation token and its captured-panic slot. It classifies every run
//! into a [`UnitOutcome`] and publishes the matching event.
//!
//! ## Event flow
//! ```text
//! run():   publish UnitStarting → unit.run() → Ok       → publish UnitStopped   → Completed
//!                                            → Err(e)   → publish UnitFailed    → Failed(e)
//!                                            → panic    → publish UnitPanicked  → Panicked(payload)
//!
//! stop():  publish StopRequested → unit.request_stop() → child.cancel()
//!                                      └─ panic → publish UnitPanicked, payload returned
//! ```
//!
//! ## Rules
//! - `bind` derives the child token from the group token and hands it to the unit (once)
//! - `run` and `stop` never unwind: panics are caught with `catch_unwind`
//! - The child token is cancelled after `request_stop` returns, even if it panicked

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::fault::{PanicPayload, panic_message};
use crate::error::UnitError;
use crate::events::{Bus, Event, EventKind};
use crate::units::UnitRef;

/// How one unit's `run` ended.
pub(crate) enum UnitOutcome {
    /// `run` returned `Ok(())`.
    Completed,
    /// `run` returned an error.
    Failed(UnitError),
    /// `run` panicked; carries the original payload.
    Panicked(PanicPayload),
}

impl UnitOutcome {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            UnitOutcome::Completed => "completed",
            UnitOutcome::Failed(_) => "failed",
            UnitOutcome::Panicked(_) => "panicked",
        }
    }
}

/// One registered unit.
pub(crate) struct UnitHandle {
    name: Arc<str>,
    unit: UnitRef,
    token: OnceLock<CancellationToken>,
    panicked: OnceLock<String>,
}

impl UnitHandle {
    pub(crate) fn new(name: Arc<str>, unit: UnitRef) -> Self {
        Self {
            name,
            unit,
            token: OnceLock::new(),
            panicked: OnceLock::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Message of the first panic caught in this unit, if any.
    pub(crate) fn panicked(&self) -> Option<&str> {
        self.panicked.get().map(String::as_str)
    }

    /// Derives the unit's child token from `group` and binds it to the unit.
    pub(crate) fn bind(&self, group: &CancellationToken) {
        let child = group.child_token();
        if self.token.set(child.clone()).is_ok() {
            self.unit.bind_cancellation(child);
        }
    }

    /// Runs the unit to completion, catching panics.
    pub(crate) async fn run(&self, bus: &Bus) -> UnitOutcome {
        bus.publish(Event::new(EventKind::UnitStarting).with_unit(Arc::clone(&self.name)));

        let res = AssertUnwindSafe(self.unit.run()).catch_unwind().await;
        match res {
            Ok(Ok(())) => {
                tracing::debug!(unit = %self.name, "unit stopped");
                bus.publish(Event::new(EventKind::UnitStopped).with_unit(Arc::clone(&self.name)));
                UnitOutcome::Completed
            }
            Ok(Err(err)) => {
                tracing::error!(unit = %self.name, error = %err, "unit failed");
                bus.publish(
                    Event::new(EventKind::UnitFailed)
                        .with_unit(Arc::clone(&self.name))
                        .with_reason(err.to_string()),
                );
                UnitOutcome::Failed(err)
            }
            Err(payload) => {
                self.capture_panic(payload.as_ref(), bus);
                UnitOutcome::Panicked(payload)
            }
        }
    }

    /// Asks the unit to stop, then cancels its child token.
    ///
    /// Returns the panic payload if `request_stop` panicked.
    pub(crate) async fn stop(&self, bus: &Bus) -> Option<PanicPayload> {
        tracing::debug!(unit = %self.name, "requesting stop");
        bus.publish(Event::new(EventKind::StopRequested).with_unit(Arc::clone(&self.name)));

        let res = AssertUnwindSafe(self.unit.request_stop())
            .catch_unwind()
            .await;
        if let Some(token) = self.token.get() {
            token.cancel();
        }

        match res {
            Ok(()) => None,
            Err(payload) => {
                self.capture_panic(payload.as_ref(), bus);
                Some(payload)
            }
        }
    }

    fn capture_panic(&self, payload: &(dyn std::any::Any + Send), bus: &Bus) {
        let info = panic_message(payload);
        tracing::error!(unit = %self.name, panic = %info, "unit panicked");
        bus.publish(
            Event::new(EventKind::UnitPanicked)
                .with_unit(Arc::clone(&self.name))
                .with_reason(info.as_str()),
        );
        let _ = self.panicked.set(info);
    }
}
