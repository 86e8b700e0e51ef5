//! # Logging subscriber.
//!
//! [`LogWriter`] renders events through `tracing` under the `groupvisor` target.
//!
//! ## Output format
//! ```text
//! [starting] unit=http
//! [failed] unit=http err="bind: address in use"
//! [panicked] unit=worker info="index out of bounds"
//! [stop-requested] unit=http
//! [shutdown-requested] reason=deadline
//! [stopped] unit=worker
//! [all-stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::UnitStarting => {
                tracing::info!(target: "groupvisor", seq = e.seq, "[starting] unit={unit}");
            }
            EventKind::UnitStopped => {
                tracing::info!(target: "groupvisor", seq = e.seq, "[stopped] unit={unit}");
            }
            EventKind::UnitFailed => {
                tracing::warn!(target: "groupvisor", seq = e.seq, "[failed] unit={unit} err={reason:?}");
            }
            EventKind::UnitPanicked => {
                tracing::error!(target: "groupvisor", seq = e.seq, "[panicked] unit={unit} info={reason:?}");
            }
            EventKind::StopRequested => {
                tracing::info!(target: "groupvisor", seq = e.seq, "[stop-requested] unit={unit}");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(
                    target: "groupvisor",
                    seq = e.seq,
                    deadline_ms = ?e.timeout_ms,
                    "[shutdown-requested] reason={reason}"
                );
            }
            EventKind::HookFailed => {
                tracing::error!(target: "groupvisor", seq = e.seq, "[hook-failed] hook={unit} info={reason:?}");
            }
            EventKind::AllStopped => {
                tracing::info!(target: "groupvisor", seq = e.seq, "[all-stopped]");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "groupvisor", "[subscriber-overflow] subscriber={unit} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "groupvisor", "[subscriber-panicked] subscriber={unit} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
