//! # Example: signals
//!
//! Long-running units stopped by Ctrl-C / SIGTERM, with lifecycle events
//! rendered by the built-in [`LogWriter`] subscriber.
//!
//! Demonstrates how to:
//! - Register OS signals with [`Supervisor::register_signal`].
//! - Plug a subscriber in through [`Supervisor::builder`].
//! - Bound the final wait with [`Supervisor::wait_timeout`].
//!
//! ## Run
//! ```bash
//! cargo run --example signals --features logging
//! # then press Ctrl-C
//! ```

use std::sync::Arc;
use std::time::Duration;

use groupvisor::{
    LogWriter, Signal, Subscribe, Supervisor, SupervisorConfig, SupervisorError, TokenUnit,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_subscribers(subs)
        .build();

    sup.register_signal([Signal::Interrupt, Signal::Terminate]);
    for name in ["ingest", "flush"] {
        sup.register_unit(
            name,
            TokenUnit::arc(move |token: CancellationToken| async move {
                while !token.is_cancelled() {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {
                            tracing::info!(unit = name, "working");
                        }
                    }
                }
                Ok(())
            }),
        );
    }
    sup.after_stop_hook("goodbye", || tracing::info!("all units stopped"));

    sup.start();
    tracing::info!("press Ctrl-C to stop");

    // Poll so the process can report progress while waiting.
    loop {
        match sup.wait_timeout(Duration::from_secs(10)).await {
            Err(err) if err.is_wait_timeout() => tracing::info!("still running"),
            Err(SupervisorError::UnitFailed { unit, source }) => {
                anyhow::bail!("unit {unit} failed: {source}")
            }
            other => return Ok(other?),
        }
    }
}
