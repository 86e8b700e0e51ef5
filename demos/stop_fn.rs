//! # Example: stop_fn
//!
//! A callback-pair unit (a fake TCP-ish listener) stopped by a sibling failure.
//!
//! Demonstrates how to:
//! - Pair a run closure with a stop closure using [`StopFnUnit`].
//! - Observe that one failing unit stops every other unit.
//! - Read the aggregated error and the full failure list.
//!
//! ## Flow
//! ```text
//! Supervisor::run()
//!     ├─► spawn listener (waits on Notify), flaky (fails after 1s)
//!     ├─► flaky returns Err ─► shared token cancelled
//!     ├─► listener.request_stop() ─► Notify ─► listener returns
//!     └─► run() returns Err(UnitFailed{unit="flaky"})
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example stop_fn
//! ```

use std::sync::Arc;
use std::time::Duration;

use groupvisor::{StopFnUnit, Supervisor, SupervisorError, TokenUnit, UnitError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let sup = Supervisor::default();

    // 1. A "server" that only stops when told to
    let shutdown = Arc::new(Notify::new());
    let (wait, wake) = (Arc::clone(&shutdown), shutdown);
    sup.register_unit(
        "listener",
        StopFnUnit::arc(
            move || {
                let wait = Arc::clone(&wait);
                async move {
                    println!("[listener] accepting");
                    wait.notified().await;
                    println!("[listener] closed");
                    Ok(())
                }
            },
            move || {
                println!("[listener] stop requested");
                wake.notify_one();
                async {}
            },
        ),
    );

    // 2. A unit that gives up after a while
    sup.register_unit(
        "flaky",
        TokenUnit::arc(|token: CancellationToken| async move {
            tokio::select! {
                _ = token.cancelled() => Ok(()),
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    Err(UnitError::fail("upstream unreachable"))
                }
            }
        }),
    );

    // 3. The failure stops the listener and is reported here
    match sup.run().await {
        Ok(()) => println!("group finished cleanly"),
        Err(SupervisorError::UnitFailed { unit, source }) => {
            println!("unit {unit} failed: {}", source.as_message());
        }
        Err(other) => return Err(other.into()),
    }
    for failure in sup.failures() {
        println!("recorded: [{}] {failure}", failure.as_label());
    }
    Ok(())
}
