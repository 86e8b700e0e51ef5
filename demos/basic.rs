//! # Example: basic
//!
//! Two cancellation-bound units and one channel-bound unit under a deadline.
//!
//! Demonstrates how to:
//! - Register [`TokenUnit`] and [`ChannelUnit`] units.
//! - Attach pre-start and after-stop hooks.
//! - Let a deadline stop the whole group.
//!
//! ## Flow
//! ```text
//! Supervisor::run()
//!     ├─► pre-start hook "banner"
//!     ├─► spawn ticker, heartbeat, watcher
//!     ├─► deadline (2s) elapses
//!     │     └─► publish(ShutdownRequested{reason=deadline})
//!     ├─► every unit observes cancellation and returns
//!     └─► after-stop hook "summary"
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use groupvisor::{ChannelUnit, Closed, Supervisor, SupervisorConfig, TokenUnit, UnitRef};
use tokio_util::sync::CancellationToken;

fn ticker(name: &'static str, every: Duration, ticks: Arc<AtomicU64>) -> UnitRef {
    TokenUnit::arc(move |token: CancellationToken| {
        let ticks = Arc::clone(&ticks);
        async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(every) => {
                        let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                        println!("[{name}] tick {n}");
                    }
                }
            }
            println!("[{name}] cancelled");
            Ok(())
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Stop the group after two seconds
    let cfg = SupervisorConfig::default().with_deadline(Duration::from_secs(2));
    let sup = Supervisor::new(cfg);
    let ticks = Arc::new(AtomicU64::new(0));

    // 2. Units
    sup.register_unit("ticker", ticker("ticker", Duration::from_millis(300), Arc::clone(&ticks)))
        .register_unit("heartbeat", ticker("heartbeat", Duration::from_millis(700), Arc::clone(&ticks)))
        .register_unit(
            "watcher",
            ChannelUnit::arc(|mut closed: Closed| async move {
                println!("[watcher] waiting for close");
                let _ = closed.wait_for(|c| *c).await;
                println!("[watcher] closed");
                Ok(())
            }),
        );

    // 3. Hooks
    sup.pre_start_hook("banner", || println!("[hook] starting group"));
    {
        let ticks = Arc::clone(&ticks);
        sup.after_stop_hook("summary", move || {
            println!("[hook] group stopped after {} ticks", ticks.load(Ordering::Relaxed));
        });
    }

    // 4. Start and wait for the deadline
    sup.run().await?;
    println!("done: stopped={}", sup.is_stopped());
    Ok(())
}
