use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;

use groupvisor::{
    ChannelUnit, Closed, Event, EventKind, Signal, State, StopFnUnit, Subscribe, Supervisor,
    SupervisorConfig, SupervisorError, TokenUnit, Unit, UnitError, UnitRef,
};

const GUARD: Duration = Duration::from_secs(5);

fn waiter() -> UnitRef {
    TokenUnit::arc(|token: CancellationToken| async move {
        token.cancelled().await;
        Ok(())
    })
}

fn message_of(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

// ---------------------------
// Registration
// ---------------------------

#[test]
fn registration_keeps_order_and_counts() {
    let sup = Supervisor::default();
    sup.register_unit("zeta", waiter())
        .register_unit("alpha", waiter())
        .register_unit("mid", waiter());

    assert_eq!(sup.state(), State::Ready);
    assert_eq!(sup.unit_count(), 3);
    assert_eq!(sup.unit_names(), vec!["zeta", "alpha", "mid"]);
    assert!(sup.failures().is_empty());
}

#[test]
#[should_panic(expected = "already registered")]
fn duplicate_unit_name_panics() {
    let sup = Supervisor::default();
    sup.register_unit("same", waiter()).register_unit("same", waiter());
}

#[test]
#[should_panic(expected = "already registered")]
fn duplicate_hook_name_panics() {
    let sup = Supervisor::default();
    sup.after_stop_hook("flush", || {})
        .after_stop_hook("flush", || {});
}

#[test]
fn same_hook_name_in_both_phases_is_allowed() {
    let sup = Supervisor::default();
    sup.pre_start_hook("log", || {}).after_stop_hook("log", || {});
}

#[test]
#[should_panic(expected = "without any units")]
fn start_without_units_panics() {
    Supervisor::default().start();
}

#[test]
#[should_panic(expected = "before the supervisor has started")]
fn stop_before_start_panics() {
    Supervisor::default().stop();
}

#[test]
#[should_panic(expected = "before the supervisor has started")]
fn error_before_start_panics() {
    let _ = Supervisor::default().error();
}

#[tokio::test]
#[should_panic(expected = "before the supervisor has started")]
async fn wait_before_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    let _ = sup.wait().await;
}

#[tokio::test]
#[should_panic(expected = "after the supervisor has started")]
async fn register_after_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();
    sup.register_unit("late", waiter());
}

#[tokio::test]
#[should_panic(expected = "after the supervisor has started")]
async fn second_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();
    sup.start();
}

#[tokio::test]
#[should_panic(expected = "after the supervisor has started")]
async fn pre_start_hook_after_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();
    sup.pre_start_hook("late", || {});
}

#[tokio::test]
#[should_panic(expected = "after the supervisor has started")]
async fn after_stop_hook_after_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();
    sup.after_stop_hook("late", || {});
}

#[tokio::test]
#[should_panic(expected = "after the supervisor has started")]
async fn register_signal_after_start_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();
    sup.register_signal([Signal::User2]);
}

#[test]
fn start_outside_runtime_panics_and_stays_ready() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());

    let res = panic::catch_unwind(AssertUnwindSafe(|| sup.start()));
    let payload = res.expect_err("start needs a runtime");
    assert_eq!(
        message_of(payload.as_ref()),
        Some("start() must be called from within a tokio runtime")
    );
    assert_eq!(sup.state(), State::Ready);
}

#[tokio::test]
async fn pre_start_hook_may_inspect_the_supervisor() {
    let sup = Supervisor::default();
    let seen = Arc::new(AtomicUsize::new(0));

    let observer = sup.clone();
    let counted = Arc::clone(&seen);
    sup.register_unit("waiter", waiter())
        .pre_start_hook("inspect", move || {
            counted.store(observer.unit_count(), Ordering::SeqCst);
            let _ = format!("{observer:?}");
            observer.register_unit("added-by-hook", waiter());
        });

    let started = sup.clone();
    timeout(GUARD, tokio::task::spawn_blocking(move || started.start()))
        .await
        .expect("start should not block on its own lock")
        .expect("start should not panic");

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(sup.state(), State::Started);
    assert_eq!(sup.unit_names(), vec!["waiter", "added-by-hook"]);

    timeout(GUARD, sup.shutdown())
        .await
        .expect("group should stop")
        .expect("no unit failed");
}

#[tokio::test]
#[should_panic(expected = "after one of its pre-start hooks panicked")]
async fn start_after_pre_start_hook_panic_panics() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter())
        .pre_start_hook("explodes", || panic!("hook exploded"));

    let first = panic::catch_unwind(AssertUnwindSafe(|| sup.start()));
    let payload = first.expect_err("hook panic reaches the caller");
    assert_eq!(message_of(payload.as_ref()), Some("hook exploded"));
    assert_eq!(sup.state(), State::Ready);

    sup.start();
}

// ---------------------------
// Lifecycle
// ---------------------------

#[tokio::test]
async fn stop_closes_every_channel_unit() {
    let sup = Supervisor::default();
    let closed = Arc::new(AtomicUsize::new(0));

    for name in ["first", "second"] {
        let closed = Arc::clone(&closed);
        sup.register_unit(
            name,
            ChannelUnit::arc(move |mut rx: Closed| {
                let closed = Arc::clone(&closed);
                async move {
                    let _ = rx.wait_for(|c| *c).await;
                    closed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );
    }

    sup.start();
    assert_eq!(sup.state(), State::Started);
    sup.stop();

    timeout(GUARD, sup.wait())
        .await
        .expect("group should stop")
        .expect("no unit failed");
    assert_eq!(closed.load(Ordering::SeqCst), 2);
    assert!(sup.is_stopped());
    assert_eq!(sup.state(), State::Stopped);
    assert!(sup.error().is_none());
}

#[tokio::test]
async fn first_failure_is_returned_and_siblings_are_stopped() {
    let sup = Supervisor::default();
    let stops = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = watch::channel(false);
    let counter = Arc::clone(&stops);

    sup.register_unit(
        "blocking",
        StopFnUnit::arc(
            move || {
                let mut rx = rx.clone();
                async move {
                    let _ = rx.wait_for(|stopped| *stopped).await;
                    Ok(())
                }
            },
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(true);
                async {}
            },
        ),
    )
    .register_unit(
        "failing",
        TokenUnit::arc(|_token: CancellationToken| async { Err(UnitError::fail("sentinel")) }),
    );

    let err = timeout(GUARD, sup.run())
        .await
        .expect("group should stop")
        .expect_err("failure should be reported");

    match &err {
        SupervisorError::UnitFailed { unit, source } => {
            assert_eq!(unit, "failing");
            assert_eq!(source.to_string(), "execution failed: sentinel");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.unit(), Some("failing"));
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert_eq!(
        sup.error().map(|e| e.to_string()),
        Some(err.to_string())
    );
    assert_eq!(sup.failures().len(), 1);
}

#[tokio::test]
async fn clean_exit_of_one_unit_stops_the_group() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter()).register_unit(
        "one-shot",
        TokenUnit::arc(|_token: CancellationToken| async { Ok(()) }),
    );

    timeout(GUARD, sup.run())
        .await
        .expect("group should stop")
        .expect("clean exit is not a failure");
    assert!(sup.is_stopped());
}

#[tokio::test]
async fn unit_panic_is_resumed_on_every_waiter() {
    let sup = Supervisor::default();
    sup.register_unit("healthy", waiter()).register_unit(
        "boom",
        TokenUnit::arc(|_token: CancellationToken| async {
            if true {
                panic!("unit exploded");
            }
            Ok(())
        }),
    );

    let runner = sup.clone();
    let first = timeout(GUARD, tokio::spawn(async move { runner.run().await }))
        .await
        .expect("group should stop")
        .expect_err("run should panic");
    assert!(first.is_panic());
    let payload = first.into_panic();
    assert_eq!(message_of(payload.as_ref()), Some("unit exploded"));

    let again = sup.clone();
    let second = tokio::spawn(async move { again.wait().await })
        .await
        .expect_err("wait should panic again");
    let payload = second.into_panic();
    assert_eq!(message_of(payload.as_ref()), Some("unit exploded"));

    let failures = sup.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        SupervisorError::UnitPanicked { unit, message } if unit == "boom" && message == "unit exploded"
    ));
    assert!(sup.error().is_none());
}

#[tokio::test]
async fn request_stop_panic_is_resumed_on_wait() {
    let sup = Supervisor::default();
    let notify = Arc::new(Notify::new());
    let (wait, wake) = (Arc::clone(&notify), notify);
    sup.register_unit(
        "bad-stop",
        StopFnUnit::arc(
            move || {
                let wait = Arc::clone(&wait);
                async move {
                    wait.notified().await;
                    Ok(())
                }
            },
            move || {
                wake.notify_one();
                async {
                    if true {
                        panic!("stop exploded");
                    }
                }
            },
        ),
    );
    sup.register_unit(
        "one-shot",
        TokenUnit::arc(|_token: CancellationToken| async { Ok(()) }),
    );

    let runner = sup.clone();
    let join = tokio::spawn(async move { runner.run().await });
    let err = timeout(GUARD, join)
        .await
        .expect("group should stop")
        .expect_err("run should panic");
    assert_eq!(message_of(err.into_panic().as_ref()), Some("stop exploded"));
}

#[derive(Default)]
struct CountingUnit {
    token: OnceLock<CancellationToken>,
    stops: AtomicUsize,
}

#[async_trait]
impl Unit for CountingUnit {
    fn bind_cancellation(&self, token: CancellationToken) {
        let _ = self.token.set(token);
    }

    async fn run(&self) -> Result<(), UnitError> {
        let token = self.token.get().ok_or(UnitError::Unbound)?;
        token.cancelled().await;
        Ok(())
    }

    async fn request_stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn request_stop_runs_once_per_unit() {
    let sup = Supervisor::default();
    let units: Vec<Arc<CountingUnit>> = (0..4).map(|_| Arc::new(CountingUnit::default())).collect();
    for (i, unit) in units.iter().enumerate() {
        sup.register_unit(format!("unit-{i}"), unit.clone());
    }

    sup.start();
    timeout(GUARD, sup.shutdown())
        .await
        .expect("group should stop")
        .expect("no unit failed");
    sup.stop();

    for unit in &units {
        assert_eq!(unit.stops.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn wait_timeout_leaves_group_running() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    sup.start();

    let err = sup
        .wait_timeout(Duration::from_millis(20))
        .await
        .expect_err("group is still running");
    assert!(err.is_wait_timeout());
    assert_eq!(sup.state(), State::Started);
    assert!(!sup.is_stopped());

    timeout(GUARD, sup.shutdown())
        .await
        .expect("group should stop")
        .expect("no unit failed");
    assert!(sup.is_stopped());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_waiters_and_idempotent_stop() {
    let sup = Supervisor::default();
    let hook_runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hook_runs);

    sup.register_unit("waiter", waiter())
        .after_stop_hook("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    sup.start();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let sup = sup.clone();
            tokio::spawn(async move { sup.wait().await })
        })
        .collect();

    sup.stop();
    sup.stop();

    for waiter in waiters {
        let res = timeout(GUARD, waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter should not panic");
        assert!(res.is_ok());
    }

    sup.stop();
    assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    assert_eq!(sup.state(), State::Stopped);
}

#[tokio::test]
async fn hooks_run_in_order_around_units() {
    let sup = Supervisor::default();
    let trace = Arc::new(Mutex::new(Vec::<String>::new()));

    for name in ["p1", "p2"] {
        let trace = Arc::clone(&trace);
        sup.pre_start_hook(name, move || trace.lock().push(format!("pre:{name}")));
    }
    {
        let trace = Arc::clone(&trace);
        sup.register_unit(
            "one-shot",
            TokenUnit::arc(move |_token: CancellationToken| {
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().push("unit".to_string());
                    Ok(())
                }
            }),
        );
    }
    for name in ["a1", "a2"] {
        let trace = Arc::clone(&trace);
        let observer = sup.clone();
        sup.after_stop_hook(name, move || {
            // waiters are released only after every hook ran
            assert!(!observer.is_stopped());
            trace.lock().push(format!("after:{name}"));
        });
    }

    timeout(GUARD, sup.run())
        .await
        .expect("group should stop")
        .expect("no unit failed");

    assert_eq!(
        *trace.lock(),
        vec!["pre:p1", "pre:p2", "unit", "after:a1", "after:a2"]
    );
}

#[tokio::test]
async fn after_stop_hook_panic_does_not_block_finish() {
    let sup = Supervisor::default();
    let mut events = sup.events();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);

    sup.register_unit(
        "one-shot",
        TokenUnit::arc(|_token: CancellationToken| async { Ok(()) }),
    )
    .after_stop_hook("explodes", || panic!("hook exploded"))
    .after_stop_hook("still-runs", move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    timeout(GUARD, sup.run())
        .await
        .expect("group should stop")
        .expect("hook panics are not unit failures");
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    let mut hook_failed = None;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::HookFailed {
            hook_failed = ev.unit.clone();
        }
    }
    assert_eq!(hook_failed.as_deref(), Some("explodes"));
}

#[tokio::test]
async fn deadline_stops_the_group() {
    let deadline = Duration::from_millis(30);
    let sup = Supervisor::new(SupervisorConfig::default().with_deadline(deadline));
    let mut events = sup.events();
    sup.register_unit("waiter", waiter());

    let started = Instant::now();
    timeout(GUARD, sup.run())
        .await
        .expect("deadline should stop the group")
        .expect("no unit failed");
    assert!(started.elapsed() >= deadline);

    let mut reason = None;
    let mut timeout_ms = None;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::ShutdownRequested {
            reason = ev.reason.clone();
            timeout_ms = ev.timeout_ms;
        }
    }
    assert_eq!(reason.as_deref(), Some("deadline"));
    assert_eq!(timeout_ms, Some(30));
}

#[tokio::test]
async fn parent_cancellation_stops_the_group() {
    let parent = CancellationToken::new();
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_parent(parent.clone())
        .build();
    sup.register_unit("waiter", waiter());
    sup.start();

    parent.cancel();
    timeout(GUARD, sup.wait())
        .await
        .expect("parent cancellation should stop the group")
        .expect("no unit failed");
    assert!(sup.is_stopped());
}

#[tokio::test]
async fn group_token_is_shared_with_embedders() {
    let sup = Supervisor::default();
    sup.register_unit("waiter", waiter());
    let token = sup.cancellation_token();
    sup.start();

    token.cancel();
    timeout(GUARD, sup.wait())
        .await
        .expect("token cancellation should stop the group")
        .expect("no unit failed");
}

#[tokio::test]
async fn failures_lists_every_unit_error() {
    let sup = Supervisor::default();
    let release = Arc::new(Notify::new());

    for name in ["one", "two"] {
        let release = Arc::clone(&release);
        sup.register_unit(
            name,
            TokenUnit::arc(move |token: CancellationToken| {
                let release = Arc::clone(&release);
                async move {
                    tokio::select! {
                        _ = release.notified() => {}
                        _ = token.cancelled() => {}
                    }
                    Err(UnitError::fail("down"))
                }
            }),
        );
    }

    sup.start();
    release.notify_one();
    let err = timeout(GUARD, sup.wait())
        .await
        .expect("group should stop")
        .expect_err("failure should be reported");

    let failures = sup.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].to_string(), err.to_string());
    let mut units: Vec<_> = failures.iter().filter_map(|f| f.unit()).collect();
    units.sort_unstable();
    assert_eq!(units, vec!["one", "two"]);
}

// ---------------------------
// Events
// ---------------------------

struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
    done: Notify,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.kinds.lock().push(ev.kind);
        if ev.kind == EventKind::AllStopped {
            self.done.notify_one();
        }
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_observe_the_lifecycle() {
    let recorder = Arc::new(Recorder {
        kinds: Mutex::new(Vec::new()),
        done: Notify::new(),
    });
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_subscribers(subs)
        .build();
    sup.register_unit("waiter", waiter());

    sup.start();
    sup.stop();
    timeout(GUARD, sup.wait())
        .await
        .expect("group should stop")
        .expect("no unit failed");
    timeout(GUARD, recorder.done.notified())
        .await
        .expect("subscriber should see AllStopped");

    let kinds = recorder.kinds.lock().clone();
    assert_eq!(kinds.first(), Some(&EventKind::UnitStarting));
    assert_eq!(kinds.last(), Some(&EventKind::AllStopped));
    assert!(kinds.contains(&EventKind::ShutdownRequested));
    assert!(kinds.contains(&EventKind::StopRequested));
    assert!(kinds.contains(&EventKind::UnitStopped));
}
