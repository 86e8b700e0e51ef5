//! # Supervisor: starts a group of units together and stops them together.
//!
//! The [`Supervisor`] owns the unit and hook registries, the shared
//! cancellation token, the finished latch and the aggregated result slots.
//!
//! ## State machine
//! ```text
//!   Ready ──start()──► Started ──(all units joined, hooks ran)──► Stopped
//!     │                   │
//!     │ register_*()      │ stop() / unit exit / deadline / signal / parent cancel
//!     ▼                   ▼
//!   Ready            shutdown listener fires (exactly once)
//! ```
//!
//! ## High-level architecture
//! ```text
//! start():
//!   PreStart hooks (in order)
//!   state = Started
//!   for unit in registration order:
//!       unit.bind_cancellation(group_token.child_token())
//!       set.spawn(unit.run())  ── on exit ──► record outcome, group_token.cancel()
//!   spawn drive_shutdown()
//!
//! drive_shutdown():
//!   select! {
//!       group_token.cancelled()   (stop(), any unit exit, parent token)
//!       sleep_until(deadline)     (SupervisorConfig::deadline)
//!       signals.recv()            (register_signal)
//!   }
//!   ├─► publish ShutdownRequested, group_token.cancel()
//!   ├─► join_all(unit.request_stop())     (issued in registration order)
//!   ├─► join every unit task
//!   ├─► AfterStop hooks (in order)
//!   └─► state = Stopped, finished latch set, publish AllStopped
//!
//! wait():
//!   finished latch ──► resume first captured panic, else first unit error, else Ok
//! ```
//!
//! ## Rules
//! - Registration is only legal in `Ready`; misuse panics
//! - The first unit error and the first unit panic win; later ones are still
//!   listed by [`Supervisor::failures`]
//! - After-stop hooks complete before the finished latch is set, so a waiter
//!   always observes their side effects
//! - `wait_timeout` only bounds the caller; it never affects the group
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use groupvisor::{Supervisor, SupervisorConfig, TokenUnit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(SupervisorConfig::default());
//!
//!     sup.register_unit("worker", TokenUnit::arc(|token: CancellationToken| async move {
//!         token.cancelled().await;
//!         Ok(())
//!     }))
//!     .register_unit("one-shot", TokenUnit::arc(|_token: CancellationToken| async move {
//!         // returning stops the whole group
//!         Ok(())
//!     }));
//!
//!     sup.run().await?;
//!     assert!(sup.is_stopped());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::fault::{Fault, PanicPayload};
use crate::core::handle::{UnitHandle, UnitOutcome};
use crate::core::hooks::{self, HookPhase, HookRegistry};
use crate::core::registry::OrderedRegistry;
use crate::core::shutdown::{Signal, SignalListener};
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::units::UnitRef;

const READY: u8 = 0;
const STARTED: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle state of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Accepting registrations.
    Ready,
    /// Units running, shutdown listener armed.
    Started,
    /// All units joined, after-stop hooks ran.
    Stopped,
}

impl State {
    fn from_u8(raw: u8) -> Self {
        match raw {
            READY => State::Ready,
            STARTED => State::Started,
            _ => State::Stopped,
        }
    }

    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Ready => "ready",
            State::Started => "started",
            State::Stopped => "stopped",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that may only change while `Ready`.
#[derive(Default)]
struct Registration {
    units: OrderedRegistry<String, Arc<UnitHandle>>,
    pre_start: HookRegistry,
    after_stop: HookRegistry,
    signals: Vec<Signal>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    /// Pre-start hooks are running; the lock is released meanwhile.
    starting: bool,
    /// A pre-start hook panicked; the supervisor can no longer start.
    start_aborted: bool,
}

struct Inner {
    cfg: SupervisorConfig,
    state: AtomicU8,
    reg: Mutex<Registration>,
    /// Shared "time to stop" token; parent of every unit token.
    token: CancellationToken,
    /// Finished latch.
    finished: CancellationToken,
    first_error: OnceLock<SupervisorError>,
    first_fault: OnceLock<Fault>,
    failures: Mutex<Vec<SupervisorError>>,
    bus: Bus,
}

/// Coordinates a group of units: start together, stop together, one outcome.
///
/// Cheap to clone; clones share the same group.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    /// Creates a supervisor with the given config and no subscribers.
    ///
    /// Does not need a tokio runtime; [`start`](Self::start) does.
    pub fn new(cfg: SupervisorConfig) -> Self {
        SupervisorBuilder::new(cfg).build()
    }

    /// Returns a builder for configuring subscribers and a parent token.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: SupervisorConfig,
        bus: Bus,
        token: CancellationToken,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let reg = Registration {
            subscribers,
            ..Registration::default()
        };
        Self {
            inner: Arc::new(Inner {
                cfg,
                state: AtomicU8::new(READY),
                reg: Mutex::new(reg),
                token,
                finished: CancellationToken::new(),
                first_error: OnceLock::new(),
                first_fault: OnceLock::new(),
                failures: Mutex::new(Vec::new()),
                bus,
            }),
        }
    }

    // ---------------------------
    // Registration (Ready only)
    // ---------------------------

    /// Registers a unit under a unique name.
    ///
    /// # Panics
    /// If the supervisor has already started, or `name` is already registered.
    pub fn register_unit(&self, name: impl Into<String>, unit: UnitRef) -> &Self {
        let name = name.into();
        let mut reg = self.inner.reg.lock();
        self.ensure_ready("register_unit");
        assert!(
            !reg.units.contains(&name),
            "unit `{name}` is already registered"
        );

        let handle = Arc::new(UnitHandle::new(Arc::from(name.as_str()), unit));
        reg.units.set(name, handle);
        self
    }

    /// Registers a hook for the given phase under a unique (per phase) name.
    ///
    /// Pre-start hooks run on the thread calling `start()`, after-stop hooks on
    /// the shutdown listener's task. A pre-start hook may register units but
    /// not further pre-start hooks.
    ///
    /// # Panics
    /// If the supervisor has already started, or `name` is already registered for `phase`.
    pub fn register_hook<F>(&self, phase: HookPhase, name: impl Into<String>, action: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let mut reg = self.inner.reg.lock();
        self.ensure_ready("register_hook");

        assert!(
            !(phase == HookPhase::PreStart && reg.starting),
            "cannot register a pre-start hook while pre-start hooks are running"
        );

        let hooks = match phase {
            HookPhase::PreStart => &mut reg.pre_start,
            HookPhase::AfterStop => &mut reg.after_stop,
        };
        assert!(
            !hooks.contains(&name),
            "{phase} hook `{name}` is already registered"
        );
        hooks.set(name, Box::new(action));
        self
    }

    /// Registers a hook run inside `start()`, before any unit is launched.
    pub fn pre_start_hook<F>(&self, name: impl Into<String>, action: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.register_hook(HookPhase::PreStart, name, action)
    }

    /// Registers a hook run after every unit has returned.
    pub fn after_stop_hook<F>(&self, name: impl Into<String>, action: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.register_hook(HookPhase::AfterStop, name, action)
    }

    /// Registers OS signals that stop the group when received.
    ///
    /// # Panics
    /// If the supervisor has already started.
    pub fn register_signal(&self, signals: impl IntoIterator<Item = Signal>) -> &Self {
        let mut reg = self.inner.reg.lock();
        self.ensure_ready("register_signal");
        for sig in signals {
            if !reg.signals.contains(&sig) {
                reg.signals.push(sig);
            }
        }
        self
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Runs pre-start hooks, launches every unit and arms the shutdown listener.
    ///
    /// Pre-start hooks run without the registration lock held, so they may
    /// inspect the supervisor or register more units.
    ///
    /// # Panics
    /// If not in `Ready`, if no unit is registered, if called outside a tokio
    /// runtime, or if a pre-start hook panics. After a pre-start hook panic the
    /// supervisor stays in `Ready` and every later `start()` panics.
    pub fn start(&self) {
        let pre_start = {
            let mut reg = self.inner.reg.lock();
            self.ensure_ready("start");
            assert!(
                !reg.start_aborted,
                "cannot start a supervisor after one of its pre-start hooks panicked"
            );
            assert!(!reg.starting, "start() is already in progress");
            assert!(
                !reg.units.is_empty(),
                "cannot start a supervisor without any units"
            );
            assert!(
                tokio::runtime::Handle::try_current().is_ok(),
                "start() must be called from within a tokio runtime"
            );
            reg.starting = true;
            std::mem::take(&mut reg.pre_start)
        };

        let hooks_ran = panic::catch_unwind(AssertUnwindSafe(|| hooks::run_pre_start(pre_start)));

        let mut reg = self.inner.reg.lock();
        reg.starting = false;
        if let Err(payload) = hooks_ran {
            reg.start_aborted = true;
            drop(reg);
            panic::resume_unwind(payload);
        }
        self.inner.state.store(STARTED, Ordering::SeqCst);

        let deadline = self.inner.cfg.deadline().map(|d| Instant::now() + d);
        let signals = SignalListener::install(&reg.signals);
        let subscribers = std::mem::take(&mut reg.subscribers);
        self.spawn_forwarder(subscribers);

        let units: Vec<Arc<UnitHandle>> = reg.units.values().cloned().collect();
        let mut set = JoinSet::new();
        for handle in &units {
            tracing::debug!(unit = handle.name(), "starting unit");
            handle.bind(&self.inner.token);

            let inner = Arc::clone(&self.inner);
            let handle = Arc::clone(handle);
            set.spawn(async move {
                let outcome = handle.run(&inner.bus).await;
                inner.record(handle.name(), outcome);
                inner.token.cancel();
            });
        }

        let after_stop = std::mem::take(&mut reg.after_stop);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.drive_shutdown(units, set, after_stop, signals, deadline));

        tracing::info!(units = reg.units.len(), "supervisor started");
    }

    /// Triggers group shutdown.
    ///
    /// Idempotent once started; a no-op after the group stopped.
    ///
    /// # Panics
    /// If called before [`start`](Self::start).
    pub fn stop(&self) {
        match self.state() {
            State::Ready => panic!("cannot call stop() before the supervisor has started"),
            State::Started => {
                tracing::debug!("stop requested");
                self.inner.token.cancel();
            }
            State::Stopped => {}
        }
    }

    /// Waits until every unit has returned and after-stop hooks ran.
    ///
    /// Returns the first unit error, if any. If a unit panicked, the first
    /// panic is resumed on the caller instead.
    ///
    /// # Panics
    /// If called before [`start`](Self::start), or to replay a unit panic.
    pub async fn wait(&self) -> Result<(), SupervisorError> {
        self.ensure_started("wait");
        self.inner.finished.cancelled().await;
        self.outcome()
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// On timeout returns [`SupervisorError::WaitTimeout`]; the group is not affected.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), SupervisorError> {
        self.ensure_started("wait_timeout");
        if time::timeout(timeout, self.inner.finished.cancelled())
            .await
            .is_err()
        {
            return Err(SupervisorError::WaitTimeout { timeout });
        }
        self.outcome()
    }

    /// [`start`](Self::start) followed by [`wait`](Self::wait).
    pub async fn run(&self) -> Result<(), SupervisorError> {
        self.start();
        self.wait().await
    }

    /// [`stop`](Self::stop) followed by [`wait`](Self::wait).
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        self.stop();
        self.wait().await
    }

    /// [`stop`](Self::stop) followed by [`wait_timeout`](Self::wait_timeout).
    pub async fn shutdown_timeout(&self, timeout: Duration) -> Result<(), SupervisorError> {
        self.stop();
        self.wait_timeout(timeout).await
    }

    // ---------------------------
    // Inspection
    // ---------------------------

    /// First error returned by any unit, if any.
    ///
    /// # Panics
    /// If called before [`start`](Self::start).
    pub fn error(&self) -> Option<SupervisorError> {
        self.ensure_started("error");
        self.inner.first_error.get().cloned()
    }

    /// Every unit error and panic recorded so far, in observation order.
    pub fn failures(&self) -> Vec<SupervisorError> {
        self.inner.failures.lock().clone()
    }

    /// True once the group has fully stopped (non-blocking).
    pub fn is_stopped(&self) -> bool {
        self.inner.finished.is_cancelled()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        State::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Number of registered units.
    pub fn unit_count(&self) -> usize {
        self.inner.reg.lock().units.len()
    }

    /// Names of registered units, in registration order.
    pub fn unit_names(&self) -> Vec<String> {
        self.inner.reg.lock().units.keys().cloned().collect()
    }

    /// The group's shared cancellation token.
    ///
    /// Cancelling it is equivalent to [`stop`](Self::stop) once started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Subscribes to the runtime event stream.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Supervisor configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.cfg
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn ensure_ready(&self, op: &str) {
        let state = self.state();
        if state != State::Ready {
            panic!("cannot call {op}() after the supervisor has started (state: {state})");
        }
    }

    fn ensure_started(&self, op: &str) {
        if self.state() == State::Ready {
            panic!("cannot call {op}() before the supervisor has started");
        }
    }

    fn outcome(&self) -> Result<(), SupervisorError> {
        if let Some(fault) = self.inner.first_fault.get() {
            fault.resume();
        }
        match self.inner.first_error.get() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Forwards bus events to the subscriber set until the group stopped.
    fn spawn_forwarder(&self, subscribers: Vec<Arc<dyn Subscribe>>) {
        if subscribers.is_empty() {
            return;
        }
        let subs = SubscriberSet::new(subscribers, self.inner.bus.clone());
        let mut rx = self.inner.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        subs.emit(&ev);
                        if ev.kind == EventKind::AllStopped {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            subs.shutdown().await;
        });
    }
}

impl Inner {
    /// Stores a unit's outcome in the aggregated result slots.
    fn record(&self, unit: &str, outcome: UnitOutcome) {
        tracing::debug!(unit, outcome = outcome.as_label(), "unit exited");
        match outcome {
            UnitOutcome::Completed => {}
            UnitOutcome::Failed(source) => {
                let err = SupervisorError::UnitFailed {
                    unit: unit.to_string(),
                    source,
                };
                let mut failures = self.failures.lock();
                failures.push(err.clone());
                let _ = self.first_error.set(err);
            }
            UnitOutcome::Panicked(payload) => self.record_fault(unit, payload),
        }
    }

    fn record_fault(&self, unit: &str, payload: PanicPayload) {
        let fault = Fault::new(unit, payload);
        let mut failures = self.failures.lock();
        failures.push(SupervisorError::UnitPanicked {
            unit: unit.to_string(),
            message: fault.message().to_string(),
        });
        if let Err(later) = self.first_fault.set(fault) {
            tracing::warn!(
                unit = later.unit(),
                panic = later.message(),
                "unit panicked after another unit already did; keeping the first panic"
            );
        }
    }

    /// The shutdown trigger listener. Runs once per supervisor.
    async fn drive_shutdown(
        self: Arc<Self>,
        units: Vec<Arc<UnitHandle>>,
        mut set: JoinSet<()>,
        after_stop: HookRegistry,
        mut signals: SignalListener,
        deadline: Option<Instant>,
    ) {
        let deadline_elapsed = async {
            match deadline {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        let reason: &'static str = tokio::select! {
            _ = self.token.cancelled() => "cancelled",
            _ = deadline_elapsed => "deadline",
            sig = signals.recv() => sig.as_str(),
        };
        tracing::debug!(reason, "stopping supervisor");

        let mut ev = Event::new(EventKind::ShutdownRequested).with_reason(reason);
        if reason == "deadline" {
            ev = ev.with_timeout(self.cfg.deadline);
        }
        self.bus.publish(ev);
        self.token.cancel();

        let stops = units.iter().map(|handle| handle.stop(&self.bus));
        for (handle, panicked) in units.iter().zip(join_all(stops).await) {
            if let Some(payload) = panicked {
                self.record_fault(handle.name(), payload);
            }
        }

        while let Some(res) = set.join_next().await {
            if let Err(err) = res {
                tracing::error!(error = %err, "unit task did not complete");
            }
        }

        let panicked: Vec<&str> = units.iter().filter_map(|h| h.panicked()).collect();
        if !panicked.is_empty() {
            tracing::debug!(?panicked, "units with captured panics");
        }

        hooks::run_after_stop(after_stop, &self.bus);

        self.state.store(STOPPED, Ordering::SeqCst);
        self.finished.cancel();
        self.bus.publish(Event::new(EventKind::AllStopped));
        tracing::info!("supervisor stopped");
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("units", &self.unit_names())
            .field("cfg", &self.inner.cfg)
            .finish_non_exhaustive()
    }
}
