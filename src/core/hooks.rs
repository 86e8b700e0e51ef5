//! # Lifecycle hooks.
//!
//! Hooks are named, zero-argument callbacks attached to one of two phases:
//!
//! ```text
//! start():    PreStart hooks (registration order) ──► units launched
//! shutdown:   units joined ──► AfterStop hooks (registration order) ──► finished
//! ```
//!
//! Each hook runs at most once. A panicking after-stop hook is reported and
//! skipped; it never prevents the group from reaching `Stopped`.

use std::fmt;

use crate::core::fault::panic_message;
use crate::core::registry::OrderedRegistry;
use crate::events::{Bus, Event, EventKind};

/// Boxed hook action.
pub(crate) type HookFn = Box<dyn FnOnce() + Send + 'static>;

/// Registry of hooks for one phase.
pub(crate) type HookRegistry = OrderedRegistry<String, HookFn>;

/// When a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before any unit is launched, synchronously inside `start()`.
    PreStart,
    /// After every unit has returned, before waiters are released.
    AfterStop,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::PreStart => f.write_str("pre-start"),
            HookPhase::AfterStop => f.write_str("after-stop"),
        }
    }
}

/// Runs pre-start hooks in order. Panics propagate to the caller of `start()`.
pub(crate) fn run_pre_start(hooks: HookRegistry) {
    for (name, hook) in hooks {
        tracing::debug!(hook = %name, "running pre-start hook");
        hook();
    }
}

/// Runs after-stop hooks in order, isolating panics.
pub(crate) fn run_after_stop(hooks: HookRegistry, bus: &Bus) {
    for (name, hook) in hooks {
        tracing::debug!(hook = %name, "running after-stop hook");
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(hook));
        if let Err(payload) = res {
            let info = panic_message(payload.as_ref());
            tracing::error!(hook = %name, panic = %info, "after-stop hook panicked");
            bus.publish(
                Event::new(EventKind::HookFailed)
                    .with_unit(name.as_str())
                    .with_reason(info),
            );
        }
    }
}
