//! # Captured unit panics.
//!
//! A panic inside a unit is caught at its task boundary and stored as a
//! [`Fault`]. The supervisor keeps the first one and resumes it from `wait`
//! once every unit has returned.
//!
//! The payload can be resumed only once; later waiters get a fresh `String`
//! payload carrying the same message.

use std::any::Any;

use parking_lot::Mutex;

/// Opaque panic payload, as produced by `catch_unwind`.
pub(crate) type PanicPayload = Box<dyn Any + Send + 'static>;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// First captured panic of a group.
pub(crate) struct Fault {
    unit: String,
    message: String,
    payload: Mutex<Option<PanicPayload>>,
}

impl Fault {
    pub(crate) fn new(unit: impl Into<String>, payload: PanicPayload) -> Self {
        Self {
            unit: unit.into(),
            message: panic_message(payload.as_ref()),
            payload: Mutex::new(Some(payload)),
        }
    }

    pub(crate) fn unit(&self) -> &str {
        &self.unit
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    /// Re-raises the panic on the calling task.
    pub(crate) fn resume(&self) -> ! {
        let payload = self.payload.lock().take();
        match payload {
            Some(payload) => std::panic::resume_unwind(payload),
            None => std::panic::resume_unwind(Box::new(self.message.clone())),
        }
    }
}

impl std::fmt::Debug for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fault")
            .field("unit", &self.unit)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
