//! Error types used by the groupvisor runtime and its units.
//!
//! This module defines two main error enums:
//!
//! - [`UnitError`] — failures returned by an individual unit's `run`.
//! - [`SupervisorError`] — the aggregated outcome reported to a waiting caller.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Misuse of the supervisor (registering after start, starting with no units,
//! stopping before start, ...) is a programmer error and panics instead of
//! producing one of these values.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by unit execution.
///
/// A unit returns one of these from [`Unit::run`](crate::Unit::run). The first
/// one observed by the supervisor becomes the group's aggregated error.
///
/// The type is cheap to clone so that [`Supervisor::error`](crate::Supervisor::error)
/// can hand it out any number of times.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum UnitError {
    /// Unit failed with a plain message.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Unit failed with an arbitrary error value.
    #[error(transparent)]
    Other(Arc<dyn StdError + Send + Sync + 'static>),

    /// `run` was called before a cancellation token was bound to the unit.
    #[error("unit run before a cancellation token was bound")]
    Unbound,
}

impl UnitError {
    /// Shorthand for [`UnitError::Fail`].
    ///
    /// # Example
    /// ```
    /// use groupvisor::UnitError;
    ///
    /// let err = UnitError::fail("listener closed");
    /// assert_eq!(err.to_string(), "execution failed: listener closed");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        UnitError::Fail {
            error: error.into(),
        }
    }

    /// Wraps any error value.
    pub fn other<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        UnitError::Other(Arc::new(err))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::Fail { .. } => "unit_failed",
            UnitError::Other(_) => "unit_error",
            UnitError::Unbound => "unit_unbound",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            UnitError::Fail { error } => format!("error: {error}"),
            UnitError::Other(err) => format!("error: {err}"),
            UnitError::Unbound => "unit run before bind".to_string(),
        }
    }
}

impl From<std::io::Error> for UnitError {
    fn from(err: std::io::Error) -> Self {
        UnitError::other(err)
    }
}

/// # Aggregated outcome errors.
///
/// Returned by [`Supervisor::wait`](crate::Supervisor::wait) and friends, and by
/// [`Supervisor::error`](crate::Supervisor::error).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SupervisorError {
    /// A unit's `run` returned an error.
    #[error("unit `{unit}` failed: {source}")]
    UnitFailed {
        /// Name the unit was registered under.
        unit: String,
        /// The error the unit returned.
        #[source]
        source: UnitError,
    },

    /// A unit panicked.
    ///
    /// Only appears in [`Supervisor::failures`](crate::Supervisor::failures);
    /// `wait` resumes the panic itself instead of returning this value.
    #[error("unit `{unit}` panicked: {message}")]
    UnitPanicked {
        /// Name the unit was registered under.
        unit: String,
        /// Panic message, when the payload was a string.
        message: String,
    },

    /// The caller's wait timed out; the group keeps running or stopping.
    #[error("wait timed out after {timeout:?}")]
    WaitTimeout {
        /// The timeout supplied by the caller.
        timeout: Duration,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use groupvisor::SupervisorError;
    /// use std::time::Duration;
    ///
    /// let err = SupervisorError::WaitTimeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "supervisor_wait_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::UnitFailed { .. } => "supervisor_unit_failed",
            SupervisorError::UnitPanicked { .. } => "supervisor_unit_panicked",
            SupervisorError::WaitTimeout { .. } => "supervisor_wait_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SupervisorError::UnitFailed { unit, source } => {
                format!("unit={unit} {}", source.as_message())
            }
            SupervisorError::UnitPanicked { unit, message } => {
                format!("unit={unit} panic: {message}")
            }
            SupervisorError::WaitTimeout { timeout } => format!("wait timeout: {timeout:?}"),
        }
    }

    /// True for [`SupervisorError::WaitTimeout`].
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, SupervisorError::WaitTimeout { .. })
    }

    /// Name of the unit this error originated from, if any.
    pub fn unit(&self) -> Option<&str> {
        match self {
            SupervisorError::UnitFailed { unit, .. } | SupervisorError::UnitPanicked { unit, .. } => {
                Some(unit)
            }
            SupervisorError::WaitTimeout { .. } => None,
        }
    }
}
