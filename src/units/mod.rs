//! # Unit abstraction and the standard unit shapes.
//!
//! - [`Unit`] - capability trait {bind_cancellation, run, request_stop}
//! - [`UnitRef`] - shared reference to a unit (`Arc<dyn Unit>`)
//! - [`StopFnUnit`] - run closure + stop closure
//! - [`TokenUnit`] - run closure observing a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - [`ChannelUnit`] - run closure observing a [`Closed`] notification channel

mod channel;
mod stop_fn;
mod token;
mod unit;

pub use channel::{ChannelUnit, Closed};
pub use stop_fn::StopFnUnit;
pub use token::TokenUnit;
pub use unit::{Unit, UnitRef};
