//! Cancellable periodic execution.
//!
//! A [`Ticker`] drives one [`PeriodicTask`] on a fixed period. `start` and
//! `stop` are idempotent. Stopping only prevents future ticks; a tick
//! already in progress runs to completion. [`Ticker::tick_now`] runs one
//! evaluation inline, which is what tests and manual checks use.

mod ticker;


pub use self::ticker::{PeriodicTask, Ticker};
