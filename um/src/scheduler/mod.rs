//! Spacing schedulers for one-off actions
//!
//! Two interchangeable single-action pacing policies sharing the same state:
//! the time of the last dispatch and a fixed interval.
//!
//! - [`ThrottleScheduler`] drops an action that arrives too soon after the last one
//! - [`CoalesceScheduler`] always runs the action, but never sooner than
//!   `interval` after the previous scheduled run

mod coalesce;
mod throttle;

pub use coalesce::CoalesceScheduler;
pub use throttle::ThrottleScheduler;
