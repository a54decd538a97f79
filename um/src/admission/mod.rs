//! Admission queue (leaky bucket)
//!
//! Bounded backlog of pending jobs. Enqueue attempts are accepted or rejected
//! against the remaining capacity, and a background ticker releases a fixed
//! number of jobs from the head of the backlog on every tick.

mod bucket;
mod config;

pub use bucket::{BucketStats, Job, LeakyBucket};
pub use config::AdmissionConfig;
