//! Delivery statistics
//!
//! This module counts publish outcomes into an all-time bucket and a daily
//! bucket that resets at midnight in a fixed timezone, and renders reports.

pub use clock::{Clock, SystemClock};
pub use report::{BucketStats, DailyStats, StatsSnapshot, UptimeStats};
pub use scheduler::DailyRolloverScheduler;
pub use service::{Outcome, StatisticsAggregator};

mod clock;
mod report;
mod scheduler;
mod service;
