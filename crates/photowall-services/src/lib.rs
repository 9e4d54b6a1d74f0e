//! Photowall Services Layer
//!
//! Long-lived services owned by the process entry point: the delivery
//! statistics aggregator with its midnight rollover scheduler, and the
//! temp-file sweeper that reclaims photos left behind by failed tasks.

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "cleanup")]
pub mod cleanup;

#[cfg(feature = "analytics")]
pub use analytics::{
    BucketStats, Clock, DailyRolloverScheduler, DailyStats, Outcome, StatisticsAggregator,
    StatsSnapshot, SystemClock, UptimeStats,
};

#[cfg(feature = "cleanup")]
pub use cleanup::TempFileSweeper;
