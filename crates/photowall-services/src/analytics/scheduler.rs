use super::service::StatisticsAggregator;
use std::sync::Arc;
use std::time::Duration;

/// Extra delay after midnight so the wake-up never lands on the old day
const WAKE_MARGIN: Duration = Duration::from_millis(500);

/// Rolls the daily statistics bucket over right after each midnight.
///
/// The aggregator already rolls over lazily; this only makes the reset show up
/// in logs at midnight instead of at the next task.
pub struct DailyRolloverScheduler {
    stats: Arc<StatisticsAggregator>,
}

impl DailyRolloverScheduler {
    pub fn new(stats: Arc<StatisticsAggregator>) -> Self {
        Self { stats }
    }

    /// Start the background task; abort the returned handle to stop it
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let wait = self.stats.until_next_midnight().saturating_add(WAKE_MARGIN);
                tracing::debug!(wait_secs = wait.as_secs(), "Next daily statistics rollover scheduled");
                tokio::time::sleep(wait).await;

                if self.stats.roll_daily() {
                    tracing::info!("Scheduled daily statistics rollover completed");
                }
            }
        })
    }
}
