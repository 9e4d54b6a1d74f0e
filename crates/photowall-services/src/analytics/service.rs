use super::clock::{Clock, SystemClock};
use super::report::{BucketStats, DailyStats, StatsSnapshot, UptimeStats};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use photowall_core::{StatsSettings, UploadResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Final outcome of one task, as counted by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<&UploadResult> for Outcome {
    fn from(result: &UploadResult) -> Self {
        if result.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

#[derive(Debug, Clone)]
struct StatCounters {
    total_success: u64,
    total_error: u64,
    daily_success: u64,
    daily_error: u64,
    /// Midnight (fixed timezone) of the most recent day observed
    daily_reset_at: DateTime<Tz>,
    started_at: DateTime<Utc>,
}

/// Success/error counters with an all-time bucket and a daily bucket.
///
/// Every read and every increment first rolls the daily bucket forward when
/// the clock has crossed midnight in the configured timezone, so no timer is
/// needed for correctness. Counters live behind one mutex shared by all tasks.
pub struct StatisticsAggregator {
    counters: Mutex<StatCounters>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    report_interval: u64,
}

impl StatisticsAggregator {
    pub fn new(settings: &StatsSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &StatsSettings, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let timezone = settings.timezone;
        let counters = StatCounters {
            total_success: 0,
            total_error: 0,
            daily_success: 0,
            daily_error: 0,
            daily_reset_at: midnight_of(timezone, now),
            started_at: now,
        };

        Self {
            counters: Mutex::new(counters),
            clock,
            timezone,
            report_interval: settings.report_interval.max(1),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Count one completed task.
    ///
    /// Returns `true` when this task completes a report interval. The check
    /// runs under the same lock as the increment, so concurrent callers see
    /// each total exactly once.
    pub fn record(&self, outcome: Outcome) -> bool {
        let mut counters = self.lock_rolled();
        match outcome {
            Outcome::Success => {
                counters.total_success += 1;
                counters.daily_success += 1;
            }
            Outcome::Failure => {
                counters.total_error += 1;
                counters.daily_error += 1;
            }
        }

        self.is_report_due(&counters)
    }

    pub fn record_result(&self, result: &UploadResult) -> bool {
        self.record(Outcome::from(result))
    }

    /// True once every `report_interval` completed tasks
    pub fn should_report(&self) -> bool {
        self.is_report_due(&self.lock())
    }

    fn is_report_due(&self, counters: &StatCounters) -> bool {
        let total = counters.total_success + counters.total_error;
        total > 0 && total % self.report_interval == 0
    }

    /// Proactive rollover; a no-op when the daily bucket is already current
    pub fn roll_daily(&self) -> bool {
        let now = self.clock.now();
        let mut counters = self.lock();
        self.roll_forward(&mut counters, now)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let now = self.clock.now();
        let mut counters = self.lock();
        self.roll_forward(&mut counters, now);

        let uptime = (now - counters.started_at).to_std().unwrap_or_default();

        StatsSnapshot {
            total: BucketStats::new(counters.total_success, counters.total_error),
            daily: DailyStats {
                bucket: BucketStats::new(counters.daily_success, counters.daily_error),
                reset_at: counters.daily_reset_at.fixed_offset(),
            },
            uptime: UptimeStats::from_duration(uptime),
            timezone: self.timezone.name().to_string(),
            generated_at: now.with_timezone(&self.timezone).fixed_offset(),
        }
    }

    /// Human-readable multi-line report
    pub fn report(&self) -> String {
        self.snapshot().render()
    }

    /// One-line summary for periodic logging
    pub fn log_line(&self) -> String {
        self.snapshot().log_line()
    }

    /// Time until the next midnight in the configured timezone
    pub fn until_next_midnight(&self) -> std::time::Duration {
        let now = self.clock.now();
        let local_date = now.with_timezone(&self.timezone).date_naive();
        let next = match local_date.succ_opt() {
            Some(tomorrow) => day_start(self.timezone, tomorrow, now),
            None => return std::time::Duration::MAX,
        };
        (next.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or_default()
    }

    fn roll_forward(&self, counters: &mut StatCounters, now: DateTime<Utc>) -> bool {
        let today = midnight_of(self.timezone, now);
        if counters.daily_reset_at < today {
            tracing::info!(
                previous_day = %counters.daily_reset_at,
                daily_success = counters.daily_success,
                daily_errors = counters.daily_error,
                "Daily statistics rolled over"
            );
            counters.daily_success = 0;
            counters.daily_error = 0;
            counters.daily_reset_at = today;
            return true;
        }
        false
    }

    fn lock_rolled(&self) -> MutexGuard<'_, StatCounters> {
        let now = self.clock.now();
        let mut counters = self.lock();
        self.roll_forward(&mut counters, now);
        counters
    }

    fn lock(&self) -> MutexGuard<'_, StatCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn midnight_of(timezone: Tz, now: DateTime<Utc>) -> DateTime<Tz> {
    let local_date = now.with_timezone(&timezone).date_naive();
    day_start(timezone, local_date, now)
}

/// First instant of `date` in `timezone`; a DST gap at midnight moves it to
/// the first valid local hour.
fn day_start(timezone: Tz, date: NaiveDate, fallback: DateTime<Utc>) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hours| {
            timezone
                .from_local_datetime(&(midnight + chrono::Duration::hours(hours)))
                .earliest()
        })
        .unwrap_or_else(|| fallback.with_timezone(&timezone))
}
