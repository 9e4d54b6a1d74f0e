use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::time::Duration;

/// Counters of one bucket with the derived rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub success: u64,
    pub errors: u64,
    pub total: u64,
    /// Percentage in `[0, 100]`; 0 when the bucket is empty
    pub success_rate: f64,
}

impl BucketStats {
    pub fn new(success: u64, errors: u64) -> Self {
        let total = success + errors;
        let success_rate = if total == 0 {
            0.0
        } else {
            success as f64 * 100.0 / total as f64
        };

        Self {
            success,
            errors,
            total,
            success_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    #[serde(flatten)]
    pub bucket: BucketStats,
    /// Midnight that opened the current daily bucket
    pub reset_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UptimeStats {
    pub seconds: u64,
    pub formatted: String,
}

impl UptimeStats {
    pub fn from_duration(uptime: Duration) -> Self {
        Self {
            seconds: uptime.as_secs(),
            formatted: format_uptime(uptime),
        }
    }
}

/// Point-in-time view of the statistics
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total: BucketStats,
    pub daily: DailyStats,
    pub uptime: UptimeStats,
    pub timezone: String,
    pub generated_at: DateTime<FixedOffset>,
}

impl StatsSnapshot {
    /// Grade of the all-time success rate; `None` before the first task
    pub fn quality(&self) -> Option<&'static str> {
        if self.total.is_empty() {
            return None;
        }

        let rate = self.total.success_rate;
        Some(if rate >= 99.0 {
            "excellent"
        } else if rate >= 95.0 {
            "good"
        } else if rate >= 90.0 {
            "normal"
        } else {
            "needs attention"
        })
    }

    /// Multi-line report; the daily block is omitted while the day is empty
    pub fn render(&self) -> String {
        let mut lines = vec![
            "Photowall statistics".to_string(),
            String::new(),
            format!("Uptime: {}", self.uptime.formatted),
        ];

        if !self.daily.bucket.is_empty() {
            let daily = &self.daily.bucket;
            lines.extend([
                String::new(),
                format!("Today ({}):", self.timezone),
                format!("Published: {}", daily.success),
                format!("Errors: {}", daily.errors),
                format!("Success rate: {:.1}%", daily.success_rate),
                format!("Received: {}", daily.total),
            ]);
        }

        lines.extend([
            String::new(),
            "All time:".to_string(),
            format!("Published: {}", self.total.success),
            format!("Errors: {}", self.total.errors),
            format!("Success rate: {:.1}%", self.total.success_rate),
            format!("Processed: {}", self.total.total),
        ]);

        if let Some(quality) = self.quality() {
            lines.push(String::new());
            lines.push(format!("Quality: {}", quality));
        }

        lines.join("\n")
    }

    pub fn log_line(&self) -> String {
        format!(
            "Statistics: {} published, {} errors ({:.1}%) in {}",
            self.total.success, self.total.errors, self.total.success_rate, self.uptime.formatted
        )
    }
}

/// `"{d}d {h}h {m}m"`; days only when non-zero, hours when hours or days are
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{}h", hours));
    }
    parts.push(format!("{}m", minutes));

    parts.join(" ")
}
