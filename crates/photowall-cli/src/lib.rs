//! Wiring for the `photowall` binary.
//!
//! Every shared component is built once here from [`Config`] and handed to
//! the parts that need it.

use anyhow::Context;
use photowall_core::{Config, UploadTask};
use photowall_infra::RateLimiter;
use photowall_processing::UploadPreparer;
use photowall_publisher::{RemotePublisher, RetryPolicy, VkApiClient};
use photowall_services::{StatisticsAggregator, TempFileSweeper};
use photowall_worker::{Acknowledgment, PhotoRelay, ShutdownSignal};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a subcommand may need
pub struct Components {
    pub relay: PhotoRelay,
    pub preparer: Arc<UploadPreparer>,
    pub stats: Arc<StatisticsAggregator>,
    pub sweeper: Arc<TempFileSweeper>,
    pub shutdown: ShutdownSignal,
}

pub fn build_components(config: &Config) -> anyhow::Result<Components> {
    let client = VkApiClient::new(config.api.clone()).context("Failed to build wall API client")?;

    let preparer = Arc::new(UploadPreparer::from_limits(&config.files));
    let publisher = RemotePublisher::new(
        Arc::new(client),
        RateLimiter::new(config.publish.rate_limit_per_second),
        preparer.validator(),
        RetryPolicy::from_settings(&config.publish),
    );
    let stats = Arc::new(StatisticsAggregator::new(&config.stats));
    let shutdown = ShutdownSignal::new();
    let relay = PhotoRelay::new(preparer.clone(), publisher, stats.clone(), shutdown.clone());

    tracing::debug!(
        group_id = config.api.group_id,
        rate_limit = config.publish.rate_limit_per_second,
        max_retries = config.publish.max_retries,
        timezone = %config.stats.timezone,
        "Components initialized"
    );

    Ok(Components {
        relay,
        preparer,
        stats,
        sweeper: Arc::new(TempFileSweeper::from_settings(&config.cleanup)),
        shutdown,
    })
}

/// Parse one stdin line of the relay protocol; blank lines yield `None`
pub fn parse_task_line(line: &str) -> anyhow::Result<Option<UploadTask>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let task: UploadTask =
        serde_json::from_str(line).with_context(|| format!("Invalid task line: {}", line))?;
    Ok(Some(task))
}

/// One line of relay output
#[derive(Debug, Serialize)]
pub struct AckLine {
    pub path: PathBuf,
    #[serde(flatten)]
    pub ack: Acknowledgment,
    pub message: String,
}

impl AckLine {
    pub fn new(path: PathBuf, ack: Acknowledgment) -> Self {
        Self {
            path,
            message: ack.message(),
            ack,
        }
    }
}
