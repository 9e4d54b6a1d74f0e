use photowall_core::{UploadResult, UploadTask};
use photowall_processing::UploadPreparer;
use photowall_publisher::RemotePublisher;
use photowall_services::StatisticsAggregator;
use std::sync::Arc;

use crate::acknowledgment::Acknowledgment;
use crate::shutdown::ShutdownSignal;

/// Entry point for one inbound photo.
///
/// Cheap to clone; every clone shares the same preparer, publisher, counters
/// and shutdown flag.
#[derive(Clone)]
pub struct PhotoRelay {
    preparer: Arc<UploadPreparer>,
    publisher: RemotePublisher,
    stats: Arc<StatisticsAggregator>,
    shutdown: ShutdownSignal,
}

impl PhotoRelay {
    pub fn new(
        preparer: Arc<UploadPreparer>,
        publisher: RemotePublisher,
        stats: Arc<StatisticsAggregator>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            preparer,
            publisher,
            stats,
            shutdown,
        }
    }

    pub fn stats(&self) -> &Arc<StatisticsAggregator> {
        &self.stats
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Run one task to completion and return the reply for the sender.
    ///
    /// Tasks that arrive after shutdown was requested are refused and not
    /// counted. Everything else, including local preparation failures, is
    /// recorded in the statistics exactly once.
    #[tracing::instrument(skip(self, task), fields(path = %task.path.display()))]
    pub async fn handle(&self, task: UploadTask) -> Acknowledgment {
        if self.shutdown.is_triggered() {
            tracing::info!("Refusing task, shutdown in progress");
            return Acknowledgment::ShuttingDown;
        }

        let result = match self.preparer.prepare(&task.path).await {
            Ok(prepared) => {
                tracing::debug!(size_bytes = prepared.size, "Handing file to publisher");
                self.publisher.publish(&prepared.path, &task.caption).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "File rejected before upload");
                UploadResult::Failure { kind: e.kind() }
            }
        };

        if self.stats.record_result(&result) {
            tracing::info!(stats = %self.stats.log_line(), "Periodic statistics");
        }

        Acknowledgment::from(result)
    }
}
