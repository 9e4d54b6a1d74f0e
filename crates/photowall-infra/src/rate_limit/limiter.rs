use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Length of the sliding window
const WINDOW: Duration = Duration::from_secs(1);

/// Sleep target measured from the oldest request; the extra 100ms absorbs
/// clock and network jitter.
const WINDOW_WITH_MARGIN: Duration = Duration::from_millis(1100);

/// Sliding-window rate limiter over the timestamps of the last K requests.
///
/// The lock is held across the wait, so concurrent callers queue up behind
/// each other and the window bookkeeping is never interleaved.
#[derive(Clone)]
pub struct RateLimiter {
    window: Arc<Mutex<VecDeque<Instant>>>,
    max_per_window: usize,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_second` request starts per window
    pub fn new(max_per_second: usize) -> Self {
        let max_per_window = max_per_second.max(1);
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(max_per_window))),
            max_per_window,
        }
    }

    /// Wait until a request may start, then record it
    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;

        if window.len() >= self.max_per_window {
            if let Some(oldest) = window.front() {
                let elapsed = oldest.elapsed();
                if elapsed < WINDOW {
                    let wait_duration = WINDOW_WITH_MARGIN - elapsed;
                    tracing::debug!(
                        wait_ms = wait_duration.as_millis(),
                        "Rate limit reached, waiting"
                    );
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }

        Self::record(&mut window, self.max_per_window, Instant::now());
        tracing::trace!(in_window = window.len(), "Rate limit slot acquired");
    }

    fn record(window: &mut VecDeque<Instant>, capacity: usize, now: Instant) {
        if window.len() >= capacity {
            window.pop_front();
        }
        window.push_back(now);
    }
}
