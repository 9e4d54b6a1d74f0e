//! Default values for every tunable setting.
//!
//! The remote API numbers (version, timeouts) follow the public wall API;
//! the file limits follow the photo size cap the wall accepts.

/// Remote API version sent as `v` on every method call.
pub const API_VERSION: &str = "5.199";

/// Base URL for API method calls (`{base}/{method}`).
pub const API_BASE_URL: &str = "https://api.vk.com/method";

/// Timeout for API method calls, in seconds.
pub const API_TIMEOUT_SECS: u64 = 30;

/// Timeout for the byte upload to the upload server, in seconds.
pub const UPLOAD_TIMEOUT_SECS: u64 = 30;

pub const MAX_FILE_SIZE_MB: u64 = 50;
pub const MIN_FILE_SIZE_BYTES: u64 = 1;
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Chunk size used for readiness probes and digest streaming.
pub const FILE_READ_CHUNK_SIZE: usize = 8192;

pub const FILE_READY_MAX_ATTEMPTS: u32 = 5;
pub const FILE_READY_INITIAL_DELAY_MS: u64 = 100;

/// Upload attempts (1-indexed) before the upload step gives up.
pub const MAX_RETRIES: u32 = 3;

/// Backoff before attempt n+1 is `RETRY_BASE_DELAY_MS * 2^(n-1)`.
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Ceiling of publish requests started within any one-second window.
pub const RATE_LIMIT_PER_SECOND: usize = 3;

/// Emit a statistics log line every N completed tasks.
pub const STATS_REPORT_INTERVAL: u64 = 10;

/// Timezone whose midnight starts a new daily statistics bucket.
pub const STATS_TIMEZONE: &str = "Europe/Moscow";

pub const TEMP_PHOTOS_DIR: &str = "data/temp_photos";
pub const CLEANUP_AGE_HOURS: u64 = 1;
pub const CLEANUP_INTERVAL_HOURS: u64 = 1;

// Acknowledgment texts returned to the chat layer
pub const ACK_PUBLISHED: &str = "Published to the wall, post id {post_id}";
pub const ACK_FAILED: &str = "Could not publish the photo, please try again later";
pub const ACK_FILE_NOT_READY: &str = "The photo could not be read yet, please send it again";
pub const ACK_SHUTTING_DOWN: &str = "The relay is shutting down, please try again in a minute";
