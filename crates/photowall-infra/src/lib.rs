//! Photowall Infrastructure Library
//!
//! Shared infrastructure used by the publisher and the binary:
//! - Rate limiting of outbound publish requests
//! - Telemetry (tracing subscriber) initialization

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimiter;
