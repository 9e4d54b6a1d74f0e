//! Rate limiting service
//!
//! This module bounds outbound publish requests with a sliding window over the
//! timestamps of the last K requests.

pub use limiter::RateLimiter;

mod limiter;
