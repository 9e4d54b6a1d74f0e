//! Temp-file cleanup
//!
//! Failed tasks leave their photo on disk; this module reclaims those files
//! once they are older than the configured age.

pub use service::TempFileSweeper;

mod service;
