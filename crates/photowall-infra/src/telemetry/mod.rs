//! Telemetry initialization
//!
//! Installs the global `tracing` subscriber. Logs go to stderr so that stdout
//! stays free for machine-readable output.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
