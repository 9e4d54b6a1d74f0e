//! Photowall Core Library
//!
//! This crate provides the domain models, error taxonomy, and configuration
//! shared by every Photowall component: the file gate, the rate limiter,
//! the wall publisher, the statistics aggregator, and the relay worker.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    ApiCredentials, CleanupSettings, Config, FileLimits, LogFormat, PublishSettings,
    StatsSettings,
};
pub use error::{FailureKind, LogLevel, PublishError, PublishResult};
pub use models::{PublishStage, RemoteAssetRef, UploadResult, UploadTask};
