//! Data models for the publishing pipeline

mod upload;

pub use upload::*;
