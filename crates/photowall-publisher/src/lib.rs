//! Photowall wall publisher
//!
//! Turns a prepared local photo into a wall post in four remote steps:
//! fetch an upload target, upload the bytes (retried with backoff), save the
//! uploaded photo, post it to the wall. [`WallApi`] is the seam between the
//! state machine in [`RemotePublisher`] and the HTTP client [`VkApiClient`].

pub mod client;
pub mod publisher;
pub mod responses;

pub use client::{VkApiClient, WallApi};
pub use publisher::{RemotePublisher, RetryPolicy, UploadAttempt};
