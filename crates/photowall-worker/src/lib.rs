//! Photowall relay worker
//!
//! [`PhotoRelay`] handles one inbound photo end to end: shutdown gate, local
//! preparation, remote publish, statistics. One relay instance is shared by
//! all concurrent tasks.

pub mod acknowledgment;
pub mod relay;
pub mod shutdown;

pub use acknowledgment::Acknowledgment;
pub use relay::PhotoRelay;
pub use shutdown::ShutdownSignal;
