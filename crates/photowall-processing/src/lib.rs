//! Photowall file gate
//!
//! Everything that happens to a photo on local disk before any remote call:
//! waiting for the writer to finish ([`FileReadinessChecker`]), checking the
//! extension and size bounds ([`FileValidator`]), and computing an advisory
//! content digest. [`UploadPreparer`] chains the three.

pub mod pipeline;
pub mod readiness;
pub mod validator;

pub use pipeline::{PreparedFile, UploadPreparer};
pub use readiness::{FileProbe, FileReadinessChecker, FsProbe, ProbeOutcome};
pub use validator::{FileValidator, ValidationError};
