//! Error types, shared with the daemon through the fc-error crate

pub use fc_error::{ExtractionError, FanError, Result};
