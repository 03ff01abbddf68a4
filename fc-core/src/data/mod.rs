//! Data types for sensor readings
//!
//! Contains the reading model and the temperature extraction rules.

mod reading;

pub use reading::{extract_temperature, ExtractionSpec, Reading, ReadingValue};
