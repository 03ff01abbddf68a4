//! Sensor readings and temperature extraction
//!
//! A sensor hands back a map of named values whose types vary between
//! drivers: some report a plain number, others a string such as `"73.5 F"`.
//! [`extract_temperature`] turns the configured field into a scalar.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, FanError, Result};

/// One value inside a sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Anything else a driver may report (null, arrays, objects)
    Other(serde_json::Value),
}

/// A single sensor sample, keyed by field name
pub type Reading = HashMap<String, ReadingValue>;

macro_rules! reading_value_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for ReadingValue {
                fn from(value: $source) -> Self {
                    ReadingValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

reading_value_from!(Int as i64: i8, i16, i32, i64, u8, u16, u32);
reading_value_from!(Float as f64: f32, f64);

impl From<&str> for ReadingValue {
    fn from(value: &str) -> Self {
        ReadingValue::Text(value.to_string())
    }
}

impl From<String> for ReadingValue {
    fn from(value: String) -> Self {
        ReadingValue::Text(value)
    }
}

impl From<bool> for ReadingValue {
    fn from(value: bool) -> Self {
        ReadingValue::Bool(value)
    }
}

/// Where the temperature lives inside a reading
#[derive(Debug, Clone)]
pub struct ExtractionSpec {
    field: String,
    pattern: Option<Regex>,
}

impl ExtractionSpec {
    /// Build a spec, compiling `pattern` when one is given
    ///
    /// An empty or all-whitespace pattern is treated as no pattern: some
    /// sensors return a bare number that parses as-is. Any other pattern is
    /// compiled exactly as given.
    pub fn new(field: impl Into<String>, pattern: Option<&str>) -> Result<Self> {
        let pattern = match pattern {
            Some(p) if !p.trim().is_empty() => Some(
                Regex::new(p)
                    .map_err(|e| FanError::invalid_config("sensor_value_regex", e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            field: field.into(),
            pattern,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

/// Pull the configured temperature out of a reading
///
/// Numeric values are returned directly. Text goes through the optional
/// pattern (first match wins) and is then parsed as a float.
pub fn extract_temperature(
    reading: &Reading,
    spec: &ExtractionSpec,
) -> std::result::Result<f64, ExtractionError> {
    match reading.get(&spec.field) {
        Some(ReadingValue::Float(value)) => Ok(*value),
        Some(ReadingValue::Int(value)) => Ok(*value as f64),
        Some(ReadingValue::Text(raw)) => {
            if raw.is_empty() {
                return Err(ExtractionError::EmptyField {
                    field: spec.field.clone(),
                });
            }

            let text = match &spec.pattern {
                Some(pattern) => pattern
                    .find(raw)
                    .map(|m| m.as_str())
                    .ok_or_else(|| ExtractionError::NoMatch { text: raw.clone() })?,
                None => raw.trim(),
            };

            text.parse::<f64>().map_err(|e| ExtractionError::ParseError {
                text: text.to_string(),
                reason: e.to_string(),
            })
        }
        Some(ReadingValue::Bool(_)) | Some(ReadingValue::Other(_)) | None => {
            Err(ExtractionError::UnsupportedType {
                field: spec.field.clone(),
            })
        }
    }
}
