//! Unified error handling for fanctl
//!
//! This crate provides the single error type shared by the controller core and
//! the daemon. It uses thiserror for the Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using FanError
pub type Result<T> = std::result::Result<T, FanError>;

/// Why a reading could not be turned into a temperature
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("field '{field}' is empty")]
    EmptyField { field: String },

    #[error("no match for pattern in '{text}'")]
    NoMatch { text: String },

    #[error("cannot parse '{text}' as a temperature: {reason}")]
    ParseError { text: String, reason: String },

    #[error("field '{field}' is missing or has an unsupported type")]
    UnsupportedType { field: String },
}

/// Unified error type for all fanctl operations
#[derive(thiserror::Error, Debug)]
pub enum FanError {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    // ============================================================================
    // Hardware Port Errors
    // ============================================================================
    #[error("Sensor error: {0}")]
    Source(String),

    #[error("Actuator error: {0}")]
    Actuator(String),

    // ============================================================================
    // Control Errors
    // ============================================================================
    #[error("Failed to extract temperature: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("No breakpoint at or below {temperature}")]
    NoBreakpointMatched { temperature: f64 },

    // ============================================================================
    // Lifecycle Errors
    // ============================================================================
    #[error("Control loop is not running")]
    NotRunning,

    #[error("Background task failed: {0}")]
    Task(String),

    // ============================================================================
    // I/O and Serialization Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl FanError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a sensor error from a string
    pub fn sensor(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create an actuator error from a string
    pub fn actuator(msg: impl Into<String>) -> Self {
        Self::Actuator(msg.into())
    }

    /// True for errors that only abort the current poll tick
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Source(_)
                | Self::Actuator(_)
                | Self::Extraction(_)
                | Self::NoBreakpointMatched { .. }
                | Self::Task(_)
        )
    }
}
