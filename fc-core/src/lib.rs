//! fanctl Core Library
//!
//! Temperature-driven fan controllers for single-board computers.
//!
//! # Features
//!
//! - **On/off fans**: digital pin switched with hysteresis and dwell times
//! - **PWM fans**: duty cycle looked up in a stepped temperature table
//! - **Flexible sensors**: temperature pulled out of any reading field, optionally through a regex
//! - **Live reconfiguration**: settings swapped atomically while the loop keeps running
//!
//! # Module Structure
//!
//! - `data/` - Sensor readings and temperature extraction
//! - `engine/` - Hysteresis engine and fan curve
//! - `hw/` - Sensor and actuator ports
//! - `controller/` - Controllers and their background loop
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use fc_core::{load_settings, DeviceRegistry, FanController};
//!
//! async fn run(registry: &dyn DeviceRegistry) -> fc_core::Result<()> {
//!     let settings = load_settings(Path::new("/etc/fanctl/fan.json"))?;
//!     let fan = FanController::new("case", &settings, registry).await?;
//!     println!("{:?}", fan.status().await?);
//!     fan.shutdown().await
//! }
//! ```

// Grouped modules
pub mod controller;
pub mod data;
pub mod engine;
pub mod hw;

// Standalone modules
pub mod constants;
pub mod error;
pub mod settings;

// Re-export primary types from data/
pub use data::{extract_temperature, ExtractionSpec, Reading, ReadingValue};

// Re-export error types
pub use error::{ExtractionError, FanError, Result};

// Re-export engine types
pub use engine::{
    normalize_speed, ActuatorCommand, CurveTable, HysteresisConfig, HysteresisController,
};

// Re-export port traits from hw/
pub use hw::{BinaryActuator, DeviceRegistry, PwmActuator, TemperatureSource};

// Re-export controllers
pub use controller::{
    FanController, FanStatus, OnOffFan, OnOffStatus, PollLoop, PwmFan, PwmStatus,
};

// Re-export settings
pub use settings::{load_settings, FanSettings, OnOffFanSettings, PwmFanSettings};
