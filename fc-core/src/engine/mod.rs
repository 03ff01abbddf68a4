//! Fan control engine modules
//!
//! Contains the on/off hysteresis engine and the stepped PWM curve.

mod command;
mod curve;
mod hysteresis;

pub use command::ActuatorCommand;
pub use curve::{normalize_speed, CurveTable};
pub use hysteresis::{HysteresisConfig, HysteresisController};
