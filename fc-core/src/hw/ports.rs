//! Sensor and actuator ports
//!
//! The controllers never touch hardware directly. A sensor driver provides a
//! [`TemperatureSource`]; a board provides a [`BinaryActuator`] (digital pin)
//! or a [`PwmActuator`] (PWM pin). All calls may block, so the control loop
//! runs them on tokio's blocking pool.

use std::sync::Arc;

use crate::data::Reading;
use crate::error::Result;

/// A sensor that can be sampled
#[cfg_attr(test, mockall::automock)]
pub trait TemperatureSource: Send + Sync {
    /// Take a fresh reading
    fn readings(&self) -> Result<Reading>;
}

/// A digital output pin driving an on/off fan
#[cfg_attr(test, mockall::automock)]
pub trait BinaryActuator: Send + Sync {
    /// Whether the pin is currently high
    fn get(&self) -> Result<bool>;

    /// Drive the pin high or low
    fn set(&self, high: bool) -> Result<()>;
}

/// A PWM output pin driving a proportional fan
#[cfg_attr(test, mockall::automock)]
pub trait PwmActuator: Send + Sync {
    /// Current duty cycle as a fraction
    fn duty_cycle(&self) -> Result<f64>;

    /// Set the duty cycle as a fraction
    fn set_duty_cycle(&self, duty_cycle: f64) -> Result<()>;

    /// Set the PWM frequency in hertz
    fn set_frequency(&self, hz: u32) -> Result<()>;
}

/// Resolves the board, pin and sensor names found in configuration
///
/// Lookup failures are configuration errors and abort a reconfiguration.
pub trait DeviceRegistry: Send + Sync {
    fn sensor(&self, name: &str) -> Result<Arc<dyn TemperatureSource>>;

    fn binary_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn BinaryActuator>>;

    fn pwm_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn PwmActuator>>;
}
