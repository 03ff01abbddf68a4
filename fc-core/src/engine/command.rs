//! Commands produced by the engines

use std::fmt;

/// What a controller wants written to its actuator on this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    /// Drive a digital pin high (`true`) or low
    Binary(bool),
    /// Set a PWM duty cycle, as a fraction
    DutyCycle(f64),
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::Binary(true) => write!(f, "on"),
            ActuatorCommand::Binary(false) => write!(f, "off"),
            ActuatorCommand::DutyCycle(duty) => write!(f, "duty cycle {:.2}", duty),
        }
    }
}
