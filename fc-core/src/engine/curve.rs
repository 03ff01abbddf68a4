//! Stepped fan curve for PWM fans
//!
//! A table of temperature breakpoints, each with a duty cycle. The duty cycle
//! for a temperature comes from the highest breakpoint at or below it; there
//! is no interpolation between breakpoints.
//!
//! Speeds greater than 1.0 are read as percentages and divided by 100.
//! Nothing is clamped, so `150` becomes a duty cycle of `1.5`.

use std::collections::HashMap;

use super::ActuatorCommand;
use crate::constants::pwm;
use crate::error::{FanError, Result};

/// Breakpoints sorted from hottest to coolest
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    /// (temperature, duty cycle), strictly descending by temperature
    points: Vec<(f64, f64)>,
}

impl CurveTable {
    /// Build a table from (temperature, speed) pairs in any order
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self> {
        let mut points: Vec<(f64, f64)> = points
            .into_iter()
            .map(|(temperature, speed)| (temperature, normalize_speed(speed)))
            .collect();

        if points.is_empty() {
            return Err(FanError::invalid_config(
                "temperature_table",
                "table must have at least one breakpoint",
            ));
        }

        if let Some((temperature, speed)) = points
            .iter()
            .find(|(t, s)| !t.is_finite() || !s.is_finite())
        {
            return Err(FanError::invalid_config(
                "temperature_table",
                format!("non-finite entry {} -> {}", temperature, speed),
            ));
        }

        points.sort_by(|a, b| b.0.total_cmp(&a.0));

        if let Some(pair) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(FanError::invalid_config(
                "temperature_table",
                format!("duplicate breakpoint {}", pair[0].0),
            ));
        }

        Ok(Self { points })
    }

    /// Build a table from the string-keyed map found in configuration files
    pub fn from_config(table: &HashMap<String, f64>) -> Result<Self> {
        let points = table
            .iter()
            .map(|(key, speed)| {
                key.trim()
                    .parse::<f64>()
                    .map(|temperature| (temperature, *speed))
                    .map_err(|e| {
                        FanError::invalid_config(
                            "temperature_table",
                            format!("cannot parse temperature '{}': {}", key, e),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_points(points)
    }

    /// Duty cycle for `temperature`
    ///
    /// Fails with [`FanError::NoBreakpointMatched`] when the temperature is
    /// below every breakpoint. Tables normally include a breakpoint at 0 to
    /// avoid that in practice.
    pub fn speed(&self, temperature: f64) -> Result<f64> {
        self.points
            .iter()
            .find(|(breakpoint, _)| *breakpoint <= temperature)
            .map(|(_, speed)| *speed)
            .ok_or(FanError::NoBreakpointMatched { temperature })
    }

    /// [`speed`](Self::speed) as an actuator command
    pub fn command(&self, temperature: f64) -> Result<ActuatorCommand> {
        self.speed(temperature).map(ActuatorCommand::DutyCycle)
    }

    /// Breakpoint temperatures, hottest first
    pub fn breakpoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Values above 1.0 are percentages, everything else is already a fraction
pub fn normalize_speed(speed: f64) -> f64 {
    if speed > 1.0 {
        speed / pwm::PERCENT_DIVISOR
    } else {
        speed
    }
}
