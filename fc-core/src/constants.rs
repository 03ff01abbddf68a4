//! Constants and configuration values for fanctl
//!
//! Centralizes the fixed timing and PWM values used by the controllers.

use std::time::Duration;

/// Control loop timing
pub mod timing {
    use super::Duration;

    /// Period between two control ticks
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// PWM output settings
pub mod pwm {
    /// Frequency programmed into the PWM pin when a proportional fan is configured
    pub const FREQUENCY_HZ: u32 = 1000;

    /// Speeds above 1.0 in a temperature table are percentages
    pub const PERCENT_DIVISOR: f64 = 100.0;

    /// Convert a duty cycle fraction to the percentage reported in status
    pub fn to_percent(duty_cycle: f64) -> f64 {
        duty_cycle * PERCENT_DIVISOR
    }
}
