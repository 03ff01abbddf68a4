//! On/off fan engine with hysteresis and dwell times
//!
//! # How It Works
//!
//! 1. **Two thresholds**: the fan turns on at `on_temperature` or above and
//!    turns off strictly below `off_temperature`. Ties favour running the fan.
//!
//! 2. **Dwell times**: after any switch the fan must stay in its new state for
//!    `on_delay` (before switching on again) or `off_delay` (before switching
//!    off again). This keeps the fan from chattering around the threshold.
//!
//! The engine never trusts its own idea of whether the fan runs: callers pass
//! the state read back from the pin on every evaluation.

use std::time::{Duration, Instant};

use super::ActuatorCommand;

/// Thresholds and dwell times for an on/off fan
///
/// No ordering is enforced between the two thresholds. A table with
/// `off_temperature > on_temperature` is accepted and only the delays keep it
/// from toggling.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisConfig {
    pub on_temperature: f64,
    pub off_temperature: f64,
    pub on_delay: Duration,
    pub off_delay: Duration,
}

/// On/off state machine
#[derive(Debug, Clone)]
pub struct HysteresisController {
    config: HysteresisConfig,
    /// `None` until the first switch, so no delay blocks it
    last_state_change: Option<Instant>,
}

impl HysteresisController {
    pub fn new(config: HysteresisConfig) -> Self {
        Self {
            config,
            last_state_change: None,
        }
    }

    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Replace thresholds and delays, keeping the time of the last switch
    pub fn set_config(&mut self, config: HysteresisConfig) {
        self.config = config;
    }

    pub fn last_state_change(&self) -> Option<Instant> {
        self.last_state_change
    }

    /// Fan is off, it is hot enough and it has been off for at least `on_delay`
    pub fn should_turn_on(&self, temperature: f64, is_running: bool, now: Instant) -> bool {
        temperature >= self.config.on_temperature
            && !is_running
            && self.dwell_elapsed(self.config.on_delay, now)
    }

    /// Fan is on, it is cool enough and it has been on for at least `off_delay`
    pub fn should_turn_off(&self, temperature: f64, is_running: bool, now: Instant) -> bool {
        temperature < self.config.off_temperature
            && is_running
            && self.dwell_elapsed(self.config.off_delay, now)
    }

    /// Decide the command for this tick
    ///
    /// Returns `Some(true)` to switch on, `Some(false)` to switch off and
    /// `None` when the pin should be left alone. Being already in the desired
    /// state is a no-op, not a reason to touch the timer.
    pub fn evaluate(&self, temperature: f64, is_running: bool, now: Instant) -> Option<bool> {
        if self.should_turn_on(temperature, is_running, now) {
            Some(true)
        } else if self.should_turn_off(temperature, is_running, now) {
            Some(false)
        } else {
            None
        }
    }

    /// [`evaluate`](Self::evaluate) as an actuator command
    pub fn command(&self, temperature: f64, is_running: bool, now: Instant) -> Option<ActuatorCommand> {
        self.evaluate(temperature, is_running, now)
            .map(ActuatorCommand::Binary)
    }

    /// Record that the pin was switched at `now`
    pub fn record_transition(&mut self, now: Instant) {
        self.last_state_change = Some(now);
    }

    fn dwell_elapsed(&self, delay: Duration, now: Instant) -> bool {
        match self.last_state_change {
            None => true,
            Some(last) => last
                .checked_add(delay)
                .map(|ready_at| now >= ready_at)
                .unwrap_or(false),
        }
    }
}
