//! Proportional fan on a PWM pin
//!
//! Every tick looks the temperature up in the curve table and writes the
//! resulting duty cycle, even when it has not changed. The PWM frequency is
//! set once whenever the pin is (re)configured.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info};

use super::poll::LoopSlot;
use super::{sample_temperature, PollLoop};
use crate::constants::{pwm, timing};
use crate::data::ExtractionSpec;
use crate::engine::{ActuatorCommand, CurveTable};
use crate::error::{FanError, Result};
use crate::hw::{run_blocking, DeviceRegistry, PwmActuator, TemperatureSource};
use crate::settings::PwmFanSettings;

/// Live status of a PWM fan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PwmStatus {
    pub temperature: f64,
    pub duty_cycle: f64,
    /// `duty_cycle` scaled to a percentage
    pub fan_speed_pct: f64,
}

struct PwmState {
    sensor: Arc<dyn TemperatureSource>,
    pin: Arc<dyn PwmActuator>,
    extraction: ExtractionSpec,
    table: Arc<CurveTable>,
    last_duty_cycle: Option<f64>,
}

struct Resolved {
    sensor: Arc<dyn TemperatureSource>,
    pin: Arc<dyn PwmActuator>,
    extraction: ExtractionSpec,
    table: CurveTable,
}

async fn resolve(settings: &PwmFanSettings, registry: &dyn DeviceRegistry) -> Result<Resolved> {
    settings.validate()?;
    let extraction = settings.extraction_spec()?;
    let table = settings.curve_table()?;

    let pin = registry
        .pwm_pin(&settings.board_name, &settings.fan_pin)
        .map_err(|e| {
            error!(board = %settings.board_name, pin = %settings.fan_pin, error = %e, "Error looking up fan pin");
            e
        })?;

    let sensor = registry.sensor(&settings.sensor_name).map_err(|e| {
        error!(sensor = %settings.sensor_name, error = %e, "Error looking up sensor");
        e
    })?;

    // Last step: nothing touches the pin until every lookup has succeeded
    let freq_pin = pin.clone();
    run_blocking("pwm frequency", move || freq_pin.set_frequency(pwm::FREQUENCY_HZ))
        .await
        .map_err(|e| {
            error!(pin = %settings.fan_pin, error = %e, "Error setting PWM frequency");
            e
        })?;

    Ok(Resolved {
        sensor,
        pin,
        extraction,
        table,
    })
}

/// Curve-controlled fan
pub struct PwmFan {
    name: String,
    state: Arc<RwLock<PwmState>>,
    poll: LoopSlot,
}

impl PwmFan {
    /// Configure the fan and start its control loop
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(
        name: impl Into<String>,
        settings: &PwmFanSettings,
        registry: &dyn DeviceRegistry,
    ) -> Result<Self> {
        let name = name.into();
        info!(fan = %name, "Starting PWM fan controller");

        let resolved = resolve(settings, registry).await?;
        let fan = Self {
            name,
            state: Arc::new(RwLock::new(PwmState {
                sensor: resolved.sensor,
                pin: resolved.pin,
                extraction: resolved.extraction,
                table: Arc::new(resolved.table),
                last_duty_cycle: None,
            })),
            poll: LoopSlot::default(),
        };

        fan.start_loop()?;
        Ok(fan)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply new settings atomically
    ///
    /// Invalid settings leave the current configuration untouched. A running
    /// loop is never restarted, and a fan that has been shut down stays down:
    /// this fails with [`FanError::NotRunning`].
    pub async fn reconfigure(&self, settings: &PwmFanSettings, registry: &dyn DeviceRegistry) -> Result<()> {
        debug!(fan = %self.name, "Reconfiguring PWM fan");
        if self.poll.is_stopped() {
            return Err(FanError::NotRunning);
        }
        let resolved = resolve(settings, registry).await?;

        {
            let mut state = self.state.write();
            state.sensor = resolved.sensor;
            state.pin = resolved.pin;
            state.extraction = resolved.extraction;
            state.table = Arc::new(resolved.table);
        }

        self.start_loop()
    }

    /// Current temperature and duty cycle, read live
    pub async fn status(&self) -> Result<PwmStatus> {
        let (sensor, pin, extraction) = {
            let state = self.state.read();
            (state.sensor.clone(), state.pin.clone(), state.extraction.clone())
        };

        let temperature = sample_temperature(sensor, extraction).await.map_err(|e| {
            error!(fan = %self.name, error = %e, "Error reading temperature");
            e
        })?;
        let duty_cycle = run_blocking("pwm duty read", move || pin.duty_cycle())
            .await
            .map_err(|e| {
                error!(fan = %self.name, error = %e, "Error getting fan speed");
                e
            })?;

        Ok(PwmStatus {
            temperature,
            duty_cycle,
            fan_speed_pct: pwm::to_percent(duty_cycle),
        })
    }

    /// Duty cycle written by the most recent successful tick
    pub fn last_duty_cycle(&self) -> Option<f64> {
        self.state.read().last_duty_cycle
    }

    /// Stop the control loop and wait for it to exit
    ///
    /// Calling this on a fan whose loop is already stopped returns
    /// [`FanError::NotRunning`].
    pub async fn shutdown(&self) -> Result<()> {
        info!(fan = %self.name, "Shutting down PWM fan controller");
        let poll = self.poll.close()?;
        poll.shutdown().await?;
        info!(fan = %self.name, "Control loop shut down");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.poll.is_running()
    }

    fn start_loop(&self) -> Result<()> {
        let state = self.state.clone();
        let name = self.name.clone();
        self.poll.start_with(|| {
            PollLoop::spawn(self.name.clone(), timing::POLL_INTERVAL, move || {
                let state = state.clone();
                let name = name.clone();
                async move { tick(&name, &state).await }
            })
        })
    }
}

async fn tick(name: &str, state: &RwLock<PwmState>) -> Result<()> {
    let (sensor, pin, extraction, table) = {
        let state = state.read();
        (
            state.sensor.clone(),
            state.pin.clone(),
            state.extraction.clone(),
            state.table.clone(),
        )
    };

    let temperature = sample_temperature(sensor, extraction).await?;
    let command = table.command(temperature)?;

    if let ActuatorCommand::DutyCycle(duty_cycle) = command {
        debug!(fan = %name, temperature, duty_cycle, "Setting fan speed");
        run_blocking("pwm duty write", move || pin.set_duty_cycle(duty_cycle)).await?;
        state.write().last_duty_cycle = Some(duty_cycle);
    }

    Ok(())
}
