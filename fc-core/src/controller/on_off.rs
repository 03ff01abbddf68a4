//! On/off fan on a digital pin
//!
//! Every tick reads the temperature and the pin, asks the hysteresis engine
//! whether to switch, and writes the pin only when it says so. The pin is read
//! back each time so a fan switched by someone else is picked up.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info};

use super::poll::LoopSlot;
use super::{sample_temperature, PollLoop};
use crate::constants::timing;
use crate::data::ExtractionSpec;
use crate::engine::{ActuatorCommand, HysteresisConfig, HysteresisController};
use crate::error::{FanError, Result};
use crate::hw::{run_blocking, BinaryActuator, DeviceRegistry, TemperatureSource};
use crate::settings::OnOffFanSettings;

/// Live status of an on/off fan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OnOffStatus {
    pub temperature: f64,
    pub fan_is_running: bool,
}

struct OnOffState {
    sensor: Arc<dyn TemperatureSource>,
    pin: Arc<dyn BinaryActuator>,
    extraction: ExtractionSpec,
    engine: HysteresisController,
}

impl OnOffState {
    fn ports(&self) -> (Arc<dyn TemperatureSource>, Arc<dyn BinaryActuator>, ExtractionSpec) {
        (self.sensor.clone(), self.pin.clone(), self.extraction.clone())
    }
}

/// Everything resolved from settings before the lock is taken
struct Resolved {
    sensor: Arc<dyn TemperatureSource>,
    pin: Arc<dyn BinaryActuator>,
    extraction: ExtractionSpec,
    config: HysteresisConfig,
}

fn resolve(settings: &OnOffFanSettings, registry: &dyn DeviceRegistry) -> Result<Resolved> {
    settings.validate()?;
    let extraction = settings.extraction_spec()?;
    let config = settings.hysteresis_config()?;

    let pin = registry
        .binary_pin(&settings.board_name, &settings.fan_pin)
        .map_err(|e| {
            error!(board = %settings.board_name, pin = %settings.fan_pin, error = %e, "Error looking up fan pin");
            e
        })?;
    let sensor = registry.sensor(&settings.sensor_name).map_err(|e| {
        error!(sensor = %settings.sensor_name, error = %e, "Error looking up sensor");
        e
    })?;

    Ok(Resolved {
        sensor,
        pin,
        extraction,
        config,
    })
}

/// Hysteresis-controlled fan
pub struct OnOffFan {
    name: String,
    state: Arc<RwLock<OnOffState>>,
    poll: LoopSlot,
}

impl OnOffFan {
    /// Configure the fan and start its control loop
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(
        name: impl Into<String>,
        settings: &OnOffFanSettings,
        registry: &dyn DeviceRegistry,
    ) -> Result<Self> {
        let name = name.into();
        info!(fan = %name, "Starting on/off fan controller");

        let resolved = resolve(settings, registry)?;
        let fan = Self {
            name,
            state: Arc::new(RwLock::new(OnOffState {
                sensor: resolved.sensor,
                pin: resolved.pin,
                extraction: resolved.extraction,
                engine: HysteresisController::new(resolved.config),
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
    /// Invalid settings leave the current configuration untouched. The time of
    /// the last switch survives, so dwell times keep counting across a reload.
    /// A running loop is never restarted, and a fan that has been shut down
    /// stays down: this fails with [`FanError::NotRunning`].
    pub async fn reconfigure(
        &self,
        settings: &OnOffFanSettings,
        registry: &dyn DeviceRegistry,
    ) -> Result<()> {
        debug!(fan = %self.name, "Reconfiguring on/off fan");
        if self.poll.is_stopped() {
            return Err(FanError::NotRunning);
        }
        let resolved = resolve(settings, registry)?;

        {
            let mut state = self.state.write();
            state.sensor = resolved.sensor;
            state.pin = resolved.pin;
            state.extraction = resolved.extraction;
            state.engine.set_config(resolved.config);
        }

        self.start_loop()
    }

    /// Current temperature and pin state, read live
    pub async fn status(&self) -> Result<OnOffStatus> {
        let (sensor, pin, extraction) = self.state.read().ports();

        let temperature = sample_temperature(sensor, extraction).await.map_err(|e| {
            error!(fan = %self.name, error = %e, "Error reading temperature");
            e
        })?;
        let fan_is_running = run_blocking("fan pin read", move || pin.get())
            .await
            .map_err(|e| {
                error!(fan = %self.name, error = %e, "Error getting fan state");
                e
            })?;

        Ok(OnOffStatus {
            temperature,
            fan_is_running,
        })
    }

    /// Active thresholds and delays
    pub fn config(&self) -> HysteresisConfig {
        self.state.read().engine.config().clone()
    }

    /// When the pin was last switched by this controller
    pub fn last_state_change(&self) -> Option<std::time::Instant> {
        self.state.read().engine.last_state_change()
    }

    /// Stop the control loop and wait for it to exit
    ///
    /// Calling this on a fan whose loop is already stopped is a caller error
    /// and returns [`FanError::NotRunning`].
    pub async fn shutdown(&self) -> Result<()> {
        info!(fan = %self.name, "Shutting down on/off fan controller");
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

async fn tick(name: &str, state: &RwLock<OnOffState>) -> Result<()> {
    let (sensor, pin, extraction) = state.read().ports();

    let temperature = sample_temperature(sensor, extraction).await?;
    let reader = pin.clone();
    let is_running = run_blocking("fan pin read", move || reader.get()).await?;

    let now = tokio::time::Instant::now().into_std();
    let command = state.read().engine.command(temperature, is_running, now);

    if let Some(ActuatorCommand::Binary(high)) = command {
        info!(fan = %name, temperature, "Turning fan {}", ActuatorCommand::Binary(high));
        run_blocking("fan pin write", move || pin.set(high)).await?;
        state.write().engine.record_transition(now);
    }

    Ok(())
}
