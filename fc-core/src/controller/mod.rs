//! Fan controllers
//!
//! Each controller owns its configuration and engine state behind a
//! read/write lock and drives one background [`PollLoop`]. Sensor and pin I/O
//! always happens outside the lock so status queries never wait on slow
//! hardware.
//!
//! - `on_off` - digital fan driven by the hysteresis engine
//! - `pwm` - proportional fan driven by the stepped curve
//! - `poll` - the fixed-period loop both of them use

mod on_off;
mod poll;
mod pwm;

use std::sync::Arc;

use serde::Serialize;

use crate::data::{extract_temperature, ExtractionSpec};
use crate::error::{FanError, Result};
use crate::hw::{run_blocking, DeviceRegistry, TemperatureSource};
use crate::settings::FanSettings;

pub use on_off::{OnOffFan, OnOffStatus};
pub use poll::PollLoop;
pub use pwm::{PwmFan, PwmStatus};

/// Sample the sensor and extract the configured temperature
pub(crate) async fn sample_temperature(
    sensor: Arc<dyn TemperatureSource>,
    extraction: ExtractionSpec,
) -> Result<f64> {
    let reading = run_blocking("sensor read", move || sensor.readings()).await?;
    Ok(extract_temperature(&reading, &extraction)?)
}

/// Live status of either controller kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FanStatus {
    OnOff(OnOffStatus),
    Pwm(PwmStatus),
}

/// A configured fan of either kind
pub enum FanController {
    OnOff(OnOffFan),
    Pwm(PwmFan),
}

impl FanController {
    /// Build the controller described by `settings` and start its loop
    pub async fn new(
        name: impl Into<String>,
        settings: &FanSettings,
        registry: &dyn DeviceRegistry,
    ) -> Result<Self> {
        match settings {
            FanSettings::OnOff(s) => Ok(Self::OnOff(OnOffFan::new(name, s, registry).await?)),
            FanSettings::Pwm(s) => Ok(Self::Pwm(PwmFan::new(name, s, registry).await?)),
        }
    }

    /// Apply new settings of the same kind
    pub async fn reconfigure(&self, settings: &FanSettings, registry: &dyn DeviceRegistry) -> Result<()> {
        match (self, settings) {
            (Self::OnOff(fan), FanSettings::OnOff(s)) => fan.reconfigure(s, registry).await,
            (Self::Pwm(fan), FanSettings::Pwm(s)) => fan.reconfigure(s, registry).await,
            _ => Err(FanError::config(format!(
                "cannot change controller kind from {} to {}",
                self.kind(),
                settings.kind()
            ))),
        }
    }

    pub async fn status(&self) -> Result<FanStatus> {
        match self {
            Self::OnOff(fan) => fan.status().await.map(FanStatus::OnOff),
            Self::Pwm(fan) => fan.status().await.map(FanStatus::Pwm),
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        match self {
            Self::OnOff(fan) => fan.shutdown().await,
            Self::Pwm(fan) => fan.shutdown().await,
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            Self::OnOff(fan) => fan.is_running(),
            Self::Pwm(fan) => fan.is_running(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::OnOff(fan) => fan.name(),
            Self::Pwm(fan) => fan.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::OnOff(_) => "on_off",
            Self::Pwm(_) => "pwm",
        }
    }
}
