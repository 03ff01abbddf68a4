//! Fan controller settings
//!
//! Serializable configuration for the two controller kinds, with validation
//! and conversion into the runtime types the engines work with.
//!
//! A settings file holds one controller:
//!
//! ```json
//! {
//!   "kind": "pwm",
//!   "board_name": "pi",
//!   "fan_pin": "12",
//!   "sensor_name": "cpu",
//!   "sensor_value_field": "temp",
//!   "temperature_table": { "0": 0, "50": 60, "70": 100 }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::ExtractionSpec;
use crate::engine::{CurveTable, HysteresisConfig};
use crate::error::{FanError, Result};

/// Settings for an on/off fan on a digital pin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnOffFanSettings {
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub fan_pin: String,
    #[serde(default)]
    pub sensor_name: String,
    #[serde(default)]
    pub sensor_value_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_value_regex: Option<String>,
    #[serde(default)]
    pub on_temperature: Option<f64>,
    #[serde(default)]
    pub off_temperature: Option<f64>,
    /// Seconds the fan must stay off before it may switch on
    #[serde(default)]
    pub on_delay: u64,
    /// Seconds the fan must stay on before it may switch off
    #[serde(default)]
    pub off_delay: u64,
}

/// Settings for a proportional fan on a PWM pin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PwmFanSettings {
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub fan_pin: String,
    #[serde(default)]
    pub sensor_name: String,
    #[serde(default)]
    pub sensor_value_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_value_regex: Option<String>,
    /// Temperature (as a string key) to speed, fraction or percentage
    #[serde(default)]
    pub temperature_table: Option<HashMap<String, f64>>,
}

/// Either controller kind, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FanSettings {
    OnOff(OnOffFanSettings),
    Pwm(PwmFanSettings),
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FanError::MissingConfig(name.to_string()));
    }
    Ok(())
}

impl OnOffFanSettings {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        require(&self.board_name, "board_name")?;
        require(&self.fan_pin, "fan_pin")?;
        require(&self.sensor_name, "sensor_name")?;
        require(&self.sensor_value_key, "sensor_value_key")?;

        if self.on_temperature.is_none() {
            return Err(FanError::MissingConfig("on_temperature".into()));
        }
        if self.off_temperature.is_none() {
            return Err(FanError::MissingConfig("off_temperature".into()));
        }

        Ok(())
    }

    pub fn extraction_spec(&self) -> Result<ExtractionSpec> {
        ExtractionSpec::new(&self.sensor_value_key, self.sensor_value_regex.as_deref())
    }

    pub fn hysteresis_config(&self) -> Result<HysteresisConfig> {
        let on_temperature = self
            .on_temperature
            .ok_or_else(|| FanError::MissingConfig("on_temperature".into()))?;
        let off_temperature = self
            .off_temperature
            .ok_or_else(|| FanError::MissingConfig("off_temperature".into()))?;

        Ok(HysteresisConfig {
            on_temperature,
            off_temperature,
            on_delay: Duration::from_secs(self.on_delay),
            off_delay: Duration::from_secs(self.off_delay),
        })
    }
}

impl PwmFanSettings {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        require(&self.board_name, "board_name")?;
        require(&self.fan_pin, "fan_pin")?;
        require(&self.sensor_name, "sensor_name")?;
        require(&self.sensor_value_field, "sensor_value_field")?;

        if self.temperature_table.is_none() {
            return Err(FanError::MissingConfig("temperature_table".into()));
        }

        Ok(())
    }

    pub fn extraction_spec(&self) -> Result<ExtractionSpec> {
        ExtractionSpec::new(&self.sensor_value_field, self.sensor_value_regex.as_deref())
    }

    pub fn curve_table(&self) -> Result<CurveTable> {
        let table = self
            .temperature_table
            .as_ref()
            .ok_or_else(|| FanError::MissingConfig("temperature_table".into()))?;
        CurveTable::from_config(table)
    }
}

impl FanSettings {
    pub fn validate(&self) -> Result<()> {
        match self {
            FanSettings::OnOff(s) => s.validate(),
            FanSettings::Pwm(s) => s.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FanSettings::OnOff(_) => "on_off",
            FanSettings::Pwm(_) => "pwm",
        }
    }
}

/// Load controller settings from a JSON file
pub fn load_settings(path: &Path) -> Result<FanSettings> {
    let content = fs::read_to_string(path).map_err(|e| FanError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: FanSettings = serde_json::from_str(&content)?;
    debug!(path = %path.display(), kind = settings.kind(), "Loaded fan settings");
    Ok(settings)
}
