//! Directory-backed sensors and pins
//!
//! Layout under the devices root:
//!
//! ```text
//! sensors/<name>.json       JSON object, one reading
//! boards/<board>/<pin>      digital pin: "0" or "1"
//!                           PWM pin: duty cycle as a fraction
//! boards/<board>/<pin>.freq PWM frequency in hertz
//! ```
//!
//! Anything that can write these files (a board driver, a test harness, a
//! shell script) can stand in for real hardware.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fc_core::{BinaryActuator, DeviceRegistry, PwmActuator, Reading, TemperatureSource};
use fc_error::{FanError, Result};
use tracing::debug;

/// Reject names that would escape the devices root
fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(FanError::invalid_config(
            kind,
            format!("'{}' is not a valid device name", name),
        ));
    }
    Ok(())
}

fn read_trimmed(path: &Path) -> std::io::Result<String> {
    fs::read_to_string(path).map(|content| content.trim().to_string())
}

/// Registry over a devices directory
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    root: PathBuf,
}

impl DirectoryRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pin_path(&self, board: &str, pin: &str) -> Result<PathBuf> {
        check_name("board_name", board)?;
        check_name("fan_pin", pin)?;

        let board_dir = self.root.join("boards").join(board);
        if !board_dir.is_dir() {
            return Err(FanError::DeviceNotFound(format!("board {}", board)));
        }

        let path = board_dir.join(pin);
        if !path.is_file() {
            return Err(FanError::DeviceNotFound(format!("pin {} on board {}", pin, board)));
        }
        Ok(path)
    }
}

impl DeviceRegistry for DirectoryRegistry {
    fn sensor(&self, name: &str) -> Result<Arc<dyn TemperatureSource>> {
        check_name("sensor_name", name)?;

        let path = self.root.join("sensors").join(format!("{}.json", name));
        if !path.is_file() {
            return Err(FanError::DeviceNotFound(format!("sensor {}", name)));
        }

        debug!(sensor = %name, path = %path.display(), "Resolved sensor");
        Ok(Arc::new(JsonFileSensor { path }))
    }

    fn binary_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn BinaryActuator>> {
        let path = self.pin_path(board, pin)?;
        debug!(board = %board, pin = %pin, path = %path.display(), "Resolved digital pin");
        Ok(Arc::new(FilePin { path }))
    }

    fn pwm_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn PwmActuator>> {
        let path = self.pin_path(board, pin)?;
        let freq_path = path.with_file_name(format!("{}.freq", pin));
        debug!(board = %board, pin = %pin, path = %path.display(), "Resolved PWM pin");
        Ok(Arc::new(FilePwmPin { path, freq_path }))
    }
}

/// Sensor reading a JSON object from a file on every sample
#[derive(Debug)]
pub struct JsonFileSensor {
    path: PathBuf,
}

impl TemperatureSource for JsonFileSensor {
    fn readings(&self) -> Result<Reading> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| FanError::sensor(format!("{}: {}", self.path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| FanError::sensor(format!("{}: invalid reading: {}", self.path.display(), e)))
    }
}

/// Digital pin stored as "0" or "1"
#[derive(Debug)]
pub struct FilePin {
    path: PathBuf,
}

impl BinaryActuator for FilePin {
    fn get(&self) -> Result<bool> {
        let value = read_trimmed(&self.path)
            .map_err(|e| FanError::actuator(format!("{}: {}", self.path.display(), e)))?;

        match value.as_str() {
            "1" => Ok(true),
            "0" | "" => Ok(false),
            other => Err(FanError::actuator(format!(
                "{}: unexpected pin value '{}'",
                self.path.display(),
                other
            ))),
        }
    }

    fn set(&self, high: bool) -> Result<()> {
        fs::write(&self.path, if high { "1\n" } else { "0\n" })
            .map_err(|e| FanError::actuator(format!("{}: {}", self.path.display(), e)))
    }
}

/// PWM pin storing its duty cycle and frequency in two files
#[derive(Debug)]
pub struct FilePwmPin {
    path: PathBuf,
    freq_path: PathBuf,
}

impl PwmActuator for FilePwmPin {
    fn duty_cycle(&self) -> Result<f64> {
        let value = read_trimmed(&self.path)
            .map_err(|e| FanError::actuator(format!("{}: {}", self.path.display(), e)))?;

        if value.is_empty() {
            return Ok(0.0);
        }
        value.parse::<f64>().map_err(|e| {
            FanError::actuator(format!(
                "{}: failed to parse '{}': {}",
                self.path.display(),
                value,
                e
            ))
        })
    }

    fn set_duty_cycle(&self, duty_cycle: f64) -> Result<()> {
        fs::write(&self.path, format!("{}\n", duty_cycle))
            .map_err(|e| FanError::actuator(format!("{}: {}", self.path.display(), e)))
    }

    fn set_frequency(&self, hz: u32) -> Result<()> {
        fs::write(&self.freq_path, format!("{}\n", hz))
            .map_err(|e| FanError::actuator(format!("{}: {}", self.freq_path.display(), e)))
    }
}
