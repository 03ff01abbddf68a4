//! In-memory sensors and pins shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use fc_core::{
    BinaryActuator, DeviceRegistry, FanError, PwmActuator, Reading, ReadingValue, Result,
    TemperatureSource,
};

/// Sensor whose `temp` field the test can change at any time
#[derive(Default)]
pub struct FakeSensor {
    value: Mutex<Option<ReadingValue>>,
    reads: AtomicU32,
}

impl FakeSensor {
    pub fn new(value: impl Into<ReadingValue>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(Some(value.into())),
            reads: AtomicU32::new(0),
        })
    }

    pub fn set(&self, value: impl Into<ReadingValue>) {
        *self.value.lock() = Some(value.into());
    }

    /// Make every subsequent read fail
    pub fn unplug(&self) {
        *self.value.lock() = None;
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TemperatureSource for FakeSensor {
    fn readings(&self) -> Result<Reading> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = self
            .value
            .lock()
            .clone()
            .ok_or_else(|| FanError::sensor("sensor unplugged"))?;

        let mut reading = Reading::new();
        reading.insert("temp".to_string(), value);
        Ok(reading)
    }
}

/// Digital pin that remembers every write
#[derive(Default)]
pub struct FakePin {
    high: Mutex<bool>,
    writes: Mutex<Vec<bool>>,
    fail_writes: AtomicBool,
    failed_writes: AtomicU32,
}

impl FakePin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_high(&self) -> bool {
        *self.high.lock()
    }

    /// Flip the pin without going through the controller
    pub fn force(&self, high: bool) {
        *self.high.lock() = high;
    }

    pub fn writes(&self) -> Vec<bool> {
        self.writes.lock().clone()
    }

    /// Make `set` fail until switched back
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn failed_writes(&self) -> u32 {
        self.failed_writes.load(Ordering::SeqCst)
    }
}

impl BinaryActuator for FakePin {
    fn get(&self) -> Result<bool> {
        Ok(*self.high.lock())
    }

    fn set(&self, high: bool) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            self.failed_writes.fetch_add(1, Ordering::SeqCst);
            return Err(FanError::actuator("pin write failed"));
        }
        *self.high.lock() = high;
        self.writes.lock().push(high);
        Ok(())
    }
}

/// PWM pin that remembers every duty cycle and frequency written
#[derive(Default)]
pub struct FakePwmPin {
    duty_cycle: Mutex<f64>,
    duty_writes: Mutex<Vec<f64>>,
    frequency_writes: Mutex<Vec<u32>>,
}

impl FakePwmPin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn duty_writes(&self) -> Vec<f64> {
        self.duty_writes.lock().clone()
    }

    pub fn frequency_writes(&self) -> Vec<u32> {
        self.frequency_writes.lock().clone()
    }
}

impl PwmActuator for FakePwmPin {
    fn duty_cycle(&self) -> Result<f64> {
        Ok(*self.duty_cycle.lock())
    }

    fn set_duty_cycle(&self, duty_cycle: f64) -> Result<()> {
        *self.duty_cycle.lock() = duty_cycle;
        self.duty_writes.lock().push(duty_cycle);
        Ok(())
    }

    fn set_frequency(&self, hz: u32) -> Result<()> {
        self.frequency_writes.lock().push(hz);
        Ok(())
    }
}

/// Registry keyed by sensor name and `board:pin`
#[derive(Default)]
pub struct FakeRegistry {
    sensors: HashMap<String, Arc<FakeSensor>>,
    pins: HashMap<String, Arc<FakePin>>,
    pwm_pins: HashMap<String, Arc<FakePwmPin>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensor(mut self, name: &str, sensor: Arc<FakeSensor>) -> Self {
        self.sensors.insert(name.to_string(), sensor);
        self
    }

    pub fn with_pin(mut self, board: &str, pin: &str, fake: Arc<FakePin>) -> Self {
        self.pins.insert(format!("{}:{}", board, pin), fake);
        self
    }

    pub fn with_pwm_pin(mut self, board: &str, pin: &str, fake: Arc<FakePwmPin>) -> Self {
        self.pwm_pins.insert(format!("{}:{}", board, pin), fake);
        self
    }
}

impl DeviceRegistry for FakeRegistry {
    fn sensor(&self, name: &str) -> Result<Arc<dyn TemperatureSource>> {
        self.sensors
            .get(name)
            .cloned()
            .map(|s| s as Arc<dyn TemperatureSource>)
            .ok_or_else(|| FanError::DeviceNotFound(format!("sensor {}", name)))
    }

    fn binary_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn BinaryActuator>> {
        self.pins
            .get(&format!("{}:{}", board, pin))
            .cloned()
            .map(|p| p as Arc<dyn BinaryActuator>)
            .ok_or_else(|| FanError::DeviceNotFound(format!("pin {}:{}", board, pin)))
    }

    fn pwm_pin(&self, board: &str, pin: &str) -> Result<Arc<dyn PwmActuator>> {
        self.pwm_pins
            .get(&format!("{}:{}", board, pin))
            .cloned()
            .map(|p| p as Arc<dyn PwmActuator>)
            .ok_or_else(|| FanError::DeviceNotFound(format!("pwm pin {}:{}", board, pin)))
    }
}
