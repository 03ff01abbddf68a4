//! Hardware interaction modules
//!
//! - `ports` - traits implemented by sensor drivers and boards
//! - `blocking` - running port calls off the async executor

mod blocking;
mod ports;

pub(crate) use blocking::run_blocking;
pub use ports::{BinaryActuator, DeviceRegistry, PwmActuator, TemperatureSource};

#[cfg(test)]
pub(crate) use ports::{MockBinaryActuator, MockPwmActuator, MockTemperatureSource};
