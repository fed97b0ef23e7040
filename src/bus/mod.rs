pub mod i2c;

pub use i2c::{open_device_bus, BusOpener, I2cBus, I2cError};
