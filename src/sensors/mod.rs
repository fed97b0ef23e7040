pub mod bh1750;

#[cfg(test)]
pub mod testing;

pub use bh1750::Bh1750Driver;

use crate::errors::{ConfigError, ConfigResult};
use std::fmt;
use std::time::Duration;

/// Primary I2C address of the BH1750FVI (ADDR pin low)
pub const I2C_ADDRESS_23: u8 = 0x23;
/// Secondary I2C address (ADDR pin high)
pub const I2C_ADDRESS_5C: u8 = 0x5c;

/// Bus numbers with an i2c-dev node on the supported boards
pub const SUPPORTED_BUSES: [u8; 2] = [0, 1];

/// Identity of one physical sensor: bus number plus 7-bit address.
///
/// Construction validates both fields, so a `DeviceKey` always refers to a
/// reachable-in-principle device and no bus access happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    bus: u8,
    address: u8,
}

impl DeviceKey {
    pub fn new(bus: u8, address: u8) -> ConfigResult<Self> {
        if !SUPPORTED_BUSES.contains(&bus) {
            return Err(ConfigError::UnsupportedBus { bus });
        }
        if address != I2C_ADDRESS_23 && address != I2C_ADDRESS_5C {
            return Err(ConfigError::UnsupportedAddress { address });
        }
        Ok(Self { bus, address })
    }

    pub fn bus(self) -> u8 {
        self.bus
    }

    pub fn address(self) -> u8 {
        self.address
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I2C_{}_{:x}", self.bus, self.address)
    }
}

/// One-time measurement modes of the BH1750FVI.
///
/// Each mode is selected by a single op-code write and needs a fixed
/// settling time before the result registers are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    OneTimeHighRes,
    OneTimeHighRes2,
    OneTimeLowRes,
}

impl MeasurementMode {
    /// Control byte selecting this mode
    pub fn opcode(self) -> u8 {
        match self {
            MeasurementMode::OneTimeHighRes => 0x20,
            MeasurementMode::OneTimeHighRes2 => 0x21,
            MeasurementMode::OneTimeLowRes => 0x23,
        }
    }

    /// Fixed conversion time before the data registers are valid
    pub fn measurement_time(self) -> Duration {
        match self {
            MeasurementMode::OneTimeHighRes => Duration::from_millis(120),
            MeasurementMode::OneTimeHighRes2 => Duration::from_millis(120),
            MeasurementMode::OneTimeLowRes => Duration::from_millis(16),
        }
    }

    /// Counts-to-lux divisor. The datasheet constant is 1.2 counts per lux;
    /// mode 2 halves the step size, which doubles the divisor.
    pub fn divisor(self) -> f32 {
        match self {
            MeasurementMode::OneTimeHighRes => 1.2,
            MeasurementMode::OneTimeHighRes2 => 2.4,
            MeasurementMode::OneTimeLowRes => 1.2,
        }
    }

    /// Convert the two big-endian result bytes to lux.
    pub fn lux_from_raw(self, data: [u8; 2]) -> f32 {
        u16::from_be_bytes(data) as f32 / self.divisor()
    }
}
