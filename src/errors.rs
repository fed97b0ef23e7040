use crate::bus::i2c::I2cError;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I2C bus {bus} is not supported: expected 0 or 1")]
    UnsupportedBus { bus: u8 },

    #[error("I2C address {address:#04x} is not supported: expected 0x23 or 0x5c")]
    UnsupportedAddress { address: u8 },

    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised by the BH1750 driver
#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I2C communication failed: {0}")]
    Comm(#[from] I2cError),

    #[error("device is not open")]
    NotOpen,
}

impl DriverError {
    /// True for errors raised by a bus transaction rather than by validation.
    pub fn is_communication(&self) -> bool {
        matches!(self, DriverError::Comm(_) | DriverError::NotOpen)
    }
}

/// Result type aliases for convenience
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DriverResult<T> = Result<T, DriverError>;
