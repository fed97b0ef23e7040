use crate::errors::{ConfigError, ConfigResult};
use crate::sensors::DeviceKey;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Root configuration struct expecting a `[device]` TOML table
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub device: DeviceEntry,
}

/// The sensor connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    /// I2C bus number (0 or 1)
    pub bus: u8,
    /// 7-bit address as a hex string, "23" or "5c"
    pub address: String,
    /// Poll interval in seconds; 0 disables polling
    pub refresh: u64,
}

impl DeviceConfig {
    /// Validated device identity from the raw settings.
    pub fn device_key(&self) -> ConfigResult<DeviceKey> {
        let address =
            u8::from_str_radix(&self.device.address, 16).map_err(|e| ConfigError::InvalidValue {
                field: "address".to_string(),
                reason: e.to_string(),
            })?;
        DeviceKey::new(self.device.bus, address)
    }

    /// Poll interval, or `None` when polling is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.device.refresh > 0 {
            Some(Duration::from_secs(self.device.refresh))
        } else {
            None
        }
    }
}

/// Loads config from TOML file
pub fn load_device_config(path: &str) -> ConfigResult<DeviceConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    let parsed: DeviceConfig = toml::from_str(&content)?;
    Ok(parsed)
}
