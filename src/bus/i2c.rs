use crate::sensors::DeviceKey;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;
#[cfg(target_os = "linux")]
use i2cdev::linux::LinuxI2CDevice;

/// I2C bus error, carrying the platform error message
#[derive(Debug, Error)]
#[error("{0}")]
pub struct I2cError(String);

impl I2cError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Raw I2C transactions against a single slave address.
///
/// The address is bound when the bus is opened, so operations take no
/// address parameter. Implementations block the calling task for the
/// duration of the transfer.
#[async_trait]
pub trait I2cBus: Send {
    /// Write a single control byte to the device.
    async fn write_byte(&mut self, byte: u8) -> Result<(), I2cError>;

    /// Fill `buf` with bytes read from the device.
    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), I2cError>;

    /// One-byte read used as a liveness check. The device has no ready
    /// signal; a failed probe means it is not responding.
    async fn probe(&mut self) -> Result<(), I2cError>;
}

/// Opens the bus for a device key, binding the slave address.
pub type BusOpener =
    dyn Fn(DeviceKey) -> Result<Box<dyn I2cBus>, I2cError> + Send + Sync;

/// The default opener backed by the kernel i2c-dev interface.
pub fn open_device_bus() -> Arc<BusOpener> {
    Arc::new(|key| I2cDevBus::open(key).map(|bus| Box::new(bus) as Box<dyn I2cBus>))
}

/// I2C bus implementation over /dev/i2c-N
#[cfg(target_os = "linux")]
pub struct I2cDevBus {
    device: LinuxI2CDevice,
}

#[cfg(target_os = "linux")]
impl I2cDevBus {
    pub fn open(key: DeviceKey) -> Result<Self, I2cError> {
        let path = format!("/dev/i2c-{}", key.bus());
        let device =
            LinuxI2CDevice::new(&path, key.address() as u16).map_err(I2cError::new)?;
        Ok(Self { device })
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl I2cBus for I2cDevBus {
    async fn write_byte(&mut self, byte: u8) -> Result<(), I2cError> {
        self.device.write(&[byte]).map_err(I2cError::new)
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), I2cError> {
        self.device.read(buf).map_err(I2cError::new)
    }

    async fn probe(&mut self) -> Result<(), I2cError> {
        let mut scratch = [0u8; 1];
        self.device.read(&mut scratch).map_err(I2cError::new)
    }
}

#[cfg(not(target_os = "linux"))]
pub struct I2cDevBus {
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(not(target_os = "linux"))]
impl I2cDevBus {
    pub fn open(_key: DeviceKey) -> Result<Self, I2cError> {
        Err(I2cError::new("I2C is only supported on Linux"))
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl I2cBus for I2cDevBus {
    async fn write_byte(&mut self, _byte: u8) -> Result<(), I2cError> {
        Err(I2cError::new("I2C is only supported on Linux"))
    }

    async fn read_bytes(&mut self, _buf: &mut [u8]) -> Result<(), I2cError> {
        Err(I2cError::new("I2C is only supported on Linux"))
    }

    async fn probe(&mut self) -> Result<(), I2cError> {
        Err(I2cError::new("I2C is only supported on Linux"))
    }
}
