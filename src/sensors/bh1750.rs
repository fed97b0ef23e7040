use crate::bus::{BusOpener, I2cBus};
use crate::errors::{DriverError, DriverResult};
use crate::sensors::{DeviceKey, MeasurementMode};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

const OPECODE_POWER_DOWN: u8 = 0x00;

const SENSOR_DATA_LENGTH: usize = 2;

/// The mode used for every reading: best resolution, single triggered
/// conversion, automatic power-down afterwards.
const MEASUREMENT_MODE: MeasurementMode = MeasurementMode::OneTimeHighRes2;

/// Driver for one BH1750FVI ambient light sensor.
///
/// The bus handle is opened on the first `open` and released when the open
/// count returns to zero, so several consumers of the same [`DeviceKey`] can
/// share one driver without the device ever being opened twice. All bus
/// transactions are serialized through the state lock; only one measurement
/// is in flight at a time.
pub struct Bh1750Driver {
    key: DeviceKey,
    opener: Arc<BusOpener>,
    state: Mutex<DriverState>,
}

#[derive(Default)]
struct DriverState {
    bus: Option<Box<dyn I2cBus>>,
    use_count: u32,
}

impl Bh1750Driver {
    pub fn new(key: DeviceKey, opener: Arc<BusOpener>) -> Self {
        Self {
            key,
            opener,
            state: Mutex::new(DriverState::default()),
        }
    }

    pub fn key(&self) -> DeviceKey {
        self.key
    }

    /// Increment the open count, opening the bus on the first open.
    pub async fn open(&self) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        debug!("[{}] before open - use_count: {}", self.key, state.use_count);
        if state.use_count == 0 {
            let bus = (self.opener)(self.key)?;
            state.bus = Some(bus);
            info!("[{}] opened", self.key);
        }
        state.use_count += 1;
        debug!("[{}] after open - use_count: {}", self.key, state.use_count);
        Ok(())
    }

    /// Decrement the open count, releasing the bus when it reaches zero.
    ///
    /// Never fails: cleanup always completes, and any power-down write
    /// failure is only logged.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        debug!("[{}] before close - use_count: {}", self.key, state.use_count);
        match state.use_count {
            0 => warn!("[{}] close without matching open", self.key),
            1 => {
                state.use_count = 0;
                if let Some(mut bus) = state.bus.take() {
                    if let Err(e) = bus.write_byte(OPECODE_POWER_DOWN).await {
                        debug!("[{}] power-down on close failed: {}", self.key, e);
                    }
                    info!("[{}] closed", self.key);
                }
            }
            _ => state.use_count -= 1,
        }
        debug!("[{}] after close - use_count: {}", self.key, state.use_count);
    }

    /// Probe the device with a bare read.
    ///
    /// `Ok(false)` means the driver is not open; a failed probe on an open
    /// bus surfaces as a communication error.
    pub async fn is_alive(&self) -> DriverResult<bool> {
        let mut state = self.state.lock().await;
        let Some(bus) = state.bus.as_mut() else {
            return Ok(false);
        };
        bus.probe().await?;
        Ok(true)
    }

    /// Trigger a one-shot measurement and return the illuminance in lux.
    ///
    /// The sensor has no ready flag; the fixed measurement time is the
    /// synchronization. The state lock is held across the wait, so the
    /// sequence write - sleep - read is never interleaved with another
    /// transaction on this device.
    pub async fn get_optical(&self) -> DriverResult<f32> {
        let mut state = self.state.lock().await;
        let bus = state.bus.as_mut().ok_or(DriverError::NotOpen)?;

        trace!(
            "[{}] sensor command: write: {:02x}",
            self.key,
            MEASUREMENT_MODE.opcode()
        );
        bus.write_byte(MEASUREMENT_MODE.opcode()).await.map_err(|e| {
            warn!("[{}] failed to write", self.key);
            DriverError::from(e)
        })?;

        sleep(MEASUREMENT_MODE.measurement_time()).await;

        let mut data = [0u8; SENSOR_DATA_LENGTH];
        bus.read_bytes(&mut data).await.map_err(|e| {
            warn!("[{}] failed to read", self.key);
            DriverError::from(e)
        })?;
        trace!(
            "[{}] sensor command: read: {:02x} {:02x}",
            self.key,
            data[0],
            data[1]
        );

        Ok(MEASUREMENT_MODE.lux_from_raw(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::{mock_opener, MockBusState};
    use crate::sensors::I2C_ADDRESS_23;

    fn test_driver(state: &Arc<MockBusState>) -> Bh1750Driver {
        let key = DeviceKey::new(1, I2C_ADDRESS_23).unwrap();
        Bh1750Driver::new(key, mock_opener(state.clone()))
    }

    #[tokio::test]
    async fn open_close_are_reference_counted() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);

        for _ in 0..3 {
            driver.open().await.unwrap();
        }
        assert_eq!(state.opened(), 1);

        driver.close().await;
        driver.close().await;
        assert_eq!(state.released(), 0, "bus must stay open after partial closes");
        assert!(driver.is_alive().await.unwrap());

        driver.close().await;
        assert_eq!(state.released(), 1, "third close releases the bus");
        assert_eq!(state.opened(), 1);
    }

    #[tokio::test]
    async fn reopen_after_release_opens_the_bus_again() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);

        driver.open().await.unwrap();
        driver.close().await;
        driver.open().await.unwrap();

        assert_eq!(state.opened(), 2);
        assert_eq!(state.released(), 1);
    }

    #[tokio::test]
    async fn unbalanced_close_is_harmless() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);

        driver.close().await;
        driver.open().await.unwrap();
        assert_eq!(state.opened(), 1);
        assert!(driver.is_alive().await.unwrap());
    }

    #[tokio::test]
    async fn get_optical_converts_the_reading() {
        let state = MockBusState::shared();
        state.set_reading([0x01, 0x08]);
        let driver = test_driver(&state);

        driver.open().await.unwrap();
        let lux = driver.get_optical().await.unwrap();
        assert!((lux - 110.0).abs() < 1e-4);
        assert_eq!(state.written(), vec![0x21]);
    }

    #[tokio::test]
    async fn get_optical_without_open_is_not_a_bus_error() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);

        let err = driver.get_optical().await.unwrap_err();
        assert!(matches!(err, DriverError::NotOpen));
        assert_eq!(state.opened(), 0);
    }

    #[tokio::test]
    async fn io_failure_surfaces_as_communication_error() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);

        driver.open().await.unwrap();
        state.fail_io(true);

        let err = driver.get_optical().await.unwrap_err();
        assert!(err.is_communication());
        assert!(driver.is_alive().await.is_err());
    }

    #[tokio::test]
    async fn is_alive_false_when_not_open() {
        let state = MockBusState::shared();
        let driver = test_driver(&state);
        assert!(!driver.is_alive().await.unwrap());
    }
}
