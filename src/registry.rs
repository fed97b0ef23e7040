use crate::bus::{open_device_bus, BusOpener};
use crate::sensors::{Bh1750Driver, DeviceKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Process-wide cache of driver instances, one per [`DeviceKey`].
///
/// Lookup and insert happen under one lock, so two concurrent requests for
/// the same key can never construct two drivers. The registry hands out
/// shared handles; opening and closing the underlying bus is the driver's
/// reference-counted business.
pub struct DriverRegistry {
    opener: Arc<BusOpener>,
    drivers: Mutex<HashMap<DeviceKey, Arc<Bh1750Driver>>>,
}

impl DriverRegistry {
    /// Registry backed by the kernel i2c-dev interface.
    pub fn new() -> Self {
        Self::with_opener(open_device_bus())
    }

    /// Registry with a custom bus opener.
    pub fn with_opener(opener: Arc<BusOpener>) -> Self {
        Self {
            opener,
            drivers: Mutex::new(HashMap::new()),
        }
    }

    /// The driver for `key`, constructing it on first request.
    pub fn instance(&self, key: DeviceKey) -> Arc<Bh1750Driver> {
        let mut drivers = self.drivers.lock().expect("driver registry lock poisoned");
        drivers
            .entry(key)
            .or_insert_with(|| {
                debug!("[registry] creating driver for {}", key);
                Arc::new(Bh1750Driver::new(key, self.opener.clone()))
            })
            .clone()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
