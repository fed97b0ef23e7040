//! Scripted bus doubles for driver, registry and handler tests.

use crate::bus::{BusOpener, I2cBus, I2cError};
use crate::sensors::DeviceKey;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared state behind every [`MockBus`] handed out by [`mock_opener`].
///
/// Tests flip the failure switches and inspect the counters; the code under
/// test only ever sees the `I2cBus` trait.
#[derive(Default)]
pub struct MockBusState {
    opened: AtomicUsize,
    released: AtomicUsize,
    fail_open: AtomicBool,
    fail_io: AtomicBool,
    written: Mutex<Vec<u8>>,
    reading: Mutex<[u8; 2]>,
}

impl MockBusState {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of times the opener produced a bus.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of bus handles dropped so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Every byte written through any handle, in order.
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    /// Raw bytes returned by the next reads.
    pub fn set_reading(&self, data: [u8; 2]) {
        *self.reading.lock().unwrap() = data;
    }

    /// Make the opener itself fail.
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make every transaction on open handles fail.
    pub fn fail_io(&self, fail: bool) {
        self.fail_io.store(fail, Ordering::SeqCst);
    }
}

pub struct MockBus {
    state: Arc<MockBusState>,
}

impl Drop for MockBus {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl I2cBus for MockBus {
    async fn write_byte(&mut self, byte: u8) -> Result<(), I2cError> {
        if self.state.fail_io.load(Ordering::SeqCst) {
            return Err(I2cError::new("injected write failure"));
        }
        self.state.written.lock().unwrap().push(byte);
        Ok(())
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), I2cError> {
        if self.state.fail_io.load(Ordering::SeqCst) {
            return Err(I2cError::new("injected read failure"));
        }
        let reading = *self.state.reading.lock().unwrap();
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = reading.get(i).copied().unwrap_or(0);
        }
        Ok(())
    }

    async fn probe(&mut self) -> Result<(), I2cError> {
        if self.state.fail_io.load(Ordering::SeqCst) {
            return Err(I2cError::new("injected probe failure"));
        }
        Ok(())
    }
}

/// Opener producing [`MockBus`] handles tied to `state`.
pub fn mock_opener(state: Arc<MockBusState>) -> Arc<BusOpener> {
    Arc::new(move |_key: DeviceKey| {
        if state.fail_open.load(Ordering::SeqCst) {
            return Err(I2cError::new("injected open failure"));
        }
        state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBus {
            state: state.clone(),
        }) as Box<dyn I2cBus>)
    })
}
