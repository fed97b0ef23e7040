use crate::config::DeviceConfig;
use crate::errors::{DriverError, DriverResult};
use crate::host::HostLink;
use crate::messages::{ChannelUid, Command, StateUpdate, StatusDetail, ThingStatus, CHANNEL_ILLUMINANCE};
use crate::registry::DriverRegistry;
use crate::scheduler;
use crate::sensors::Bh1750Driver;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of the handled device.
///
/// `Online` is the measuring state. A communication failure on the timer
/// path tears the driver down and parks in `PendingReinit`; the next cycle
/// makes exactly one reopen attempt. Initialization failures are
/// configuration errors and land in `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerState {
    Online,
    PendingReinit,
    Failed,
}

struct HandlerInner {
    driver: Option<Arc<Bh1750Driver>>,
    state: HandlerState,
}

/// Polling controller for one BH1750 device.
///
/// Owns the driver lifecycle between `initialize` and `dispose`, publishes
/// readings and status transitions through the [`HostLink`], and reacts to
/// explicit refresh commands from the host.
pub struct LightSensorHandler {
    config: DeviceConfig,
    registry: Arc<DriverRegistry>,
    host: Arc<dyn HostLink>,
    inner: Mutex<HandlerInner>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl LightSensorHandler {
    pub fn new(
        config: DeviceConfig,
        registry: Arc<DriverRegistry>,
        host: Arc<dyn HostLink>,
    ) -> Self {
        Self {
            config,
            registry,
            host,
            inner: Mutex::new(HandlerInner {
                driver: None,
                state: HandlerState::Failed,
            }),
            poll_task: Mutex::new(None),
        }
    }

    /// Open the device and, unless refresh is 0, start the poll task.
    pub async fn initialize(self: Arc<Self>) {
        self.init_device().await;

        match self.config.refresh_interval() {
            Some(interval) => {
                let task = scheduler::spawn_poll_task(self.clone(), interval);
                *self.poll_task.lock().await = Some(task);
                info!("[handler] polling every {:?}", interval);
            }
            None => info!("[handler] refresh is 0, polling disabled"),
        }
    }

    /// One timer cycle.
    pub async fn poll(&self) {
        let state = self.inner.lock().await.state;
        match state {
            HandlerState::Online => self.poll_online().await,
            HandlerState::PendingReinit => {
                debug!("[handler] reinitializing device");
                self.init_device().await;
            }
            HandlerState::Failed => {
                debug!("[handler] device failed, skipping poll");
            }
        }
    }

    /// Command dispatch from the host.
    ///
    /// A communication failure here is reported immediately and does not
    /// trigger reinitialization; recovery stays on the timer path.
    pub async fn handle_command(&self, channel: &ChannelUid, command: Command) {
        match command {
            Command::Refresh => {
                let driver = self.inner.lock().await.driver.clone();
                let result = match driver {
                    Some(driver) => self.refresh_channel(&driver, channel).await,
                    None => Err(DriverError::NotOpen),
                };
                if let Err(e) = result {
                    error!("[handler] refresh of {} failed: {}", channel, e);
                    self.host
                        .update_status(ThingStatus::offline(
                            StatusDetail::CommunicationError,
                            e.to_string(),
                        ))
                        .await;
                }
            }
        }
    }

    /// Cancel polling and close the driver. Runs on every exit path;
    /// failures along the way are logged, never escalated.
    pub async fn dispose(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
        let driver = {
            let mut inner = self.inner.lock().await;
            inner.state = HandlerState::Failed;
            inner.driver.take()
        };
        if let Some(driver) = driver {
            driver.close().await;
        }
        info!("[handler] disposed");
    }

    /// Link bookkeeping is the host's business; unlink only gets logged.
    pub fn channel_unlinked(&self, channel: &ChannelUid) {
        info!("[handler] channel {} unlinked", channel);
    }

    pub async fn is_polling(&self) -> bool {
        self.poll_task.lock().await.is_some()
    }

    async fn poll_online(&self) {
        let driver = self.inner.lock().await.driver.clone();
        let Some(driver) = driver else {
            self.mark_offline_comm("device is not open".to_string()).await;
            return;
        };

        match driver.is_alive().await {
            Ok(true) => {
                for channel in self.host.linked_channels() {
                    if let Err(e) = self.refresh_channel(&driver, &channel).await {
                        warn!("[handler] poll of {} failed: {}", channel, e);
                        self.mark_offline_comm(e.to_string()).await;
                        return;
                    }
                }
            }
            Ok(false) => {
                debug!("[handler] {} seems not reachable, scheduling restart", driver.key());
                self.mark_offline_comm("device is not responding".to_string())
                    .await;
            }
            Err(e) => {
                debug!("[handler] alive check failed, scheduling restart: {}", e);
                self.mark_offline_comm(e.to_string()).await;
            }
        }
    }

    async fn refresh_channel(
        &self,
        driver: &Bh1750Driver,
        channel: &ChannelUid,
    ) -> DriverResult<()> {
        if channel.id() == CHANNEL_ILLUMINANCE {
            let lux = driver.get_optical().await?;
            debug!("[handler] optical: {}", lux);
            self.host
                .update_state(StateUpdate {
                    channel: channel.clone(),
                    lux: lux as f64,
                })
                .await;
        } else {
            error!("[handler] unsupported channel {}", channel);
        }
        Ok(())
    }

    /// Report the communication failure, tear the driver down and queue the
    /// reopen for the next cycle.
    async fn mark_offline_comm(&self, message: String) {
        let driver = {
            let mut inner = self.inner.lock().await;
            inner.state = HandlerState::PendingReinit;
            inner.driver.take()
        };
        if let Some(driver) = driver {
            driver.close().await;
        }
        self.host
            .update_status(ThingStatus::offline(
                StatusDetail::CommunicationError,
                message,
            ))
            .await;
    }

    /// Open the device, reporting the outcome to the host.
    async fn init_device(&self) {
        match self.try_open().await {
            Ok(driver) => {
                let mut inner = self.inner.lock().await;
                inner.driver = Some(driver);
                inner.state = HandlerState::Online;
                drop(inner);
                self.host.update_status(ThingStatus::Online).await;
            }
            Err(e) => {
                error!("[handler] device initialization failed: {}", e);
                let stale = {
                    let mut inner = self.inner.lock().await;
                    inner.state = HandlerState::Failed;
                    inner.driver.take()
                };
                if let Some(driver) = stale {
                    driver.close().await;
                }
                self.host
                    .update_status(ThingStatus::offline(
                        StatusDetail::ConfigurationError,
                        e.to_string(),
                    ))
                    .await;
            }
        }
    }

    async fn try_open(&self) -> DriverResult<Arc<Bh1750Driver>> {
        let key = self.config.device_key()?;
        let driver = self.registry.instance(key);
        driver.open().await?;
        Ok(driver)
    }
}
