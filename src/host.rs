use crate::messages::{ChannelUid, StateUpdate, ThingStatus, CHANNEL_ILLUMINANCE};
use async_trait::async_trait;
use tracing::{info, warn};

/// The boundary to the host platform.
///
/// The controller pushes status and state updates through this trait and
/// asks it which channels are linked; everything beyond it is the host's
/// business.
#[async_trait]
pub trait HostLink: Send + Sync {
    async fn update_status(&self, status: ThingStatus);

    async fn update_state(&self, update: StateUpdate);

    /// Channels with an active link. Only these are refreshed on a poll.
    fn linked_channels(&self) -> Vec<ChannelUid>;
}

/// Host implementation used by the binary: logs status transitions and
/// emits state updates as JSON lines on stdout.
pub struct LoggingHost {
    channels: Vec<ChannelUid>,
}

impl LoggingHost {
    pub fn new() -> Self {
        Self {
            channels: vec![ChannelUid::new(CHANNEL_ILLUMINANCE)],
        }
    }
}

impl Default for LoggingHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLink for LoggingHost {
    async fn update_status(&self, status: ThingStatus) {
        match status {
            ThingStatus::Online => info!("[host] status: ONLINE"),
            ThingStatus::Offline { detail, message } => {
                warn!("[host] status: OFFLINE ({:?}): {}", detail, message)
            }
        }
    }

    async fn update_state(&self, update: StateUpdate) {
        match serde_json::to_string(&update) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("[host] failed to serialize state update: {}", e),
        }
    }

    fn linked_channels(&self) -> Vec<ChannelUid> {
        self.channels.clone()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Host double recording everything the controller publishes.
    #[derive(Default)]
    pub struct RecordingHost {
        pub statuses: Mutex<Vec<ThingStatus>>,
        pub states: Mutex<Vec<StateUpdate>>,
        channels: Vec<ChannelUid>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self {
                statuses: Mutex::new(Vec::new()),
                states: Mutex::new(Vec::new()),
                channels: vec![ChannelUid::new(CHANNEL_ILLUMINANCE)],
            }
        }

        pub fn last_status(&self) -> Option<ThingStatus> {
            self.statuses.lock().unwrap().last().cloned()
        }

        pub fn published_lux(&self) -> Vec<f64> {
            self.states.lock().unwrap().iter().map(|s| s.lux).collect()
        }
    }

    #[async_trait]
    impl HostLink for RecordingHost {
        async fn update_status(&self, status: ThingStatus) {
            self.statuses.lock().unwrap().push(status);
        }

        async fn update_state(&self, update: StateUpdate) {
            self.states.lock().unwrap().push(update);
        }

        fn linked_channels(&self) -> Vec<ChannelUid> {
            self.channels.clone()
        }
    }
}
