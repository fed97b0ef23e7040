use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel id carrying the illuminance reading
pub const CHANNEL_ILLUMINANCE: &str = "illuminance";

/// Identifier of one output channel on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelUid(String);

impl ChannelUid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a device is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusDetail {
    /// Bad bus number or address, or the device could not be initialized.
    /// Terminal: never retried automatically.
    ConfigurationError,
    /// A bus transaction failed on an initialized device.
    CommunicationError,
}

/// Device status as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThingStatus {
    Online,
    Offline {
        detail: StatusDetail,
        message: String,
    },
}

impl ThingStatus {
    pub fn offline(detail: StatusDetail, message: impl Into<String>) -> Self {
        ThingStatus::Offline {
            detail,
            message: message.into(),
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ThingStatus::Online)
    }
}

/// Commands the host can dispatch to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
}

/// One published reading: the channel and its decimal value in lux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub channel: ChannelUid,
    pub lux: f64,
}

impl StateUpdate {
    /// Serialize to JSON for debugging
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
