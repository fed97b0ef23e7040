// Public modules
pub mod bus;
pub mod config;
pub mod errors;
pub mod handler;
pub mod host;
pub mod messages;
pub mod registry;
pub mod scheduler;
pub mod sensors;

// Re-export commonly used types
pub use config::{load_device_config, DeviceConfig};
pub use errors::{ConfigError, ConfigResult, DriverError, DriverResult};
pub use handler::LightSensorHandler;
pub use host::{HostLink, LoggingHost};
pub use messages::{ChannelUid, Command, StateUpdate, StatusDetail, ThingStatus};
pub use registry::DriverRegistry;
pub use sensors::{Bh1750Driver, DeviceKey, MeasurementMode};

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Run the illuminance service with the given configuration path
pub async fn run_service(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("[bh1750-hub] starting up...");

    // Load configuration
    let device_config_path = format!("{}/device.toml", config_path);
    let config = load_device_config(&device_config_path)?;
    info!(
        "[config] device on bus {} at address {}",
        config.device.bus, config.device.address
    );

    // Wire the controller to the logging host
    let registry = Arc::new(DriverRegistry::new());
    let host: Arc<dyn HostLink> = Arc::new(LoggingHost::new());
    let handler = Arc::new(LightSensorHandler::new(config, registry, host));

    handler.clone().initialize().await;
    info!("[main] handler initialized");

    // Dispose on shutdown no matter how initialization went
    tokio::signal::ctrl_c().await?;
    info!("[main] shutting down");
    handler.dispose().await;

    Ok(())
}
