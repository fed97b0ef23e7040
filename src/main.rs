use bh1750_hub::{init_tracing, run_service};
use tracing::error;

#[tokio::main]
async fn main() {
    // RUST_LOG=debug for verbose, RUST_LOG=trace for raw bus dumps
    init_tracing();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    if let Err(e) = run_service(&config_path).await {
        error!("[error] service failed: {}", e);
        std::process::exit(1);
    }
}
