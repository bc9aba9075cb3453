use anyhow::Result;

use replied_config::Config;
use replied_server::{init_tracing, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.logging.rust_log);

    tracing::info!("=== Replied Server Starting ===");
    tracing::info!("Port: {}", config.port);

    run_server(config).await
}
