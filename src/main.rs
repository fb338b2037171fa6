use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use wardline::api::start_api_server;
use wardline::assistant::Assistant;
use wardline::config::{self, AppConfig};
use wardline::directory::HttpDirectory;

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Wardline starting v{}", config::APP_VERSION);

    let config = AppConfig::from_env();
    tracing::info!(
        directory = %config.directory.base_url,
        path = %config.directory.patients_path,
        timeout_secs = config.directory.timeout_secs,
        "upstream directory configured"
    );

    let directory = Arc::new(HttpDirectory::new(config.directory.clone()));
    let server_config = config.server.clone();
    let assistant = Arc::new(Assistant::new(config, directory));

    let mut server = match start_api_server(assistant, &server_config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "wardline ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown requested");
    server.shutdown();

    // Give in-flight requests a moment to drain.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
}
