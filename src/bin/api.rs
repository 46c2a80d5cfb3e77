use hybrid_query_orchestrator::{agent::Runtime, api::start_server, config::Settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    info!("🚀 Hybrid Query Orchestrator - API Server");
    info!("📍 Port: {}", settings.port);
    info!(config = ?settings.redacted(), "Settings loaded");

    let runtime = Runtime::from_settings(&settings)?;

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    let served = start_server(runtime.orchestrator.clone(), settings.port, shutdown_signal()).await;

    // Release the pool whether the server stopped cleanly or not
    runtime.shutdown().await;

    if let Err(e) = &served {
        error!("API server stopped with error: {}", e);
    }
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
