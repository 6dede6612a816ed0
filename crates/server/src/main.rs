//! SwapC - DEX price comparison
//!
//! Main entry point for the HTTP server

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use swapc_core::LoggingConfig;
use swapc_server::{settings, HttpServer, PriceService};

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let settings = settings::load()?;
    init_logging(&settings.logging);

    info!("Starting SwapC price aggregator v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Deadlines: overall {}ms, per source {}ms, grace {}ms; cache TTL {}ms",
        settings.aggregator.overall_timeout_ms,
        settings.aggregator.source_timeout_ms,
        settings.aggregator.grace_window_ms,
        settings.cache.ttl_ms
    );

    let service = PriceService::from_config(&settings)?;
    let server = HttpServer::with_service(settings.server.clone(), service);

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Try: http://{}/api/prices/compare?tokenA=SOL&tokenB=USDC", server.address());
    info!("Press Ctrl+C to shutdown");

    if let Err(e) = server.start_with_shutdown(shutdown_rx).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}
