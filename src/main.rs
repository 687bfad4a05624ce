// nutralingo - Food label and meal analysis backend
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use nutralingo::analysis::AnalysisPipeline;
use nutralingo::cache::{CacheManager, LlmResponseCache};
use nutralingo::cli::Args;
use nutralingo::config::AppConfig;
use nutralingo::metrics::PerformanceMonitor;
use nutralingo::server::{create_router, AppState};
use nutralingo::upstream::Collaborators;
use nutralingo::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load_from(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting nutralingo v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Upstream model clients
    let collaborators = Collaborators::from_config(&config.upstream)?;
    info!(
        speech = collaborators.speech.is_some(),
        "Upstream clients ready"
    );

    // Phase 4: Caches and performance monitor
    let llm_cache = Arc::new(LlmResponseCache::new(config.llm_cache.clone()));
    let response_cache = Arc::new(CacheManager::new(config.response_cache.clone()));
    let monitor = Arc::new(PerformanceMonitor::new());
    info!(
        llm_entries = config.llm_cache.max_entries,
        response_entries = config.response_cache.max_size,
        similarity_threshold = config.llm_cache.similarity_threshold,
        "Caches initialized"
    );

    // Phase 5: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let pipeline = AnalysisPipeline::new(collaborators, llm_cache, response_cache, monitor);
    let app = create_router(AppState::new(config, pipeline))?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
