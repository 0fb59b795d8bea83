//! Text Coordinates Server
//!
//! A single endpoint that turns an uploaded image into recognized words with
//! pixel bounding boxes.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use textcoords_server::{routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "textcoords_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Text Coordinates Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Upload limit: {} bytes, types: {:?}",
        config.upload.max_bytes,
        config.upload.allowed_types
    );
    tracing::info!(
        "OCR: engine={:?} language={} timeout={:?} concurrency={}",
        config.ocr.engine,
        config.ocr.language,
        config.ocr.timeout,
        config.ocr.max_concurrency
    );

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST '{}'", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let app_state = AppState::from_config(config);
    if !app_state.pipeline().ocr().is_available().await {
        tracing::warn!(
            "OCR engine '{}' is not available; extraction requests will fail",
            app_state.pipeline().ocr().engine_name()
        );
    }

    let app = routes::router(app_state);

    // Start server with graceful shutdown
    tracing::info!("Text Coordinates Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
