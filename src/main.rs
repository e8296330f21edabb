//! Govee Gateway
//!
//! REST gateway for Govee lights over the LAN protocol with cloud API fallback.

use govee_gateway::{api, cloud, config, gateway, lan};

use anyhow::Result;
use axum::http::{header, HeaderName, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "govee_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Govee Gateway v{} ({})",
        env!("GOVEE_GATEWAY_VERSION"),
        env!("GOVEE_GATEWAY_GIT_SHA")
    );

    let config = config::load_config()?;
    config.validate()?;
    tracing::info!("Configuration loaded, port: {}", config.port);
    tracing::info!("LAN control: {}", config.lan.enabled);

    let cloud = cloud::GoveeCloudClient::new(
        config.api_key().map(str::to_string),
        config.cloud.base_url.clone(),
        config.cloud.timeout(),
    )?;
    if config.api_key().is_none() {
        tracing::warn!("No Govee API key configured, cloud requests will fail");
    }

    let lan = lan::LanClient::new(config.lan.discovery_options(), config.lan.controller());

    let gateway = gateway::DeviceGateway::new(Arc::new(cloud), Arc::new(lan), config.lan.enabled);
    let state = api::AppState::new(gateway);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("govee-api-key")]);

    let app = api::router(state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
