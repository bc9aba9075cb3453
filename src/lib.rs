use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod content_guard;
pub mod context;
pub mod identity;
pub mod inbox;
pub mod notification;
pub mod rate_limit;
pub mod repository;
pub mod routes;
pub mod store;
pub mod submission;
pub mod thread_integrity;
pub mod utils;

use context::AppContext;
use replied_config::Config;

/// Install the global tracing subscriber (EnvFilter + fmt)
pub fn init_tracing(rust_log: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build every collaborator and serve HTTP until a shutdown signal arrives
pub async fn run_server(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let app_context = Arc::new(AppContext::from_config(config.clone()).await?);

    tracing::info!(
        rate_limiting = app_context.rate_limiting_enabled,
        notifications = config.notification.enabled(),
        seal_failure_policy = ?config.security.seal_failure_policy,
        "Pipeline ready"
    );

    let app = routes::create_router(app_context);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", config.bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Failed to start server")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, initiating graceful shutdown..."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown..."),
    }
}
