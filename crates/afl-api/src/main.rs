//! AFL API Server
//!
//! REST API server for affiliate platform and link management.
//!
//! Author: hephaex@gmail.com

use afl_api::maintenance::{daily_maintenance, spawn_daily};
use afl_api::{create_router, AppState};
use afl_core::{AppConfig, LoggingConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.logging);
    config.validate()?;

    let store = afl_store::connect(&config.database).await?;
    let state = Arc::new(AppState::new(config, store)?);

    let scheduler = if state.config.scheduler.enabled {
        let store = state.store.clone();
        Some(spawn_daily(
            "daily-maintenance",
            Duration::from_secs(state.config.scheduler.interval_secs),
            move || daily_maintenance(store.clone()),
        ))
    } else {
        None
    };

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("AFL API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// `AFL_CONFIG` names an optional TOML file; environment variables override it
fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("AFL_CONFIG") {
        Ok(path) if !path.trim().is_empty() => AppConfig::from_file(path)?.with_env_override()?,
        _ => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_file(logging.include_location)
                    .with_line_number(logging.include_location),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(logging.include_location)
                    .with_line_number(logging.include_location),
            )
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
