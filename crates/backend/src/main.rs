use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod repository;
mod routes;
mod schema;

use crate::auth::{GoogleProvider, IdentityProvider, TokenService};
use crate::config::{AppConfig, AuthSettings};
use crate::repository::{PgUserStore, UserStore};

/// Process-wide dependencies, built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AuthSettings>,
    pub tokens: Arc<TokenService>,
    pub provider: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuner_backend=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::parse();

    let state = match &config.database_url {
        Some(database_url) => Some(build_state(&config, database_url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, serving health routes only");
            None
        }
    };

    let app = routes::build_router(state, &config.cors_origins());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited unexpectedly")
}

async fn build_state(config: &AppConfig, database_url: &str) -> anyhow::Result<AppState> {
    let settings = AuthSettings::from_config(config)?;

    let pool = db::establish_connection_pool(database_url)?;
    db::ensure_schema(&pool)
        .await
        .context("failed to apply users schema")?;
    tracing::info!("Database connected and schema applied");

    Ok(AppState {
        tokens: Arc::new(TokenService::new(&settings.jwt_secret)),
        provider: Arc::new(GoogleProvider::new(&settings)),
        users: Arc::new(PgUserStore::new(pool)),
        settings: Arc::new(settings),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
