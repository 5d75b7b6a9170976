pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use anyhow::Context;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use services::client_directory::ClientDirectory;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub directory: ClientDirectory,
}

impl AppState {
    /// Connects to Postgres, applies migrations and builds the directory
    /// client.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size)
            .await
            .context("failed to connect to database")?;

        db.run_migrations()
            .await
            .context("failed to run migrations")?;

        let directory = ClientDirectory::from_config(&config)
            .context("failed to build client directory HTTP client")?;

        Ok(Arc::new(Self { db, config, directory }))
    }
}

/// Full HTTP application: routes plus request-id, tracing and timeout layers.
pub fn app(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.app.request_timeout_secs);

    Router::new()
        .route("/", get(|| async { "Hotel API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes())
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
