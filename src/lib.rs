//! Admin web dashboard for a Plex Media Server
//!
//! Accounts live in a local SQLite database; everything else is fetched from
//! the user's media server on each request.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::Config;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Shared by every media server client; carries the request timeout
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.remote_timeout)
            .build()?;

        Ok(Self { db, config, http })
    }
}

/// Full application router with state and request tracing attached.
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::build_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
