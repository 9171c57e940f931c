use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plexdash::config::{self, Config};
use plexdash::services::{auth, db};
use plexdash::{AppState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = config::load_env_file();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set; sessions are signed with the development key");
    }

    let pool = db::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    tracing::info!("Database ready");

    if auth::ensure_admin(&pool, &config)
        .await
        .context("Failed to create admin account")?
    {
        tracing::info!(username = %config.admin_username, "created admin account");
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(pool, config).context("Failed to build HTTP client")?);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    // Peer addresses feed the per-IP rate limiter on the auth routes
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
