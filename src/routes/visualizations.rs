//! Chart pages and the JSON they poll

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, header},
    response::Response,
    routing::get,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

use super::auth::AuthUser;
use super::{api_client, render_page};
use crate::AppState;
use crate::aggregate;
use crate::models::{GenreCount, WatchCount};
use crate::services::error::JsonError;
use crate::views;

pub fn routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .route("/api/genre_distribution_data", get(genre_distribution_data))
        .route("/api/playtime_trends_data", get(playtime_trends_data))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/visualizations/genre_distribution", get(genre_distribution))
        .route("/visualizations/playtime_trends", get(playtime_trends))
        .merge(api)
}

/// GET /visualizations/genre_distribution
async fn genre_distribution(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), views::genre_distribution_page)
}

/// GET /visualizations/playtime_trends
async fn playtime_trends(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), views::playtime_trends_page)
}

/// GET /api/genre_distribution_data - Genre counts over movie and show sections
async fn genre_distribution_data(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<GenreCount>>, JsonError> {
    let plex = api_client(&state, &user).await?;

    let items = plex.library_items().await.map_err(|e| {
        tracing::error!(user_id = user.id, "Failed to fetch genre data: {}", e);
        JsonError::internal(format!("Failed to fetch genre data: {}", e))
    })?;

    Ok(Json(aggregate::genre_tally(&items)))
}

/// GET /api/playtime_trends_data - Most watched titles, episodes rolled up by show
async fn playtime_trends_data(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<WatchCount>>, JsonError> {
    let plex = api_client(&state, &user).await?;

    let items = plex.library_items().await.map_err(|e| {
        tracing::error!(user_id = user.id, "Failed to fetch playtime data: {}", e);
        JsonError::internal(format!("Failed to fetch playtime data: {}", e))
    })?;

    Ok(Json(aggregate::watch_tally(&items)))
}
