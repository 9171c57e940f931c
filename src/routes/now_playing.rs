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
use crate::models::SessionView;
use crate::services::error::JsonError;
use crate::views;

pub fn routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .route("/api/now_playing_data", get(now_playing_data))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/now_playing", get(now_playing))
        .merge(api)
}

/// GET /now_playing - Page shell; rows come from the polling endpoint
async fn now_playing(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), views::now_playing_page)
}

/// GET /api/now_playing_data
async fn now_playing_data(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SessionView>>, JsonError> {
    let plex = api_client(&state, &user).await?;

    let sessions = plex.sessions().await.map_err(|e| {
        tracing::error!(user_id = user.id, "Failed to fetch active sessions: {}", e);
        JsonError::internal(format!("Failed to fetch active sessions: {}", e))
    })?;

    Ok(Json(sessions.iter().map(aggregate::session_view).collect()))
}
