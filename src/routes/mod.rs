pub mod auth;
pub mod content;
pub mod dashboard;
pub mod now_playing;
pub mod user;
pub mod visualizations;

use axum::{
    Router,
    routing::get,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::AppState;
use crate::domain::users::User;
use crate::services::auth as auth_service;
use crate::services::error::JsonError;
use crate::services::flash::{self, Flash};
use crate::services::plex::{self, PlexClient, PlexError};
use crate::views::PageContext;

/// Build all routes for the dashboard
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(content::routes())
        .merge(dashboard::routes())
        .merge(now_playing::routes())
        .merge(user::routes())
        .merge(visualizations::routes())
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "ok"
}

/// Render a page for a signed-in user, draining queued flash messages and
/// appending `notices` raised while handling this request.
pub(crate) fn render_page(
    jar: CookieJar,
    state: &AppState,
    user: &User,
    notices: Vec<Flash>,
    render: impl FnOnce(&PageContext) -> String,
) -> Response {
    let (jar, mut flashes) = flash::take(jar);
    flashes.extend(notices);
    let ctx = PageContext::for_user(user, auth_service::is_admin(user, &state.config), flashes);
    (jar, Html(render(&ctx))).into_response()
}

/// Media server client for a page render. Failures come back as the warning
/// the page should show instead of its data.
pub(crate) async fn page_client(state: &AppState, user: &User) -> Result<PlexClient, Flash> {
    plex::build_client(&state.http, &state.config, user)
        .await
        .map_err(|e| match e {
            PlexError::NotConfigured => Flash::warning(e.to_string()),
            other => {
                tracing::warn!(user_id = user.id, "Plex connection failed: {}", other);
                Flash::warning(format!("Error connecting to your Plex server: {}", other))
            }
        })
}

/// Media server client for a JSON endpoint.
pub(crate) async fn api_client(state: &AppState, user: &User) -> Result<PlexClient, JsonError> {
    plex::build_client(&state.http, &state.config, user)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = user.id, "Plex connection failed: {}", e);
            JsonError::internal("Media server not connected.")
        })
}
