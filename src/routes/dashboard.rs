use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{page_client, render_page};
use crate::AppState;
use crate::aggregate;
use crate::constants::{MOVIES_SECTION, TV_SHOWS_SECTION};
use crate::domain::users;
use crate::models::DashboardCounts;
use crate::services::error::LogErr;
use crate::services::plex::PlexError;
use crate::views;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard))
        .route("/dashboard", get(dashboard))
}

/// GET / and GET /dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let mut counts = DashboardCounts {
        users: users::count_users(&state.db)
            .await
            .log_500("Count users error")?,
        ..Default::default()
    };
    let mut notices = Vec::new();

    match page_client(&state, &user).await {
        Ok(plex) => {
            let (movies, shows, sessions) = tokio::join!(
                plex.section_items_by_title(MOVIES_SECTION),
                plex.section_items_by_title(TV_SHOWS_SECTION),
                plex.sessions(),
            );
            counts.movies = metric(movies.map(|m| aggregate::count(&m)), "movie count");
            counts.tv_shows = metric(shows.map(|s| aggregate::count(&s)), "TV show count");
            counts.active_sessions =
                metric(sessions.map(|s| aggregate::count(&s)), "active session count");
        }
        Err(flash) => notices.push(flash),
    }

    Ok(render_page(jar, &state, &user, notices, |ctx| {
        views::dashboard_page(ctx, &counts)
    }))
}

/// A failed metric shows as zero without affecting the others.
fn metric(result: Result<usize, PlexError>, what: &str) -> usize {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch {}: {}", what, e);
        0
    })
}
