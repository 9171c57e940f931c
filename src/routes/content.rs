//! Library browsing: filterable content list and movie title search

use axum::{
    Form, Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{page_client, render_page};
use crate::AppState;
use crate::aggregate::{self, ContentFilter, SortKey, SortOrder};
use crate::constants::{MOVIES_SECTION, TV_SHOWS_SECTION};
use crate::models::MediaItem;
use crate::services::flash::Flash;
use crate::services::plex::{PlexClient, PlexError};
use crate::views::{self, ContentView};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/content", get(list_content))
        .route("/movies/search", get(search_page).post(search_movies))
}

#[derive(Debug, Default, Deserialize)]
struct ContentQuery {
    genre: Option<String>,
    year: Option<String>,
    rating: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

/// GET /content
async fn list_content(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
    Query(query): Query<ContentQuery>,
) -> Response {
    // No sort_by means title order; an unrecognised one keeps server order
    let sort_by = match query.sort_by.as_deref() {
        None | Some("") => Some(SortKey::Title),
        Some(key) => SortKey::parse(key),
    };
    let sort_order = SortOrder::parse(query.sort_order.as_deref());
    let filter = ContentFilter::new(query.genre, query.year, query.rating);

    let fetched = match page_client(&state, &user).await {
        Ok(plex) => fetch_library(&plex).await.map_err(|e| {
            tracing::warn!(user_id = user.id, "Failed to fetch library content: {}", e);
            Flash::warning(format!("Error fetching content: {}", e))
        }),
        Err(flash) => Err(flash),
    };

    let (all_items, notices) = match fetched {
        Ok(items) => (items, Vec::new()),
        Err(flash) => (Vec::new(), vec![flash]),
    };

    // Dropdowns offer every value in the library, not just the filtered rows
    let options = aggregate::filter_options(&all_items);
    let mut items = aggregate::filter_items(all_items, &filter);
    if let Some(key) = sort_by {
        aggregate::sort_items(&mut items, key, sort_order);
    }

    render_page(jar, &state, &user, notices, |ctx| {
        views::content_page(
            ctx,
            &ContentView {
                items: &items,
                options,
                filter,
                sort_by,
                sort_order,
            },
        )
    })
}

async fn fetch_library(plex: &PlexClient) -> Result<Vec<MediaItem>, PlexError> {
    let (movies, shows) = tokio::join!(
        plex.section_items_by_title(MOVIES_SECTION),
        plex.section_items_by_title(TV_SHOWS_SECTION),
    );
    let mut items = movies?;
    items.extend(shows?);
    Ok(items)
}

#[derive(Debug, Default, Deserialize)]
struct SearchForm {
    #[serde(default)]
    search_term: String,
}

/// GET /movies/search
async fn search_page(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), |ctx| {
        views::search_page(ctx, &[], "")
    })
}

/// POST /movies/search - Title search in the Movies section
async fn search_movies(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
    Form(form): Form<SearchForm>,
) -> Response {
    let term = form.search_term.trim();
    let mut results = Vec::new();
    let mut notices = Vec::new();

    match page_client(&state, &user).await {
        Err(flash) => notices.push(flash),
        Ok(_) if term.is_empty() => notices.push(Flash::warning("Please enter a search term.")),
        Ok(plex) => match search_section(&plex, term).await {
            Ok(found) if found.is_empty() => {
                notices.push(Flash::info(format!("No movies found matching '{}'.", term)));
            }
            Ok(mut found) => {
                aggregate::sort_by_title_ci(&mut found);
                results = found;
            }
            Err(e) => {
                tracing::warn!(user_id = user.id, "Movie search failed: {}", e);
                notices.push(Flash::warning(format!("Error searching for movies: {}", e)));
            }
        },
    }

    render_page(jar, &state, &user, notices, |ctx| {
        views::search_page(ctx, &results, term)
    })
}

async fn search_section(plex: &PlexClient, term: &str) -> Result<Vec<MediaItem>, PlexError> {
    let section = plex.section(MOVIES_SECTION).await?;
    plex.search_section(&section, term).await
}
