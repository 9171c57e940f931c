//! Media-backed pages and polling endpoints, with Plex mocked

mod common;

use axum::http::{StatusCode, header};
use common::*;
use mockito::{Matcher, Mock, Server, ServerGuard};
use plexdash::build_app;
use plexdash::config::Config;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;

const SECTIONS: &str = r#"{
    "MediaContainer": {
        "Directory": [
            {"key": "1", "type": "movie", "title": "Movies"},
            {"key": "2", "type": "show", "title": "TV Shows"}
        ]
    }
}"#;

const MOVIES: &str = r#"{
    "MediaContainer": {
        "Metadata": [
            {"type": "movie", "title": "Heat", "year": 1995, "contentRating": "R",
             "viewCount": 3, "Genre": [{"tag": "Crime"}, {"tag": "Drama"}]},
            {"type": "movie", "title": "Alien", "year": 1979, "contentRating": "R",
             "viewCount": 5, "Genre": [{"tag": "Horror"}]},
            {"type": "movie", "title": "Up", "year": 2009, "contentRating": "PG",
             "Genre": [{"tag": "Drama"}]}
        ]
    }
}"#;

const SHOWS: &str = r#"{
    "MediaContainer": {
        "Metadata": [
            {"type": "show", "title": "Lost", "year": 2004, "contentRating": "TV-14",
             "viewCount": 4, "Genre": [{"tag": "Drama"}]}
        ]
    }
}"#;

/// Mocked Plex server; mocks stay registered while this is alive
struct MockPlex {
    server: ServerGuard,
    _mocks: Vec<Mock>,
}

impl MockPlex {
    /// Server that answers nothing until mocks are added
    async fn bare() -> Self {
        Self {
            server: Server::new_async().await,
            _mocks: Vec::new(),
        }
    }

    /// Server that passes the connection check and lists both sections
    async fn new() -> Self {
        let mut plex = Self::bare().await;
        plex.json("/", r#"{"MediaContainer": {"friendlyName": "Test"}}"#).await;
        plex.json("/library/sections", SECTIONS).await;
        plex
    }

    async fn json(&mut self, path: &str, body: &str) {
        let mock = self
            .server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        self._mocks.push(mock);
    }

    async fn status(&mut self, path: &str, status: usize) {
        let mock = self
            .server
            .mock("GET", path)
            .with_status(status)
            .create_async()
            .await;
        self._mocks.push(mock);
    }

    async fn movie_search(&mut self, term: &str, body: &str) {
        let mock = self
            .server
            .mock("GET", "/library/sections/1/all")
            .match_query(Matcher::UrlEncoded("title".into(), term.into()))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        self._mocks.push(mock);
    }

    async fn library(&mut self) {
        self.json("/library/sections/1/all", MOVIES).await;
        self.json("/library/sections/2/all", SHOWS).await;
    }

    /// Signed-in session for a user pointed at this server
    async fn session(&self) -> (axum::Router, String) {
        let (app, state) = test_app().await;
        let url = self.server.url();
        create_user(&state, "alice", Some((url.as_str(), "tok"))).await;
        let session = login(&app, "alice").await;
        (app, session)
    }
}

/// Address of a server that accepts connections and never answers
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

async fn json_body(response: axum::http::Response<axum::body::Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// =============================================================================
// Polling endpoints
// =============================================================================

#[tokio::test]
async fn test_api_without_media_server_is_500() {
    let (app, state) = test_app().await;
    create_user(&state, "alice", None).await;
    let session = login(&app, "alice").await;

    for uri in [
        "/api/now_playing_data",
        "/api/genre_distribution_data",
        "/api/playtime_trends_data",
    ] {
        let response = send(&app, get(uri, &session)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(
            json_body(response).await,
            json!({"error": "Media server not connected."})
        );
    }
}

#[tokio::test]
async fn test_api_requires_login() {
    let (app, _) = test_app().await;

    let response = send(&app, get("/api/now_playing_data", "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_now_playing_data() {
    let mut plex = MockPlex::new().await;
    plex.json(
        "/status/sessions",
        r#"{
            "MediaContainer": {
                "Metadata": [
                    {"type": "episode", "title": "Pilot", "viewOffset": 30000, "duration": 120000,
                     "User": {"title": "bob"}, "Player": {"title": "TV", "state": "paused"}},
                    {"type": "track", "title": "Song", "User": {"title": "sam"},
                     "Player": {"title": "Phone", "state": "playing"}},
                    {"title": "Mystery"}
                ]
            }
        }"#,
    )
    .await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/api/now_playing_data", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(
        json_body(response).await,
        json!([
            {"user": "bob", "player": "TV", "content": "Pilot", "type": "episode",
             "progress": "25%", "state": "paused"},
            {"user": "sam", "player": "Phone", "content": "Song", "type": "track",
             "progress": "N/A", "state": "playing"},
            {"user": "Unknown User", "player": "Unknown Player", "content": "Mystery",
             "type": "N/A", "progress": "N/A", "state": "N/A"}
        ])
    );
}

#[tokio::test]
async fn test_no_sessions_is_empty_array() {
    let mut plex = MockPlex::new().await;
    plex.json("/status/sessions", r#"{"MediaContainer": {"size": 0}}"#).await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/api/now_playing_data", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_genre_distribution_data() {
    let mut plex = MockPlex::new().await;
    plex.library().await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/api/genre_distribution_data", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([
            {"genre": "Drama", "count": 3},
            {"genre": "Crime", "count": 1},
            {"genre": "Horror", "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_playtime_trends_data() {
    let mut plex = MockPlex::new().await;
    plex.library().await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/api/playtime_trends_data", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([
            {"show": "Alien", "watch_count": 5},
            {"show": "Lost", "watch_count": 4},
            {"show": "Heat", "watch_count": 3}
        ])
    );
}

#[tokio::test]
async fn test_upstream_failure_is_json_error() {
    let mut plex = MockPlex::new().await;
    plex.status("/status/sessions", 500).await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/api/now_playing_data", &session)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch active sessions")
    );
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_dashboard_counts() {
    let mut plex = MockPlex::new().await;
    plex.library().await;
    // Sessions endpoint fails; the other counts still render
    plex.status("/status/sessions", 500).await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/dashboard", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("<tr><th>Users</th><td>1</td></tr>"));
    assert!(page.contains("<tr><th>Movies</th><td>3</td></tr>"));
    assert!(page.contains("<tr><th>TV Shows</th><td>1</td></tr>"));
    assert!(page.contains("<tr><th>Active Sessions</th><td>0</td></tr>"));
}

#[tokio::test]
async fn test_rejected_token_degrades_dashboard() {
    let mut plex = MockPlex::bare().await;
    plex.status("/", 401).await;
    let (app, session) = plex.session().await;

    let response = send(&app, get("/", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Error connecting to your Plex server"));
    assert!(page.contains("<tr><th>Movies</th><td>0</td></tr>"));
}

#[tokio::test]
async fn test_content_filter_and_sort() {
    let mut plex = MockPlex::new().await;
    plex.library().await;
    let (app, session) = plex.session().await;

    let response = send(
        &app,
        get("/content?genre=Drama&sort_by=year&sort_order=desc", &session),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("<p>3 items</p>"));
    assert!(!page.contains("<td>Alien</td>"));
    let up = page.find("<td>Up</td>").unwrap();
    let lost = page.find("<td>Lost</td>").unwrap();
    let heat = page.find("<td>Heat</td>").unwrap();
    assert!(up < lost && lost < heat);
    // Dropdowns still list genres outside the filter
    assert!(page.contains(r#"<option value="Horror">"#));
    assert!(page.contains(r#"<option value="Drama" selected>"#));
}

#[tokio::test]
async fn test_content_without_media_server() {
    let (app, state) = test_app().await;
    create_user(&state, "alice", None).await;
    let session = login(&app, "alice").await;

    let response = send(&app, get("/content", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Plex credentials not found for your account."));
    assert!(page.contains("<p>0 items</p>"));
}

#[tokio::test]
async fn test_search_messages() {
    let mut plex = MockPlex::new().await;
    plex.movie_search("zzz", r#"{"MediaContainer": {"size": 0}}"#).await;
    let (app, session) = plex.session().await;

    let response = send(&app, post_form("/movies/search", "search_term=+", &session)).await;
    assert!(body_text(response).await.contains("Please enter a search term."));

    let response = send(&app, post_form("/movies/search", "search_term=zzz", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_text(response)
            .await
            .contains("No movies found matching &#39;zzz&#39;.")
    );
}

#[tokio::test]
async fn test_search_results_sorted_by_title() {
    let mut plex = MockPlex::new().await;
    plex.movie_search(
        "the",
        r#"{"MediaContainer": {"Metadata": [
            {"type": "movie", "title": "the Thing", "year": 1982},
            {"type": "movie", "title": "The Abyss", "year": 1989}
        ]}}"#,
    )
    .await;
    let (app, session) = plex.session().await;

    let response = send(&app, post_form("/movies/search", "search_term=the", &session)).await;
    let page = body_text(response).await;
    let abyss = page.find("The Abyss").unwrap();
    let thing = page.find("the Thing").unwrap();
    assert!(abyss < thing);
}

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    let state = test_state(Config {
        remote_timeout: Duration::from_millis(200),
        ..Config::default()
    })
    .await;
    let app = build_app(state.clone());
    let url = silent_server().await;
    create_user(&state, "alice", Some((url.as_str(), "tok"))).await;
    let session = login(&app, "alice").await;

    let limit = Duration::from_secs(5);

    let response = tokio::time::timeout(limit, send(&app, get("/dashboard", &session)))
        .await
        .expect("dashboard should not hang");
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Error connecting to your Plex server"));
    assert!(page.contains("<tr><th>Movies</th><td>0</td></tr>"));

    let response = tokio::time::timeout(limit, send(&app, get("/api/now_playing_data", &session)))
        .await
        .expect("now playing should not hang");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Media server not connected."})
    );
}
