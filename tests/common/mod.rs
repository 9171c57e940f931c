//! Shared helpers for the HTTP-level tests
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use std::sync::Arc;
use tower::ServiceExt;

use plexdash::config::Config;
use plexdash::services::{auth, db};
use plexdash::{AppState, build_app};

pub const PASSWORD: &str = "hunter22";

/// App state backed by a fresh in-memory database
pub async fn test_state(config: Config) -> Arc<AppState> {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    Arc::new(AppState::new(pool, config).unwrap())
}

pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state(Config::default()).await;
    (build_app(state.clone()), state)
}

/// Register a user directly, bypassing the form
pub async fn create_user(
    state: &AppState,
    username: &str,
    plex: Option<(&str, &str)>,
) -> i64 {
    let form = auth::Registration {
        username: username.to_string(),
        password: PASSWORD.to_string(),
        plex_baseurl: plex.map(|(url, _)| url.to_string()),
        plex_token: plex.map(|(_, token)| token.to_string()),
    };
    auth::register(&state.db, &form).await.unwrap()
}

pub fn get(uri: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "127.0.0.1");
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "127.0.0.1");
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `name=value` pair for a cookie set by `response`, ready to send back
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

/// Log in through the form and return the session cookie pair
pub async fn login(app: &Router, username: &str) -> String {
    let response = send(
        app,
        post_form(
            "/login",
            &format!("username={}&password={}", username, PASSWORD),
            "",
        ),
    )
    .await;
    assert_eq!(location(&response), "/dashboard");
    set_cookie(&response, "plexdash_session").expect("session cookie")
}

/// Follow a redirect to `target` carrying the flash cookie it set
pub async fn follow(app: &Router, response: &Response<Body>, session: &str) -> String {
    let flash = set_cookie(response, "plexdash_flash").unwrap_or_default();
    let cookies = [session, flash.as_str()]
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    let next = send(app, get(location(response), &cookies)).await;
    body_text(next).await
}
