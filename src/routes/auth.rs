//! Login, registration and logout endpoints, plus the session extractor

use axum::{
    Form, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::users::{self, User};
use crate::services::auth::{self, AuthError, Registration, RegistrationError};
use crate::services::cookies::{self, config::SESSION_COOKIE_NAME};
use crate::services::error::LogErr;
use crate::services::flash::{self, Flash};
use crate::services::session;
use crate::views::{self, PageContext};

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit: burst of 10, then one request every 6 seconds per IP
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    let credentials = Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/register", get(register_page).post(register_submit))
        .layer(rate_limit_layer);

    Router::new()
        .merge(credentials)
        .route("/logout", get(logout))
}

// ============================================================================
// Auth Extractor - validates the session cookie and loads the user
// ============================================================================

/// The signed-in user. Rejects with a redirect to `/login`.
pub struct AuthUser(pub User);

/// Rejection for requests without a usable session
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        let jar = flash::push(
            CookieJar::new(),
            Flash::warning("Please log in to access this page."),
        );
        (jar, Redirect::to("/login")).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Unauthenticated.into_response())?;

        let user_id = session::validate_session_token(&token, state.config.secret_key.as_bytes())
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                Unauthenticated.into_response()
            })?;

        // A valid token for a deleted user is still unauthenticated
        let user = users::get_user_by_id(&state.db, user_id)
            .await
            .log_500("Get user by ID error")
            .map_err(IntoResponse::into_response)?
            .ok_or_else(|| Unauthenticated.into_response())?;

        Ok(AuthUser(user))
    }
}

// ============================================================================
// Login / logout
// ============================================================================

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// GET /login
async fn login_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, Html(views::login_page(&PageContext::anonymous(flashes)))).into_response()
}

/// POST /login - Verify credentials and start a session
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    match auth::authenticate(&state.db, form.username.trim(), &form.password).await {
        Ok(user) => {
            let token = session::create_session_token(user.id, state.config.secret_key.as_bytes())
                .log_500("Create session token error")?;
            tracing::info!(user_id = user.id, "user logged in");

            let jar = jar.add(cookies::session_cookie(token, state.config.cookie_secure));
            let jar = flash::push(jar, Flash::success("Logged in successfully!"));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            let (jar, mut flashes) = flash::take(jar);
            flashes.push(Flash::danger("Invalid credentials. Please try again."));
            let page = views::login_page(&PageContext::anonymous(flashes));
            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Err(e).log_500("Authenticate error"),
    }
}

/// GET /logout - Clear the session; safe to call without one
async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(cookies::clear_session_cookie());
    let jar = flash::push(jar, Flash::info("You have been logged out."));
    (jar, Redirect::to("/login")).into_response()
}

// ============================================================================
// Registration
// ============================================================================

/// GET /register
async fn register_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = views::register_page(&PageContext::anonymous(flashes), "", "");
    (jar, Html(page)).into_response()
}

/// POST /register - Create an account, then send the user to log in
async fn register_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<Registration>,
) -> Result<Response, StatusCode> {
    match auth::register(&state.db, &form).await {
        Ok(user_id) => {
            tracing::info!(user_id, "user registered");
            let jar = flash::push(jar, Flash::success("Registration successful! Please log in."));
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(e @ (RegistrationError::MissingFields | RegistrationError::UsernameTaken)) => {
            let (jar, mut flashes) = flash::take(jar);
            flashes.push(Flash::danger(e.to_string()));
            let page = views::register_page(
                &PageContext::anonymous(flashes),
                &form.username,
                form.plex_baseurl.as_deref().unwrap_or_default(),
            );
            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Err(e).log_500("Register error"),
    }
}
