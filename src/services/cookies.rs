//! Cookie building utilities for session management
//!
//! Centralizes cookie attributes so login, logout, account deletion and
//! flash messages all agree on names, paths and lifetimes.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::constants::SESSION_EXPIRY_HOURS;

/// Cookie configuration constants
pub mod config {
    /// Session token cookie name
    pub const SESSION_COOKIE_NAME: &str = "plexdash_session";
    /// One-shot flash message cookie name
    pub const FLASH_COOKIE_NAME: &str = "plexdash_flash";
    /// Path for all cookies (every route)
    pub const COOKIE_PATH: &str = "/";
    /// Flash messages only need to survive one redirect
    pub const FLASH_MAX_AGE_SECS: i64 = 60;
}

/// Build the session token cookie
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((config::SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(config::COOKIE_PATH)
        .max_age(time::Duration::hours(SESSION_EXPIRY_HOURS))
        .build()
}

/// Cookie that, when removed from the jar, clears the session token
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(config::SESSION_COOKIE_NAME)
        .path(config::COOKIE_PATH)
        .build()
}

pub fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((config::FLASH_COOKIE_NAME, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path(config::COOKIE_PATH)
        .max_age(time::Duration::seconds(config::FLASH_MAX_AGE_SECS))
        .build()
}

pub fn clear_flash_cookie() -> Cookie<'static> {
    Cookie::build(config::FLASH_COOKIE_NAME)
        .path(config::COOKIE_PATH)
        .build()
}
