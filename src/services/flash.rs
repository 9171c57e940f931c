//! Flash messages carried across a redirect in a short-lived cookie

use axum_extra::extract::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use super::cookies::{self, config::FLASH_COOKIE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Level::Danger, message)
    }
}

/// Queue a message for the next page render.
pub fn push(jar: CookieJar, flash: Flash) -> CookieJar {
    let mut pending = read(&jar);
    pending.push(flash);
    jar.add(cookies::flash_cookie(encode(&pending)))
}

/// Drain queued messages, clearing the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE_NAME).is_none() {
        return (jar, Vec::new());
    }
    let pending = read(&jar);
    (jar.remove(cookies::clear_flash_cookie()), pending)
}

fn read(jar: &CookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE_NAME)
        .map(|c| decode(c.value()))
        .unwrap_or_default()
}

fn encode(flashes: &[Flash]) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(flashes).unwrap_or_default())
}

// A tampered or stale cookie just yields no messages.
fn decode(value: &str) -> Vec<Flash> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}
