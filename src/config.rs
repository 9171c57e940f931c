//! Runtime configuration read from the environment (and `.env`, if present)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_REMOTE_TIMEOUT_SECS;

const DEFAULT_SECRET_KEY: &str = "you-will-never-guess";

#[derive(Debug, Clone)]
pub struct Config {
    /// Signs session tokens
    pub secret_key: String,
    pub database_url: String,
    /// Fallback media server URL for users without their own
    pub default_plex_base_url: Option<String>,
    /// Fallback media server token for users without their own
    pub default_plex_token: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub remote_timeout: Duration,
    /// Mark cookies `Secure` (requires HTTPS in front of the server)
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            database_url: "sqlite://plexdash.db?mode=rwc".to_string(),
            default_plex_base_url: None,
            default_plex_token: None,
            admin_username: "admin".to_string(),
            admin_password: "password".to_string(),
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 5000,
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            cookie_secure: false,
        }
    }
}

impl Config {
    /// Overlay environment variables on the defaults. Call [`load_env_file`]
    /// first so `.env` values are visible here.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            secret_key: env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            default_plex_base_url: non_empty_var("PLEX_BASEURL"),
            default_plex_token: non_empty_var("PLEX_TOKEN"),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            debug: flag_var("DEBUG"),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            remote_timeout: env::var("REMOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.remote_timeout),
            cookie_secure: flag_var("COOKIE_SECURE"),
        }
    }

    /// Default tracing filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info,tower_http=warn,sqlx=warn"
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load `.env` into the process environment. Returns the file's path when one
/// was found; nothing is logged so this can run before tracing is set up.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_var(key: &str) -> bool {
    matches!(
        env::var(key).map(|v| v.to_lowercase()).as_deref(),
        Ok("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_media_server_fallback() {
        let config = Config::default();
        assert!(config.default_plex_base_url.is_none());
        assert!(config.default_plex_token.is_none());
        assert!(config.uses_default_secret());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_log_filter_follows_debug_flag() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info,tower_http=warn,sqlx=warn");

        let config = Config {
            debug: true,
            ..Config::default()
        };
        assert_eq!(config.log_filter(), "debug");
    }
}
