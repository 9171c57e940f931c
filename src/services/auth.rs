//! Credential checks: password hashing, login, registration and the admin
//! account seeded from configuration.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::domain::users::{self, NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown user and wrong password are deliberately indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Username and password are required.")]
    MissingFields,
    #[error("Username already exists. Please choose a different one.")]
    UsernameTaken,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        if users::is_unique_violation(&err) {
            RegistrationError::UsernameTaken
        } else {
            RegistrationError::Database(err)
        }
    }
}

/// Verified against when the username is unknown, so both failure paths cost
/// one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("not-a-real-password").ok());

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

/// Constant-time comparison of `password` against a stored PHC hash string
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let Some(user) = users::get_user_by_username(db, username).await? else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            verify_password(password, dummy);
        }
        return Err(AuthError::InvalidCredentials);
    };

    if verify_password(password, &user.password_hash) {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Fields submitted on the registration form
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub plex_baseurl: Option<String>,
    pub plex_token: Option<String>,
}

/// Create the account described by the form. Returns the new user id.
pub async fn register(db: &SqlitePool, form: &Registration) -> Result<i64, RegistrationError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(RegistrationError::MissingFields);
    }

    if users::get_user_by_username(db, username).await?.is_some() {
        return Err(RegistrationError::UsernameTaken);
    }

    let password_hash = hash_password(&form.password).map_err(RegistrationError::Hash)?;

    // The UNIQUE constraint still catches a concurrent registration that
    // slipped past the check above.
    let id = users::create_user(
        db,
        &NewUser {
            username,
            password_hash: &password_hash,
            plex_base_url: blank_to_none(form.plex_baseurl.as_deref()),
            plex_token: blank_to_none(form.plex_token.as_deref()),
        },
    )
    .await?;

    Ok(id)
}

/// Create the configured admin account if it does not exist yet.
/// Returns true when a user was created.
pub async fn ensure_admin(db: &SqlitePool, config: &Config) -> Result<bool, RegistrationError> {
    if users::get_user_by_username(db, &config.admin_username)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    register(
        db,
        &Registration {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
            ..Default::default()
        },
    )
    .await?;

    Ok(true)
}

pub fn is_admin(user: &User, config: &Config) -> bool {
    user.username == config.admin_username
}

/// Form fields arrive as empty strings when left blank; store those as NULL.
pub fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
