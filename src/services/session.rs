//! Session tokens: HS256 JWTs naming the signed-in user
//!
//! The token is the only session state. Resolving it to a user happens per
//! request in [`crate::routes::auth::AuthUser`], which also re-checks that
//! the user row still exists, so deleting an account ends its sessions.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::constants::SESSION_EXPIRY_HOURS;

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: i64,    // expiry timestamp
    pub iat: i64,    // issued at
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
}

/// Create a session token valid for [`SESSION_EXPIRY_HOURS`]
pub fn create_session_token(user_id: i64, secret: &[u8]) -> Result<String, SessionError> {
    let now = Utc::now();
    let exp = now + Duration::hours(SESSION_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| SessionError::InvalidToken)
}

/// Validate a session token and return the user_id
pub fn validate_session_token(token: &str, secret: &[u8]) -> Result<i64, SessionError> {
    // HS256 only, to rule out algorithm confusion
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub", "iat"]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::InvalidToken,
        })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| SessionError::InvalidToken)
}
