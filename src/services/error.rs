//! Error handling utilities for route handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Extension trait for logging errors and converting to StatusCode
pub trait LogErr<T> {
    /// Log error with context and return INTERNAL_SERVER_ERROR
    fn log_500(self, context: &str) -> Result<T, StatusCode>;

    /// Log error with context and return a custom StatusCode
    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, StatusCode> {
        self.map_err(|e| {
            tracing::error!("{}: {}", context, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }

    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode> {
        self.map_err(|e| {
            tracing::warn!("{}: {}", context, e);
            status
        })
    }
}

/// `{"error": ...}` body returned by the polling endpoints when the media
/// server cannot be reached or queried.
#[derive(Debug)]
pub struct JsonError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
