// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every variant renders as a message that can be shown to the user as-is.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Administrator sign-in required")]
    Unauthorized,

    #[error("Offline mode - using cached data")]
    Offline,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation failure; the message is the user-facing reason.
    #[error("{0}")]
    BadRequest(String),

    /// Network, auth or backend failure; the message is the user-facing reason.
    #[error("{0}")]
    Backend(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const SIGN_IN_INVALID: &'static str = "Invalid email or password. Please try again.";
    pub const SIGN_IN_UNAUTHORIZED: &'static str =
        "Unauthorized access. Please check your credentials.";
    pub const SIGN_IN_NOT_FOUND: &'static str = "User not found. Please sign up first.";
    pub const SIGN_IN_UNEXPECTED: &'static str =
        "An unexpected error occurred. Please try again later.";
    pub const SIGN_IN_CONNECTION: &'static str =
        "An error occurred. Please check your connection and try again.";
    pub const REQUEST_TIMEOUT: &'static str = "Request timeout. Using cached data.";

    /// Map a failed sign-in HTTP status to its user-facing message.
    pub fn sign_in_failure(status: u16) -> Self {
        let msg = match status {
            400 => Self::SIGN_IN_INVALID,
            401 => Self::SIGN_IN_UNAUTHORIZED,
            404 => Self::SIGN_IN_NOT_FOUND,
            _ => Self::SIGN_IN_UNEXPECTED,
        };
        AppError::Backend(msg.to_string())
    }

    /// Map a transport-level reqwest failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Backend(Self::REQUEST_TIMEOUT.to_string())
        } else if err.is_connect() {
            AppError::Offline
        } else {
            AppError::Backend(err.to_string())
        }
    }

    /// Whether this error means the backend could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        match self {
            AppError::Offline => true,
            AppError::Backend(msg) => msg == Self::REQUEST_TIMEOUT,
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Offline => (
                StatusCode::SERVICE_UNAVAILABLE,
                "offline",
                Some(self.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Backend(msg) => {
                tracing::warn!(error = %msg, "Backend error");
                (StatusCode::BAD_GATEWAY, "backend_error", Some(msg.clone()))
            }
            AppError::Cache(msg) => {
                tracing::error!(error = %msg, "Cache error");
                (StatusCode::INTERNAL_SERVER_ERROR, "cache_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
