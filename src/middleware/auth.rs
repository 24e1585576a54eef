// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator guard middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires a signed-in administrator session.
///
/// Refreshes the session first when it is close to expiry.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.auth.is_signed_in() {
        tracing::debug!(path = %request.uri().path(), "Blocked admin request without session");
        return Err(AppError::Unauthorized);
    }

    state.auth.ensure_fresh().await?;
    if !state.auth.is_signed_in() {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
