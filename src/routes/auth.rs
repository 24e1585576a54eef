// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator sign-in routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Credentials, SessionStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/session", get(session))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
}

/// Current session, without tokens.
async fn session(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.auth.status())
}

/// Sign in with email and password.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionStatus>> {
    Ok(Json(state.roster.sign_in(&credentials).await?))
}

/// Sign out. Always succeeds locally even when the backend is unreachable.
async fn sign_out(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.roster.sign_out().await)
}
