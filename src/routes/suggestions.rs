// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Suggestion box routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{NewSuggestion, ResolveRequest, Suggestion};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/suggestions", get(list).post(submit))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/suggestions/{id}/resolve", post(resolve))
        .route("/api/suggestions/{id}", delete(remove))
}

/// Newest first.
async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Suggestion>> {
    let mut suggestions = state.roster.suggestions();
    suggestions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Json(suggestions)
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewSuggestion>,
) -> Result<(StatusCode, Json<Suggestion>)> {
    let suggestion = state.roster.add_suggestion(new).await?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<StatusCode> {
    state
        .roster
        .resolve_suggestion(&id, &request.resolution_note)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.roster.delete_suggestion(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
