// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local reminders and clinical notes.
//!
//! Both live only on this device, so no administrator session is needed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Reminder, ReminderRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reminders",
            get(list_reminders)
                .post(schedule_reminder)
                .delete(cancel_all),
        )
        .route("/api/reminders/{job_id}", delete(cancel_reminder))
        .route("/api/reminders/staff/{staff_id}", delete(cancel_for_staff))
        .route("/api/notes", get(get_notes).put(save_notes))
}

// ─── Reminders ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct CancelledResponse {
    pub cancelled: usize,
}

/// Soonest first.
async fn list_reminders(State(state): State<Arc<AppState>>) -> Json<Vec<Reminder>> {
    let mut reminders = state.reminders.list().await;
    reminders.sort_by_key(|r| r.fire_at);
    Json(reminders)
}

async fn schedule_reminder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>)> {
    let staff = state.roster.find_staff(&request.staff_id)?;
    let reminder = state
        .reminders
        .schedule(&staff, &request, chrono::Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn cancel_reminder(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<StatusCode> {
    state.reminders.cancel(&job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_for_staff(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
) -> Json<CancelledResponse> {
    Json(CancelledResponse {
        cancelled: state.reminders.cancel_for_staff(&staff_id).await,
    })
}

async fn cancel_all(State(state): State<Arc<AppState>>) -> Json<CancelledResponse> {
    Json(CancelledResponse {
        cancelled: state.reminders.cancel_all().await,
    })
}

// ─── Notes ───────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct Notes {
    #[serde(default)]
    pub notes: String,
}

async fn get_notes(State(state): State<Arc<AppState>>) -> Json<Notes> {
    Json(Notes {
        notes: state.cache.load_notes().await,
    })
}

async fn save_notes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Notes>,
) -> Result<Json<Notes>> {
    state.cache.save_notes(&body.notes).await?;
    Ok(Json(body))
}
