// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staff directory routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{StaffForm, StaffMember};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/staff", get(list_staff))
        .route("/api/staff/{id}", get(get_staff))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/staff", post(add_staff))
        .route("/api/staff/{id}", put(edit_staff).delete(remove_staff))
        .route("/api/staff/{id}/photo", put(set_photo))
}

// ─── Views ───────────────────────────────────────────────────

/// Staff row with display labels for its role and unit codes.
#[derive(Serialize)]
pub struct StaffView {
    #[serde(flatten)]
    pub staff: StaffMember,
    pub full_name: String,
    pub role_label: &'static str,
    pub unit_label: &'static str,
}

impl From<StaffMember> for StaffView {
    fn from(staff: StaffMember) -> Self {
        Self {
            full_name: staff.full_name(),
            role_label: staff.role.label(),
            unit_label: staff.unit.label(),
            staff,
        }
    }
}

/// Add/edit body: the profile form plus an optional base64 photo.
#[derive(Deserialize)]
pub struct StaffRequest {
    #[serde(flatten)]
    pub form: StaffForm,
    #[serde(default)]
    pub photo: Option<String>,
}

impl StaffRequest {
    fn into_parts(self) -> Result<(StaffForm, Option<Vec<u8>>)> {
        let photo = match self.photo.as_deref().map(str::trim) {
            Some(encoded) if !encoded.is_empty() => Some(
                STANDARD
                    .decode(encoded)
                    .map_err(|_| AppError::BadRequest("Invalid photo encoding".to_string()))?,
            ),
            _ => None,
        };
        Ok((self.form, photo))
    }
}

// ─── Handlers ────────────────────────────────────────────────

async fn list_staff(State(state): State<Arc<AppState>>) -> Json<Vec<StaffView>> {
    Json(state.roster.staff().into_iter().map(StaffView::from).collect())
}

async fn get_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StaffView>> {
    Ok(Json(state.roster.find_staff(&id)?.into()))
}

async fn add_staff(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StaffRequest>,
) -> Result<(StatusCode, Json<StaffView>)> {
    let (form, photo) = request.into_parts()?;
    let staff = state.roster.add_staff(form, photo.as_deref()).await?;
    tracing::info!(staff_id = %staff.id, "Staff member added");
    Ok((StatusCode::CREATED, Json(staff.into())))
}

async fn edit_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<StaffRequest>,
) -> Result<Json<StaffView>> {
    let (form, photo) = request.into_parts()?;
    let staff = state.roster.edit_staff(&id, form, photo.as_deref()).await?;
    Ok(Json(staff.into()))
}

/// Replace the photo with the raw image bytes of the request body.
async fn set_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<StaffView>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Photo is empty".to_string()));
    }
    let staff = state.roster.set_staff_photo(&id, &body).await?;
    Ok(Json(staff.into()))
}

async fn remove_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.roster.remove_staff(&id).await?;
    tracing::info!(staff_id = %id, "Staff member removed");
    Ok(StatusCode::NO_CONTENT)
}
