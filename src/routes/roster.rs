// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster views, schedule edits, status and refresh.

use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::calendar;
use crate::error::{AppError, Result};
use crate::models::{ReminderOffset, Role, ScheduleField, Unit};
use crate::routes::staff::StaffView;
use crate::services::roster::{staff_on_call, staff_on_leave};
use crate::state::{Period, ScheduleUpdate};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/refresh", post(refresh))
        .route("/api/roster/calls", get(calls))
        .route("/api/roster/leave", get(leave))
        .route("/api/calendar", get(month_calendar))
        .route("/api/options", get(options))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/roster/calls", put(update_calls))
        .route("/api/roster/leave", put(update_leave))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub online: bool,
    pub refreshing: bool,
    pub admin_signed_in: bool,
    pub admin_email: Option<String>,
    /// RFC 3339 time of the last successful fetch
    pub last_synced: Option<String>,
    pub staff_count: usize,
    pub suggestion_count: usize,
    pub pending_reminders: usize,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(build_status(&state).await)
}

async fn build_status(state: &AppState) -> StatusResponse {
    let session = state.auth.status();
    StatusResponse {
        online: state.roster.is_online(),
        refreshing: state.roster.is_refreshing(),
        admin_signed_in: session.signed_in,
        admin_email: session.email,
        last_synced: state.roster.last_synced().map(format_utc_rfc3339),
        staff_count: state.roster.staff().len(),
        suggestion_count: state.roster.suggestions().len(),
        pending_reminders: state.reminders.list().await.len(),
    }
}

/// Pull-to-refresh. On failure the cached snapshot stays published and the
/// error says why.
async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    state.roster.refresh().await?;
    Ok(Json(build_status(&state).await))
}

// ─── Call Roster ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WeekQuery {
    year: Option<i32>,
    week: Option<u32>,
}

#[derive(Serialize)]
pub struct CallSlot {
    pub slot: &'static str,
    pub staff: Option<StaffView>,
}

#[derive(Serialize)]
pub struct CallsResponse {
    pub year: i32,
    pub week: u32,
    pub month: u32,
    pub quarter: u32,
    /// "1st Jan\n7th Jan"
    pub date_range: String,
    pub slots: Vec<CallSlot>,
}

const SLOT_LABELS: [&str; 6] = [
    "Ward call 1",
    "Ward call 2",
    "Ward call 3",
    "Gym call",
    "2nd on call",
    "3rd on call",
];

async fn calls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<CallsResponse>> {
    let year = query.year.unwrap_or_else(calendar::current_year);
    let week = query.week.unwrap_or_else(calendar::current_week);
    let date_range = calendar::week_date_range(year, week)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid week {} of {}", week, year)))?;

    let staff = state.roster.staff();
    let lineup = staff_on_call(&staff, year, week);
    let slots = SLOT_LABELS
        .iter()
        .zip(lineup.slots())
        .map(|(&slot, member)| CallSlot {
            slot,
            staff: member.cloned().map(StaffView::from),
        })
        .collect();

    Ok(Json(CallsResponse {
        year,
        week,
        month: calendar::month_for_week(week),
        quarter: calendar::quarter_for_week(week),
        date_range,
        slots,
    }))
}

#[derive(Deserialize)]
pub struct CallUpdateRequest {
    pub year: i32,
    pub week: u32,
    pub call_type: ScheduleField,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

async fn update_calls(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallUpdateRequest>,
) -> Result<Json<ScheduleUpdate>> {
    let period = Period {
        year: request.year,
        value: request.week,
    };
    let outcome = state
        .roster
        .update_call_dates(&request.add, &request.remove, period, request.call_type)
        .await?;
    Ok(Json(outcome))
}

// ─── Leave Roster ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

impl MonthQuery {
    fn resolve(&self) -> Result<(i32, u32, (&'static str, &'static str))> {
        let year = self.year.unwrap_or_else(calendar::current_year);
        let month = self.month.unwrap_or_else(calendar::current_month);
        let info = calendar::month_info(month)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid month {}", month)))?;
        Ok((year, month, info))
    }
}

#[derive(Serialize)]
pub struct LeaveResponse {
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub staff: Vec<StaffView>,
}

async fn leave(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<LeaveResponse>> {
    let (year, month, (_, month_name)) = query.resolve()?;
    let staff = staff_on_leave(&state.roster.staff(), year, month)
        .into_iter()
        .map(StaffView::from)
        .collect();
    Ok(Json(LeaveResponse {
        year,
        month,
        month_name,
        staff,
    }))
}

#[derive(Deserialize)]
pub struct LeaveUpdateRequest {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

async fn update_leave(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LeaveUpdateRequest>,
) -> Result<Json<ScheduleUpdate>> {
    let period = Period {
        year: request.year,
        value: request.month,
    };
    let outcome = state
        .roster
        .update_leave_dates(&request.add, &request.remove, period)
        .await?;
    Ok(Json(outcome))
}

// ─── Calendar & Options ──────────────────────────────────────

#[derive(Serialize)]
pub struct WeekSummary {
    pub week: u32,
    pub date_range: Option<String>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub abbreviation: &'static str,
    pub name: &'static str,
    pub quarter: u32,
    /// Roster weeks of the month
    pub weeks: Vec<WeekSummary>,
    /// Fraction of the month elapsed (0 for future, 1 for past months)
    pub progress: f32,
}

async fn month_calendar(Query(query): Query<MonthQuery>) -> Result<Json<CalendarResponse>> {
    let (year, month, (abbreviation, name)) = query.resolve()?;
    let weeks = calendar::weeks_in_month(month)
        .map(|week| WeekSummary {
            week,
            date_range: calendar::week_date_range(year, week),
        })
        .collect();

    let today = calendar::today();
    let progress = match (year, month).cmp(&(today.year(), today.month())) {
        std::cmp::Ordering::Less => 1.0,
        std::cmp::Ordering::Greater => 0.0,
        std::cmp::Ordering::Equal => calendar::month_progress(year, month, today.day()),
    };

    Ok(Json(CalendarResponse {
        year,
        month,
        abbreviation,
        name,
        quarter: calendar::quarter_for_month(month),
        weeks,
        progress,
    }))
}

#[derive(Serialize)]
pub struct CodeLabel {
    pub code: i32,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct Today {
    pub year: i32,
    pub month: u32,
    pub week: u32,
    pub quarter: u32,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub roles: Vec<CodeLabel>,
    pub units: Vec<CodeLabel>,
    pub reminder_offsets: Vec<&'static str>,
    pub today: Today,
}

/// Choices for the staff form and reminder picker.
async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        roles: Role::ALL
            .iter()
            .map(|r| CodeLabel {
                code: r.code(),
                label: r.label(),
            })
            .collect(),
        units: Unit::ALL
            .iter()
            .map(|u| CodeLabel {
                code: u.code(),
                label: u.label(),
            })
            .collect(),
        reminder_offsets: ReminderOffset::ALL.iter().map(|o| o.label()).collect(),
        today: Today {
            year: calendar::current_year(),
            month: calendar::current_month(),
            week: calendar::current_week(),
            quarter: calendar::current_quarter(),
        },
    })
}
