// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use chrono::{Duration, Utc};
use physio_roster::config::Config;
use physio_roster::db::{OfflineCache, SupabaseDb};
use physio_roster::models::{Role, Schedule, Session, StaffMember, Unit, YearGroup};
use physio_roster::routes::create_router;
use physio_roster::services::{AuthService, LogNotifier, ReminderService, TokioJobScheduler};
use physio_roster::state::RosterState;
use physio_roster::AppState;
use std::sync::Arc;

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(Config::test_default(), SupabaseDb::new_mock())
}

/// Create a test app talking to a mock backend at `uri`.
#[allow(dead_code)]
pub fn create_app_with_backend(uri: &str) -> (axum::Router, Arc<AppState>) {
    create_app_with_config(Config {
        supabase_url: uri.to_string(),
        ..Config::test_default()
    })
}

/// Create a test app with a custom backend configuration.
#[allow(dead_code)]
pub fn create_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = SupabaseDb::new(&config);
    build_app(config, db)
}

fn build_app(config: Config, db: SupabaseDb) -> (axum::Router, Arc<AppState>) {
    let cache = OfflineCache::in_memory();
    let auth = Arc::new(AuthService::new(db.clone()));
    let roster = Arc::new(RosterState::new(db.clone(), cache.clone(), auth.clone()));
    let reminders = ReminderService::new(
        Arc::new(TokioJobScheduler::new()),
        Arc::new(LogNotifier),
        cache.clone(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        cache,
        auth,
        roster,
        reminders,
    });

    (create_router(state.clone()), state)
}

/// Sign in an administrator without a backend round trip.
#[allow(dead_code)]
pub async fn sign_in_admin(state: &AppState) {
    state
        .auth
        .set_session_for_test(Session {
            access_token: "admin-access".to_string(),
            refresh_token: "admin-refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            email: Some("admin@example.com".to_string()),
        })
        .await;
}

/// A staff member with empty schedules.
#[allow(dead_code)]
pub fn staff_member(id: &str, first: &str, role: Role, unit: Unit) -> StaffMember {
    StaffMember {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: "Test".to_string(),
        role,
        unit,
        phone: "0801234567".to_string(),
        image_url: String::new(),
        on_call_dates: Schedule::default(),
        gym_call_dates: Schedule::default(),
        leave_dates: Schedule::default(),
    }
}

#[allow(dead_code)]
pub fn schedule(year: i32, values: &[u32]) -> Schedule {
    Schedule::new([YearGroup {
        year,
        values: values.to_vec(),
    }])
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
