// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder, notes and suggestion-box API tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Datelike;
use physio_roster::models::{Role, Unit};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn app_with_staff() -> axum::Router {
    let (app, state) = common::create_test_app();
    state.roster.set_staff_for_test(vec![
        common::staff_member("a", "Ada", Role::Intern, Unit::Neurology),
        common::staff_member("b", "Bola", Role::Senior, Unit::Orthopedics),
    ]);
    app
}

fn next_year() -> i32 {
    chrono::Utc::now().year() + 1
}

fn leave_request(staff_id: &str, month: u32, offset: &str) -> Value {
    json!({
        "staff_id": staff_id,
        "kind": "leave",
        "year": next_year(),
        "value": month,
        "offset": offset
    })
}

#[tokio::test]
async fn test_schedule_list_and_cancel() {
    let app = app_with_staff();

    let (status, reminder) = send(
        &app,
        "POST",
        "/api/reminders",
        Some(leave_request("a", 7, "A Week Before")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reminder["title"], "A Week's Leave Reminder");
    assert_eq!(
        reminder["message"],
        format!("For Ada Test's Leave coming up in July, {}.", next_year())
    );

    let (status, list) = send(&app, "GET", "/api/reminders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let job_id = reminder["job_id"].as_str().unwrap();
    let (status, _) = send(&app, "DELETE", &format!("/api/reminders/{}", job_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("/api/reminders/{}", job_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_reminder_rejected() {
    let app = app_with_staff();
    let request = leave_request("a", 7, "A Day Before");

    let (status, _) = send(&app, "POST", "/api/reminders", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/reminders", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Reminder for this has already been set!");
}

#[tokio::test]
async fn test_past_reminder_rejected() {
    let app = app_with_staff();
    let request = json!({
        "staff_id": "a",
        "kind": "ward_call",
        "year": 2020,
        "value": 10,
        "offset": "A Month Before"
    });

    let (status, body) = send(&app, "POST", "/api/reminders", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        "The reminder date selected is in the past! Please select a future time."
    );
}

#[tokio::test]
async fn test_reminder_for_unknown_staff() {
    let app = app_with_staff();
    let (status, _) = send(
        &app,
        "POST",
        "/api/reminders",
        Some(leave_request("nobody", 7, "A Day Before")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_for_staff_and_all() {
    let app = app_with_staff();
    for (staff, month) in [("a", 7), ("a", 8), ("b", 9)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/reminders",
            Some(leave_request(staff, month, "A Month Before")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "DELETE", "/api/reminders/staff/a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], 2);

    let (_, body) = send(&app, "DELETE", "/api/reminders", None).await;
    assert_eq!(body["cancelled"], 1);

    let (_, list) = send(&app, "GET", "/api/reminders", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_notes_round_trip() {
    let app = app_with_staff();

    let (status, body) = send(&app, "GET", "/api/notes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/notes",
        Some(json!({"notes": "Bed 4: mobilise twice daily"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/notes", None).await;
    assert_eq!(body["notes"], "Bed 4: mobilise twice daily");
}

#[tokio::test]
async fn test_empty_suggestion_rejected() {
    let app = app_with_staff();
    let (status, body) = send(&app, "POST", "/api/suggestions", Some(json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Suggestion cannot be empty");
}

#[tokio::test]
async fn test_suggestion_offline_reports_offline() {
    let app = app_with_staff();
    let (status, body) = send(
        &app,
        "POST",
        "/api/suggestions",
        Some(json!({"text": "More chairs in the gym"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"], "Offline mode - using cached data");
}
