// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend contract tests.
//!
//! These tests verify the exact REST, Auth and Storage requests sent to the
//! backend and how its responses and failures are mapped.

use axum::{
    body::Body,
    http::{header as http_header, Request, StatusCode},
};
use physio_roster::config::Config;
use physio_roster::db::SupabaseDb;
use physio_roster::error::AppError;
use physio_roster::models::{Credentials, Role, ScheduleField, StaffForm, Unit};
use physio_roster::services::AuthService;
use physio_roster::state::PHOTO_SAVED_PROFILE_FAILED;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn db_for(server: &MockServer) -> SupabaseDb {
    SupabaseDb::new(&Config {
        supabase_url: server.uri(),
        ..Config::test_default()
    })
}

fn staff_row(id: &str, on_call: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Obi",
        "role": 1,
        "unit": 2,
        "phone": null,
        "image_url": null,
        "on_call_dates": on_call,
        "gym_call_dates": null,
        "leave_dates": []
    })
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

fn token_body() -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": {"id": "u1", "email": "admin@example.com"}
    })
}

// ─── REST ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_staff_request_and_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/staff"))
        .and(query_param("select", "*"))
        .and(header("apikey", "test_anon_key"))
        .and(header("authorization", "Bearer test_anon_key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([staff_row(
                "a",
                json!([{"year": 2025, "values": [11, 10]}])
            )])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let staff = db_for(&server).fetch_staff().await.unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].role, Role::Intern);
    assert_eq!(staff[0].unit, Unit::Orthopedics);
    assert_eq!(staff[0].phone, "");
    assert_eq!(staff[0].on_call_dates.values_for(2025), &[10, 11]);
    assert!(staff[0].gym_call_dates.is_empty());
}

#[tokio::test]
async fn test_update_schedule_patches_single_column() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/staff"))
        .and(query_param("id", "eq.a b"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(json!({"gym_call_dates": [{"year": 2025, "values": [3]}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let schedule = common::schedule(2025, &[3]);
    db_for(&server)
        .update_schedule("a b", ScheduleField::GymCall, &schedule)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rest_rejection_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/suggestions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "JWT expired"})))
        .mount(&server)
        .await;

    let err = db_for(&server).delete_suggestion("s1").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn test_rest_failure_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/suggestions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let err = db_for(&server).fetch_suggestions().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: boom");
    assert!(!err.is_connectivity());
}

// ─── Storage ─────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_photo_upserts_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/staff-photos/a.jpg"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Key": "staff-photos/a.jpg"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = db_for(&server)
        .upload_staff_photo("a", &png_bytes())
        .await
        .unwrap();
    assert_eq!(
        url,
        format!("{}/storage/v1/object/public/staff-photos/a.jpg", server.uri())
    );
}

#[tokio::test]
async fn test_delete_photo_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/staff-photos"))
        .and(body_json(json!({"prefixes": ["a.jpg"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    db_for(&server).delete_staff_photo("a").await.unwrap();
}

// ─── Auth ────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_failure_messages() {
    let cases = [
        (400_u16, AppError::SIGN_IN_INVALID),
        (401, AppError::SIGN_IN_UNAUTHORIZED),
        (404, AppError::SIGN_IN_NOT_FOUND),
        (500, AppError::SIGN_IN_UNEXPECTED),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = db_for(&server)
            .sign_in_with_password("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), expected, "status {}", status);
    }
}

#[tokio::test]
async fn test_sign_in_uses_session_token_for_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({"email": "admin@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/staff"))
        .and(query_param("id", "eq.a"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let db = db_for(&server);
    let auth = AuthService::new(db.clone());
    let status = auth
        .sign_in(&Credentials {
            email: " admin@example.com ".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert!(status.signed_in);
    assert_eq!(status.email.as_deref(), Some("admin@example.com"));
    assert_eq!(auth.admin_name(), "admin@example.com");
    db.delete_staff("a").await.unwrap();
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(db_for(&server));
    auth.sign_in(&Credentials {
        email: "admin@example.com".to_string(),
        password: "secret".to_string(),
    })
    .await
    .unwrap();

    let status = auth.sign_out().await;
    assert!(!status.signed_in);
    assert!(!auth.is_signed_in());
}

#[tokio::test]
async fn test_health_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(db_for(&server).health().await);
    assert!(!SupabaseDb::new_mock().health().await);
}

// ─── Through the API ─────────────────────────────────────────

#[tokio::test]
async fn test_call_booking_writes_then_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/staff"))
        .and(query_param("id", "eq.a"))
        .and(body_json(json!({"on_call_dates": [{"year": 2025, "values": [10]}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/staff"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([staff_row("a", json!([{"year": 2025, "values": [10]}]))])),
        )
        .mount(&server)
        .await;

    let (app, state) = common::create_app_with_backend(&server.uri());
    common::sign_in_admin(&state).await;
    state.roster.set_staff_for_test(vec![common::staff_member(
        "a",
        "Ada",
        Role::Intern,
        Unit::Orthopedics,
    )]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/roster/calls")
                .header(http_header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"year": 2025, "week": 10, "call_type": "on_call", "add": ["a"]})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["updated"], 1);

    // Re-fetched rows are published and cached
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/roster/calls?year=2025&week=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["slots"][0]["staff"]["id"], "a");

    let cached = state.cache.load_staff().await;
    assert_eq!(cached.len(), 1);
    assert!(cached[0].on_call_dates.contains(2025, 10));
}

#[tokio::test]
async fn test_refresh_publishes_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/staff"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([staff_row("a", json!([]))])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/suggestions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s1", "text": "More chairs", "timestamp": 1700000000000_i64}
        ])))
        .mount(&server)
        .await;

    let (_, state) = common::create_app_with_backend(&server.uri());
    state.roster.refresh().await.unwrap();

    assert_eq!(state.roster.staff().len(), 1);
    assert_eq!(state.roster.suggestions()[0].author, "Anonymous");
    assert!(state.roster.last_synced().is_some());
    assert_eq!(state.cache.load_suggestions().await.len(), 1);
}

#[tokio::test]
async fn test_edit_reports_photo_saved_when_profile_write_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/staff-photos/a.jpg"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Key": "staff-photos/a.jpg"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/staff"))
        .and(query_param("id", "eq.a"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let (_, state) = common::create_app_with_backend(&server.uri());
    common::sign_in_admin(&state).await;
    state.roster.set_staff_for_test(vec![common::staff_member(
        "a",
        "Ada",
        Role::Intern,
        Unit::Orthopedics,
    )]);

    let form = StaffForm {
        first_name: "Ada".to_string(),
        last_name: "Okafor".to_string(),
        phone: "8012345678".to_string(),
        role: Some(3),
        unit: Some(2),
    };
    let err = state
        .roster
        .edit_staff("a", form, Some(&png_bytes()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Backend(_)));
    assert_eq!(err.to_string(), PHOTO_SAVED_PROFILE_FAILED);

    // The published row is untouched until a re-fetch succeeds
    assert_eq!(state.roster.find_staff("a").unwrap().last_name, "Test");
}
