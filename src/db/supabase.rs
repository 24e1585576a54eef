// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Staff rows (profile fields and schedule columns)
//! - Staff photos (storage bucket)
//! - Suggestions
//! - Password sign-in, token refresh and sign-out

use crate::config::{Config, STAFF_PHOTO_BUCKET};
use crate::db::tables;
use crate::error::AppError;
use crate::models::{
    Collection, Schedule, ScheduleField, Session, StaffMember, Suggestion, SuggestionUpdate,
};
use chrono::{Duration, Utc};
use image::codecs::jpeg::JpegEncoder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;

const JPEG_QUALITY: u8 = 80;

/// Supabase REST/auth/storage client.
///
/// Cheap to clone; all clones share the lazily built HTTP client and the
/// current access token.
#[derive(Clone)]
pub struct SupabaseDb {
    inner: Arc<Inner>,
}

struct Inner {
    base_url: String,
    anon_key: String,
    timeout: std::time::Duration,
    http: OnceCell<reqwest::Client>,
    /// Bearer token of the signed-in administrator, if any
    access_token: RwLock<Option<String>>,
    offline: bool,
}

/// GoTrue token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    email: Option<String>,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            email: token.user.and_then(|u| u.email),
        }
    }
}

/// Profile columns written when a staff member is edited.
#[derive(Serialize)]
struct StaffProfilePatch<'a> {
    first_name: &'a str,
    last_name: &'a str,
    role: i32,
    unit: i32,
    phone: &'a str,
    image_url: &'a str,
}

impl SupabaseDb {
    /// Create a client for the configured project.
    ///
    /// No connection is made until the first call.
    pub fn new(config: &Config) -> Self {
        tracing::info!(url = %config.supabase_url, "Supabase client configured");
        Self {
            inner: Arc::new(Inner {
                base_url: config.supabase_url.clone(),
                anon_key: config.supabase_anon_key.clone(),
                timeout: std::time::Duration::from_secs(config.http_timeout_secs),
                http: OnceCell::new(),
                access_token: RwLock::new(None),
                offline: false,
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All backend operations will return [`AppError::Offline`].
    pub fn new_mock() -> Self {
        let mut db = Self::new(&Config::test_default());
        if let Some(inner) = Arc::get_mut(&mut db.inner) {
            inner.offline = true;
        }
        db
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.inner.anon_key
    }

    /// Use `token` for authenticated writes (or the anon key if `None`).
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.inner.access_token.write() {
            *guard = token;
        }
    }

    /// Helper to get the HTTP client, building it on first use.
    async fn client(&self) -> Result<&reqwest::Client, AppError> {
        if self.inner.offline {
            return Err(AppError::Offline);
        }

        let timeout = self.inner.timeout;
        self.inner
            .http
            .get_or_try_init(|| async move {
                reqwest::Client::builder()
                    .connect_timeout(timeout)
                    .timeout(timeout)
                    .build()
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to build HTTP client");
                AppError::Offline
            })
    }

    fn bearer(&self) -> String {
        self.inner
            .access_token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_else(|| self.inner.anon_key.clone())
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.inner.base_url, table)
    }

    fn by_id(id: &str) -> String {
        format!("eq.{}", urlencoding::encode(id))
    }

    /// Request carrying the API key and the current bearer token.
    async fn request(
        &self,
        method: reqwest::Method,
        url: String,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        Ok(self
            .client()
            .await?
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(self.bearer()))
    }

    // ─── Generic Table Operations ────────────────────────────────

    /// Fetch every row of a collection.
    pub async fn fetch_all<T: Collection>(&self) -> Result<Vec<T>, AppError> {
        tracing::debug!(table = T::TABLE, "Fetching rows");
        let response = self
            .request(reqwest::Method::GET, self.rest_url(T::TABLE))
            .await?
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        let rows: Vec<T> = check_response_json(response).await?;
        tracing::debug!(table = T::TABLE, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    async fn insert_row<T: Serialize>(&self, table: &str, row: &T) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::POST, self.rest_url(table))
            .await?
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response).await
    }

    async fn patch_row<T: Serialize + ?Sized>(
        &self,
        table: &str,
        id: &str,
        patch: &T,
    ) -> Result<(), AppError> {
        let url = format!("{}?id={}", self.rest_url(table), Self::by_id(id));
        let response = self
            .request(reqwest::Method::PATCH, url)
            .await?
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response).await
    }

    async fn delete_row(&self, table: &str, id: &str) -> Result<(), AppError> {
        let url = format!("{}?id={}", self.rest_url(table), Self::by_id(id));
        let response = self
            .request(reqwest::Method::DELETE, url)
            .await?
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response).await
    }

    // ─── Staff Operations ────────────────────────────────────────

    pub async fn fetch_staff(&self) -> Result<Vec<StaffMember>, AppError> {
        self.fetch_all::<StaffMember>().await
    }

    pub async fn insert_staff(&self, staff: &StaffMember) -> Result<(), AppError> {
        self.insert_row(tables::STAFF, staff).await?;
        tracing::info!(staff_id = %staff.id, "Staff member added");
        Ok(())
    }

    /// Write the profile columns of `staff`, leaving its schedules untouched.
    pub async fn update_staff_profile(&self, staff: &StaffMember) -> Result<(), AppError> {
        let patch = StaffProfilePatch {
            first_name: &staff.first_name,
            last_name: &staff.last_name,
            role: staff.role.code(),
            unit: staff.unit.code(),
            phone: &staff.phone,
            image_url: &staff.image_url,
        };
        self.patch_row(tables::STAFF, &staff.id, &patch).await?;
        tracing::info!(staff_id = %staff.id, "Staff profile updated");
        Ok(())
    }

    /// Overwrite a single schedule column.
    pub async fn update_schedule(
        &self,
        id: &str,
        field: ScheduleField,
        schedule: &Schedule,
    ) -> Result<(), AppError> {
        let mut patch = serde_json::Map::new();
        patch.insert(
            field.column().to_string(),
            serde_json::to_value(schedule)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?,
        );
        self.patch_row(tables::STAFF, id, &patch).await?;
        tracing::debug!(staff_id = %id, column = field.column(), "Schedule updated");
        Ok(())
    }

    pub async fn delete_staff(&self, id: &str) -> Result<(), AppError> {
        self.delete_row(tables::STAFF, id).await?;
        tracing::info!(staff_id = %id, "Staff member deleted");
        Ok(())
    }

    // ─── Storage Operations ──────────────────────────────────────

    /// Public URL of a staff photo.
    pub fn staff_photo_url(&self, id: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.inner.base_url,
            STAFF_PHOTO_BUCKET,
            photo_object(id)
        )
    }

    /// Re-encode `bytes` as JPEG and store it as the staff member's photo.
    ///
    /// Returns the public URL of the stored object.
    pub async fn upload_staff_photo(&self, id: &str, bytes: &[u8]) -> Result<String, AppError> {
        let jpeg = encode_jpeg(bytes)?;
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.inner.base_url,
            STAFF_PHOTO_BUCKET,
            photo_object(id)
        );

        let response = self
            .request(reqwest::Method::POST, url)
            .await?
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(jpeg)
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response)
            .await
            .map_err(|e| AppError::Backend(format!("Image upload failed: {}", e)))?;

        tracing::info!(staff_id = %id, "Staff photo uploaded");
        Ok(self.staff_photo_url(id))
    }

    pub async fn delete_staff_photo(&self, id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.inner.base_url, STAFF_PHOTO_BUCKET
        );
        let body = serde_json::json!({ "prefixes": [photo_object(id)] });

        let response = self
            .request(reqwest::Method::DELETE, url)
            .await?
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response).await
    }

    // ─── Suggestion Operations ───────────────────────────────────

    pub async fn fetch_suggestions(&self) -> Result<Vec<Suggestion>, AppError> {
        self.fetch_all::<Suggestion>().await
    }

    pub async fn insert_suggestion(&self, suggestion: &Suggestion) -> Result<(), AppError> {
        self.insert_row(tables::SUGGESTIONS, suggestion).await?;
        tracing::info!(suggestion_id = %suggestion.id, "Suggestion submitted");
        Ok(())
    }

    pub async fn resolve_suggestion(
        &self,
        id: &str,
        update: &SuggestionUpdate,
    ) -> Result<(), AppError> {
        self.patch_row(tables::SUGGESTIONS, id, update).await?;
        tracing::info!(
            suggestion_id = %id,
            resolved_by = %update.resolved_by,
            "Suggestion resolved"
        );
        Ok(())
    }

    pub async fn delete_suggestion(&self, id: &str) -> Result<(), AppError> {
        self.delete_row(tables::SUGGESTIONS, id).await?;
        tracing::info!(suggestion_id = %id, "Suggestion deleted");
        Ok(())
    }

    // ─── Auth Operations ─────────────────────────────────────────

    /// Password grant.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let url = format!("{}/auth/v1/token", self.inner.base_url);
        let response = self
            .client()
            .await?
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-in request failed");
                AppError::Backend(AppError::SIGN_IN_CONNECTION.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Sign-in rejected");
            return Err(AppError::sign_in_failure(status.as_u16()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))?;
        Ok(token.into())
    }

    /// Refresh-token grant.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AppError> {
        let url = format!("{}/auth/v1/token", self.inner.base_url);
        let response = self
            .client()
            .await?
            .post(url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        // GoTrue answers an invalid or revoked refresh token with 400
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            tracing::warn!("Refresh token rejected");
            return Err(AppError::Unauthorized);
        }
        let token: TokenResponse = check_response_json(response).await?;
        Ok(token.into())
    }

    /// Revoke the session identified by `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/auth/v1/logout", self.inner.base_url);
        let response = self
            .client()
            .await?
            .post(url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::from_transport(&e))?;

        check_response(response).await
    }

    /// Whether the backend answers its health endpoint.
    pub async fn health(&self) -> bool {
        let Ok(client) = self.client().await else {
            return false;
        };
        let url = format!("{}/auth/v1/health", self.inner.base_url);
        match client
            .get(url)
            .header("apikey", &self.inner.anon_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                false
            }
        }
    }
}

/// Storage object name of a staff photo.
fn photo_object(id: &str) -> String {
    format!("{}.jpg", id)
}

/// Decode any supported image and re-encode it as JPEG.
fn encode_jpeg(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::BadRequest(format!("Unsupported image: {}", e)))?;
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JPEG encode error: {}", e)))?;
    Ok(out)
}

/// Error body returned by PostgREST, GoTrue and Storage.
#[derive(Deserialize)]
struct BackendMessage {
    #[serde(alias = "msg", alias = "error_description", alias = "error")]
    message: String,
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(status_error(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
}

async fn status_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        tracing::warn!(status = status.as_u16(), "Backend rejected credentials");
        return AppError::Unauthorized;
    }

    let message = serde_json::from_str::<BackendMessage>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    AppError::Backend(format!("HTTP {}: {}", status.as_u16(), message))
}
