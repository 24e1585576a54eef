// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation state holder.
//!
//! Owns the observable roster state (connectivity, staff, suggestions,
//! refresh flag) and performs every mutation as a remote write followed by
//! a re-fetch of the canonical collection. When the backend is unreachable
//! the last cached snapshot is served instead.

use crate::db::{OfflineCache, SupabaseDb};
use crate::error::AppError;
use crate::models::{
    Credentials, NewSuggestion, ScheduleField, SessionStatus, StaffForm, StaffMember, Suggestion,
    SuggestionUpdate,
};
use crate::services::realtime::RealtimeService;
use crate::services::AuthService;
use crate::time_utils::now_millis;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

pub const PHOTO_SAVED_PROFILE_FAILED: &str =
    "Image uploaded successfully, but staff details update failed";

/// Outcome of a bulk schedule edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleUpdate {
    /// Staff rows written
    pub updated: u32,
    /// Staff rows already in the requested state
    pub unchanged: u32,
}

/// A week (or month) of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub value: u32,
}

pub struct RosterState {
    db: SupabaseDb,
    cache: OfflineCache,
    auth: Arc<AuthService>,
    realtime: RealtimeService,
    /// Written only by `set_network_available`
    online: watch::Sender<bool>,
    refreshing: watch::Sender<bool>,
    staff: Arc<watch::Sender<Vec<StaffMember>>>,
    suggestions: Arc<watch::Sender<Vec<Suggestion>>>,
    last_synced: watch::Sender<Option<DateTime<Utc>>>,
}

impl RosterState {
    pub fn new(db: SupabaseDb, cache: OfflineCache, auth: Arc<AuthService>) -> Self {
        let realtime = RealtimeService::new(db.clone(), cache.clone());
        Self {
            db,
            cache,
            auth,
            realtime,
            online: watch::channel(false).0,
            refreshing: watch::channel(false).0,
            staff: Arc::new(watch::channel(Vec::new()).0),
            suggestions: Arc::new(watch::channel(Vec::new()).0),
            last_synced: watch::channel(None).0,
        }
    }

    // ─── Observable State ────────────────────────────────────────

    pub fn staff(&self) -> Vec<StaffMember> {
        self.staff.borrow().clone()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    pub fn admin_signed_in(&self) -> bool {
        self.auth.is_signed_in()
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        *self.last_synced.borrow()
    }

    pub fn watch_staff(&self) -> watch::Receiver<Vec<StaffMember>> {
        self.staff.subscribe()
    }

    pub fn watch_online(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    /// Whether the staff and suggestion change feeds are running.
    pub fn subscriptions(&self) -> (bool, bool) {
        self.realtime.is_subscribed()
    }

    pub fn find_staff(&self, id: &str) -> Result<StaffMember, AppError> {
        self.staff
            .borrow()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Staff member {}", id)))
    }

    // ─── Connectivity & Refresh ──────────────────────────────────

    /// React to a connectivity change.
    ///
    /// Going online (re)establishes the change feeds and refreshes; going
    /// offline tears them down and serves the cached snapshot.
    pub async fn set_network_available(&self, available: bool) {
        let was_online = self.online.send_replace(available);
        tracing::info!(available, was_online, "Network availability changed");

        if available {
            self.ensure_subscriptions();
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "Refresh after reconnect failed");
            }
        } else {
            self.realtime.cleanup();
            self.load_cached().await;
        }
    }

    /// Start any change feed that is not running. Idempotent.
    pub fn ensure_subscriptions(&self) {
        let staff = Arc::clone(&self.staff);
        self.realtime.subscribe_staff(Arc::new(move |rows| {
            staff.send_replace(rows);
        }));

        let suggestions = Arc::clone(&self.suggestions);
        self.realtime.subscribe_suggestions(Arc::new(move |rows| {
            suggestions.send_replace(rows);
        }));
    }

    /// Publish the cached snapshot.
    pub async fn load_cached(&self) {
        let staff = self.cache.load_staff().await;
        let suggestions = self.cache.load_suggestions().await;
        tracing::info!(
            staff = staff.len(),
            suggestions = suggestions.len(),
            "Loaded cached snapshot"
        );
        self.staff.send_replace(staff);
        self.suggestions.send_replace(suggestions);
    }

    /// Re-fetch staff and suggestions, falling back to the cache on failure.
    ///
    /// Returns the first failure, after the cached data has been published.
    /// A failed fetch leaves the network status alone; only the connectivity
    /// monitor changes it.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.refreshing.send_replace(true);
        let staff = self.reload_staff().await;
        let suggestions = self.reload_suggestions().await;
        self.refreshing.send_replace(false);

        let result = staff.and(suggestions);
        if result.is_ok() {
            self.last_synced.send_replace(Some(Utc::now()));
        }
        result
    }

    async fn reload_staff(&self) -> Result<(), AppError> {
        match self.db.fetch_staff().await {
            Ok(rows) => {
                if let Err(e) = self.cache.save_staff(&rows).await {
                    tracing::warn!(error = %e, "Failed to cache staff");
                }
                self.staff.send_replace(rows);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Staff fetch failed; using cached data");
                self.staff.send_replace(self.cache.load_staff().await);
                Err(e)
            }
        }
    }

    async fn reload_suggestions(&self) -> Result<(), AppError> {
        match self.db.fetch_suggestions().await {
            Ok(rows) => {
                if let Err(e) = self.cache.save_suggestions(&rows).await {
                    tracing::warn!(error = %e, "Failed to cache suggestions");
                }
                self.suggestions.send_replace(rows);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Suggestion fetch failed; using cached data");
                self.suggestions
                    .send_replace(self.cache.load_suggestions().await);
                Err(e)
            }
        }
    }

    /// Re-fetch after a successful write; a failed re-fetch is only logged.
    async fn resync_staff(&self) {
        if let Err(e) = self.reload_staff().await {
            tracing::debug!(error = %e, "Staff re-fetch after write failed");
        }
    }

    async fn resync_suggestions(&self) {
        if let Err(e) = self.reload_suggestions().await {
            tracing::debug!(error = %e, "Suggestion re-fetch after write failed");
        }
    }

    // ─── Staff Mutations ─────────────────────────────────────────

    /// Add a staff member, uploading the photo first when given.
    pub async fn add_staff(
        &self,
        form: StaffForm,
        photo: Option<&[u8]>,
    ) -> Result<StaffMember, AppError> {
        form.check()?;
        self.auth.ensure_fresh().await?;

        let id = uuid::Uuid::new_v4().to_string();
        let image_url = match photo {
            Some(bytes) => self.db.upload_staff_photo(&id, bytes).await?,
            None => String::new(),
        };

        let staff = form.into_staff(id, image_url);
        self.db.insert_staff(&staff).await?;
        self.resync_staff().await;
        Ok(staff)
    }

    /// Edit the profile fields of a staff member, optionally replacing the photo.
    pub async fn edit_staff(
        &self,
        id: &str,
        form: StaffForm,
        photo: Option<&[u8]>,
    ) -> Result<StaffMember, AppError> {
        form.check()?;
        self.auth.ensure_fresh().await?;

        let mut staff = self.find_staff(id)?;
        form.apply_to(&mut staff);

        let uploaded = match photo {
            Some(bytes) => {
                staff.image_url = self.db.upload_staff_photo(id, bytes).await?;
                true
            }
            None => false,
        };

        if let Err(e) = self.db.update_staff_profile(&staff).await {
            if uploaded && !e.is_connectivity() {
                return Err(AppError::Backend(PHOTO_SAVED_PROFILE_FAILED.to_string()));
            }
            return Err(e);
        }

        self.resync_staff().await;
        Ok(staff)
    }

    /// Replace a staff member's photo.
    pub async fn set_staff_photo(&self, id: &str, photo: &[u8]) -> Result<StaffMember, AppError> {
        self.auth.ensure_fresh().await?;

        let mut staff = self.find_staff(id)?;
        staff.image_url = self.db.upload_staff_photo(id, photo).await?;
        if let Err(e) = self.db.update_staff_profile(&staff).await {
            tracing::warn!(staff_id = %id, error = %e, "Photo stored but profile not updated");
            return Err(AppError::Backend(PHOTO_SAVED_PROFILE_FAILED.to_string()));
        }

        self.resync_staff().await;
        Ok(staff)
    }

    /// Delete a staff member and, best effort, their photo.
    ///
    /// Reminders for the staff member are left in place.
    pub async fn remove_staff(&self, id: &str) -> Result<(), AppError> {
        self.auth.ensure_fresh().await?;
        self.db.delete_staff(id).await?;

        if let Err(e) = self.db.delete_staff_photo(id).await {
            tracing::warn!(staff_id = %id, error = %e, "Failed to delete staff photo");
        }

        self.resync_staff().await;
        Ok(())
    }

    // ─── Schedule Mutations ──────────────────────────────────────

    /// Book or unbook a call week for several staff members.
    ///
    /// Every member is attempted; the first failure is reported afterwards.
    pub async fn update_call_dates(
        &self,
        add: &[String],
        remove: &[String],
        period: Period,
        call_type: ScheduleField,
    ) -> Result<ScheduleUpdate, AppError> {
        if call_type == ScheduleField::Leave {
            return Err(AppError::BadRequest(
                "Call type must be on_call or gym_call".to_string(),
            ));
        }
        if !(1..=53).contains(&period.value) {
            return Err(AppError::BadRequest(format!("Invalid week {}", period.value)));
        }
        self.apply_schedule_changes(add, remove, period, call_type)
            .await
    }

    /// Book or unbook a leave month for several staff members.
    pub async fn update_leave_dates(
        &self,
        add: &[String],
        remove: &[String],
        period: Period,
    ) -> Result<ScheduleUpdate, AppError> {
        if !(1..=12).contains(&period.value) {
            return Err(AppError::BadRequest(format!("Invalid month {}", period.value)));
        }
        self.apply_schedule_changes(add, remove, period, ScheduleField::Leave)
            .await
    }

    async fn apply_schedule_changes(
        &self,
        add: &[String],
        remove: &[String],
        period: Period,
        field: ScheduleField,
    ) -> Result<ScheduleUpdate, AppError> {
        self.auth.ensure_fresh().await?;

        let edits = add
            .iter()
            .map(|id| (id, true))
            .chain(remove.iter().map(|id| (id, false)));

        let mut result = ScheduleUpdate::default();
        let mut first_error: Option<AppError> = None;

        for (id, booked) in edits {
            let outcome = self.write_schedule(id, field, period, booked).await;
            match outcome {
                Ok(true) => result.updated += 1,
                Ok(false) => result.unchanged += 1,
                Err(e) => {
                    tracing::warn!(
                        staff_id = %id,
                        column = field.column(),
                        error = %e,
                        "Schedule update failed"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        tracing::info!(
            column = field.column(),
            year = period.year,
            value = period.value,
            updated = result.updated,
            failed = first_error.is_some(),
            "Schedule changes applied"
        );

        if result.updated > 0 {
            self.resync_staff().await;
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    /// Set one member's booking. Returns whether a write was needed.
    async fn write_schedule(
        &self,
        id: &str,
        field: ScheduleField,
        period: Period,
        booked: bool,
    ) -> Result<bool, AppError> {
        let staff = self.find_staff(id)?;
        let mut schedule = staff.schedule(field).clone();

        let changed = if booked {
            schedule.add(period.year, period.value)
        } else {
            schedule.remove(period.year, period.value)
        };
        if !changed {
            return Ok(false);
        }

        self.db.update_schedule(id, field, &schedule).await?;
        Ok(true)
    }

    // ─── Suggestions ─────────────────────────────────────────────

    pub async fn add_suggestion(&self, new: NewSuggestion) -> Result<Suggestion, AppError> {
        new.check()?;
        let suggestion = new.into_suggestion(uuid::Uuid::new_v4().to_string(), now_millis());
        self.db.insert_suggestion(&suggestion).await?;
        self.resync_suggestions().await;
        Ok(suggestion)
    }

    /// Mark a suggestion resolved by the signed-in administrator.
    pub async fn resolve_suggestion(&self, id: &str, note: &str) -> Result<(), AppError> {
        self.auth.ensure_fresh().await?;
        let update = SuggestionUpdate {
            resolved: true,
            resolved_by: self.auth.admin_name(),
            resolved_timestamp: now_millis(),
            resolution_note: note.trim().to_string(),
        };
        self.db.resolve_suggestion(id, &update).await?;
        self.resync_suggestions().await;
        Ok(())
    }

    pub async fn delete_suggestion(&self, id: &str) -> Result<(), AppError> {
        self.auth.ensure_fresh().await?;
        self.db.delete_suggestion(id).await?;
        self.resync_suggestions().await;
        Ok(())
    }

    // ─── Session ─────────────────────────────────────────────────

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionStatus, AppError> {
        self.auth.sign_in(credentials).await
    }

    pub async fn sign_out(&self) -> SessionStatus {
        self.auth.sign_out().await
    }

    /// Replace the staff list without a backend round trip (tests only).
    #[doc(hidden)]
    pub fn set_staff_for_test(&self, staff: Vec<StaffMember>) {
        self.staff.send_replace(staff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Schedule, Unit};

    fn state_with_cache(cache: OfflineCache) -> RosterState {
        let db = SupabaseDb::new_mock();
        RosterState::new(db.clone(), cache, Arc::new(AuthService::new(db)))
    }

    fn member(id: &str) -> StaffMember {
        StaffMember {
            id: id.to_string(),
            first_name: "Tolu".to_string(),
            last_name: "Ade".to_string(),
            role: Role::Intern,
            unit: Unit::Orthopedics,
            phone: "8012345678".to_string(),
            image_url: String::new(),
            on_call_dates: Schedule::default(),
            gym_call_dates: Schedule::default(),
            leave_dates: Schedule::default(),
        }
    }

    #[tokio::test]
    async fn offline_refresh_serves_cache() {
        let cache = OfflineCache::in_memory();
        cache.save_staff(&[member("a")]).await.unwrap();
        let state = state_with_cache(cache);

        let err = state.refresh().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(!state.is_refreshing());
        assert!(!state.is_online());
        assert_eq!(state.staff().len(), 1);
        assert!(state.last_synced().is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_network_status() {
        let state = state_with_cache(OfflineCache::in_memory());
        let mut online = state.watch_online();

        state.set_network_available(true).await;
        assert!(*online.borrow_and_update());

        let err = state.refresh().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(state.is_online());
        assert!(!online.has_changed().unwrap());
    }

    #[tokio::test]
    async fn going_offline_loads_cached_snapshot() {
        let cache = OfflineCache::in_memory();
        cache.save_staff(&[member("a"), member("b")]).await.unwrap();
        let state = state_with_cache(cache);
        let mut rx = state.watch_staff();

        state.set_network_available(false).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
    }

    #[tokio::test]
    async fn schedule_edit_validates_period() {
        let state = state_with_cache(OfflineCache::in_memory());
        let ids = vec!["a".to_string()];

        let err = state
            .update_leave_dates(&ids, &[], Period { year: 2025, value: 13 })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid month 13");

        let err = state
            .update_call_dates(
                &ids,
                &[],
                Period { year: 2025, value: 3 },
                ScheduleField::Leave,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn schedule_edit_attempts_all_and_reports_first_failure() {
        let state = state_with_cache(OfflineCache::in_memory());
        let mut booked = member("booked");
        booked.on_call_dates.add(2025, 3);
        state.set_staff_for_test(vec![booked]);

        // "booked" already has week 3, "missing" is unknown
        let err = state
            .update_call_dates(
                &["booked".to_string(), "missing".to_string()],
                &[],
                Period { year: 2025, value: 3 },
                ScheduleField::OnCall,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found: Staff member missing");
    }
}
