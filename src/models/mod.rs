// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod reminder;
pub mod schedule;
pub mod session;
pub mod staff;
pub mod suggestion;

pub use reminder::{EventKind, Reminder, ReminderOffset, ReminderRequest};
pub use schedule::{Schedule, ScheduleField, YearGroup};
pub use session::{Session, SessionStatus};
pub use staff::{Credentials, Role, StaffForm, StaffMember, Unit};
pub use suggestion::{NewSuggestion, ResolveRequest, Suggestion, SuggestionUpdate};

use serde::{de::DeserializeOwned, Serialize};

/// A backend table mirrored locally and in the offline cache.
pub trait Collection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table name in the REST API
    const TABLE: &'static str;
    /// Key of the snapshot in the offline cache
    const CACHE_KEY: &'static str;
}

impl Collection for StaffMember {
    const TABLE: &'static str = crate::db::tables::STAFF;
    const CACHE_KEY: &'static str = "staff";
}

impl Collection for Suggestion {
    const TABLE: &'static str = crate::db::tables::SUGGESTIONS;
    const CACHE_KEY: &'static str = "suggestions";
}
