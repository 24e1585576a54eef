// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data access layer (Supabase backend and offline cache).

pub mod cache;
pub mod supabase;

pub use cache::{KvStore, OfflineCache};
pub use supabase::SupabaseDb;

/// Table names as constants.
pub mod tables {
    pub const STAFF: &str = "staff";
    pub const SUGGESTIONS: &str = "suggestions";
}
