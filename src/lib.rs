// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Physio-Roster: duty roster for a hospital physiotherapy department
//!
//! This crate tracks ward-call and gym-call weeks, leave months, the staff
//! directory and a suggestion box stored in Supabase, keeps an offline
//! snapshot for when the network is down, schedules local reminders and
//! serves it all to a UI over a local JSON API.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod time_utils;

use config::Config;
use db::{OfflineCache, SupabaseDb};
use services::{AuthService, ReminderService};
use state::RosterState;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SupabaseDb,
    pub cache: OfflineCache,
    pub auth: Arc<AuthService>,
    pub roster: Arc<RosterState>,
    pub reminders: ReminderService,
}
