// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod network;
pub mod realtime;
pub mod reminders;
pub mod roster;

pub use auth::AuthService;
pub use network::NetworkMonitor;
pub use realtime::RealtimeService;
pub use reminders::{JobScheduler, LogNotifier, Notifier, ReminderService, TokioJobScheduler};
pub use roster::CallLineup;
