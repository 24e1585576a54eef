// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Physio-Roster API Server
//!
//! Keeps the department roster in sync with Supabase and serves it to the
//! UI over a local JSON API, falling back to cached data when offline.

use physio_roster::{
    config::Config,
    db::{KvStore, OfflineCache, SupabaseDb},
    services::{AuthService, LogNotifier, NetworkMonitor, ReminderService, TokioJobScheduler},
    state::RosterState,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Physio-Roster API");

    let db = SupabaseDb::new(&config);

    // Open the offline cache and publish whatever it holds right away
    let cache = OfflineCache::new(KvStore::open(&config.cache_path).await?);

    let auth = Arc::new(AuthService::new(db.clone()));
    let roster = Arc::new(RosterState::new(db.clone(), cache.clone(), auth.clone()));
    roster.load_cached().await;

    // Re-arm reminders persisted by a previous run
    let reminders = ReminderService::new(
        Arc::new(TokioJobScheduler::new()),
        Arc::new(LogNotifier),
        cache.clone(),
    );
    let restored = reminders.restore(chrono::Utc::now()).await;
    tracing::info!(restored, "Reminder scheduler initialized");

    // Connectivity probe drives subscriptions and refreshes
    NetworkMonitor::new(
        db.clone(),
        roster.clone(),
        Duration::from_secs(config.network_probe_secs),
    )
    .spawn();

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        cache,
        auth,
        roster,
        reminders,
    });

    // Build router
    let app = physio_roster::routes::create_router(state);

    // Start server
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("physio_roster=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
