// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connectivity monitor.
//!
//! Probes the backend health endpoint on a fixed interval and reports
//! transitions to the roster state.

use crate::db::SupabaseDb;
use crate::state::RosterState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct NetworkMonitor {
    db: SupabaseDb,
    state: Arc<RosterState>,
    interval: Duration,
}

impl NetworkMonitor {
    pub fn new(db: SupabaseDb, state: Arc<RosterState>, interval: Duration) -> Self {
        Self {
            db,
            state,
            interval,
        }
    }

    /// Run the probe loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last: Option<bool> = None;

        loop {
            ticker.tick().await;
            let available = self.db.health().await;

            if last != Some(available) {
                self.state.set_network_available(available).await;
                last = Some(available);
            } else if available {
                // Restart any change feed whose socket dropped.
                self.state.ensure_subscriptions();
            }
        }
    }
}
