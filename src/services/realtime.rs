// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Realtime change-feed subscriptions.
//!
//! Joins the Phoenix channel `realtime:public:{table}` over the Supabase
//! realtime websocket. Every row change triggers a full re-fetch of the
//! table; the fresh rows go to the subscriber callback and then to the
//! offline cache.

use crate::db::{OfflineCache, SupabaseDb};
use crate::models::{Collection, StaffMember, Suggestion};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Phoenix heartbeat interval.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Callback receiving a freshly fetched collection.
pub type UpdateCallback<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;

/// Realtime websocket endpoint for a project URL.
pub fn websocket_url(base_url: &str, anon_key: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!(
        "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
        ws_base,
        urlencoding::encode(anon_key)
    )
}

pub fn channel_topic(table: &str) -> String {
    format!("realtime:public:{table}")
}

/// `phx_join` for every change on `table`.
pub fn join_message(table: &str, reference: u64) -> String {
    json!({
        "topic": channel_topic(table),
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        },
        "ref": reference.to_string(),
    })
    .to_string()
}

pub fn heartbeat_message(reference: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string(),
    })
    .to_string()
}

/// Inbound channel frame.
#[derive(Debug, Deserialize)]
pub struct ChannelMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ChannelMessage {
    /// A row change on the joined table.
    pub fn is_change(&self) -> bool {
        self.event == "postgres_changes"
            || (self.topic.starts_with("realtime:")
                && matches!(self.event.as_str(), "INSERT" | "UPDATE" | "DELETE"))
    }

    /// A `phx_reply` whose status is not "ok".
    pub fn is_error_reply(&self) -> bool {
        self.event == "phx_error"
            || (self.event == "phx_reply"
                && self.payload.get("status").and_then(|s| s.as_str()) != Some("ok"))
    }
}

/// Manages the staff and suggestion subscriptions.
pub struct RealtimeService {
    db: SupabaseDb,
    cache: OfflineCache,
    staff_active: Arc<AtomicBool>,
    suggestions_active: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RealtimeService {
    pub fn new(db: SupabaseDb, cache: OfflineCache) -> Self {
        Self {
            db,
            cache,
            staff_active: Arc::new(AtomicBool::new(false)),
            suggestions_active: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to staff changes. A no-op while already subscribed.
    pub fn subscribe_staff(&self, on_update: UpdateCallback<StaffMember>) {
        self.subscribe(Arc::clone(&self.staff_active), on_update);
    }

    /// Subscribe to suggestion changes. A no-op while already subscribed.
    pub fn subscribe_suggestions(&self, on_update: UpdateCallback<Suggestion>) {
        self.subscribe(Arc::clone(&self.suggestions_active), on_update);
    }

    pub fn is_subscribed(&self) -> (bool, bool) {
        (
            self.staff_active.load(Ordering::SeqCst),
            self.suggestions_active.load(Ordering::SeqCst),
        )
    }

    /// Cancel every subscription and reset the guards.
    pub fn cleanup(&self) {
        let handles = match self.handles.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        };
        for handle in &handles {
            handle.abort();
        }
        self.staff_active.store(false, Ordering::SeqCst);
        self.suggestions_active.store(false, Ordering::SeqCst);
        tracing::info!(cancelled = handles.len(), "Realtime subscriptions cleaned up");
    }

    fn subscribe<T: Collection>(&self, active: Arc<AtomicBool>, on_update: UpdateCallback<T>) {
        if active.swap(true, Ordering::SeqCst) {
            tracing::debug!(table = T::TABLE, "Already subscribed");
            return;
        }

        let db = self.db.clone();
        let cache = self.cache.clone();
        let handle = tokio::spawn(async move {
            let result = run_channel::<T>(&db, &cache, &on_update).await;
            match result {
                Ok(()) => tracing::info!(table = T::TABLE, "Realtime channel closed"),
                Err(e) => tracing::warn!(table = T::TABLE, error = %e, "Realtime channel failed"),
            }
            active.store(false, Ordering::SeqCst);
        });

        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
    }
}

/// Re-fetch a table and push it to the callback and the cache.
async fn refetch<T: Collection>(
    db: &SupabaseDb,
    cache: &OfflineCache,
    on_update: &UpdateCallback<T>,
) {
    match db.fetch_all::<T>().await {
        Ok(rows) => {
            on_update(rows.clone());
            if let Err(e) = cache.save(&rows).await {
                tracing::warn!(table = T::TABLE, error = %e, "Failed to cache realtime update");
            }
        }
        Err(e) => tracing::warn!(table = T::TABLE, error = %e, "Realtime re-fetch failed"),
    }
}

/// Run one channel until the socket closes.
async fn run_channel<T: Collection>(
    db: &SupabaseDb,
    cache: &OfflineCache,
    on_update: &UpdateCallback<T>,
) -> Result<(), String> {
    let url = websocket_url(db.base_url(), db.anon_key());
    let (ws_stream, _) = connect_async(url.as_str())
        .await
        .map_err(|e| format!("connect: {e}"))?;
    let (mut write, mut read) = ws_stream.split();

    let mut next_ref: u64 = 1;
    write
        .send(Message::Text(join_message(T::TABLE, next_ref)))
        .await
        .map_err(|e| format!("send join: {e}"))?;
    tracing::info!(table = T::TABLE, "Joined realtime channel");

    refetch(db, cache, on_update).await;

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    // Skip the first immediate tick.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(frame) = serde_json::from_str::<ChannelMessage>(&text) else {
                            tracing::debug!(table = T::TABLE, "Ignoring unparseable frame");
                            continue;
                        };
                        if frame.is_change() {
                            tracing::debug!(table = T::TABLE, "Change received");
                            refetch(db, cache, on_update).await;
                        } else if frame.is_error_reply() {
                            return Err(format!("channel error: {}", frame.payload));
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Err(e)) => return Err(format!("read error: {e}")),
                    _ => {}
                }
            }
            _ = heartbeat.tick() => {
                next_ref += 1;
                let msg = heartbeat_message(next_ref);
                write
                    .send(Message::Text(msg))
                    .await
                    .map_err(|e| format!("heartbeat error: {e}"))?;
            }
        }
    }
}
