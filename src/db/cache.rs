// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline snapshot cache backed by a JSON key-value file.
//!
//! Each key holds a single snapshot that is overwritten on every save. The
//! whole map is rewritten on each change via a temp file and rename, so a
//! crash mid-write leaves the previous snapshot intact.

use crate::error::AppError;
use crate::models::{Collection, Reminder, StaffMember, Suggestion};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const REMINDERS_KEY: &str = "reminders_list";
pub const NOTES_KEY: &str = "clinical_notes";

/// Persistent JSON key-value store.
#[derive(Clone)]
pub struct KvStore {
    inner: Arc<Mutex<KvInner>>,
}

struct KvInner {
    /// `None` for an in-memory store
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
}

impl KvStore {
    /// Open the store at `path`, loading existing entries.
    ///
    /// A missing file starts empty; an unreadable one is logged and replaced
    /// on the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt cache file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::Cache(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(path = %path.display(), keys = entries.len(), "Offline cache opened");
        Ok(Self {
            inner: Arc::new(Mutex::new(KvInner {
                path: Some(path),
                entries,
            })),
        })
    }

    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(KvInner {
                path: None,
                entries: BTreeMap::new(),
            })),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let inner = self.inner.lock().await;
        inner
            .entries
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| AppError::Cache(format!("Failed to decode {}: {}", key, e)))
            })
            .transpose()
    }

    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Cache(format!("Failed to encode {}: {}", key, e)))?;

        // Memory only changes once the file holds the new map.
        let mut inner = self.inner.lock().await;
        let mut entries = inner.entries.clone();
        entries.insert(key.to_string(), value);
        inner.persist(&entries).await?;
        inner.entries = entries;
        Ok(())
    }
}

impl KvInner {
    async fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes =
            serde_json::to_vec_pretty(entries).map_err(|e| AppError::Cache(e.to_string()))?;
        write_atomic(path, &bytes)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to write {}: {}", path.display(), e)))
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Last known snapshot of the backend collections plus local-only data.
#[derive(Clone)]
pub struct OfflineCache {
    store: KvStore,
}

impl OfflineCache {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    /// Cache that lives only in memory, for tests.
    pub fn in_memory() -> Self {
        Self::new(KvStore::in_memory())
    }

    /// Overwrite the snapshot of a collection.
    pub async fn save<T: Collection>(&self, rows: &[T]) -> Result<(), AppError> {
        self.store.put(T::CACHE_KEY, rows).await?;
        tracing::debug!(key = T::CACHE_KEY, count = rows.len(), "Cached snapshot");
        Ok(())
    }

    /// Load the snapshot of a collection; missing or unreadable is empty.
    pub async fn load<T: Collection>(&self) -> Vec<T> {
        match self.store.get::<Vec<T>>(T::CACHE_KEY).await {
            Ok(rows) => rows.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key = T::CACHE_KEY, error = %e, "Ignoring unreadable snapshot");
                Vec::new()
            }
        }
    }

    pub async fn save_staff(&self, staff: &[StaffMember]) -> Result<(), AppError> {
        self.save(staff).await
    }

    pub async fn load_staff(&self) -> Vec<StaffMember> {
        self.load().await
    }

    pub async fn save_suggestions(&self, suggestions: &[Suggestion]) -> Result<(), AppError> {
        self.save(suggestions).await
    }

    pub async fn load_suggestions(&self) -> Vec<Suggestion> {
        self.load().await
    }

    // ─── Local-only data ─────────────────────────────────────────

    pub async fn save_reminders(&self, reminders: &[Reminder]) -> Result<(), AppError> {
        self.store.put(REMINDERS_KEY, reminders).await
    }

    pub async fn load_reminders(&self) -> Vec<Reminder> {
        self.store
            .get(REMINDERS_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub async fn save_notes(&self, notes: &str) -> Result<(), AppError> {
        self.store.put(NOTES_KEY, notes).await
    }

    pub async fn load_notes(&self) -> String {
        self.store
            .get(NOTES_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}
