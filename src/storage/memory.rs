use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

use super::{DraftStorage, StorageError, StoredDraft};

/// In-process storage that keeps serialized snapshots in a map.
///
/// Snapshots go through JSON on every save/load so decoding behaves like a
/// durable backend.
#[derive(Default)]
pub struct MemoryDraftStorage {
    entries: Mutex<HashMap<String, String>>,
    saves: AtomicU32,
    failures_remaining: AtomicU32,
    clear_failures_remaining: AtomicU32,
}

impl MemoryDraftStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` saves with a transient error
    pub fn failing_saves(count: u32) -> Self {
        let storage = Self::default();
        storage.failures_remaining.store(count, Ordering::SeqCst);
        storage
    }

    /// Fail the next `count` clears with a transient error
    pub fn failing_clears(count: u32) -> Self {
        let storage = Self::default();
        storage.clear_failures_remaining.store(count, Ordering::SeqCst);
        storage
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn insert_raw(&self, storage_key: &str, json: &str) {
        self.entries
            .lock()
            .await
            .insert(storage_key.to_string(), json.to_string());
    }
}

#[async_trait]
impl DraftStorage for MemoryDraftStorage {
    async fn load(&self, storage_key: &str) -> Result<Option<StoredDraft>, StorageError> {
        let entries = self.entries.lock().await;
        match entries.get(storage_key) {
            Some(json) => Ok(Some(StoredDraft::from_json(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, storage_key: &str, snapshot: &StoredDraft) -> Result<(), StorageError> {
        if take_failure(&self.failures_remaining) {
            return Err(StorageError::Unavailable("injected save failure".to_string()));
        }

        let json = snapshot.to_json()?;
        self.entries.lock().await.insert(storage_key.to_string(), json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, storage_key: &str) -> Result<(), StorageError> {
        if take_failure(&self.clear_failures_remaining) {
            return Err(StorageError::Unavailable("injected clear failure".to_string()));
        }
        self.entries.lock().await.remove(storage_key);
        Ok(())
    }
}

fn take_failure(remaining: &AtomicU32) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
