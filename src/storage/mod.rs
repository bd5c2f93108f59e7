// ============================================================================
// Draft Storage - durable home of the draft between sessions
// ============================================================================
//
// Drafts are stored as JSON snapshots tagged with the build that wrote them.
// A snapshot from another build, or one that no longer decodes, is treated
// as an empty draft.
//
// ============================================================================

mod error;
mod file;
mod memory;
mod snapshot;

use async_trait::async_trait;

use crate::domain::draft::OrderDraft;

pub use error::StorageError;
pub use file::FileDraftStorage;
pub use memory::MemoryDraftStorage;
pub use snapshot::StoredDraft;

#[async_trait]
pub trait DraftStorage: Send + Sync {
    async fn load(&self, storage_key: &str) -> Result<Option<StoredDraft>, StorageError>;

    async fn save(&self, storage_key: &str, snapshot: &StoredDraft) -> Result<(), StorageError>;

    /// Removing a key that was never saved is not an error
    async fn clear(&self, storage_key: &str) -> Result<(), StorageError>;
}

/// Outcome of loading a stored draft for the running build
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedDraft {
    Restored(OrderDraft),
    Empty,
    /// Snapshot existed but could not be used
    Discarded { reason: String },
}

impl LoadedDraft {
    pub fn into_draft(self) -> OrderDraft {
        match self {
            LoadedDraft::Restored(draft) => draft,
            LoadedDraft::Empty | LoadedDraft::Discarded { .. } => OrderDraft::new(),
        }
    }
}

/// Load the draft under `storage_key`, discarding snapshots from other builds
pub async fn load_draft(
    storage: &dyn DraftStorage,
    storage_key: &str,
    build_id: &str,
) -> Result<LoadedDraft, StorageError> {
    let snapshot = match storage.load(storage_key).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            tracing::debug!(storage_key, "No stored draft found");
            return Ok(LoadedDraft::Empty);
        }
        Err(StorageError::Serialization(e)) => {
            tracing::warn!(storage_key, error = %e, "Stored draft is unreadable, starting empty");
            return Ok(LoadedDraft::Discarded {
                reason: format!("unreadable snapshot: {}", e),
            });
        }
        Err(e) => return Err(e),
    };

    if snapshot.build_id != build_id {
        tracing::warn!(
            storage_key,
            stored_build = %snapshot.build_id,
            current_build = %build_id,
            "Stored draft was written by another build, starting empty"
        );
        return Ok(LoadedDraft::Discarded {
            reason: format!("build mismatch: {} != {}", snapshot.build_id, build_id),
        });
    }

    tracing::info!(
        storage_key,
        entries = snapshot.draft.len(),
        saved_at = %snapshot.saved_at,
        "Restored stored draft"
    );
    Ok(LoadedDraft::Restored(snapshot.draft))
}
