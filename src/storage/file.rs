use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DraftStorage, StorageError, StoredDraft};

/// One JSON file per storage key inside a directory
pub struct FileDraftStorage {
    dir: PathBuf,
}

impl FileDraftStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage keys may carry arbitrary characters; only `[A-Za-z0-9_-]` reach the file name
    fn path_for(&self, storage_key: &str) -> PathBuf {
        let file_stem: String = storage_key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }
}

#[async_trait]
impl DraftStorage for FileDraftStorage {
    async fn load(&self, storage_key: &str) -> Result<Option<StoredDraft>, StorageError> {
        let path = self.path_for(storage_key);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(StoredDraft::from_json(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, storage_key: &str, snapshot: &StoredDraft) -> Result<(), StorageError> {
        let path = self.path_for(storage_key);
        let tmp = path.with_extension("json.tmp");
        let json = snapshot.to_json()?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            path = %path.display(),
            entries = snapshot.draft.len(),
            "Wrote draft snapshot"
        );
        Ok(())
    }

    async fn clear(&self, storage_key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(storage_key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
