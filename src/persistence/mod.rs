use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant as TokioInstant};

use crate::config::DraftConfig;
use crate::domain::draft::OrderDraft;
use crate::metrics::DraftMetrics;
use crate::storage::{DraftStorage, StorageError, StoredDraft};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Debounced Draft Persister
// ============================================================================
//
// Background task that writes the latest pending change once changes stop
// arriving for `persist_debounce`. Only the newest change is kept; anything
// pushed during the quiet period is overwritten before it reaches storage.
//
// A change is either a draft to save or a request to clear the stored
// snapshot. The task owns its shutdown signal. `shutdown()` flushes any
// unwritten change before the task exits.
//
// ============================================================================

/// The next write the persister will perform
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Save(OrderDraft),
    Clear,
}

type MetricsSlot = Arc<OnceLock<Arc<DraftMetrics>>>;

pub struct PersisterHandle {
    pending: watch::Sender<PendingWrite>,
    shutdown: watch::Sender<bool>,
    metrics: MetricsSlot,
    task: JoinHandle<()>,
}

impl PersisterHandle {
    /// Queue `draft` as the next value to save, replacing any unwritten change
    pub fn push(&self, draft: OrderDraft) {
        self.pending.send_replace(PendingWrite::Save(draft));
    }

    /// Queue removal of the stored snapshot, replacing any unwritten change
    pub fn clear(&self) {
        self.pending.send_replace(PendingWrite::Clear);
    }

    /// Start recording persist metrics; ignored if metrics are already set
    pub fn attach_metrics(&self, metrics: Arc<DraftMetrics>) {
        let _ = self.metrics.set(metrics);
    }

    /// Flush pending changes and stop the task
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        self.task.await?;
        Ok(())
    }
}

pub struct DraftPersister {
    storage: Arc<dyn DraftStorage>,
    storage_key: String,
    build_id: String,
    debounce: Duration,
    retry: RetryConfig,
    metrics: MetricsSlot,
}

impl DraftPersister {
    pub fn new(storage: Arc<dyn DraftStorage>, config: &DraftConfig) -> Self {
        Self {
            storage,
            storage_key: config.storage_key.clone(),
            build_id: config.build_id.clone(),
            debounce: config.persist_debounce,
            retry: config.retry.clone(),
            metrics: Arc::new(OnceLock::new()),
        }
    }

    pub fn with_metrics(self, metrics: Arc<DraftMetrics>) -> Self {
        let _ = self.metrics.set(metrics);
        self
    }

    /// Start the background task; `initial` is treated as already saved
    pub fn spawn(self, initial: OrderDraft) -> PersisterHandle {
        let (pending_tx, pending_rx) = watch::channel(PendingWrite::Save(initial));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = self.metrics.clone();

        let task = tokio::spawn(self.run(pending_rx, shutdown_rx));

        PersisterHandle {
            pending: pending_tx,
            shutdown: shutdown_tx,
            metrics,
            task,
        }
    }

    async fn run(
        self,
        mut pending: watch::Receiver<PendingWrite>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::debug!(
            storage_key = %self.storage_key,
            debounce_ms = self.debounce.as_millis() as u64,
            "Draft persister started"
        );

        let mut dirty = false;
        let mut deadline = TokioInstant::now();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                changed = pending.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    dirty = true;
                    deadline = TokioInstant::now() + self.debounce;
                }

                _ = sleep_until(deadline), if dirty => {
                    self.flush(&mut pending).await;
                    dirty = false;
                }
            }
        }

        if dirty || pending.has_changed().unwrap_or(false) {
            self.flush(&mut pending).await;
        }

        tracing::debug!(storage_key = %self.storage_key, "Draft persister stopped");
    }

    async fn flush(&self, pending: &mut watch::Receiver<PendingWrite>) {
        let write = pending.borrow_and_update().clone();
        let started = Instant::now();

        let result = match write {
            PendingWrite::Save(draft) => {
                let entries = draft.len();
                self.save(StoredDraft::new(self.build_id.clone(), draft))
                    .await
                    .map(|()| entries)
            }
            PendingWrite::Clear => self.clear().await.map(|()| 0),
        };

        let elapsed = started.elapsed().as_secs_f64();
        if let Some(metrics) = self.metrics.get() {
            metrics.record_persist(result.is_ok(), elapsed);
        }

        match result {
            Ok(entries) => tracing::debug!(
                storage_key = %self.storage_key,
                entries,
                "Persisted draft"
            ),
            Err(e) => tracing::error!(
                storage_key = %self.storage_key,
                error = %e,
                "Failed to persist draft"
            ),
        }
    }

    async fn save(&self, snapshot: StoredDraft) -> Result<(), StorageError> {
        retry_on_transient(&self.retry, |attempt| {
            let snapshot = &snapshot;
            async move {
                tracing::debug!(attempt, "Saving draft snapshot");
                self.storage.save(&self.storage_key, snapshot).await
            }
        })
        .await
        .into_result()
    }

    async fn clear(&self) -> Result<(), StorageError> {
        retry_on_transient(&self.retry, |attempt| async move {
            tracing::debug!(attempt, "Clearing draft snapshot");
            self.storage.clear(&self.storage_key).await
        })
        .await
        .into_result()
    }
}
