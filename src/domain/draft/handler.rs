use std::sync::Arc;
use std::time::Instant;
use anyhow::{bail, Context, Result};

use crate::config::DraftConfig;
use crate::domain::catalog::MenuCatalog;
use crate::metrics::DraftMetrics;
use crate::persistence::{DraftPersister, PersisterHandle};
use crate::storage::{load_draft, DraftStorage, LoadedDraft, StorageError, StoredDraft};

use super::actions::DraftAction;
use super::errors::DraftError;
use super::instance_key::ensure_key_safe;
use super::reducer::reduce_with_outcome;
use super::value_objects::{OrderDraft, OrderSubmission};

// ============================================================================
// Draft Handler
// ============================================================================
//
// Orchestrates: Action → validation → Reducer → Storage
//
// Holds the current draft for one point-of-sale. Saves happen after every
// accepted action, either directly or through a debounced persister.
//
// ============================================================================

enum Persist {
    Immediate,
    Debounced(PersisterHandle),
}

pub struct DraftHandler {
    storage: Arc<dyn DraftStorage>,
    config: DraftConfig,
    draft: OrderDraft,
    persist: Persist,
    metrics: Option<Arc<DraftMetrics>>,
    discarded_on_open: bool,
}

impl DraftHandler {
    /// Load the stored draft for `config.storage_key`, or start empty
    pub async fn open(storage: Arc<dyn DraftStorage>, config: DraftConfig) -> Result<Self, StorageError> {
        let loaded = load_draft(storage.as_ref(), &config.storage_key, &config.build_id).await?;
        let discarded = matches!(loaded, LoadedDraft::Discarded { .. });

        let handler = Self {
            storage,
            config,
            draft: loaded.into_draft(),
            persist: Persist::Immediate,
            metrics: None,
            discarded_on_open: discarded,
        };

        if discarded {
            // Drop the unusable snapshot so the next load is clean; the first
            // save overwrites it anyway
            if let Err(e) = handler.storage.clear(&handler.config.storage_key).await {
                tracing::warn!(
                    storage_key = %handler.config.storage_key,
                    error = %e,
                    "Failed to clear discarded draft snapshot"
                );
            }
        }

        Ok(handler)
    }

    /// Record metrics from here on, including saves made by a persister
    /// started earlier with [`DraftHandler::debounced`]
    pub fn with_metrics(mut self, metrics: Arc<DraftMetrics>) -> Self {
        metrics.update_draft_size(self.draft.len(), self.draft.total_qty());
        if self.discarded_on_open {
            metrics.record_discarded();
        }
        if let Persist::Debounced(handle) = &self.persist {
            handle.attach_metrics(metrics.clone());
        }
        self.metrics = Some(metrics);
        self
    }

    /// Route saves through a debounced background persister
    pub fn debounced(mut self) -> Self {
        let mut persister = DraftPersister::new(self.storage.clone(), &self.config);
        if let Some(metrics) = &self.metrics {
            persister = persister.with_metrics(metrics.clone());
        }
        self.persist = Persist::Debounced(persister.spawn(self.draft.clone()));
        self
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    /// Apply an action and persist the result.
    ///
    /// Only commit payloads with ids that would make an ambiguous key are
    /// rejected; every other action is applied. Persistence failures are
    /// logged and do not fail the dispatch.
    pub async fn dispatch(&mut self, action: DraftAction) -> Result<&OrderDraft, DraftError> {
        if let Err(e) = validate_action(&action) {
            tracing::warn!(action = action.name(), error = %e, "Rejected draft action");
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected(action.name());
            }
            return Err(e);
        }

        let outcome = reduce_with_outcome(&self.draft, &action);

        tracing::debug!(
            action = action.name(),
            entries = outcome.draft.len(),
            merged_into = outcome.merged_into.as_ref().map(|k| k.as_str()),
            pruned = outcome.pruned.len(),
            "Applied draft action"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_action(action.name(), outcome.merged_into.is_some(), outcome.pruned.len());
            metrics.update_draft_size(outcome.draft.len(), outcome.draft.total_qty());
        }

        self.draft = outcome.draft;
        self.persist_current().await;

        Ok(&self.draft)
    }

    /// Prune, hand back the order payload, then reset and clear storage.
    ///
    /// If storage cannot be cleared the draft is left untouched and an error
    /// is returned, so the order can be submitted again.
    pub async fn submit(&mut self, catalog: Option<&MenuCatalog>) -> Result<OrderSubmission> {
        let prune = DraftAction::PruneInvalid {
            catalog: catalog.cloned(),
        };
        let outcome = reduce_with_outcome(&self.draft, &prune);

        if !outcome.pruned.is_empty() {
            tracing::info!(pruned = outcome.pruned.len(), "Pruned invalid entries before submission");
        }

        if outcome.draft.is_empty() {
            self.draft = outcome.draft;
            self.persist_current().await;
            bail!("Cannot submit an empty draft");
        }

        let submission = outcome.draft.submission();
        tracing::info!(
            storage_key = %self.config.storage_key,
            entries = submission.items.len(),
            items = outcome.draft.total_qty(),
            "Submitting draft"
        );

        self.reset_and_clear()
            .await
            .context("Failed to clear submitted draft")?;

        if let Some(metrics) = &self.metrics {
            metrics.record_submitted();
        }

        Ok(submission)
    }

    /// Abandon the draft
    pub async fn cancel(&mut self) -> Result<()> {
        tracing::info!(storage_key = %self.config.storage_key, "Cancelling draft");
        self.reset_and_clear()
            .await
            .context("Failed to clear cancelled draft")
    }

    /// Stop the persister, flushing any pending save
    pub async fn close(self) -> Result<()> {
        if let Persist::Debounced(handle) = self.persist {
            handle.shutdown().await?;
        }
        Ok(())
    }

    /// Clear storage, then reset the in-memory draft. On failure the draft
    /// is kept and queued for saving again.
    async fn reset_and_clear(&mut self) -> Result<(), StorageError> {
        // Replace any pending save first so the persister cannot write the
        // old draft back after the clear below
        if let Persist::Debounced(handle) = &self.persist {
            handle.clear();
        }

        if let Err(e) = self.storage.clear(&self.config.storage_key).await {
            if let Persist::Debounced(handle) = &self.persist {
                handle.push(self.draft.clone());
            }
            return Err(e);
        }

        self.draft = OrderDraft::new();
        if let Some(metrics) = &self.metrics {
            metrics.update_draft_size(0, 0);
        }
        Ok(())
    }

    async fn persist_current(&self) {
        match &self.persist {
            Persist::Debounced(handle) => handle.push(self.draft.clone()),
            Persist::Immediate => {
                let snapshot = StoredDraft::new(self.config.build_id.clone(), self.draft.clone());
                let started = Instant::now();
                let result = self.storage.save(&self.config.storage_key, &snapshot).await;

                if let Some(metrics) = &self.metrics {
                    metrics.record_persist(result.is_ok(), started.elapsed().as_secs_f64());
                }
                if let Err(e) = result {
                    tracing::error!(
                        storage_key = %self.config.storage_key,
                        error = %e,
                        "Failed to persist draft"
                    );
                }
            }
        }
    }
}

/// Commit payloads must produce unambiguous keys
fn validate_action(action: &DraftAction) -> Result<(), DraftError> {
    let Some(instance) = action.committed_instance() else {
        return Ok(());
    };

    if instance.menu_id.as_str().trim().is_empty() {
        return Err(DraftError::BlankMenuId);
    }
    ensure_key_safe(instance.menu_id.as_str())?;
    for addon in &instance.addon_ids {
        ensure_key_safe(addon.as_str())?;
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
