use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

// ============================================================================
// Metrics - Prometheus metrics for the draft lifecycle
// ============================================================================
//
// - Actions applied, by action name
// - Merges and prunes performed by the reducer
// - Current draft size (entries and item count)
// - Persistence outcomes and latency
// - Stored drafts discarded on load
//
// The registry is owned here; callers scrape it through `registry()`.
// ============================================================================

pub struct DraftMetrics {
    registry: Registry,

    pub actions_applied: IntCounterVec,
    pub actions_rejected: IntCounterVec,
    pub instances_merged: IntCounter,
    pub instances_pruned: IntCounter,

    pub draft_entries: IntGauge,
    pub draft_items: IntGauge,

    pub persist_total: IntCounterVec,
    pub persist_duration: HistogramVec,
    pub drafts_discarded: IntCounter,
    pub orders_submitted: IntCounter,
}

impl DraftMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let actions_applied = IntCounterVec::new(
            Opts::new("draft_actions_applied_total", "Draft actions applied by the reducer"),
            &["action"],
        )?;
        registry.register(Box::new(actions_applied.clone()))?;

        let actions_rejected = IntCounterVec::new(
            Opts::new("draft_actions_rejected_total", "Draft actions rejected before reduction"),
            &["action"],
        )?;
        registry.register(Box::new(actions_rejected.clone()))?;

        let instances_merged = IntCounter::new(
            "draft_instances_merged_total",
            "Edited instances merged into an identical existing entry",
        )?;
        registry.register(Box::new(instances_merged.clone()))?;

        let instances_pruned = IntCounter::new(
            "draft_instances_pruned_total",
            "Entries removed as deleted or no longer orderable",
        )?;
        registry.register(Box::new(instances_pruned.clone()))?;

        let draft_entries = IntGauge::new("draft_entries", "Distinct entries in the current draft")?;
        registry.register(Box::new(draft_entries.clone()))?;

        let draft_items = IntGauge::new("draft_items", "Total quantity in the current draft")?;
        registry.register(Box::new(draft_items.clone()))?;

        let persist_total = IntCounterVec::new(
            Opts::new("draft_persist_total", "Draft persistence attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(persist_total.clone()))?;

        let persist_duration = HistogramVec::new(
            HistogramOpts::new("draft_persist_duration_seconds", "Draft persistence duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(persist_duration.clone()))?;

        let drafts_discarded = IntCounter::new(
            "draft_snapshots_discarded_total",
            "Stored drafts ignored on load (other build or unreadable)",
        )?;
        registry.register(Box::new(drafts_discarded.clone()))?;

        let orders_submitted = IntCounter::new("draft_orders_submitted_total", "Drafts submitted as orders")?;
        registry.register(Box::new(orders_submitted.clone()))?;

        Ok(Self {
            registry,
            actions_applied,
            actions_rejected,
            instances_merged,
            instances_pruned,
            draft_entries,
            draft_items,
            persist_total,
            persist_duration,
            drafts_discarded,
            orders_submitted,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_action(&self, action: &str, merged: bool, pruned: usize) {
        self.actions_applied.with_label_values(&[action]).inc();
        if merged {
            self.instances_merged.inc();
        }
        self.instances_pruned.inc_by(pruned as u64);
    }

    pub fn record_rejected(&self, action: &str) {
        self.actions_rejected.with_label_values(&[action]).inc();
    }

    pub fn update_draft_size(&self, entries: usize, items: i64) {
        self.draft_entries.set(entries as i64);
        self.draft_items.set(items);
    }

    pub fn record_persist(&self, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "failure" };
        self.persist_total.with_label_values(&[outcome]).inc();
        self.persist_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    pub fn record_discarded(&self) {
        self.drafts_discarded.inc();
    }

    pub fn record_submitted(&self) {
        self.orders_submitted.inc();
    }
}
