// ============================================================================
// Kiosk Draft - order-draft reconciliation for a point-of-sale kiosk
// ============================================================================
//
// - domain::draft   instance identity, actions, the pure reducer, handler
// - domain::catalog read-only menu view used when pruning
// - storage         versioned draft snapshots (memory and file backends)
// - persistence     debounced background saves
// - metrics         Prometheus metrics for the draft lifecycle
// - config          defaults plus environment overrides
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod metrics;
pub mod persistence;
pub mod storage;
pub mod utils;

pub use config::DraftConfig;
pub use domain::catalog::{MenuCatalog, MenuEntry};
pub use domain::draft::{
    create_instance_key, parse_instance_key, reduce, reduce_with_outcome, AddonId, DraftAction,
    DraftError, DraftHandler, InstanceKey, MenuId, OrderDraft, OrderInstance, OrderSubmission,
};
