use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::utils::RetryConfig;

// ============================================================================
// Draft Configuration
// ============================================================================
//
// Environment variables (all optional):
// - KIOSK_STORAGE_KEY          storage key, one per point-of-sale
// - KIOSK_BUILD_ID             build tag written into stored drafts
// - KIOSK_STORAGE_DIR          directory for file-backed storage
// - KIOSK_PERSIST_DEBOUNCE_MS  quiet period before a debounced save
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct DraftConfig {
    pub storage_key: String,
    /// Stored drafts from any other build are ignored on load
    pub build_id: String,
    pub storage_dir: PathBuf,
    pub persist_debounce: Duration,
    pub retry: RetryConfig,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            storage_key: "kiosk-draft".to_string(),
            build_id: env!("CARGO_PKG_VERSION").to_string(),
            storage_dir: PathBuf::from(".kiosk"),
            persist_debounce: Duration::from_millis(300),
            retry: RetryConfig::default(),
        }
    }
}

impl DraftConfig {
    /// Draft scoped to one point-of-sale identity
    pub fn for_pos(pos_id: &str) -> Self {
        Self {
            storage_key: format!("kiosk-draft-{}", pos_id),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_key = var("KIOSK_STORAGE_KEY").unwrap_or(defaults.storage_key);
        let build_id = var("KIOSK_BUILD_ID").unwrap_or(defaults.build_id);
        let storage_dir = var("KIOSK_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);
        let debounce_ms = parse_or(
            "KIOSK_PERSIST_DEBOUNCE_MS",
            var("KIOSK_PERSIST_DEBOUNCE_MS"),
            defaults.persist_debounce.as_millis() as u64,
        );

        info!(storage_key = %storage_key, build_id = %build_id, "Loaded draft config");

        Self {
            storage_key,
            build_id,
            storage_dir,
            persist_debounce: Duration::from_millis(debounce_ms),
            retry: defaults.retry,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default {default}");
            default
        }),
        None => default,
    }
}
