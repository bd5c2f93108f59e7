use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::DraftError;
use super::value_objects::{AddonId, MenuId};

// ============================================================================
// Instance Identity
// ============================================================================
//
// Key layout: `<menu_id>-<addon_1>-<addon_2>-...` with addons sorted and
// deduplicated, so the key depends only on the addon *set*.
//
// The delimiter is a plain hyphen. Keys stay reversible only while ids are
// hyphen-free; `ensure_key_safe` enforces that at the dispatch boundary.
//
// ============================================================================

pub const KEY_DELIMITER: char = '-';

/// Identity of one (menu item, addon set) combination
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceKey(String);

impl InstanceKey {
    pub fn create<'a, I>(menu_id: &MenuId, addon_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a AddonId>,
    {
        create_instance_key(menu_id.as_str(), addon_ids.into_iter().map(AddonId::as_str))
    }

    pub fn parse(&self) -> ParsedKey {
        parse_instance_key(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for InstanceKey {
    /// Wraps a raw string as-is; no normalization happens
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Components recovered from an [`InstanceKey`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub menu_id: MenuId,
    pub addon_ids: Vec<AddonId>,
}

/// Derive the order-independent key for a menu item and its addons.
///
/// Blank addon ids are dropped, the rest are sorted and deduplicated.
pub fn create_instance_key<M, I, A>(menu_id: M, addon_ids: I) -> InstanceKey
where
    M: AsRef<str>,
    I: IntoIterator<Item = A>,
    A: AsRef<str>,
{
    let mut addons: Vec<String> = addon_ids
        .into_iter()
        .map(|addon| addon.as_ref().to_string())
        .filter(|addon| !addon.trim().is_empty())
        .collect();
    addons.sort();
    addons.dedup();

    let mut key = menu_id.as_ref().to_string();
    for addon in &addons {
        key.push(KEY_DELIMITER);
        key.push_str(addon);
    }

    InstanceKey(key)
}

/// Best-effort split of a key back into menu id and addon ids.
///
/// Never fails: the first segment is the menu id and every non-empty segment
/// after it is an addon id.
pub fn parse_instance_key(key: &str) -> ParsedKey {
    let mut segments = key.split(KEY_DELIMITER);
    let menu_id = MenuId::new(segments.next().unwrap_or_default());
    let addon_ids = segments
        .filter(|segment| !segment.is_empty())
        .map(AddonId::new)
        .collect();

    ParsedKey { menu_id, addon_ids }
}

/// Reject ids that would make a key ambiguous
pub fn ensure_key_safe(id: &str) -> Result<(), DraftError> {
    if id.contains(KEY_DELIMITER) {
        return Err(DraftError::AmbiguousId(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
