use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::instance_key::InstanceKey;

// ============================================================================
// Draft Value Objects
// ============================================================================

/// Menu item identifier, issued by the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(pub String);

impl MenuId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MenuId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Addon identifier, issued by the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonId(pub String);

impl AddonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AddonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AddonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One line item: a menu item, a set of addons, a quantity and an optional note.
///
/// A `qty` of zero or less marks the instance as logically deleted; it stays
/// in the draft until the next prune.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInstance {
    pub menu_id: MenuId,
    #[serde(default, deserialize_with = "non_blank_addons")]
    pub addon_ids: BTreeSet<AddonId>,
    pub qty: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderInstance {
    /// Build an instance, dropping blank addon ids
    pub fn new<I, A>(menu_id: impl Into<MenuId>, addon_ids: I, qty: i32) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AddonId>,
    {
        Self {
            menu_id: menu_id.into(),
            addon_ids: addon_ids
                .into_iter()
                .map(Into::into)
                .filter(|addon: &AddonId| !addon.is_blank())
                .collect(),
            qty,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Addon ids that take part in the key; blanks set directly on the field are left out
    pub(crate) fn keyed_addon_ids(&self) -> BTreeSet<AddonId> {
        self.addon_ids
            .iter()
            .filter(|addon| !addon.is_blank())
            .cloned()
            .collect()
    }

    /// Identity key of this instance's (menu, addon set) combination
    pub fn key(&self) -> InstanceKey {
        InstanceKey::create(&self.menu_id, &self.addon_ids)
    }

    /// Notes as stored, or `None` when blank after trimming
    pub fn non_blank_notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .filter(|notes| !notes.trim().is_empty())
    }
}

fn non_blank_addons<'de, D>(deserializer: D) -> Result<BTreeSet<AddonId>, D::Error>
where
    D: Deserializer<'de>,
{
    let addons = Vec::<AddonId>::deserialize(deserializer)?;
    Ok(addons.into_iter().filter(|addon| !addon.is_blank()).collect())
}

/// The in-progress cart, keyed by instance identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderDraft {
    entries: BTreeMap<InstanceKey, OrderInstance>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &InstanceKey) -> Option<&OrderInstance> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &InstanceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, InstanceKey, OrderInstance> {
        self.entries.iter()
    }

    /// Sum of quantities across live (qty > 0) entries
    pub fn total_qty(&self) -> i64 {
        self.entries
            .values()
            .filter(|instance| instance.qty > 0)
            .map(|instance| i64::from(instance.qty))
            .sum()
    }

    /// Payload handed to the order-acceptance side
    pub fn submission(&self) -> OrderSubmission {
        OrderSubmission {
            items: self.entries.clone(),
        }
    }

    pub(crate) fn insert(&mut self, key: InstanceKey, instance: OrderInstance) {
        self.entries.insert(key, instance);
    }

    pub(crate) fn remove(&mut self, key: &InstanceKey) -> Option<OrderInstance> {
        self.entries.remove(key)
    }

    pub(crate) fn get_mut(&mut self, key: &InstanceKey) -> Option<&mut OrderInstance> {
        self.entries.get_mut(key)
    }

    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&InstanceKey, &mut OrderInstance) -> bool,
    {
        self.entries.retain(keep);
    }
}

impl FromIterator<OrderInstance> for OrderDraft {
    /// Keys each instance by its identity; later duplicates overwrite earlier ones
    fn from_iter<T: IntoIterator<Item = OrderInstance>>(iter: T) -> Self {
        let entries = iter
            .into_iter()
            .map(|instance| (instance.key(), instance))
            .collect();
        Self { entries }
    }
}

/// Finalized order payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub items: BTreeMap<InstanceKey, OrderInstance>,
}

// ============================================================================
// Unit Tests
// ============================================================================
