use serde::{Deserialize, Serialize};

use crate::domain::catalog::MenuCatalog;
use super::instance_key::InstanceKey;
use super::value_objects::OrderInstance;

// ============================================================================
// Draft Actions - UI intents applied to the draft
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DraftAction {
    /// Drop every entry
    Reset,

    /// Finish editing an existing entry whose addons may have changed
    CommitPendingInstance {
        pending_key: InstanceKey,
        pending_instance: OrderInstance,
    },

    /// Add more of a selection from the menu
    CommitNewInstance {
        new_instance: OrderInstance,
    },

    /// Remove deleted entries and, with a catalog, entries for unorderable menus
    PruneInvalid {
        #[serde(default)]
        catalog: Option<MenuCatalog>,
    },

    SetInstanceNotes {
        key: InstanceKey,
        #[serde(default)]
        notes: Option<String>,
    },

    SetInstanceQty {
        key: InstanceKey,
        qty: i32,
    },

    /// Any tag this build does not know; applied as a no-op
    #[serde(other)]
    Unknown,
}

impl DraftAction {
    pub fn name(&self) -> &'static str {
        match self {
            DraftAction::Reset => "Reset",
            DraftAction::CommitPendingInstance { .. } => "CommitPendingInstance",
            DraftAction::CommitNewInstance { .. } => "CommitNewInstance",
            DraftAction::PruneInvalid { .. } => "PruneInvalid",
            DraftAction::SetInstanceNotes { .. } => "SetInstanceNotes",
            DraftAction::SetInstanceQty { .. } => "SetInstanceQty",
            DraftAction::Unknown => "Unknown",
        }
    }

    /// Instance payload carried by commit actions
    pub fn committed_instance(&self) -> Option<&OrderInstance> {
        match self {
            DraftAction::CommitPendingInstance { pending_instance, .. } => Some(pending_instance),
            DraftAction::CommitNewInstance { new_instance } => Some(new_instance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action = DraftAction::SetInstanceQty {
            key: InstanceKey::from("m-a"),
            qty: 2,
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SetInstanceQty", "key": "m-a", "qty": 2}));
    }

    #[test]
    fn test_commit_new_instance_deserializes() {
        let action: DraftAction = serde_json::from_str(
            r#"{"type":"CommitNewInstance","new_instance":{"menu_id":"m","addon_ids":["b","a"],"qty":1}}"#,
        )
        .unwrap();

        let instance = action.committed_instance().unwrap();
        assert_eq!(instance.key().as_str(), "m-a-b");
        assert_eq!(action.name(), "CommitNewInstance");
    }

    #[test]
    fn test_prune_catalog_is_optional() {
        let action: DraftAction = serde_json::from_str(r#"{"type":"PruneInvalid"}"#).unwrap();
        assert_eq!(action, DraftAction::PruneInvalid { catalog: None });
    }

    #[test]
    fn test_unknown_tag_maps_to_unknown() {
        let action: DraftAction =
            serde_json::from_str(r#"{"type":"ApplyCoupon","code":"SAVE10"}"#).unwrap();
        assert_eq!(action, DraftAction::Unknown);
    }
}
