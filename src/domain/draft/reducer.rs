use crate::domain::catalog::MenuCatalog;
use super::actions::DraftAction;
use super::instance_key::InstanceKey;
use super::value_objects::{OrderDraft, OrderInstance};

// ============================================================================
// Draft Reducer - pure state transitions over the draft
// ============================================================================
//
// Every transition reads the current draft by reference and builds a fresh
// one. The input is never modified, so a previously rendered draft cannot
// change under its holder.
//
// ============================================================================

/// Result of one transition, with bookkeeping for logging and metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceOutcome {
    pub draft: OrderDraft,
    /// Set when a pending edit collided with a live entry and was merged into it
    pub merged_into: Option<InstanceKey>,
    pub pruned: Vec<InstanceKey>,
}

impl ReduceOutcome {
    fn unchanged(draft: OrderDraft) -> Self {
        Self {
            draft,
            merged_into: None,
            pruned: Vec::new(),
        }
    }
}

/// Apply `action` to `draft`, returning the next draft
pub fn reduce(draft: &OrderDraft, action: &DraftAction) -> OrderDraft {
    reduce_with_outcome(draft, action).draft
}

pub fn reduce_with_outcome(draft: &OrderDraft, action: &DraftAction) -> ReduceOutcome {
    match action {
        DraftAction::Reset => ReduceOutcome::unchanged(OrderDraft::new()),

        DraftAction::CommitPendingInstance { pending_key, pending_instance } => {
            commit_pending(draft, pending_key, pending_instance)
        }

        DraftAction::CommitNewInstance { new_instance } => commit_new(draft, new_instance),

        DraftAction::PruneInvalid { catalog } => {
            let mut next = draft.clone();
            let pruned = prune_in_place(&mut next, catalog.as_ref());
            ReduceOutcome {
                draft: next,
                merged_into: None,
                pruned,
            }
        }

        DraftAction::SetInstanceNotes { key, notes } => {
            let mut next = draft.clone();
            if let Some(entry) = next.get_mut(key) {
                entry.notes = notes.clone();
            }
            ReduceOutcome::unchanged(next)
        }

        DraftAction::SetInstanceQty { key, qty } => {
            let parsed = key.parse();
            let notes = draft.get(key).and_then(|entry| entry.notes.clone());
            let mut next = draft.clone();
            next.insert(
                key.clone(),
                OrderInstance {
                    menu_id: parsed.menu_id,
                    addon_ids: parsed.addon_ids.into_iter().collect(),
                    qty: *qty,
                    notes,
                },
            );
            ReduceOutcome::unchanged(next)
        }

        DraftAction::Unknown => ReduceOutcome::unchanged(draft.clone()),
    }
}

fn commit_pending(
    draft: &OrderDraft,
    pending_key: &InstanceKey,
    pending: &OrderInstance,
) -> ReduceOutcome {
    let target_key = pending.key();
    let moved = target_key != *pending_key;

    // An edit that carries no note keeps the note of the entry being edited
    let pending_notes = pending
        .notes
        .clone()
        .or_else(|| draft.get(pending_key).and_then(|entry| entry.notes.clone()));

    let collision = if moved {
        draft.get(&target_key).filter(|existing| existing.qty > 0)
    } else {
        None
    };

    let (qty, notes) = match collision {
        Some(existing) => {
            let notes = match pending_notes.as_deref() {
                Some(notes) if !notes.trim().is_empty() => pending_notes.clone(),
                _ => existing.notes.clone(),
            };
            (existing.qty.saturating_add(pending.qty), notes)
        }
        None => (pending.qty, pending_notes),
    };

    let mut next = draft.clone();
    next.insert(
        target_key.clone(),
        OrderInstance {
            menu_id: pending.menu_id.clone(),
            addon_ids: pending.keyed_addon_ids(),
            qty,
            notes,
        },
    );
    if moved {
        next.remove(pending_key);
    }

    let pruned = prune_in_place(&mut next, None);
    ReduceOutcome {
        draft: next,
        merged_into: collision.map(|_| target_key),
        pruned,
    }
}

fn commit_new(draft: &OrderDraft, new_instance: &OrderInstance) -> ReduceOutcome {
    let target_key = new_instance.key();
    let previous_qty = draft.get(&target_key).map_or(0, |existing| existing.qty);

    let mut next = draft.clone();
    next.insert(
        target_key,
        OrderInstance {
            menu_id: new_instance.menu_id.clone(),
            addon_ids: new_instance.keyed_addon_ids(),
            qty: previous_qty.saturating_add(new_instance.qty),
            notes: new_instance.notes.clone(),
        },
    );

    let pruned = prune_in_place(&mut next, None);
    ReduceOutcome {
        draft: next,
        merged_into: None,
        pruned,
    }
}

/// Drop entries with `qty <= 0` and, given a catalog, entries whose menu is not orderable.
/// Operates on a draft the caller already owns.
fn prune_in_place(draft: &mut OrderDraft, catalog: Option<&MenuCatalog>) -> Vec<InstanceKey> {
    let mut pruned = Vec::new();
    draft.retain(|key, instance| {
        let keep = instance.qty > 0
            && catalog.map_or(true, |catalog| catalog.is_orderable(&instance.menu_id));
        if !keep {
            pruned.push(key.clone());
        }
        keep
    });
    pruned
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::MenuEntry;
    use crate::domain::draft::instance_key::create_instance_key;
    use crate::domain::draft::value_objects::{AddonId, MenuId};

    fn no_addons() -> Vec<&'static str> {
        Vec::new()
    }

    fn draft_of(instances: Vec<OrderInstance>) -> OrderDraft {
        instances.into_iter().collect()
    }

    #[test]
    fn test_reset_clears_everything() {
        let draft = draft_of(vec![OrderInstance::new("x", ["a"], 2)]);
        assert!(reduce(&draft, &DraftAction::Reset).is_empty());
    }

    #[test]
    fn test_commit_new_twice_accumulates() {
        let action = DraftAction::CommitNewInstance {
            new_instance: OrderInstance::new("X", no_addons(), 2),
        };

        let once = reduce(&OrderDraft::new(), &action);
        let twice = reduce(&once, &action);

        assert_eq!(twice.len(), 1);
        let key = create_instance_key("X", no_addons());
        assert_eq!(twice.get(&key).unwrap().qty, 4);
    }

    #[test]
    fn test_commit_new_replaces_notes_but_adds_qty() {
        let draft = draft_of(vec![OrderInstance::new("X", ["a"], 1).with_notes("old")]);
        let next = reduce(
            &draft,
            &DraftAction::CommitNewInstance {
                new_instance: OrderInstance::new("X", ["a"], 2).with_notes("new"),
            },
        );

        let entry = next.get(&create_instance_key("X", ["a"])).unwrap();
        assert_eq!(entry.qty, 3);
        assert_eq!(entry.notes.as_deref(), Some("new"));
    }

    #[test]
    fn test_commit_new_with_zero_qty_is_pruned() {
        let next = reduce(
            &OrderDraft::new(),
            &DraftAction::CommitNewInstance {
                new_instance: OrderInstance::new("X", no_addons(), 0),
            },
        );
        assert!(next.is_empty());
    }

    #[test]
    fn test_commit_pending_merges_on_collision() {
        let k1 = create_instance_key("X", ["A"]);
        let k2 = create_instance_key("X", ["B"]);
        let draft = draft_of(vec![
            OrderInstance::new("X", ["A"], 1).with_notes("spicy"),
            OrderInstance::new("X", ["B"], 3).with_notes(""),
        ]);

        let outcome = reduce_with_outcome(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: k1.clone(),
                pending_instance: OrderInstance::new("X", ["B"], 1),
            },
        );

        assert_eq!(outcome.draft.len(), 1);
        assert!(!outcome.draft.contains_key(&k1));
        let merged = outcome.draft.get(&k2).unwrap();
        assert_eq!(merged.qty, 4);
        assert_eq!(merged.notes.as_deref(), Some("spicy"));
        assert_eq!(outcome.merged_into, Some(k2));
    }

    #[test]
    fn test_commit_pending_merge_keeps_existing_note_over_blank() {
        let k1 = create_instance_key("X", ["A"]);
        let k2 = create_instance_key("X", ["B"]);
        let draft = draft_of(vec![
            OrderInstance::new("X", ["A"], 2),
            OrderInstance::new("X", ["B"], 1).with_notes("extra sauce"),
        ]);

        let next = reduce(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: k1,
                pending_instance: OrderInstance::new("X", ["B"], 2).with_notes("   "),
            },
        );

        let merged = next.get(&k2).unwrap();
        assert_eq!(merged.qty, 3);
        assert_eq!(merged.notes.as_deref(), Some("extra sauce"));
    }

    #[test]
    fn test_commit_pending_moves_without_collision() {
        let k1 = create_instance_key("X", ["A"]);
        let k2 = create_instance_key("X", ["B"]);
        let draft = draft_of(vec![OrderInstance::new("X", ["A"], 2).with_notes("warm")]);

        let outcome = reduce_with_outcome(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: k1.clone(),
                pending_instance: OrderInstance::new("X", ["B"], 5),
            },
        );

        assert!(!outcome.draft.contains_key(&k1));
        let moved = outcome.draft.get(&k2).unwrap();
        assert_eq!(moved.qty, 5);
        assert_eq!(moved.notes.as_deref(), Some("warm"));
        assert_eq!(outcome.merged_into, None);
    }

    #[test]
    fn test_commit_pending_does_not_merge_into_deleted_entry() {
        let k1 = create_instance_key("X", ["A"]);
        let k2 = create_instance_key("X", ["B"]);
        let draft = draft_of(vec![
            OrderInstance::new("X", ["A"], 2),
            OrderInstance::new("X", ["B"], 0).with_notes("stale"),
        ]);

        let next = reduce(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: k1,
                pending_instance: OrderInstance::new("X", ["B"], 2),
            },
        );

        let entry = next.get(&k2).unwrap();
        assert_eq!(entry.qty, 2);
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn test_commit_pending_in_place_replaces_qty() {
        let key = create_instance_key("X", ["A"]);
        let draft = draft_of(vec![OrderInstance::new("X", ["A"], 4)]);

        let next = reduce(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: key.clone(),
                pending_instance: OrderInstance::new("X", ["A"], 1).with_notes("half"),
            },
        );

        let entry = next.get(&key).unwrap();
        assert_eq!(entry.qty, 1);
        assert_eq!(entry.notes.as_deref(), Some("half"));
    }

    #[test]
    fn test_commit_pending_prunes_zero_qty_entries() {
        let draft = draft_of(vec![
            OrderInstance::new("X", ["A"], 1),
            OrderInstance::new("Y", no_addons(), 0),
        ]);

        let outcome = reduce_with_outcome(
            &draft,
            &DraftAction::CommitPendingInstance {
                pending_key: create_instance_key("X", ["A"]),
                pending_instance: OrderInstance::new("X", ["A"], 2),
            },
        );

        assert_eq!(outcome.draft.len(), 1);
        assert_eq!(outcome.pruned, vec![create_instance_key("Y", no_addons())]);
    }

    #[test]
    fn test_prune_removes_zero_qty_and_orphans() {
        let draft = draft_of(vec![
            OrderInstance::new("keep", no_addons(), 1),
            OrderInstance::new("keep", ["a"], 0),
            OrderInstance::new("gone", no_addons(), 2),
            OrderInstance::new("off", no_addons(), 2),
            OrderInstance::new("keep", ["b"], -1),
        ]);
        let catalog = MenuCatalog::new()
            .with_menu("keep", MenuEntry::active())
            .with_menu("off", MenuEntry::inactive());

        let next = reduce(&draft, &DraftAction::PruneInvalid { catalog: Some(catalog) });

        assert_eq!(next.len(), 1);
        assert!(next.contains_key(&create_instance_key("keep", no_addons())));
    }

    #[test]
    fn test_prune_without_catalog_only_drops_zero_qty() {
        let draft = draft_of(vec![
            OrderInstance::new("a", no_addons(), 0),
            OrderInstance::new("b", no_addons(), 1),
        ]);

        let next = reduce(&draft, &DraftAction::PruneInvalid { catalog: None });

        assert_eq!(next.len(), 1);
        assert!(next.contains_key(&create_instance_key("b", no_addons())));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let draft = draft_of(vec![
            OrderInstance::new("a", no_addons(), 0),
            OrderInstance::new("b", no_addons(), 1),
            OrderInstance::new("c", ["x"], 3),
        ]);
        let action = DraftAction::PruneInvalid {
            catalog: Some(MenuCatalog::new().with_menu("b", MenuEntry::active())),
        };

        let once = reduce(&draft, &action);
        let twice = reduce(&once, &action);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_notes_on_missing_key_is_noop() {
        let draft = draft_of(vec![OrderInstance::new("a", no_addons(), 1)]);

        let next = reduce(
            &draft,
            &DraftAction::SetInstanceNotes {
                key: InstanceKey::from("nonexistent-key"),
                notes: Some("x".to_string()),
            },
        );

        assert_eq!(next, draft);
    }

    #[test]
    fn test_set_notes_leaves_qty_and_addons() {
        let key = create_instance_key("a", ["z"]);
        let draft = draft_of(vec![OrderInstance::new("a", ["z"], 2)]);

        let next = reduce(
            &draft,
            &DraftAction::SetInstanceNotes {
                key: key.clone(),
                notes: Some("no ice".to_string()),
            },
        );

        let entry = next.get(&key).unwrap();
        assert_eq!(entry.notes.as_deref(), Some("no ice"));
        assert_eq!(entry.qty, 2);
        assert_eq!(entry.addon_ids, draft.get(&key).unwrap().addon_ids);
    }

    #[test]
    fn test_set_qty_zero_is_kept_until_prune() {
        let key = create_instance_key("a", no_addons());
        let draft = draft_of(vec![OrderInstance::new("a", no_addons(), 3).with_notes("hot")]);

        let next = reduce(&draft, &DraftAction::SetInstanceQty { key: key.clone(), qty: 0 });

        let entry = next.get(&key).unwrap();
        assert_eq!(entry.qty, 0);
        assert_eq!(entry.notes.as_deref(), Some("hot"));

        let pruned = reduce(&next, &DraftAction::PruneInvalid { catalog: None });
        assert!(pruned.is_empty());
    }

    #[test]
    fn test_set_qty_synthesizes_missing_entry() {
        let key = create_instance_key("menu", ["b", "a"]);

        let next = reduce(&OrderDraft::new(), &DraftAction::SetInstanceQty { key: key.clone(), qty: 2 });

        let entry = next.get(&key).unwrap();
        assert_eq!(entry.menu_id, MenuId::new("menu"));
        assert_eq!(entry.key(), key);
        assert_eq!(entry.qty, 2);
    }

    #[test]
    fn test_unknown_action_returns_equal_copy() {
        let draft = draft_of(vec![OrderInstance::new("a", ["x"], 1)]);
        assert_eq!(reduce(&draft, &DraftAction::Unknown), draft);
    }

    #[test]
    fn test_transitions_never_modify_input() {
        let k1 = create_instance_key("X", ["A"]);
        let draft = draft_of(vec![
            OrderInstance::new("X", ["A"], 1).with_notes("spicy"),
            OrderInstance::new("X", ["B"], 3),
            OrderInstance::new("Y", no_addons(), 0),
        ]);
        let snapshot = draft.clone();

        let actions = vec![
            DraftAction::Reset,
            DraftAction::CommitPendingInstance {
                pending_key: k1.clone(),
                pending_instance: OrderInstance::new("X", ["B"], 1),
            },
            DraftAction::CommitNewInstance {
                new_instance: OrderInstance::new("X", ["A"], 2),
            },
            DraftAction::PruneInvalid { catalog: Some(MenuCatalog::new()) },
            DraftAction::SetInstanceNotes { key: k1.clone(), notes: None },
            DraftAction::SetInstanceQty { key: k1, qty: 9 },
            DraftAction::Unknown,
        ];

        for action in &actions {
            let _ = reduce(&draft, action);
            assert_eq!(draft, snapshot, "{} modified its input", action.name());
        }
    }

    #[test]
    fn test_commit_drops_blank_addons_from_payload() {
        let new_instance: OrderInstance =
            serde_json::from_str(r#"{"menu_id":"m","addon_ids":["","a"],"qty":1}"#).unwrap();
        let draft = reduce(&OrderDraft::new(), &DraftAction::CommitNewInstance { new_instance });

        let json = serde_json::to_value(draft.submission()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": {"m-a": {"menu_id": "m", "addon_ids": ["a"], "qty": 1}}})
        );
    }

    #[test]
    fn test_commit_pending_drops_blank_addons_set_on_field() {
        let mut pending = OrderInstance::new("m", ["a"], 2);
        pending.addon_ids.insert(AddonId::new(" "));
        let key = create_instance_key("m", ["a"]);

        let next = reduce(
            &OrderDraft::new(),
            &DraftAction::CommitPendingInstance {
                pending_key: key.clone(),
                pending_instance: pending,
            },
        );

        let entry = next.get(&key).unwrap();
        assert_eq!(entry.addon_ids, OrderInstance::new("m", ["a"], 1).addon_ids);
        assert_eq!(entry.key(), key);
    }

    mod properties {
        use super::*;
        use proptest::collection::vec;
        use proptest::prelude::*;
        use proptest::sample::select;

        const MENUS: [&str; 4] = ["burger", "fries", "soda", "salad"];
        const ADDONS: [&str; 4] = ["cheese", "bacon", "ice", "lemon"];

        fn instance_strat() -> impl Strategy<Value = OrderInstance> {
            (
                select(MENUS.to_vec()),
                vec(select(ADDONS.to_vec()), 0..3),
                -2i32..5,
                proptest::option::of("[a-z ]{0,6}"),
            )
                .prop_map(|(menu, addons, qty, notes)| {
                    let instance = OrderInstance::new(menu, addons, qty);
                    match notes {
                        Some(notes) => instance.with_notes(notes),
                        None => instance,
                    }
                })
        }

        fn draft_strat() -> impl Strategy<Value = OrderDraft> {
            vec(instance_strat(), 0..8).prop_map(|instances| instances.into_iter().collect())
        }

        fn catalog_strat() -> impl Strategy<Value = MenuCatalog> {
            vec((select(MENUS.to_vec()), any::<bool>()), 0..5).prop_map(|menus| {
                menus.into_iter().fold(MenuCatalog::new(), |catalog, (menu, active)| {
                    let entry = if active { MenuEntry::active() } else { MenuEntry::inactive() };
                    catalog.with_menu(menu, entry)
                })
            })
        }

        fn action_strat() -> impl Strategy<Value = DraftAction> {
            prop_oneof![
                Just(DraftAction::Reset),
                (instance_strat(), instance_strat()).prop_map(|(edited, pending_instance)| {
                    DraftAction::CommitPendingInstance {
                        pending_key: edited.key(),
                        pending_instance,
                    }
                }),
                instance_strat().prop_map(|new_instance| DraftAction::CommitNewInstance { new_instance }),
                proptest::option::of(catalog_strat())
                    .prop_map(|catalog| DraftAction::PruneInvalid { catalog }),
                (instance_strat(), proptest::option::of("[a-z ]{0,6}"))
                    .prop_map(|(target, notes)| DraftAction::SetInstanceNotes { key: target.key(), notes }),
                (instance_strat(), -2i32..5)
                    .prop_map(|(target, qty)| DraftAction::SetInstanceQty { key: target.key(), qty }),
                Just(DraftAction::Unknown),
            ]
        }

        proptest! {
            #[test]
            fn prune_is_idempotent(
                draft in draft_strat(),
                catalog in proptest::option::of(catalog_strat())
            ) {
                let action = DraftAction::PruneInvalid { catalog: catalog.clone() };
                let once = reduce(&draft, &action);
                let twice = reduce(&once, &action);

                prop_assert_eq!(&once, &twice);
                for (_, instance) in once.iter() {
                    prop_assert!(instance.qty > 0);
                    if let Some(catalog) = &catalog {
                        prop_assert!(catalog.is_orderable(&instance.menu_id));
                    }
                }
            }

            #[test]
            fn reduce_never_modifies_input(draft in draft_strat(), action in action_strat()) {
                let snapshot = draft.clone();
                let _ = reduce(&draft, &action);
                prop_assert_eq!(draft, snapshot);
            }

            #[test]
            fn commit_new_adds_quantities(draft in draft_strat(), new_instance in instance_strat()) {
                let key = new_instance.key();
                let previous = draft.get(&key).map_or(0, |existing| existing.qty);
                let expected = previous + new_instance.qty;

                let next = reduce(&draft, &DraftAction::CommitNewInstance { new_instance });

                prop_assert_eq!(next.get(&key).map(|entry| entry.qty), Some(expected).filter(|qty| *qty > 0));
                prop_assert!(next.iter().all(|(_, instance)| instance.qty > 0));
            }
        }
    }
}
