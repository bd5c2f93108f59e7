use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::draft::MenuId;

// ============================================================================
// Menu Catalog - read-only view used to validate draft entries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MenuEntry {
    pub fn active() -> Self {
        Self { active: true, name: None }
    }

    pub fn inactive() -> Self {
        Self { active: false, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuCatalog {
    menus: HashMap<MenuId, MenuEntry>,
}

impl MenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_menu(mut self, menu_id: impl Into<MenuId>, entry: MenuEntry) -> Self {
        self.menus.insert(menu_id.into(), entry);
        self
    }

    pub fn lookup(&self, menu_id: &MenuId) -> Option<&MenuEntry> {
        self.menus.get(menu_id)
    }

    /// Missing and deactivated menus are both unorderable
    pub fn is_orderable(&self, menu_id: &MenuId) -> bool {
        self.lookup(menu_id).is_some_and(|entry| entry.active)
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }
}

impl FromIterator<(MenuId, MenuEntry)> for MenuCatalog {
    fn from_iter<T: IntoIterator<Item = (MenuId, MenuEntry)>>(iter: T) -> Self {
        Self {
            menus: iter.into_iter().collect(),
        }
    }
}
