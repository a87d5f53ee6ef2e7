// Tab registry - pure logic, no Tauri imports.
// Owns the ordered tab list and the active tab id; keeps the
// "at least one tab, active id always valid" invariants.

use std::collections::HashMap;

use crate::state::{Tab, TabId};

pub const HOME_TITLE: &str = "Home";
pub const NEW_TAB_TITLE: &str = "New Tab";
pub const LOADING_TITLE: &str = "Loading...";

#[derive(Debug)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: TabId,
    next_id: u64,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistry {
    /// Starts with a single active home tab.
    pub fn new() -> Self {
        let home = Tab::home(TabId(1), HOME_TITLE);
        Self {
            active: home.id,
            tabs: vec![home],
            next_id: 2,
        }
    }

    fn allocate_id(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Tabs in storage (insertion) order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_id(&self) -> TabId {
        self.active
    }

    pub fn active(&self) -> Option<&Tab> {
        self.get(self.active)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.get(id).is_some()
    }

    fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    /// Pinned tabs first, then unpinned; each group keeps storage order.
    pub fn display_order(&self) -> Vec<&Tab> {
        let pinned = self.tabs.iter().filter(|t| t.pinned);
        let unpinned = self.tabs.iter().filter(|t| !t.pinned);
        pinned.chain(unpinned).collect()
    }

    pub fn add_tab(&mut self) -> TabId {
        let id = self.allocate_id();
        self.tabs.push(Tab::home(id, NEW_TAB_TITLE));
        self.active = id;
        log::debug!("[Tabs] Added {}", id);
        id
    }

    /// Appends a content tab and activates it.
    pub fn open_tab(&mut self, url: &str, title: &str) -> TabId {
        let id = self.allocate_id();
        self.tabs.push(Tab {
            id,
            title: title.to_string(),
            url: url.to_string(),
            icon: None,
            pinned: false,
        });
        self.active = id;
        log::debug!("[Tabs] Opened {} at {}", id, url);
        id
    }

    /// Removes a tab. Returns the removed record so the caller can release
    /// its view. The registry is never left empty.
    pub fn remove_tab(&mut self, id: TabId) -> Option<Tab> {
        let idx = self.position(id)?;
        let removed = self.tabs.remove(idx);

        if self.tabs.is_empty() {
            let home = Tab::home(self.allocate_id(), HOME_TITLE);
            self.active = home.id;
            self.tabs.push(home);
        } else if self.active == id {
            // Non-empty checked above
            if let Some(last) = self.tabs.last() {
                self.active = last.id;
            }
        }

        log::debug!("[Tabs] Removed {}, active is now {}", id, self.active);
        Some(removed)
    }

    /// Returns false (and changes nothing) for an unknown id.
    pub fn activate_tab(&mut self, id: TabId) -> bool {
        if !self.contains(id) {
            log::warn!("[Tabs] Ignoring activation of unknown {}", id);
            return false;
        }
        self.active = id;
        true
    }

    pub fn update_tab_title(&mut self, id: TabId, title: &str) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Points the tab at a new url; the title shows a placeholder until the
    /// view reports load completion.
    pub fn navigate(&mut self, id: TabId, url: &str) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.url = url.to_string();
                tab.title = LOADING_TITLE.to_string();
                true
            }
            None => false,
        }
    }

    pub fn toggle_pin(&mut self, id: TabId) -> Option<bool> {
        let tab = self.get_mut(id)?;
        tab.pinned = !tab.pinned;
        Some(tab.pinned)
    }

    /// The close button is hidden on pinned tabs; context-menu close still works.
    pub fn is_closable_by_button(&self, id: TabId) -> bool {
        self.get(id).map(|t| !t.pinned).unwrap_or(false)
    }

    /// Keeps `id` and every pinned tab, activates `id`. Returns the discarded tabs.
    pub fn close_others(&mut self, id: TabId) -> Vec<Tab> {
        if !self.contains(id) {
            return Vec::new();
        }
        let (kept, discarded): (Vec<Tab>, Vec<Tab>) = self
            .tabs
            .drain(..)
            .partition(|t| t.id == id || t.pinned);
        self.tabs = kept;
        self.active = id;
        discarded
    }

    /// Inserts a copy right after the source. The copy gets a fresh id and
    /// shares nothing with the source beyond url, title and pin state.
    pub fn duplicate_tab(&mut self, id: TabId) -> Option<TabId> {
        let idx = self.position(id)?;
        let new_id = self.allocate_id();
        let copy = Tab {
            id: new_id,
            ..self.tabs[idx].clone()
        };
        self.tabs.insert(idx + 1, copy);
        Some(new_id)
    }

    /// Drag-and-drop reorder. Returns true if the order changed.
    ///
    /// Algorithm:
    /// 1. Map existing tabs by ID for O(1) lookup
    /// 2. Rebuild vector based on new_order
    /// 3. Append any missing tabs in their previous order (no tab is ever lost)
    pub fn reorder(&mut self, new_order: &[TabId]) -> bool {
        if self.tabs.is_empty() || new_order.is_empty() {
            return false;
        }

        let old_order: Vec<TabId> = self.tabs.iter().map(|t| t.id).collect();
        let mut tab_map: HashMap<TabId, Tab> = self.tabs.drain(..).map(|t| (t.id, t)).collect();

        let mut reordered = Vec::with_capacity(old_order.len());
        for id in new_order {
            if let Some(tab) = tab_map.remove(id) {
                reordered.push(tab);
            }
        }
        for id in &old_order {
            if let Some(tab) = tab_map.remove(id) {
                reordered.push(tab);
            }
        }

        let changed = reordered.iter().map(|t| t.id).ne(old_order.iter().copied());
        self.tabs = reordered;
        changed
    }
}
