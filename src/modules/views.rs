// View lifecycle registry - pure logic.
// Maps tab ids to live content views, tracks each view's load phase and
// derives capability state from it. `release` is the only teardown path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ShellResult;
use crate::modules::commands::{NavActionKind, NavCommand};
use crate::state::{NavState, Tab, TabId};

/// Host-provided component rendering web content for one tab.
pub trait ContentView {
    fn load_url(&mut self, url: &str) -> ShellResult<()>;
    fn can_go_back(&self) -> ShellResult<bool>;
    fn can_go_forward(&self) -> ShellResult<bool>;
    fn go_back(&mut self) -> ShellResult<()>;
    fn go_forward(&mut self) -> ShellResult<()>;
    fn reload(&mut self) -> ShellResult<()>;
    fn stop(&mut self) -> ShellResult<()>;
    /// Document title once known.
    fn title(&self) -> Option<String>;
    fn is_devtools_open(&self) -> bool;
    fn open_devtools(&mut self) -> ShellResult<()>;
    fn close_devtools(&mut self) -> ShellResult<()>;
    fn set_visible(&mut self, visible: bool) -> ShellResult<()>;
    fn close(&mut self) -> ShellResult<()>;
}

/// Factory for content views; the view starts loading `tab.url` on creation.
pub trait ViewHost {
    type View: ContentView;

    fn create_view(&mut self, tab: &Tab) -> ShellResult<Self::View>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    #[default]
    Unloaded,
    Loading,
    Loaded,
}

/// Lifecycle callbacks a view reports for its tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewEvent {
    LoadStarted,
    LoadStopped,
    Navigated,
    NavigatedInPage,
}

/// What the shell should surface after a view event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// Recomputed capability state; `None` when the event must not touch the UI.
    pub nav_state: Option<NavState>,
    /// New tab title reported on load completion.
    pub title: Option<String>,
}

struct ViewSlot<V> {
    view: V,
    phase: LoadPhase,
    url: String,
}

pub struct ViewRegistry<V: ContentView> {
    slots: HashMap<TabId, ViewSlot<V>>,
}

impl<V: ContentView> Default for ViewRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ContentView> ViewRegistry<V> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.slots.keys().copied().collect()
    }

    pub fn get(&self, id: TabId) -> Option<&V> {
        self.slots.get(&id).map(|s| &s.view)
    }

    pub fn phase(&self, id: TabId) -> LoadPhase {
        self.slots.get(&id).map(|s| s.phase).unwrap_or_default()
    }

    /// URL the view was last pointed at by the shell.
    pub fn loaded_url(&self, id: TabId) -> Option<&str> {
        self.slots.get(&id).map(|s| s.url.as_str())
    }

    pub fn insert(&mut self, id: TabId, view: V, url: &str) {
        if let Some(mut old) = self.slots.insert(
            id,
            ViewSlot {
                view,
                phase: LoadPhase::Unloaded,
                url: url.to_string(),
            },
        ) {
            log::warn!("[Views] Replacing live view for {}", id);
            if let Err(e) = old.view.close() {
                log::warn!("[Views] Failed to close replaced view for {}: {}", id, e);
            }
        }
    }

    /// Single teardown point: drops the handle and closes the view.
    pub fn release(&mut self, id: TabId) -> bool {
        match self.slots.remove(&id) {
            Some(mut slot) => {
                if let Err(e) = slot.view.close() {
                    log::warn!("[Views] Failed to close view for {}: {}", id, e);
                }
                log::debug!("[Views] Released view for {}", id);
                true
            }
            None => false,
        }
    }

    pub fn load(&mut self, id: TabId, url: &str) -> ShellResult<()> {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.url = url.to_string();
            slot.view.load_url(url)?;
        }
        Ok(())
    }

    /// Capability state for a tab; a tab without a view supports nothing.
    pub fn nav_state(&self, id: TabId) -> NavState {
        match self.slots.get(&id) {
            Some(slot) => capability(&slot.view, slot.phase == LoadPhase::Loading),
            None => NavState::default(),
        }
    }

    pub fn handle_event(&mut self, id: TabId, event: ViewEvent) -> EventOutcome {
        let Some(slot) = self.slots.get_mut(&id) else {
            log::debug!("[Views] Event {:?} for {} without a view", event, id);
            return EventOutcome::default();
        };

        match event {
            ViewEvent::LoadStarted => {
                slot.phase = LoadPhase::Loading;
                EventOutcome {
                    nav_state: Some(capability(&slot.view, true)),
                    title: None,
                }
            }
            ViewEvent::LoadStopped => {
                slot.phase = LoadPhase::Loaded;
                EventOutcome {
                    nav_state: Some(capability(&slot.view, false)),
                    title: slot.view.title(),
                }
            }
            // Hash changes and same-document navigations never start a
            // spinner, and stay silent while a real load is pending.
            ViewEvent::Navigated | ViewEvent::NavigatedInPage => {
                if slot.phase == LoadPhase::Loading {
                    EventOutcome::default()
                } else {
                    EventOutcome {
                        nav_state: Some(capability(&slot.view, false)),
                        title: None,
                    }
                }
            }
        }
    }

    /// Runs a navigation command against its target view. Returns whether a
    /// primitive was invoked; failures are logged, never propagated.
    pub fn execute(&mut self, command: &NavCommand) -> bool {
        let Some(slot) = self.slots.get_mut(&command.target) else {
            log::debug!(
                "[Views] Dropping {:?} #{} for {}: no live view",
                command.kind,
                command.seq,
                command.target
            );
            return false;
        };

        let view = &mut slot.view;
        let result = match command.kind {
            NavActionKind::Back => match view.can_go_back() {
                Ok(true) => view.go_back().map(|_| true),
                Ok(false) => Ok(false),
                Err(e) => Err(e),
            },
            NavActionKind::Forward => match view.can_go_forward() {
                Ok(true) => view.go_forward().map(|_| true),
                Ok(false) => Ok(false),
                Err(e) => Err(e),
            },
            NavActionKind::Reload => view.reload().map(|_| true),
            NavActionKind::Stop => view.stop().map(|_| true),
            NavActionKind::Devtools => {
                if view.is_devtools_open() {
                    view.close_devtools().map(|_| true)
                } else {
                    view.open_devtools().map(|_| true)
                }
            }
        };

        match result {
            Ok(ran) => ran,
            Err(e) => {
                log::warn!(
                    "[Views] Nav error running {:?} on {}: {}",
                    command.kind,
                    command.target,
                    e
                );
                false
            }
        }
    }

    /// Only the active tab's view is visible.
    pub fn show_only(&mut self, active: TabId) {
        for (id, slot) in self.slots.iter_mut() {
            if let Err(e) = slot.view.set_visible(*id == active) {
                log::warn!("[Views] Failed to toggle visibility of {}: {}", id, e);
            }
        }
    }
}

fn capability<V: ContentView>(view: &V, is_loading: bool) -> NavState {
    NavState {
        can_go_back: view.can_go_back().unwrap_or(false),
        can_go_forward: view.can_go_forward().unwrap_or(false),
        is_loading,
    }
}
