// Top-level shell controller.
// Owns the tab registry and the active tab; every mutation ends in a
// reconcile pass that brings the view registry in line with the tabs.

use crate::modules::commands::{CommandChannel, NavActionKind, NavCommand};
use crate::modules::navigation::{is_internal_url, resolve_input};
use crate::modules::policy::SettingsProvider;
use crate::modules::shortcuts::{KeyEvent, ShortcutAction, ShortcutMap};
use crate::modules::stats::domain_of;
use crate::modules::tabs::{TabRegistry, HOME_TITLE};
use crate::modules::views::{ViewEvent, ViewHost, ViewRegistry};
use crate::state::{NavState, ShellEvent, Tab, TabId};

const SEARCH_TAB_TITLE: &str = "Search";

pub struct Shell<H: ViewHost> {
    tabs: TabRegistry,
    views: ViewRegistry<H::View>,
    host: H,
    commands: CommandChannel,
    nav_state: NavState,
    shortcuts: ShortcutMap,
    settings: SettingsProvider,
    events: Vec<ShellEvent>,
}

impl<H: ViewHost> Shell<H> {
    pub fn new(host: H, settings: SettingsProvider) -> Self {
        let mut shell = Self {
            tabs: TabRegistry::new(),
            views: ViewRegistry::new(),
            host,
            commands: CommandChannel::new(),
            nav_state: NavState::default(),
            shortcuts: ShortcutMap::default(),
            settings,
            events: Vec::new(),
        };
        shell.reconcile();
        shell
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn views(&self) -> &ViewRegistry<H::View> {
        &self.views
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn active_tab_id(&self) -> TabId {
        self.tabs.active_id()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.active()
    }

    pub fn nav_state(&self) -> NavState {
        self.nav_state
    }

    pub fn shortcuts(&self) -> &ShortcutMap {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutMap {
        &mut self.shortcuts
    }

    /// Hands the accumulated UI events to the caller.
    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Tab operations ---

    pub fn add_tab(&mut self) -> TabId {
        let id = self.tabs.add_tab();
        self.after_change(true);
        id
    }

    pub fn remove_tab(&mut self, id: TabId) {
        let was_active = self.tabs.active_id() == id;
        if self.tabs.remove_tab(id).is_none() {
            return;
        }
        self.commands.discard_for(id);
        self.after_change(was_active);
    }

    pub fn activate_tab(&mut self, id: TabId) {
        if self.tabs.activate_tab(id) {
            self.after_change(true);
        }
    }

    pub fn toggle_pin(&mut self, id: TabId) {
        if self.tabs.toggle_pin(id).is_some() {
            self.after_change(false);
        }
    }

    pub fn close_others(&mut self, id: TabId) {
        let discarded = self.tabs.close_others(id);
        for tab in &discarded {
            self.commands.discard_for(tab.id);
        }
        if self.tabs.contains(id) {
            self.after_change(true);
        }
    }

    pub fn duplicate_tab(&mut self, id: TabId) -> Option<TabId> {
        let new_id = self.tabs.duplicate_tab(id)?;
        self.after_change(false);
        Some(new_id)
    }

    pub fn reorder_tabs(&mut self, order: &[TabId]) {
        if self.tabs.reorder(order) {
            self.after_change(false);
        }
    }

    /// Navigates the active tab to address-bar input. Returns the resolved URL.
    pub fn navigate(&mut self, input: &str) -> Option<String> {
        let url = resolve_input(input, self.settings.current().search_engine)?;
        let id = self.tabs.active_id();
        self.tabs.navigate(id, &url);

        if is_internal_url(&url) {
            self.tabs.update_tab_title(id, HOME_TITLE);
        } else if let Some(domain) = domain_of(&url) {
            self.events.push(ShellEvent::VisitRecorded(domain));
        }

        self.after_change(false);
        Some(url)
    }

    /// Search overlay: results open in a fresh tab.
    pub fn open_in_new_tab(&mut self, input: &str) -> Option<TabId> {
        let url = resolve_input(input, self.settings.current().search_engine)?;
        let id = self.tabs.open_tab(&url, SEARCH_TAB_TITLE);
        self.after_change(true);
        Some(id)
    }

    // --- Navigation commands ---

    /// Addresses `kind` to the active tab and runs it.
    pub fn trigger_nav_action(&mut self, kind: NavActionKind) -> NavCommand {
        let command = self.commands.issue(kind, self.tabs.active_id());
        self.dispatch_commands();
        command
    }

    /// Consumes every queued command exactly once.
    pub fn dispatch_commands(&mut self) {
        for command in self.commands.drain() {
            self.views.execute(&command);
        }
    }

    // --- View lifecycle callbacks ---

    pub fn handle_view_event(&mut self, id: TabId, event: ViewEvent) {
        let outcome = self.views.handle_event(id, event);

        if let Some(title) = outcome.title {
            if self.tabs.update_tab_title(id, &title) {
                self.push_tabs();
            }
        }

        // Background tabs keep their phase locally; activation refreshes them
        if let Some(state) = outcome.nav_state {
            if id == self.tabs.active_id() {
                self.set_nav_state(state);
            }
        }
    }

    // --- Keyboard ---

    /// Returns true when the key matched a shortcut and must be consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let Some(action) = self.shortcuts.match_event(event) else {
            return false;
        };
        log::debug!("[Shell] Shortcut {:?}", action);

        match action {
            ShortcutAction::NewTab => {
                self.add_tab();
            }
            ShortcutAction::CloseTab => {
                let active = self.tabs.active_id();
                self.remove_tab(active);
            }
            ShortcutAction::Reload => {
                self.trigger_nav_action(NavActionKind::Reload);
            }
            ShortcutAction::FocusUrl => self.events.push(ShellEvent::FocusUrlBar),
            ShortcutAction::GoBack => {
                self.trigger_nav_action(NavActionKind::Back);
            }
            ShortcutAction::GoForward => {
                self.trigger_nav_action(NavActionKind::Forward);
            }
            ShortcutAction::DevTools => {
                self.trigger_nav_action(NavActionKind::Devtools);
            }
        }
        true
    }

    // --- Reconciliation ---

    /// Brings views in line with tabs: releases views of removed or home
    /// tabs, creates views for content tabs, reloads views whose tab url
    /// moved, shows only the active one.
    pub fn reconcile(&mut self) {
        for id in self.views.ids() {
            let keep = self.tabs.get(id).map(|t| !t.is_home()).unwrap_or(false);
            if !keep {
                self.views.release(id);
            }
        }

        for tab in self.tabs.tabs() {
            if tab.is_home() {
                continue;
            }
            let stale = match self.views.loaded_url(tab.id) {
                Some(loaded) => loaded != tab.url,
                None => {
                    match self.host.create_view(tab) {
                        Ok(view) => self.views.insert(tab.id, view, &tab.url),
                        Err(e) => {
                            log::warn!("[Shell] Failed to create view for {}: {}", tab.id, e)
                        }
                    }
                    continue;
                }
            };
            if stale {
                if let Err(e) = self.views.load(tab.id, &tab.url) {
                    log::warn!("[Shell] Failed to load {} in {}: {}", tab.url, tab.id, e);
                }
            }
        }

        self.views.show_only(self.tabs.active_id());
    }

    fn after_change(&mut self, refresh_nav: bool) {
        self.reconcile();
        self.push_tabs();
        let state = self.views.nav_state(self.tabs.active_id());
        if refresh_nav {
            self.nav_state = state;
            self.events.push(ShellEvent::NavStateChanged(state));
        } else {
            self.set_nav_state(state);
        }
    }

    fn set_nav_state(&mut self, state: NavState) {
        if self.nav_state != state {
            self.nav_state = state;
            self.events.push(ShellEvent::NavStateChanged(state));
        }
    }

    fn push_tabs(&mut self) {
        self.events.push(ShellEvent::TabsChanged {
            tabs: self.tabs.tabs().to_vec(),
            active_tab_id: self.tabs.active_id(),
        });
    }
}
