// Keyboard shortcut matching - pure logic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortcutAction {
    NewTab,
    CloseTab,
    Reload,
    FocusUrl,
    GoBack,
    GoForward,
    DevTools,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    #[serde(rename = "id")]
    pub action: ShortcutAction,
    pub label: String,
    pub keys: String,
}

impl Shortcut {
    fn new(action: ShortcutAction, label: &str, keys: &str) -> Self {
        Self {
            action,
            label: label.to_string(),
            keys: keys.to_string(),
        }
    }
}

/// A key-down as reported by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub key: String,
    #[serde(default, alias = "ctrlKey")]
    pub ctrl: bool,
    #[serde(default, alias = "altKey")]
    pub alt: bool,
    #[serde(default, alias = "shiftKey")]
    pub shift: bool,
    #[serde(default, alias = "metaKey")]
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Lowercased `modifier+...+key` combo; `None` for a bare modifier press.
    pub fn combo(&self) -> Option<String> {
        if matches!(self.key.as_str(), "Control" | "Alt" | "Shift" | "Meta") {
            return None;
        }

        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        parts.push(if self.key == " " { "Space" } else { &self.key });

        Some(parts.join("+").to_lowercase())
    }
}

const DEVTOOLS_KEY: &str = "F12";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutMap {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        use ShortcutAction::*;
        Self {
            shortcuts: vec![
                Shortcut::new(NewTab, "New Tab", "Ctrl+t"),
                Shortcut::new(CloseTab, "Close Tab", "Ctrl+w"),
                Shortcut::new(Reload, "Reload Page", "Ctrl+r"),
                Shortcut::new(FocusUrl, "Focus URL Bar", "Ctrl+l"),
                Shortcut::new(GoBack, "Go Back", "Alt+ArrowLeft"),
                Shortcut::new(GoForward, "Go Forward", "Alt+ArrowRight"),
            ],
        }
    }
}

impl ShortcutMap {
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Replaces the key combo of every binding for `action`, or registers a
    /// new binding at the end when the action has none.
    pub fn rebind(&mut self, action: ShortcutAction, keys: &str) {
        let mut found = false;
        for shortcut in self.shortcuts.iter_mut().filter(|s| s.action == action) {
            shortcut.keys = keys.to_string();
            found = true;
        }
        if !found {
            let label = serde_json::to_value(action)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            self.shortcuts.push(Shortcut::new(action, &label, keys));
        }
    }

    /// F12 always toggles devtools, whatever is bound to it. Otherwise the
    /// first binding in registration order wins. A match means the native
    /// key event must be consumed.
    pub fn match_event(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        if event.key == DEVTOOLS_KEY {
            return Some(ShortcutAction::DevTools);
        }
        let combo = event.combo()?;
        self.shortcuts
            .iter()
            .find(|s| s.keys.to_lowercase() == combo)
            .map(|s| s.action)
    }
}
