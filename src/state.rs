// Shared state structs to avoid circular dependencies.
// These are used by the shell, the host plugin and the pure modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::downloads::Download;
use crate::modules::navigation::{is_internal_url, HOME_URL};

/// Unique identifier for a tab. Allocated by the registry, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl Tab {
    pub fn home(id: TabId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            url: HOME_URL.to_string(),
            icon: Some("home".to_string()),
            pinned: false,
        }
    }

    /// Home tabs render the in-app start page and never own a content view.
    pub fn is_home(&self) -> bool {
        self.url.is_empty() || is_internal_url(&self.url)
    }
}

/// Capability state of the active tab's view, drives button enablement and the spinner.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
}

/// Outbox entries produced by the shell for the UI layer.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ShellEvent {
    #[serde(rename_all = "camelCase")]
    TabsChanged {
        tabs: Vec<Tab>,
        active_tab_id: TabId,
    },
    NavStateChanged(NavState),
    VisitRecorded(String),
    FocusUrlBar,
    DownloadStarted(Download),
    #[serde(rename = "download-complete")]
    DownloadCompleted(Download),
    DownloadFailed(Download),
}
