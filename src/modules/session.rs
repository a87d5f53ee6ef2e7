// Per-view session history - pure logic.
// Engines that only report committed URLs get back/forward capability
// from this. Traversals the shell starts are announced first, so the
// commit that lands on the expected entry moves the cursor instead of
// pushing one.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traversal {
    Back,
    Forward,
}

#[derive(Debug, Default, Clone)]
pub struct SessionHistory {
    entries: Vec<String>,
    index: usize,
    pending: Option<Traversal>,
    /// The seed is the requested URL; the first commit replaces it.
    provisional: bool,
    /// `Some(true)` once the load in flight has committed an entry.
    load_committed: Option<bool>,
}

/// Engines report URLs in serialized form (`https://a.test/`).
fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl SessionHistory {
    /// History seeded with the URL the view was created for.
    pub fn new(url: &str) -> Self {
        Self {
            entries: vec![normalize(url)],
            provisional: true,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn begin_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.pending = Some(Traversal::Back);
        true
    }

    pub fn begin_forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.pending = Some(Traversal::Forward);
        true
    }

    /// The traversal never reached the engine.
    pub fn cancel_traversal(&mut self) {
        self.pending = None;
    }

    /// A top-level load started; commits until the next start belong to it.
    pub fn start_load(&mut self) {
        self.load_committed = Some(false);
    }

    /// Records a committed navigation.
    pub fn commit(&mut self, url: &str) {
        let url = normalize(url);
        let in_same_load = self.load_committed == Some(true);
        if self.load_committed.is_some() {
            self.load_committed = Some(true);
        }

        if let Some(traversal) = self.pending.take() {
            let target = match traversal {
                Traversal::Back => self.index.checked_sub(1),
                Traversal::Forward => Some(self.index + 1),
            };
            // A traversal that never produced a load leaves a stale marker;
            // it only counts if the commit lands on the expected entry.
            if let Some(target) = target.filter(|t| self.entries.get(*t) == Some(&url)) {
                self.index = target;
                self.provisional = false;
                return;
            }
        }

        // Initial seed and redirects within one load rewrite the entry
        if self.provisional || in_same_load {
            self.provisional = false;
            match self.entries.get_mut(self.index) {
                Some(entry) => *entry = url,
                None => {
                    self.entries.push(url);
                    self.index = self.entries.len() - 1;
                }
            }
            return;
        }

        // Reloads
        if self.current() == Some(url.as_str()) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }
}
