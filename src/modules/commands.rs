// Navigation command channel - pure logic.
// Every issued command carries a fresh sequence number, so two identical
// RELOADs are two distinct events and a consumer never relies on timing.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::state::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavActionKind {
    Back,
    Forward,
    Reload,
    Stop,
    #[serde(alias = "DEV_TOOLS")]
    Devtools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavCommand {
    pub seq: u64,
    pub kind: NavActionKind,
    pub target: TabId,
}

#[derive(Debug, Default)]
pub struct CommandChannel {
    queue: VecDeque<NavCommand>,
    last_seq: u64,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, kind: NavActionKind, target: TabId) -> NavCommand {
        self.last_seq += 1;
        let command = NavCommand {
            seq: self.last_seq,
            kind,
            target,
        };
        self.queue.push_back(command);
        command
    }

    /// Sequence number of the most recently issued command (0 before any).
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Hands out every queued command once, in issue order.
    pub fn drain(&mut self) -> Vec<NavCommand> {
        self.queue.drain(..).collect()
    }

    /// Drops commands addressed to a tab that no longer exists.
    pub fn discard_for(&mut self, target: TabId) {
        self.queue.retain(|c| c.target != target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_commands_are_distinct_events() {
        let mut channel = CommandChannel::new();
        let first = channel.issue(NavActionKind::Reload, TabId(1));
        let second = channel.issue(NavActionKind::Reload, TabId(1));

        assert_ne!(first.seq, second.seq);
        assert!(second.seq > first.seq);
        assert_eq!(channel.drain(), vec![first, second]);
    }

    #[test]
    fn test_drain_consumes_once() {
        let mut channel = CommandChannel::new();
        channel.issue(NavActionKind::Back, TabId(3));
        assert_eq!(channel.pending(), 1);
        assert_eq!(channel.drain().len(), 1);
        assert!(channel.drain().is_empty());
        assert_eq!(channel.last_seq(), 1);
    }

    #[test]
    fn test_discard_for_removed_tab() {
        let mut channel = CommandChannel::new();
        channel.issue(NavActionKind::Stop, TabId(1));
        channel.issue(NavActionKind::Forward, TabId(2));
        channel.discard_for(TabId(1));

        let left = channel.drain();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].target, TabId(2));
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_string(&NavActionKind::Devtools).unwrap(), "\"DEVTOOLS\"");
        let parsed: NavActionKind = serde_json::from_str("\"DEV_TOOLS\"").unwrap();
        assert_eq!(parsed, NavActionKind::Devtools);
    }
}
