//! Clipboard history entity

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of history items kept in memory
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// A clipboard entry as recorded by the relay.
/// Missing fields decode to empty strings and a zero timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryItem {
    pub id: String,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl HistoryItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
        }
    }
}

/// Which side produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    Local,
    Remote,
}

impl HistorySource {
    const fn id_prefix(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Bounded, newest-first clipboard history kept only in memory.
#[derive(Debug, Clone)]
pub struct ClipboardHistory {
    items: VecDeque<HistoryItem>,
    capacity: usize,
}

impl ClipboardHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.front()
    }

    /// Entries from newest to oldest
    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryItem> {
        self.items.iter().cloned().collect()
    }

    /// Record a change at the front.
    /// Returns false when the content equals the current head.
    pub fn record(&mut self, source: HistorySource, content: &str, timestamp: i64) -> bool {
        if self
            .items
            .front()
            .is_some_and(|head| head.content == content)
        {
            return false;
        }

        let id = format!("{}-{}", source.id_prefix(), timestamp);
        self.items
            .push_front(HistoryItem::new(id, content, timestamp));
        self.items.truncate(self.capacity);
        true
    }

    /// Replace everything with the relay's view, keeping its order
    pub fn replace(&mut self, items: Vec<HistoryItem>) {
        self.items = items.into_iter().take(self.capacity).collect();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for ClipboardHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
