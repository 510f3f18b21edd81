//! Clipboard change detection with echo suppression
//!
//! Writes that come from the relay must not be reported back as local edits.
//! Before such a write the detector is armed with a [`PendingEcho`] holding the
//! exact content. The next observed change consumes the marker: a match is
//! swallowed, anything else is reported as a genuine edit. A marker that sees no
//! change expires one TTL after the write settled, so it cannot swallow a later
//! local copy of the same text.

use std::time::{Duration, Instant};

use super::value::ClipboardValue;

/// Marker for a clipboard write whose echo must be ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEcho {
    content: String,
    settled_at: Option<Instant>,
}

impl PendingEcho {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            settled_at: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the write this marker guards has completed
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    pub fn matches(&self, content: &str) -> bool {
        self.content == content
    }

    /// Only settled markers expire; an in-flight write keeps its marker.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.settled_at
            .is_some_and(|at| now.saturating_duration_since(at) >= ttl)
    }
}

/// Outcome of comparing the clipboard with the last observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    /// Content changed to what a remote-origin write put there
    Echo,
    Changed(ClipboardValue),
}

/// Tracks the last observed clipboard content and the pending echo marker.
#[derive(Debug)]
pub struct ChangeDetector {
    last_content: String,
    observations: u64,
    pending: Option<PendingEcho>,
    echo_ttl: Duration,
}

impl ChangeDetector {
    pub fn new(echo_ttl: Duration) -> Self {
        Self {
            last_content: String::new(),
            observations: 0,
            pending: None,
            echo_ttl,
        }
    }

    pub fn last_content(&self) -> &str {
        &self.last_content
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn pending_echo(&self) -> Option<&PendingEcho> {
        self.pending.as_ref()
    }

    /// Set the baseline without reporting it as a change
    pub fn reset_baseline(&mut self, content: impl Into<String>) {
        self.last_content = content.into();
    }

    /// Compare freshly read content against the last observation
    pub fn observe(&mut self, content: &str, now: Instant) -> Observation {
        if content == self.last_content {
            if self
                .pending
                .as_ref()
                .is_some_and(|p| p.is_expired(now, self.echo_ttl))
            {
                self.pending = None;
            }
            return Observation::Unchanged;
        }

        self.last_content = content.to_string();
        self.observations += 1;

        match self.pending.take() {
            Some(pending) if pending.matches(content) => Observation::Echo,
            _ => Observation::Changed(ClipboardValue::new(content, self.observations)),
        }
    }

    /// Arm the marker before a remote-origin write is issued
    pub fn arm_echo(&mut self, content: impl Into<String>) {
        self.pending = Some(PendingEcho::new(content));
    }

    /// Start the TTL once the write completed
    pub fn settle_echo(&mut self, now: Instant) {
        if let Some(pending) = self.pending.as_mut() {
            pending.settled_at = Some(now);
        }
    }

    /// Drop the marker after a failed write
    pub fn disarm_echo(&mut self) {
        self.pending = None;
    }
}
