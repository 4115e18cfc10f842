//! Timeline entries.
//!
//! A [`TimelineEntry`] is one item of the replay timeline: either a full
//! state-info `Snapshot` or a single discrete `Occurrence`. Entries are
//! ordered by `(timestamp, sequence_hint)`; the hint is the entry's position
//! in extraction order and only breaks timestamp ties.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::category::{EventCategory, KillCategory};

/// What an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    /// Full state-info payload (carries an `info` field).
    Snapshot,
    /// A single discrete event (carries a `name` or nested `data`).
    Occurrence,
}

/// One entry of the assembled timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub kind: EntryKind,
    /// Unix milliseconds (UTC). Not unique.
    pub timestamp: i64,
    /// Decoded JSON fragment. For occurrences this is one event object,
    /// never an array.
    pub payload: Value,
    /// Position in extraction order. Strictly increasing across a log.
    pub sequence_hint: u64,
}

impl TimelineEntry {
    pub fn snapshot(timestamp: i64, payload: Value, sequence_hint: u64) -> Self {
        Self {
            kind: EntryKind::Snapshot,
            timestamp,
            payload,
            sequence_hint,
        }
    }

    pub fn occurrence(timestamp: i64, payload: Value, sequence_hint: u64) -> Self {
        Self {
            kind: EntryKind::Occurrence,
            timestamp,
            payload,
            sequence_hint,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.kind == EntryKind::Snapshot
    }

    /// The event name of an occurrence: `payload.name`, else `payload.data.name`.
    ///
    /// Snapshots have no event name.
    pub fn event_name(&self) -> Option<&str> {
        if self.is_snapshot() {
            return None;
        }
        self.payload
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.payload
                    .get("data")
                    .and_then(|d| d.get("name"))
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
            })
    }

    /// Name shown in tables: the event name, or the literal `"info"` for snapshots.
    pub fn display_name(&self) -> &str {
        match self.kind {
            EntryKind::Snapshot => "info",
            EntryKind::Occurrence => self.event_name().unwrap_or(""),
        }
    }

    /// Whether this is an occurrence in the kill category.
    pub fn is_kill(&self, kill: &KillCategory) -> bool {
        self.event_name().is_some_and(|name| kill.matches(name))
    }

    pub fn category(&self, kill: &KillCategory) -> EventCategory {
        match self.kind {
            EntryKind::Snapshot => EventCategory::Info,
            EntryKind::Occurrence if self.is_kill(kill) => EventCategory::Kill,
            EntryKind::Occurrence => EventCategory::Event,
        }
    }
}
