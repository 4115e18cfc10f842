//! Entry categories and the filters built on them.
//!
//! Two filters exist and they are deliberately separate:
//!
//! - [`CategoryFilter`] drives the display projection only.
//! - [`DispatchFilter`] drives what the playback scheduler forwards to the
//!   sink. It never changes how far the cursor moves.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::entry::{EntryKind, TimelineEntry};

/// Display tag of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventCategory {
    Info,
    Kill,
    Event,
}

/// Event names that make up the "kill" category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KillCategory {
    names: Vec<String>,
}

impl KillCategory {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive match against the configured names.
    pub fn matches(&self, event_name: &str) -> bool {
        self.names.iter().any(|n| n == event_name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for KillCategory {
    fn default() -> Self {
        Self::new(["kill_feed", "kill"])
    }
}

/// Category predicate for the display projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum CategoryFilter {
    #[default]
    #[strum(serialize = "all")]
    All,
    #[strum(to_string = "snapshot", serialize = "info")]
    SnapshotOnly,
    #[strum(to_string = "occurrence", serialize = "event")]
    OccurrenceOnly,
    /// Refinement of `OccurrenceOnly` restricted to the kill category.
    #[strum(serialize = "kill")]
    KillOnly,
}

impl CategoryFilter {
    pub fn admits(&self, entry: &TimelineEntry, kill: &KillCategory) -> bool {
        self.admits_kind(entry.kind, entry.category(kill))
    }

    /// Same decision from an entry's kind and already-resolved category.
    pub fn admits_kind(&self, kind: EntryKind, category: EventCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::SnapshotOnly => kind == EntryKind::Snapshot,
            CategoryFilter::OccurrenceOnly => kind == EntryKind::Occurrence,
            CategoryFilter::KillOnly => category == EventCategory::Kill,
        }
    }
}

/// What the playback scheduler forwards to the sink.
///
/// Snapshots are always forwarded; `KillOnly` drops non-kill occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchFilter {
    #[default]
    All,
    KillOnly,
}

impl DispatchFilter {
    pub fn forwards(&self, entry: &TimelineEntry, kill: &KillCategory) -> bool {
        match self {
            DispatchFilter::All => true,
            DispatchFilter::KillOnly => entry.is_snapshot() || entry.is_kill(kill),
        }
    }
}
