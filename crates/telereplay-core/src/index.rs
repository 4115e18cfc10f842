//! Filter/search projection of a timeline for table display.
//!
//! Everything here is a pure function of its inputs: the timeline is never
//! mutated or reordered and no state survives between calls, so callers can
//! re-run a query on every keystroke.

use serde::Serialize;
use telereplay_types::{
    format_clock, CategoryFilter, EntryKind, EventCategory, KillCategory, TimelineEntry,
};

use crate::config::DetailLimits;
use crate::details::details_for;
use crate::timeline::Timeline;

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    /// Zero-based position in the timeline.
    pub index: usize,
    pub kind: EntryKind,
    pub timestamp_text: String,
    /// Event name, or `"info"` for snapshots.
    pub name: String,
    pub details: String,
    pub category: EventCategory,
}

impl DisplayRow {
    fn new(index: usize, entry: &TimelineEntry, kill: &KillCategory, limits: &DetailLimits) -> Self {
        Self {
            index,
            kind: entry.kind,
            timestamp_text: format_clock(entry.timestamp),
            name: entry.display_name().to_string(),
            details: details_for(entry, kill, limits),
            category: entry.category(kill),
        }
    }

    /// Case-insensitive match of an already-lowercased needle against the
    /// index, name and details.
    fn matches_needle(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.index.to_string().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.details.to_lowercase().contains(needle)
    }
}

/// A live `(searchText, categoryFilter)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub category: CategoryFilter,
}

impl Query {
    pub fn new(search: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    fn needle(&self) -> String {
        self.search.trim().to_lowercase()
    }

    fn keeps(&self, row: &DisplayRow, needle: &str) -> bool {
        self.category.admits_kind(row.kind, row.category) && row.matches_needle(needle)
    }
}

/// Project every entry of the timeline into a display row.
pub fn project(timeline: &Timeline, kill: &KillCategory, limits: &DetailLimits) -> Vec<DisplayRow> {
    timeline
        .iter()
        .enumerate()
        .map(|(index, entry)| DisplayRow::new(index, entry, kill, limits))
        .collect()
}

/// Filter an existing projection, keeping timeline order.
pub fn filter_rows<'r>(rows: &'r [DisplayRow], query: &Query) -> Vec<&'r DisplayRow> {
    let needle = query.needle();
    rows.iter().filter(|row| query.keeps(row, &needle)).collect()
}

/// Project and filter in one pass.
pub fn search(
    timeline: &Timeline,
    query: &Query,
    kill: &KillCategory,
    limits: &DetailLimits,
) -> Vec<DisplayRow> {
    let needle = query.needle();
    timeline
        .iter()
        .enumerate()
        .map(|(index, entry)| DisplayRow::new(index, entry, kill, limits))
        .filter(|row| query.keeps(row, &needle))
        .collect()
}

/// A line of the cursor context window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowItem {
    pub index: usize,
    pub kind: EntryKind,
    pub timestamp_text: String,
    pub name: String,
    /// Already dispatched (behind the cursor).
    pub dispatched: bool,
}

/// Entries in `[cursor - radius, cursor + radius)`, clamped to the timeline.
pub fn window_around(timeline: &Timeline, cursor: usize, radius: usize) -> Vec<WindowItem> {
    let start = cursor.saturating_sub(radius).min(timeline.len());
    let end = cursor.saturating_add(radius).min(timeline.len());
    timeline[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let index = start + offset;
            WindowItem {
                index,
                kind: entry.kind,
                timestamp_text: format_clock(entry.timestamp),
                name: entry.display_name().to_string(),
                dispatched: index < cursor,
            }
        })
        .collect()
}
