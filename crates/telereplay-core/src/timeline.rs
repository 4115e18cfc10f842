//! Timeline assembly.
//!
//! Runs the extractor over every line of a log, numbers the candidates in
//! extraction order, counts them, and stably sorts by
//! `(timestamp, sequence_hint)`. Lines that share a timestamp keep their file
//! order: simultaneous log lines are often causally ordered (a roster update
//! followed by the event it enables).

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use telereplay_types::{EntryKind, KillCategory, TimelineEntry};

use crate::extract::{self, Clock, Skip, SystemClock};

/// Byte order mark some editors write at the start of a text file.
const BOM: char = '\u{feff}';

/// An assembled, immutable timeline.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Arc<[TimelineEntry]>,
}

impl Timeline {
    /// Build a timeline, sorting by `(timestamp, sequence_hint)`.
    pub fn from_entries(mut entries: Vec<TimelineEntry>) -> Self {
        entries.sort_by_key(|e| (e.timestamp, e.sequence_hint));
        Self {
            entries: entries.into(),
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }
}

impl Deref for Timeline {
    type Target = [TimelineEntry];

    fn deref(&self) -> &[TimelineEntry] {
        &self.entries
    }
}

/// Summary counters for an assembled timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub snapshots: usize,
    pub occurrences: usize,
    /// Occurrences in the kill category.
    pub kills: usize,
    /// Occurrences outside the kill category.
    pub other_occurrences: usize,
}

impl Counters {
    fn record(&mut self, entry: &TimelineEntry, kill: &KillCategory) {
        match entry.kind {
            EntryKind::Snapshot => self.snapshots += 1,
            EntryKind::Occurrence => {
                self.occurrences += 1;
                if entry.is_kill(kill) {
                    self.kills += 1;
                } else {
                    self.other_occurrences += 1;
                }
            }
        }
    }
}

/// A line that contributed no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    /// One-based line number, blank lines included.
    pub line: usize,
    pub reason: Skip,
}

/// A timeline together with its counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembled {
    pub timeline: Timeline,
    pub counters: Counters,
    /// Non-blank lines that were not recognised, in file order.
    pub skipped: Vec<SkippedLine>,
}

/// Builds timelines from raw log text.
pub struct TimelineAssembler {
    kill: KillCategory,
    clock: Arc<dyn Clock>,
}

impl TimelineAssembler {
    pub fn new(kill: KillCategory) -> Self {
        Self::with_clock(kill, Arc::new(SystemClock))
    }

    /// Use a specific clock for the ingestion-time fallback.
    pub fn with_clock(kill: KillCategory, clock: Arc<dyn Clock>) -> Self {
        Self { kill, clock }
    }

    /// Assemble a full log payload. Lines may end in `\n` or `\r\n`; a
    /// leading byte order mark is ignored.
    pub fn assemble_text(&self, text: &str) -> Assembled {
        self.assemble(text.strip_prefix(BOM).unwrap_or(text).lines())
    }

    /// Assemble from individual lines. Never fails; a log with no usable
    /// lines yields an empty timeline and zero counters.
    pub fn assemble<I, S>(&self, lines: I) -> Assembled
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let span = tracing::debug_span!("replay.assemble");
        let _enter = span.enter();

        let mut entries = Vec::new();
        let mut counters = Counters::default();
        let mut next_hint: u64 = 0;
        let mut lines_read = 0usize;
        let mut skipped = Vec::new();

        for (number, line) in (1..).zip(lines) {
            let line = line.as_ref();
            lines_read = number;
            if line.is_empty() {
                continue;
            }

            match extract::try_extract(line, self.clock.as_ref()) {
                Ok(candidates) => {
                    for candidate in candidates {
                        let entry = candidate.into_entry(next_hint);
                        next_hint += 1;
                        counters.record(&entry, &self.kill);
                        entries.push(entry);
                    }
                }
                Err(reason) => {
                    tracing::trace!(?reason, line = number, "skipping log line");
                    skipped.push(SkippedLine { line: number, reason });
                }
            }
        }

        let timeline = Timeline::from_entries(entries);
        tracing::debug!(
            lines = lines_read,
            skipped = skipped.len(),
            entries = timeline.len(),
            snapshots = counters.snapshots,
            occurrences = counters.occurrences,
            kills = counters.kills,
            "timeline assembled"
        );

        Assembled {
            timeline,
            counters,
            skipped,
        }
    }
}
