//! Playback state machine.
//!
//! [`PlaybackMachine`] owns the cursor and the `{Idle, Playing, Paused}` state
//! for one timeline. It has no timer of its own: whoever drives it (the
//! session actor, or a test) calls [`PlaybackMachine::tick`] once per timer
//! period while the state is `Playing`.
//!
//! ```text
//!            start              tick @ end
//!   Idle ─────────────▶ Playing ──────────▶ Idle
//!    ▲  ◀───── stop ────  │  ▲
//!    │                pause  start
//!    │                    ▼  │
//!    └────── stop ───── Paused
//! ```
//!
//! `step` and `seek` move the cursor without changing state. Only `stop`
//! resets the cursor to zero.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use telereplay_types::{DispatchFilter, EntryKind, KillCategory, TimelineEntry};

use crate::sink::ReplaySink;
use crate::timeline::Timeline;

/// Playback state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Observable snapshot of a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub cursor: usize,
    pub length: usize,
    pub tick_interval_ms: u64,
    pub dispatch_filter: DispatchFilter,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The entry at this index went to the sink.
    Dispatched(usize),
    /// The entry at this index was passed over by the dispatch filter.
    Skipped(usize),
    /// The cursor was already at the end; the machine is now `Idle`.
    Finished,
    /// Not playing; nothing happened.
    NotPlaying,
}

/// The playback state machine for a single timeline.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    timeline: Timeline,
    cursor: usize,
    state: PlaybackState,
    tick_interval_ms: u64,
    minimum_tick_ms: u64,
    dispatch_filter: DispatchFilter,
    kill: KillCategory,
}

impl PlaybackMachine {
    pub fn new(timeline: Timeline, tick_interval_ms: u64, minimum_tick_ms: u64, kill: KillCategory) -> Self {
        Self {
            timeline,
            cursor: 0,
            state: PlaybackState::Idle,
            tick_interval_ms,
            minimum_tick_ms,
            dispatch_filter: DispatchFilter::All,
            kill,
        }
    }

    /// A fresh machine over a new timeline that keeps this machine's tick
    /// interval and dispatch filter.
    pub fn reload(&self, timeline: Timeline) -> Self {
        Self {
            timeline,
            cursor: 0,
            state: PlaybackState::Idle,
            tick_interval_ms: self.tick_interval_ms,
            minimum_tick_ms: self.minimum_tick_ms,
            dispatch_filter: self.dispatch_filter,
            kill: self.kill.clone(),
        }
    }

    // ── Observers ────────────────────────────────────────────────────────

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    pub fn dispatch_filter(&self) -> DispatchFilter {
        self.dispatch_filter
    }

    /// The interval a timer should actually use.
    pub fn effective_tick(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(self.minimum_tick_ms))
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            cursor: self.cursor,
            length: self.len(),
            tick_interval_ms: self.tick_interval_ms,
            dispatch_filter: self.dispatch_filter,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// `Idle|Paused → Playing`. Returns false if already playing.
    pub fn start(&mut self) -> bool {
        if self.state == PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Playing;
        true
    }

    /// `Playing → Paused`. Returns false in any other state.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Paused;
        true
    }

    /// Any state → `Idle`, cursor reset to zero.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.cursor = 0;
    }

    /// Dispatch the entry at the cursor and advance, regardless of state.
    /// Returns `None` at the end of the timeline.
    pub fn step(&mut self, sink: &mut dyn ReplaySink) -> Option<TickOutcome> {
        (self.cursor < self.len()).then(|| self.advance(sink))
    }

    /// Move the cursor, clamped to `[0, length]`. Dispatches nothing.
    pub fn seek(&mut self, target: usize) -> usize {
        self.cursor = target.min(self.len());
        self.cursor
    }

    /// One timer period while playing.
    pub fn tick(&mut self, sink: &mut dyn ReplaySink) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::NotPlaying;
        }
        if self.cursor >= self.len() {
            self.state = PlaybackState::Idle;
            return TickOutcome::Finished;
        }
        self.advance(sink)
    }

    /// Store a requested tick interval. The floor is applied at read time by
    /// [`effective_tick`](Self::effective_tick).
    pub fn set_tick_interval_ms(&mut self, ms: u64) {
        self.tick_interval_ms = ms;
    }

    pub fn set_dispatch_filter(&mut self, filter: DispatchFilter) {
        self.dispatch_filter = filter;
    }

    /// Dispatch (or skip) the entry at the cursor and advance by exactly one.
    fn advance(&mut self, sink: &mut dyn ReplaySink) -> TickOutcome {
        let index = self.cursor;
        let entry = &self.timeline[index];
        let outcome = if self.dispatch_filter.forwards(entry, &self.kill) {
            dispatch(entry, sink);
            TickOutcome::Dispatched(index)
        } else {
            TickOutcome::Skipped(index)
        };
        self.cursor += 1;
        outcome
    }
}

/// Forward one entry to the sink.
pub fn dispatch(entry: &TimelineEntry, sink: &mut dyn ReplaySink) {
    match entry.kind {
        EntryKind::Snapshot => sink.apply_info_snapshot(&entry.payload, entry.timestamp),
        EntryKind::Occurrence => {
            if entry.payload.get("events").is_some_and(Value::is_array) {
                sink.apply_event_batch(&entry.payload, entry.timestamp);
            } else {
                let batch = json!({ "events": [entry.payload.clone()] });
                sink.apply_event_batch(&batch, entry.timestamp);
            }
        }
    }
}
