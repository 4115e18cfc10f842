//! The consumer side of playback.
//!
//! A [`ReplaySink`] receives two fire-and-forget commands. The scheduler never
//! waits on a result; sink failures are the sink's own business, so the
//! built-in [`JsonLinesSink`] logs write errors instead of returning them.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

/// A state consumer fed by the playback scheduler.
pub trait ReplaySink: Send {
    /// Apply a full state snapshot.
    fn apply_info_snapshot(&mut self, payload: &Value, timestamp: i64);

    /// Apply a batch of discrete events. `payload` always carries an
    /// `events` array.
    fn apply_event_batch(&mut self, payload: &Value, timestamp: i64);

    /// Discard all accumulated match state.
    fn force_reset_match(&mut self) {}

    /// Reset per-round statistics.
    fn reset_round_stats(&mut self) {}
}

impl<S: ReplaySink + ?Sized> ReplaySink for Box<S> {
    fn apply_info_snapshot(&mut self, payload: &Value, timestamp: i64) {
        (**self).apply_info_snapshot(payload, timestamp);
    }

    fn apply_event_batch(&mut self, payload: &Value, timestamp: i64) {
        (**self).apply_event_batch(payload, timestamp);
    }

    fn force_reset_match(&mut self) {
        (**self).force_reset_match();
    }

    fn reset_round_stats(&mut self) {
        (**self).reset_round_stats();
    }
}

// ============================================================================
// JsonLinesSink
// ============================================================================

#[derive(Serialize)]
struct CommandLine<'a> {
    command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a Value>,
}

/// Writes one JSON object per command to a writer.
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Number of lines successfully written.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: CommandLine<'_>) {
        let result = serde_json::to_writer(&mut self.out, &line)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        match result {
            Ok(()) => self.written += 1,
            Err(e) => tracing::warn!(command = line.command, error = %e, "sink write failed"),
        }
    }
}

impl<W: Write + Send> ReplaySink for JsonLinesSink<W> {
    fn apply_info_snapshot(&mut self, payload: &Value, timestamp: i64) {
        self.emit(CommandLine {
            command: "apply_info_snapshot",
            timestamp: Some(timestamp),
            payload: Some(payload),
        });
    }

    fn apply_event_batch(&mut self, payload: &Value, timestamp: i64) {
        self.emit(CommandLine {
            command: "apply_event_batch",
            timestamp: Some(timestamp),
            payload: Some(payload),
        });
    }

    fn force_reset_match(&mut self) {
        self.emit(CommandLine {
            command: "force_reset_match",
            timestamp: None,
            payload: None,
        });
    }

    fn reset_round_stats(&mut self) {
        self.emit(CommandLine {
            command: "reset_round_stats",
            timestamp: None,
            payload: None,
        });
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// A command received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    InfoSnapshot { payload: Value, timestamp: i64 },
    EventBatch { payload: Value, timestamp: i64 },
    ForceResetMatch,
    ResetRoundStats,
}

impl SinkCall {
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::InfoSnapshot { timestamp, .. } | Self::EventBatch { timestamp, .. } => Some(*timestamp),
            Self::ForceResetMatch | Self::ResetRoundStats => None,
        }
    }
}

/// Records every command it receives. Clones share the same log, so one
/// clone can be handed to a session while another inspects the calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl ReplaySink for RecordingSink {
    fn apply_info_snapshot(&mut self, payload: &Value, timestamp: i64) {
        self.calls.lock().push(SinkCall::InfoSnapshot {
            payload: payload.clone(),
            timestamp,
        });
    }

    fn apply_event_batch(&mut self, payload: &Value, timestamp: i64) {
        self.calls.lock().push(SinkCall::EventBatch {
            payload: payload.clone(),
            timestamp,
        });
    }

    fn force_reset_match(&mut self) {
        self.calls.lock().push(SinkCall::ForceResetMatch);
    }

    fn reset_round_stats(&mut self) {
        self.calls.lock().push(SinkCall::ResetRoundStats);
    }
}
