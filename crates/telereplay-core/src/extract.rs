//! Entry extraction: one raw log line → zero or more timeline candidates.
//!
//! A line is read in three passes:
//!
//! 1. **Timestamp** — a leading `YYYY-MM-DD HH:MM:SS,mmm` is parsed as UTC;
//!    otherwise the ingestion time from the [`Clock`] is used.
//! 2. **Fragment** — the text between the first `{` and the last `}` is
//!    decoded as JSON.
//! 3. **Shape** — the decoded object is offered to an ordered list of shape
//!    parsers; the first one that matches wins:
//!
//! ```text
//! { "info": ... }                  → Snapshot (whole object)
//! { "events": [ ... ] }            → one Occurrence per element
//! { "events": { "events": [...] }} → one Occurrence per element
//! { "event": { "name": ... } }     → Occurrence (the `event` object)
//! { "name": ... }                  → Occurrence (whole object)
//! ```
//!
//! Anything else contributes nothing. Nothing here fails: malformed lines
//! are expected in real telemetry logs.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use telereplay_types::{EntryKind, TimelineEntry};

static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})\s+(\d{2}):(\d{2}):(\d{2}),(\d{3})")
        .expect("timestamp prefix pattern is valid")
});

// ============================================================================
// Clock
// ============================================================================

/// Source of the ingestion-time fallback timestamp.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        telereplay_types::now_millis()
    }
}

/// A clock frozen at one instant. Makes assembly reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// An extracted entry that has not been numbered yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: EntryKind,
    pub timestamp: i64,
    pub payload: Value,
}

impl Candidate {
    pub fn into_entry(self, sequence_hint: u64) -> TimelineEntry {
        TimelineEntry {
            kind: self.kind,
            timestamp: self.timestamp,
            payload: self.payload,
            sequence_hint,
        }
    }
}

/// Why a line contributed no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// No `{ ... }` pair on the line.
    NoFragment,
    /// The fragment is not valid JSON.
    InvalidJson,
    /// Valid JSON that matches no known shape.
    UnrecognizedShape,
}

// ============================================================================
// Shapes
// ============================================================================

/// The recognised shape of a decoded object.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Snapshot(Value),
    Batch(Vec<Value>),
    Single(Value),
}

/// Result of one shape parser. `NoMatch` hands the object back untouched
/// for the next parser.
enum Attempt {
    Matched(Shape),
    NoMatch(Map<String, Value>),
}

type ShapeParser = fn(Map<String, Value>) -> Attempt;

/// Shape parsers in priority order.
const SHAPE_PARSERS: [ShapeParser; 3] = [snapshot_shape, batch_shape, single_shape];

/// Classify a decoded JSON value. Non-objects never match.
pub fn classify(value: Value) -> Option<Shape> {
    let Value::Object(mut obj) = value else {
        return None;
    };
    for parse in SHAPE_PARSERS {
        match parse(obj) {
            Attempt::Matched(shape) => return Some(shape),
            Attempt::NoMatch(rest) => obj = rest,
        }
    }
    None
}

fn snapshot_shape(obj: Map<String, Value>) -> Attempt {
    if obj.get("info").is_some_and(is_truthy) {
        Attempt::Matched(Shape::Snapshot(Value::Object(obj)))
    } else {
        Attempt::NoMatch(obj)
    }
}

fn batch_shape(mut obj: Map<String, Value>) -> Attempt {
    let events = obj.get("events");
    let items = if matches!(events, Some(Value::Array(_))) {
        obj.remove("events")
    } else if matches!(events.and_then(|e| e.get("events")), Some(Value::Array(_))) {
        obj.remove("events")
            .and_then(|mut e| e.get_mut("events").map(Value::take))
    } else {
        None
    };
    match items {
        Some(Value::Array(items)) => Attempt::Matched(Shape::Batch(
            items.into_iter().filter(is_event_shaped).collect(),
        )),
        _ => Attempt::NoMatch(obj),
    }
}

fn single_shape(mut obj: Map<String, Value>) -> Attempt {
    let nested_named = matches!(
        obj.get("event"),
        Some(Value::Object(event)) if event.get("name").is_some_and(is_truthy)
    );
    if nested_named {
        if let Some(event) = obj.remove("event") {
            return Attempt::Matched(Shape::Single(event));
        }
    }
    if obj.get("name").is_some_and(is_truthy) {
        return Attempt::Matched(Shape::Single(Value::Object(obj)));
    }
    Attempt::NoMatch(obj)
}

/// An event object carries a `name` or a nested `data`.
fn is_event_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("name") || o.contains_key("data"))
}

/// Presence test used for shape sniffing: null, false, 0 and "" are absent.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Line extraction
// ============================================================================

/// Parse a leading `YYYY-MM-DD HH:MM:SS,mmm` as UTC milliseconds.
pub fn parse_timestamp_prefix(line: &str) -> Option<i64> {
    let caps = TIMESTAMP_PREFIX.captures(line)?;
    let field = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };

    let year = i32::try_from(field(1)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    let time = date.and_hms_milli_opt(field(4)?, field(5)?, field(6)?, field(7)?)?;
    Some(time.and_utc().timestamp_millis())
}

/// The substring from the first `{` through the last `}`.
pub fn json_fragment(line: &str) -> Option<&str> {
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    (end > start).then(|| &line[start..=end])
}

/// Extract candidates from one line, reporting why a line was skipped.
#[tracing::instrument(level = "trace", skip_all, name = "extract.line", fields(len = line.len()))]
pub fn try_extract(line: &str, clock: &dyn Clock) -> Result<Vec<Candidate>, Skip> {
    let fragment = json_fragment(line).ok_or(Skip::NoFragment)?;
    let value: Value = serde_json::from_str(fragment).map_err(|_| Skip::InvalidJson)?;
    let shape = classify(value).ok_or(Skip::UnrecognizedShape)?;

    let timestamp = parse_timestamp_prefix(line).unwrap_or_else(|| clock.now_millis());
    let candidates = match shape {
        Shape::Snapshot(payload) => vec![Candidate {
            kind: EntryKind::Snapshot,
            timestamp,
            payload,
        }],
        Shape::Batch(events) => events
            .into_iter()
            .map(|payload| Candidate {
                kind: EntryKind::Occurrence,
                timestamp,
                payload,
            })
            .collect(),
        Shape::Single(payload) => vec![Candidate {
            kind: EntryKind::Occurrence,
            timestamp,
            payload,
        }],
    };
    Ok(candidates)
}

/// Extract candidates from one line. Malformed lines yield nothing.
pub fn extract(line: &str, clock: &dyn Clock) -> Vec<Candidate> {
    try_extract(line, clock).unwrap_or_default()
}
