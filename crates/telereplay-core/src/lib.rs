//! Log-driven replay engine.
//!
//! Turns a free-form telemetry log (timestamped text lines with JSON
//! fragments embedded in them) into one chronologically ordered timeline,
//! and replays that timeline into a [`ReplaySink`] at a controllable rate.
//!
//! ```text
//!   raw text ──▶ extract (per line) ──▶ TimelineAssembler (sort + counters)
//!                                              │
//!                         ┌────────────────────┴───────────────────┐
//!                         ▼                                        ▼
//!               index (filter/search rows)          PlaybackMachine / ReplaySession
//!                                                                  │
//!                                                                  ▼
//!                                                             ReplaySink
//! ```
//!
//! # Modules
//!
//! |---------------|------------------------------------------------------|
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | [`extract`]   | One line → zero or more timeline candidates          |
//! | [`timeline`]  | Ordered, immutable [`Timeline`] plus [`Counters`]    |
//! | [`details`]   | Bounded `key=value` details text                     |
//! | [`index`]     | Display rows, search, cursor window                  |
//! | [`scheduler`] | Synchronous playback state machine                   |
//! | [`session`]   | Timer-driven actor around the machine                |
//! | [`sink`]      | Consumer trait and built-in sinks                    |
//! | [`source`]    | Where log text comes from                            |
//! | [`config`]    | [`ReplayConfig`], loadable from TOML                 |
//! |---------------|------------------------------------------------------|

pub mod config;
pub mod details;
pub mod error;
pub mod extract;
pub mod index;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod source;
pub mod timeline;

pub use config::{DetailLimits, ReplayConfig};
pub use error::{ConfigError, ReplayError, Result, SourceError};
pub use extract::{Candidate, Clock, FixedClock, Skip, SystemClock};
pub use index::{DisplayRow, Query, WindowItem};
pub use scheduler::{PlaybackMachine, PlaybackState, PlaybackStatus, TickOutcome};
pub use session::{ReplayHandle, ReplaySession, SessionView};
pub use sink::{JsonLinesSink, RecordingSink, ReplaySink, SinkCall};
pub use source::{FileSource, LogSource, TextSource};
pub use timeline::{Assembled, Counters, SkippedLine, Timeline, TimelineAssembler};
