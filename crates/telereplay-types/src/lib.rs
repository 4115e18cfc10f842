//! Shared timeline types for telereplay.
//!
//! This crate is the vocabulary the rest of the workspace speaks: what a
//! timeline entry is, how entries are categorised, and how category filters
//! admit them. It has **no internal telereplay dependencies**.
//!
//! # Key Types
//!
//! |-----------------------|-----------------------------------------------|
//! | Type                  | Purpose                                       |
//! |-----------------------|-----------------------------------------------|
//! | [`TimelineEntry`]     | One Snapshot or Occurrence with its timestamp |
//! | [`EntryKind`]         | Snapshot vs Occurrence                        |
//! | [`EventCategory`]     | Display tag: Info, Kill, Event                |
//! | [`KillCategory`]      | Which event names count as "kill"             |
//! | [`CategoryFilter`]    | Display filter (All/Snapshot/Occurrence/Kill) |
//! | [`DispatchFilter`]    | What the scheduler forwards to the sink       |
//! |-----------------------|-----------------------------------------------|

pub mod category;
pub mod entry;
pub mod time;

pub use category::{CategoryFilter, DispatchFilter, EventCategory, KillCategory};
pub use entry::{EntryKind, TimelineEntry};
pub use time::{format_clock, now_millis};
