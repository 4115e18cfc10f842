//! End-to-end replay scenarios through the public API.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use telereplay_core::{
    index, FileSource, FixedClock, PlaybackMachine, PlaybackState, Query, RecordingSink,
    ReplayConfig, ReplayError, ReplaySession, SinkCall, TimelineAssembler,
};
use telereplay_types::{CategoryFilter, DispatchFilter, EntryKind, KillCategory};

const INGEST_NOW: i64 = 1_900_000_000_000;

fn assembler() -> TimelineAssembler {
    TimelineAssembler::with_clock(KillCategory::default(), Arc::new(FixedClock(INGEST_NOW)))
}

#[test]
fn timestamped_snapshot_line() {
    let out = assembler().assemble_text(
        "2024-01-01 10:00:00,000 {\"info\":{\"match_info\":{\"map\":\"X\"}}}\n",
    );
    assert_eq!(out.timeline.len(), 1);
    let entry = &out.timeline[0];
    assert_eq!(entry.kind, EntryKind::Snapshot);
    assert_eq!(entry.timestamp, 1_704_103_200_000);
    assert_eq!(entry.payload["info"]["match_info"]["map"], "X");
}

#[test]
fn untimestamped_batch_uses_ingestion_time() {
    let out = assembler().assemble_text(
        "{\"events\":[{\"name\":\"kill_feed\",\"data\":\"{}\"},{\"name\":\"heal\",\"data\":\"{}\"}]}\n",
    );
    assert_eq!(out.timeline.len(), 2);
    assert!(out.timeline.iter().all(|e| e.timestamp == INGEST_NOW));
    assert_eq!(out.timeline[0].event_name(), Some("kill_feed"));
    assert_eq!(out.timeline[1].event_name(), Some("heal"));
    assert_eq!(out.counters.kills, 1);
    assert_eq!(out.counters.other_occurrences, 1);
}

#[test]
fn lines_are_sorted_by_timestamp() {
    let out = assembler().assemble_text(
        "2024-01-01 10:00:05,000 {\"name\":\"b\"}\n2024-01-01 10:00:01,000 {\"name\":\"a\"}\n",
    );
    let names: Vec<_> = out.timeline.iter().filter_map(|e| e.event_name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn scheduler_plays_five_entries_then_idles() {
    let text = (0..5)
        .map(|i| format!("2024-01-01 10:00:0{i},000 {{\"name\":\"e{i}\"}}"))
        .collect::<Vec<_>>()
        .join("\n");
    let timeline = assembler().assemble_text(&text).timeline;
    let mut machine = PlaybackMachine::new(timeline, 150, 25, KillCategory::default());
    let mut sink = RecordingSink::new();

    machine.start();
    for _ in 0..5 {
        machine.tick(&mut sink);
    }
    assert_eq!(sink.len(), 5);
    machine.tick(&mut sink);
    assert_eq!(machine.state(), PlaybackState::Idle);
    assert_eq!(machine.cursor(), 5);

    let names: Vec<_> = sink
        .calls()
        .into_iter()
        .map(|c| match c {
            SinkCall::EventBatch { payload, .. } => payload["events"][0]["name"].clone(),
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(names, vec![json!("e0"), json!("e1"), json!("e2"), json!("e3"), json!("e4")]);
}

#[test]
fn malformed_lines_never_fail_the_batch() {
    let out = assembler().assemble_text(
        "garbage\n{\"events\":\"nope\"}\n{\"name\":\"ok\"}\n{\"info\":null}\n{ unclosed\n",
    );
    assert_eq!(out.timeline.len(), 1);
    assert_eq!(out.timeline[0].event_name(), Some("ok"));
}

#[test]
fn display_filter_does_not_reorder() {
    let out = assembler().assemble_text(
        "2024-01-01 10:00:02,000 {\"name\":\"kill\",\"data\":{\"attacker\":\"A\",\"victim\":\"B\"}}\n\
         2024-01-01 10:00:01,000 {\"info\":{\"team\":\"red\"}}\n\
         2024-01-01 10:00:03,000 {\"name\":\"heal\"}\n",
    );
    let config = ReplayConfig::default();
    let rows = index::search(
        &out.timeline,
        &Query::new("", CategoryFilter::OccurrenceOnly),
        &config.kill_event_names,
        &config.details,
    );
    assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rows[0].details, "A → B");
}

#[tokio::test(start_paused = true)]
async fn session_replays_file_into_sink() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..4 {
        writeln!(file, "2024-01-01 10:00:0{i},000 {{\"name\":\"kill\",\"data\":{{\"n\":{i}}}}}").unwrap();
    }
    writeln!(file, "2024-01-01 10:00:09,000 {{\"name\":\"heal\"}}").unwrap();

    let sink = RecordingSink::new();
    let handle = ReplaySession::spawn(ReplayConfig::default(), sink.clone());
    let counters = handle.load_from(&FileSource::new(file.path())).await.unwrap();
    assert_eq!(counters.kills, 4);
    assert_eq!(counters.other_occurrences, 1);

    handle.set_dispatch_filter(DispatchFilter::KillOnly).await.unwrap();
    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(150 * 6 + 10)).await;

    let status = handle.status();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.cursor, 5);
    assert_eq!(sink.len(), 4);
}

#[tokio::test]
async fn failed_reload_leaves_replay_intact() {
    let handle = ReplaySession::spawn(ReplayConfig::default(), RecordingSink::new());
    handle.load_log("{\"name\":\"a\"}\n{\"name\":\"b\"}\n").await.unwrap();
    handle.step().await.unwrap();

    let err = handle
        .load_from(&FileSource::new("/definitely/not/here.log"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::LoadFailed(_)));
    assert_eq!(handle.status().cursor, 1);
    assert_eq!(handle.status().length, 2);
}
