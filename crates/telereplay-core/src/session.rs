//! Async replay session.
//!
//! A single actor task owns the [`PlaybackMachine`], the sink and the
//! playback timer. [`ReplayHandle`] is the `Send + Sync` control surface:
//! every call sends a command over mpsc and waits for the oneshot reply, so
//! when `pause()` or `stop()` returns the timer is already gone.
//!
//! ```text
//!   ReplayHandle (Clone)        mpsc       ReplayActor (tokio task)
//!   ┌─────────────────────┐  ─────────▶  ┌──────────────────────────────┐
//!   │ .load_from()        │              │ PlaybackMachine + sink       │
//!   │ .start() .pause()   │  ◀─────────  │ ticker: Option<Interval>     │
//!   │ .step() .seek()     │   oneshot    │ watch::Sender<PlaybackStatus>│
//!   └─────────────────────┘              └──────────────────────────────┘
//! ```
//!
//! Text is read and assembled on the caller's side; only the finished
//! timeline crosses into the actor. The actor is aborted when the last
//! handle is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use telereplay_types::DispatchFilter;

use crate::config::ReplayConfig;
use crate::error::{ReplayError, Result};
use crate::extract::Clock;
use crate::index::{self, DisplayRow, Query, WindowItem};
use crate::scheduler::{PlaybackMachine, PlaybackStatus, TickOutcome};
use crate::sink::ReplaySink;
use crate::source::LogSource;
use crate::timeline::{Counters, Timeline, TimelineAssembler};

/// Aborts the actor task when the last reference is dropped.
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ============================================================================
// Commands (internal)
// ============================================================================

enum Command {
    Load {
        timeline: Timeline,
        counters: Counters,
        reply: oneshot::Sender<()>,
    },
    Start {
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Step {
        reply: oneshot::Sender<Option<TickOutcome>>,
    },
    Seek {
        target: usize,
        reply: oneshot::Sender<usize>,
    },
    PlayFrom {
        index: usize,
        reply: oneshot::Sender<usize>,
    },
    DispatchAt {
        index: usize,
        reply: oneshot::Sender<Option<TickOutcome>>,
    },
    SetTickInterval {
        ms: u64,
        reply: oneshot::Sender<()>,
    },
    SetDispatchFilter {
        filter: DispatchFilter,
        reply: oneshot::Sender<()>,
    },
    ForceResetMatch {
        reply: oneshot::Sender<()>,
    },
    ResetRoundStats {
        reply: oneshot::Sender<()>,
    },
    View {
        reply: oneshot::Sender<SessionView>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// A consistent read of the session: the timeline together with the status
/// and counters that belong to it.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub timeline: Timeline,
    pub status: PlaybackStatus,
    pub counters: Counters,
}

// ============================================================================
// ReplayHandle
// ============================================================================

/// Cloneable control surface for a running [`ReplaySession`].
#[derive(Clone)]
pub struct ReplayHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<PlaybackStatus>,
    assembler: Arc<TimelineAssembler>,
    config: Arc<ReplayConfig>,
    _task: Arc<AbortOnDrop>,
}

impl ReplayHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| ReplayError::SessionClosed)?;
        rx.await.map_err(|_| ReplayError::SessionClosed)
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Assemble `text` and replace the current timeline. Playback is stopped
    /// first.
    #[tracing::instrument(skip_all, name = "replay.load", fields(bytes = text.len()))]
    pub async fn load_log(&self, text: &str) -> Result<Counters> {
        let assembled = self.assembler.assemble_text(text);
        let counters = assembled.counters;
        self.call(|reply| Command::Load {
            timeline: assembled.timeline,
            counters,
            reply,
        })
        .await?;
        tracing::info!(
            snapshots = counters.snapshots,
            occurrences = counters.occurrences,
            kills = counters.kills,
            "log loaded"
        );
        Ok(counters)
    }

    /// Read from a source and load it. On a read failure the current
    /// timeline, cursor and state are left as they were.
    #[tracing::instrument(skip_all, name = "replay.load", fields(source = %source.describe()))]
    pub async fn load_from(&self, source: &dyn LogSource) -> Result<Counters> {
        let text = match source.read_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "log source read failed, keeping current timeline");
                return Err(ReplayError::LoadFailed(e));
            }
        };
        self.load_log(&text).await
    }

    // ── Playback control ─────────────────────────────────────────────────

    /// Begin or resume playback. Returns false if already playing.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn start(&self) -> Result<bool> {
        self.call(|reply| Command::Start { reply }).await
    }

    /// Pause playback. Returns false if not playing.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn pause(&self) -> Result<bool> {
        self.call(|reply| Command::Pause { reply }).await
    }

    /// Stop playback and rewind to the first entry.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn stop(&self) -> Result<()> {
        self.call(|reply| Command::Stop { reply }).await
    }

    /// Dispatch the entry at the cursor and advance. `None` at the end.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn step(&self) -> Result<Option<TickOutcome>> {
        self.call(|reply| Command::Step { reply }).await
    }

    /// Move the cursor, clamped to the timeline. Returns the new cursor.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn seek(&self, target: usize) -> Result<usize> {
        self.call(|reply| Command::Seek { target, reply }).await
    }

    /// Seek to `index` and start playing. Returns the cursor after seeking.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn play_from(&self, index: usize) -> Result<usize> {
        self.call(|reply| Command::PlayFrom { index, reply }).await
    }

    /// Seek to `index` and dispatch that one entry.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn dispatch_at(&self, index: usize) -> Result<Option<TickOutcome>> {
        self.call(|reply| Command::DispatchAt { index, reply }).await
    }

    /// Change the tick interval. A running timer is re-armed immediately.
    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn set_tick_interval_ms(&self, ms: u64) -> Result<()> {
        self.call(|reply| Command::SetTickInterval { ms, reply }).await
    }

    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn set_dispatch_filter(&self, filter: DispatchFilter) -> Result<()> {
        self.call(|reply| Command::SetDispatchFilter { filter, reply }).await
    }

    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn force_reset_match(&self) -> Result<()> {
        self.call(|reply| Command::ForceResetMatch { reply }).await
    }

    #[tracing::instrument(skip(self), name = "replay.control")]
    pub async fn reset_round_stats(&self) -> Result<()> {
        self.call(|reply| Command::ResetRoundStats { reply }).await
    }

    /// Stop playback and end the actor. Later calls fail with
    /// [`ReplayError::SessionClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.call(|reply| Command::Shutdown { reply }).await
    }

    // ── Observers ────────────────────────────────────────────────────────

    /// Latest published status.
    pub fn status(&self) -> PlaybackStatus {
        *self.status.borrow()
    }

    /// Watch every status transition.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }

    pub async fn view(&self) -> Result<SessionView> {
        self.call(|reply| Command::View { reply }).await
    }

    pub async fn counters(&self) -> Result<Counters> {
        Ok(self.view().await?.counters)
    }

    pub async fn timeline(&self) -> Result<Timeline> {
        Ok(self.view().await?.timeline)
    }

    /// Display rows for a query. Computed on the caller's side; the actor
    /// only hands over the timeline.
    pub async fn rows(&self, query: &Query) -> Result<Vec<DisplayRow>> {
        let timeline = self.timeline().await?;
        Ok(index::search(
            &timeline,
            query,
            &self.config.kill_event_names,
            &self.config.details,
        ))
    }

    /// The entries around the cursor.
    pub async fn window(&self) -> Result<Vec<WindowItem>> {
        let view = self.view().await?;
        Ok(index::window_around(
            &view.timeline,
            view.status.cursor,
            self.config.window_radius,
        ))
    }
}

// ============================================================================
// ReplaySession (actor)
// ============================================================================

/// Spawns replay actors.
pub struct ReplaySession;

impl ReplaySession {
    /// Spawn a session with an empty timeline. Must be called inside a tokio
    /// runtime.
    pub fn spawn<S>(config: ReplayConfig, sink: S) -> ReplayHandle
    where
        S: ReplaySink + 'static,
    {
        let assembler = TimelineAssembler::new(config.kill_event_names.clone());
        Self::spawn_with_assembler(config, assembler, sink)
    }

    /// Spawn with a specific clock for the ingestion-time fallback.
    pub fn spawn_with_clock<S>(config: ReplayConfig, clock: Arc<dyn Clock>, sink: S) -> ReplayHandle
    where
        S: ReplaySink + 'static,
    {
        let assembler = TimelineAssembler::with_clock(config.kill_event_names.clone(), clock);
        Self::spawn_with_assembler(config, assembler, sink)
    }

    fn spawn_with_assembler<S>(config: ReplayConfig, assembler: TimelineAssembler, sink: S) -> ReplayHandle
    where
        S: ReplaySink + 'static,
    {
        let machine = PlaybackMachine::new(
            Timeline::default(),
            config.tick_interval_ms,
            config.minimum_tick_ms,
            config.kill_event_names.clone(),
        );
        let (status_tx, status_rx) = watch::channel(machine.status());
        let (tx, rx) = mpsc::unbounded_channel();

        let actor = ReplayActor {
            machine,
            counters: Counters::default(),
            sink,
            ticker: None,
            status_tx,
        };
        let task = tokio::spawn(actor.run(rx));

        ReplayHandle {
            tx,
            status: status_rx,
            assembler: Arc::new(assembler),
            config: Arc::new(config),
            _task: Arc::new(AbortOnDrop(task.abort_handle())),
        }
    }
}

struct ReplayActor<S> {
    machine: PlaybackMachine,
    counters: Counters,
    sink: S,
    /// At most one live timer; `Some` exactly while playing.
    ticker: Option<Interval>,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl<S: ReplaySink> ReplayActor<S> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;

                cmd = rx.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        self.disarm();
                        self.machine.stop();
                        self.publish();
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },

                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }
        tracing::debug!("replay actor shutting down");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Load { timeline, counters, reply } => {
                self.disarm();
                self.machine.stop();
                self.machine = self.machine.reload(timeline);
                self.counters = counters;
                self.publish();
                let _ = reply.send(());
            }
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Pause { reply } => {
                let paused = self.machine.pause();
                self.disarm();
                self.publish();
                let _ = reply.send(paused);
            }
            Command::Stop { reply } => {
                self.disarm();
                self.machine.stop();
                self.publish();
                let _ = reply.send(());
            }
            Command::Step { reply } => {
                let outcome = self.machine.step(&mut self.sink);
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::Seek { target, reply } => {
                let cursor = self.machine.seek(target);
                self.publish();
                let _ = reply.send(cursor);
            }
            Command::PlayFrom { index, reply } => {
                let cursor = self.machine.seek(index);
                self.start();
                let _ = reply.send(cursor);
            }
            Command::DispatchAt { index, reply } => {
                self.machine.seek(index);
                let outcome = self.machine.step(&mut self.sink);
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::SetTickInterval { ms, reply } => {
                self.machine.set_tick_interval_ms(ms);
                if self.ticker.is_some() {
                    self.arm();
                }
                self.publish();
                let _ = reply.send(());
            }
            Command::SetDispatchFilter { filter, reply } => {
                self.machine.set_dispatch_filter(filter);
                self.publish();
                let _ = reply.send(());
            }
            Command::ForceResetMatch { reply } => {
                self.sink.force_reset_match();
                let _ = reply.send(());
            }
            Command::ResetRoundStats { reply } => {
                self.sink.reset_round_stats();
                let _ = reply.send(());
            }
            Command::View { reply } => {
                let _ = reply.send(SessionView {
                    timeline: self.machine.timeline().clone(),
                    status: self.machine.status(),
                    counters: self.counters,
                });
            }
            // Handled in run().
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn start(&mut self) -> bool {
        let started = self.machine.start();
        if started {
            self.arm();
        }
        self.publish();
        started
    }

    fn on_tick(&mut self) {
        let span = tracing::trace_span!("replay.tick", cursor = self.machine.cursor());
        let _enter = span.enter();

        match self.machine.tick(&mut self.sink) {
            TickOutcome::Finished => {
                self.disarm();
                tracing::info!(length = self.machine.len(), "replay complete");
            }
            TickOutcome::NotPlaying => self.disarm(),
            outcome => tracing::trace!(?outcome, "tick"),
        }
        self.publish();
    }

    /// Replace any running timer with a fresh one at the effective interval.
    /// The first tick fires one period from now.
    fn arm(&mut self) {
        let period = self.machine.effective_tick();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    fn disarm(&mut self) {
        self.ticker = None;
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.machine.status());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::extract::FixedClock;
    use crate::scheduler::PlaybackState;
    use crate::sink::RecordingSink;
    use crate::source::{FileSource, TextSource};

    const LOG: &str = "\
2024-01-01 10:00:00,000 {\"info\":{\"roster\":{\"p1\":\"Ana\"}}}
2024-01-01 10:00:01,000 {\"name\":\"kill_feed\",\"data\":{\"attacker\":\"Ana\",\"victim\":\"Bob\"}}
2024-01-01 10:00:02,000 {\"name\":\"heal\",\"data\":{\"amount\":40}}
2024-01-01 10:00:03,000 {\"name\":\"kill\",\"data\":{\"attacker\":\"Bob\",\"victim\":\"Ana\"}}
2024-01-01 10:00:04,000 {\"name\":\"round_end\"}
";

    fn session() -> (ReplayHandle, RecordingSink) {
        let sink = RecordingSink::new();
        let handle = ReplaySession::spawn_with_clock(
            ReplayConfig::default(),
            Arc::new(FixedClock(0)),
            sink.clone(),
        );
        (handle, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_to_completion() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        assert!(handle.start().await.unwrap());

        // Five dispatches plus one finishing tick.
        tokio::time::sleep(Duration::from_millis(150 * 6 + 10)).await;

        let status = handle.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.cursor, 5);
        assert_eq!(sink.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_dispatch_per_tick() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(150 * 2 + 10)).await;
        assert_eq!(sink.len(), 2);
        assert_eq!(handle.status().cursor, 2);
        assert_eq!(handle.status().state, PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_timer() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(160)).await;

        assert!(handle.pause().await.unwrap());
        let dispatched = sink.len();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.len(), dispatched);
        assert_eq!(handle.status().state, PlaybackState::Paused);
        assert_eq!(handle.status().cursor, dispatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_one_timer() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        assert!(handle.start().await.unwrap());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.start().await.unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_rewinds() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(310)).await;

        handle.stop().await.unwrap();
        let status = handle.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.cursor, 0);

        let dispatched = sink.len();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sink.len(), dispatched);
    }

    #[tokio::test]
    async fn test_seek_and_step() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        assert_eq!(handle.seek(3).await.unwrap(), 3);
        assert_eq!(handle.step().await.unwrap(), Some(TickOutcome::Dispatched(3)));
        assert_eq!(handle.status().cursor, 4);
        assert_eq!(sink.len(), 1);
        assert_eq!(handle.seek(100).await.unwrap(), 5);
        assert_eq!(handle.step().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dispatch_at() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        assert_eq!(handle.dispatch_at(1).await.unwrap(), Some(TickOutcome::Dispatched(1)));
        assert_eq!(handle.status().cursor, 2);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_from() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        assert_eq!(handle.play_from(3).await.unwrap(), 3);
        tokio::time::sleep(Duration::from_millis(150 * 3 + 10)).await;

        assert_eq!(sink.len(), 2);
        assert_eq!(handle.status().state, PlaybackState::Idle);
        assert_eq!(handle.status().cursor, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_only_dispatch() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.set_dispatch_filter(DispatchFilter::KillOnly).await.unwrap();
        for _ in 0..5 {
            handle.step().await.unwrap();
        }
        assert_eq!(handle.status().cursor, 5);
        // The snapshot plus two kills.
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_interval_floor_and_rearm() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.set_tick_interval_ms(1).await.unwrap();
        assert_eq!(handle.status().tick_interval_ms, 1);

        handle.start().await.unwrap();
        // Floored to 25ms.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(sink.len(), 1);

        handle.set_tick_interval_ms(1_000).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sink.len(), 1);
        tokio::time::sleep(Duration::from_millis(510)).await;
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_while_playing() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.set_tick_interval_ms(40).await.unwrap();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(90)).await;

        let counters = handle.load_log("{\"name\":\"only\"}\n").await.unwrap();
        assert_eq!(counters.occurrences, 1);

        let status = handle.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.cursor, 0);
        assert_eq!(status.length, 1);
        assert_eq!(status.tick_interval_ms, 40);

        let dispatched = sink.len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.len(), dispatched);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_timeline() {
        let (handle, _sink) = session();
        handle.load_from(&TextSource::new(LOG)).await.unwrap();
        handle.seek(2).await.unwrap();

        let err = handle
            .load_from(&FileSource::new("/nonexistent/match.log"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::LoadFailed(_)));

        let view = handle.view().await.unwrap();
        assert_eq!(view.timeline.len(), 5);
        assert_eq!(view.status.cursor, 2);
        assert_eq!(view.counters.kills, 2);
    }

    #[tokio::test]
    async fn test_match_control_passthrough() {
        let (handle, sink) = session();
        handle.force_reset_match().await.unwrap();
        handle.reset_round_stats().await.unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_rows_and_window() {
        let (handle, _sink) = session();
        handle.load_log(LOG).await.unwrap();

        let kills = handle
            .rows(&Query::new("", telereplay_types::CategoryFilter::KillOnly))
            .await
            .unwrap();
        assert_eq!(kills.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 3]);

        handle.seek(2).await.unwrap();
        let window = handle.window().await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window.iter().filter(|w| w.dispatched).count(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let (handle, _sink) = session();
        let mut rx = handle.subscribe();
        handle.load_log(LOG).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().length, 5);

        handle.seek(4).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().cursor, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_stops_timer() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(160)).await;
        assert_eq!(sink.len(), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clone_keeps_session_alive() {
        let (handle, sink) = session();
        handle.load_log(LOG).await.unwrap();
        let other = handle.clone();
        handle.start().await.unwrap();

        drop(handle);
        tokio::time::sleep(Duration::from_millis(150 * 2 + 10)).await;
        assert_eq!(sink.len(), 2);
        assert_eq!(other.status().cursor, 2);
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let (handle, _sink) = session();
        handle.shutdown().await.unwrap();
        assert!(matches!(handle.start().await, Err(ReplayError::SessionClosed)));
    }
}
