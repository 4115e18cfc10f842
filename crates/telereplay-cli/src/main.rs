//! telereplay binary.
//!
//! Summarize, inspect and replay telemetry logs.
//!
//! ## Usage
//!
//! ```bash
//! # Entry count and counters
//! telereplay summary match.log
//!
//! # Filtered table of entries
//! telereplay inspect match.log --category kill --search ana
//!
//! # Replay into JSON lines on stdout
//! telereplay play match.log --interval-ms 50 --kill-only
//! telereplay --config replay.toml play match.log --from 120 --steps 10
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use telereplay_core::{
    FileSource, JsonLinesSink, LogSource, PlaybackState, Query, ReplayConfig, ReplaySession,
    TimelineAssembler,
};
use telereplay_types::{CategoryFilter, DispatchFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Replay line-oriented game telemetry logs.
#[derive(Parser, Debug)]
#[command(name = "telereplay", version)]
#[command(about = "Replay game telemetry logs into a state consumer")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entry count and counters
    Summary {
        log: PathBuf,
    },

    /// Print the display table
    Inspect {
        log: PathBuf,

        /// Case-insensitive search over index, name and details
        #[arg(long, default_value = "")]
        search: String,

        /// all, snapshot, occurrence or kill
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Replay into JSON lines on stdout
    Play {
        log: PathBuf,

        /// Tick interval (floored by the config minimum)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Only dispatch kill events (snapshots still go through)
        #[arg(long)]
        kill_only: bool,

        /// Start at this timeline index
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Dispatch this many entries manually instead of playing
        #[arg(long)]
        steps: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _otel_guard = init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReplayConfig::default(),
    };

    match cli.command {
        Command::Summary { log } => summary(&config, log).await,
        Command::Inspect {
            log,
            search,
            category,
            limit,
        } => inspect(&config, log, Query::new(search, category), limit).await,
        Command::Play {
            log,
            interval_ms,
            kill_only,
            from,
            steps,
        } => play(config, log, interval_ms, kill_only, from, steps).await,
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(feature = "telemetry")]
fn init_tracing() -> Option<telereplay_telemetry::OtelGuard> {
    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr));

    if !telereplay_telemetry::otel_enabled() {
        registry.init();
        return None;
    }
    match telereplay_telemetry::otel_layer("telereplay") {
        Ok((otel_layer, guard)) => {
            registry.with(otel_layer).init();
            Some(guard)
        }
        Err(e) => {
            registry.init();
            tracing::warn!(error = %e, "OTel export requested but unavailable");
            None
        }
    }
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn read_log(path: PathBuf) -> Result<String> {
    let source = FileSource::new(path);
    source
        .read_text()
        .await
        .with_context(|| format!("reading {}", source.describe()))
}

async fn summary(config: &ReplayConfig, log: PathBuf) -> Result<()> {
    let text = read_log(log).await?;
    let assembled = TimelineAssembler::new(config.kill_event_names.clone()).assemble_text(&text);
    let c = assembled.counters;

    println!("entries:      {}", assembled.timeline.len());
    println!("snapshots:    {}", c.snapshots);
    println!("occurrences:  {}", c.occurrences);
    println!("  kills:      {}", c.kills);
    println!("  other:      {}", c.other_occurrences);
    println!("skipped:      {}", assembled.skipped.len());
    if let Some(first) = assembled.skipped.first() {
        println!("  first:      line {} ({:?})", first.line, first.reason);
    }
    if let (Some(first), Some(last)) = (assembled.timeline.first(), assembled.timeline.last()) {
        println!(
            "span:         {} .. {}",
            telereplay_types::format_clock(first.timestamp),
            telereplay_types::format_clock(last.timestamp)
        );
    }
    Ok(())
}

async fn inspect(config: &ReplayConfig, log: PathBuf, query: Query, limit: Option<usize>) -> Result<()> {
    let text = read_log(log).await?;
    let timeline = TimelineAssembler::new(config.kill_event_names.clone())
        .assemble_text(&text)
        .timeline;
    let rows = telereplay_core::index::search(&timeline, &query, &config.kill_event_names, &config.details);

    println!("{:>6}  {:<12}  {:<5}  {:<20}  details", "#", "time", "cat", "name");
    let shown = limit.unwrap_or(rows.len());
    for row in rows.iter().take(shown) {
        println!(
            "{:>6}  {:<12}  {:<5}  {:<20}  {}",
            row.index,
            row.timestamp_text,
            row.category.to_string(),
            clip(&row.name, 20),
            row.details
        );
    }
    if rows.len() > shown {
        println!("… {} more", rows.len() - shown);
    }
    Ok(())
}

async fn play(
    config: ReplayConfig,
    log: PathBuf,
    interval_ms: Option<u64>,
    kill_only: bool,
    from: usize,
    steps: Option<usize>,
) -> Result<()> {
    let handle = ReplaySession::spawn(config, JsonLinesSink::new(std::io::stdout()));
    let counters = handle.load_from(&FileSource::new(log)).await?;
    tracing::info!(
        snapshots = counters.snapshots,
        occurrences = counters.occurrences,
        "replaying"
    );

    if let Some(ms) = interval_ms {
        handle.set_tick_interval_ms(ms).await?;
    }
    if kill_only {
        handle.set_dispatch_filter(DispatchFilter::KillOnly).await?;
    }
    handle.seek(from).await?;

    match steps {
        Some(n) => {
            for _ in 0..n {
                if handle.step().await?.is_none() {
                    break;
                }
            }
        }
        None => {
            let mut status = handle.subscribe();
            handle.start().await?;
            status
                .wait_for(|s| s.state == PlaybackState::Idle)
                .await
                .context("replay session ended unexpectedly")?;
        }
    }

    let status = handle.status();
    tracing::info!(cursor = status.cursor, length = status.length, "replay finished");
    handle.shutdown().await?;
    Ok(())
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
