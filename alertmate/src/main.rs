//! alertmate - capture notifications, count them per source, relay them
//!
//! This tool provides commands for:
//! - Running the capture pipeline over a stream of notification events
//! - Setting or clearing the ingestion endpoint
//! - Showing configuration and device status
//!
//! Uses XDG Base Directory specification for file locations:
//! - Settings: $XDG_DATA_HOME/alertmate/settings.toml (~/.local/share/alertmate/settings.toml)
//! - Logs: $XDG_STATE_HOME/alertmate/ (~/.local/state/alertmate/)
//! - Config: $XDG_CONFIG_HOME/alertmate/config.toml (~/.config/alertmate/config.toml)
//!
//! `run` reads one JSON object per line, e.g.
//!
//! ```text
//! {"kind":"posted","source_id":"com.chat.app","key":"0|com.chat.app|7","post_time":1700000000000,"extras":{"title":"Hi","text":"there"}}
//! {"kind":"removed","source_id":"com.chat.app","key":"0|com.chat.app|7"}
//! ```

mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use alertmate_core::forward::ForwardStats;
use alertmate_core::{
    device, CaptureListener, Config, Counts, Pipeline, SettingsStore, SourceMessage,
    Subscription,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "alertmate")]
#[command(about = "Capture notifications, count them per source and relay them")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/alertmate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs for commands other than `run`
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Feed notification events (JSON lines) through the capture pipeline
    Run {
        /// Read events from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show or change the ingestion endpoint
    Endpoint {
        #[command(subcommand)]
        action: EndpointAction,
    },

    /// Show configuration and device status
    Status,
}

#[derive(Subcommand)]
enum EndpointAction {
    /// Print the current endpoint
    Show,
    /// Set the endpoint URL (e.g. http://192.168.1.10:8082/ingest)
    Set { url: String },
    /// Disable forwarding
    Clear,
}

/// How the input loop ended
enum Ending {
    EndOfInput,
    Interrupted,
}

#[derive(Debug, Default)]
struct FeedStats {
    lines: u64,
    posted: u64,
    removed: u64,
    malformed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let run_pipeline = matches!(args.command, Command::Run { .. });
    let _log_guard = if run_pipeline || args.verbose {
        Some(alertmate_core::logging::init(&config.logging).context("failed to initialize logging")?)
    } else {
        None
    };

    match args.command {
        Command::Run { input } => cmd_run(&config, input.as_deref()),
        Command::Endpoint { action } => cmd_endpoint(action),
        Command::Status => cmd_status(&config, args.config.as_deref()),
    }
}

fn cmd_run(config: &Config, input: Option<&Path>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    let result = runtime.block_on(run(config, input));

    // A pending stdin read cannot be cancelled, so don't wait on it
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn run(config: &Config, input: Option<&Path>) -> Result<()> {
    tracing::info!("alertmate run starting");

    let pipeline = Pipeline::start(config).context("failed to start pipeline")?;

    println!("Device:   {}", pipeline.device_id());
    println!("Endpoint: {}", describe_endpoint(&pipeline.settings().get()));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    // Display consumers
    let background = [
        tokio::spawn(log_counts(pipeline.aggregation().subscribe())),
        tokio::spawn(log_endpoint(pipeline.settings().subscribe())),
        tokio::spawn(watch::watch_settings(Arc::clone(pipeline.settings()))),
    ];

    let mut feed_stats = FeedStats::default();
    let mut read_error = None;
    let ending = tokio::select! {
        result = feed(reader, pipeline.listener(), &mut feed_stats) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Input stream failed");
                read_error = Some(e);
            }
            Ending::EndOfInput
        }
        _ = tokio::signal::ctrl_c() => Ending::Interrupted,
    };

    match ending {
        Ending::EndOfInput => {
            let in_flight = pipeline.forwarder().in_flight();
            if in_flight > 0 {
                println!("Waiting for {} in-flight dispatch(es)...", in_flight);
            }
            pipeline.forwarder().drain().await;
        }
        Ending::Interrupted => {
            eprintln!("\nShutting down...");
            pipeline.forwarder().shutdown().await;
        }
    }

    for task in &background {
        task.abort();
    }

    print_summary(
        &pipeline.aggregation().snapshot(),
        &pipeline.forwarder().stats(),
        &feed_stats,
    );

    tracing::info!(
        lines = feed_stats.lines,
        posted = feed_stats.posted,
        removed = feed_stats.removed,
        malformed = feed_stats.malformed,
        forward = ?pipeline.forwarder().stats(),
        "alertmate run complete"
    );

    match read_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Read JSON lines and hand each message to the listener.
///
/// Lines are read as bytes so that one line of invalid UTF-8 is skipped like
/// any other malformed line. Only I/O errors end the feed early.
async fn feed(
    mut reader: Box<dyn AsyncBufRead + Unpin + Send>,
    listener: &CaptureListener,
    stats: &mut FeedStats,
) -> Result<()> {
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .context("failed to read input")?;
        if read == 0 {
            break;
        }

        stats.lines += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<SourceMessage>(&line) {
            Ok(SourceMessage::Posted(raw)) => {
                stats.posted += 1;
                listener.on_event_posted(raw);
            }
            Ok(SourceMessage::Removed(removed)) => {
                stats.removed += 1;
                listener.on_event_removed(&removed);
            }
            Err(e) => {
                stats.malformed += 1;
                tracing::warn!(line = stats.lines, error = %e, "Skipping malformed event");
                eprintln!("Skipping line {}: {}", stats.lines, e);
            }
        }
    }

    Ok(())
}

async fn log_counts(mut counts: Subscription<Counts>) {
    while let Some(snapshot) = counts.next().await {
        tracing::info!(
            sources = snapshot.len(),
            total = snapshot.values().sum::<u64>(),
            counts = ?snapshot,
            "Counts updated"
        );
    }
}

async fn log_endpoint(mut endpoint: Subscription<String>) {
    while let Some(url) = endpoint.next().await {
        tracing::info!(endpoint = %describe_endpoint(&url), "Endpoint");
    }
}

fn print_summary(counts: &Counts, forward: &ForwardStats, feed: &FeedStats) {
    println!();
    if counts.is_empty() {
        println!("No notifications captured.");
    } else {
        println!("Captured notifications:");
        let width = counts.keys().map(String::len).max().unwrap_or(0);
        for (source, count) in counts {
            println!("  {:<width$}  {:>6}", source, count, width = width);
        }
    }

    println!();
    println!(
        "Input:      {} line(s), {} posted, {} removed, {} malformed",
        feed.lines, feed.posted, feed.removed, feed.malformed
    );
    println!(
        "Forwarding: {} attempted, {} delivered, {} failed, {} cancelled",
        forward.attempted, forward.delivered, forward.failed, forward.cancelled
    );
}

fn cmd_endpoint(action: EndpointAction) -> Result<()> {
    let settings = SettingsStore::open(Config::settings_path());

    match action {
        EndpointAction::Show => {
            println!("{}", describe_endpoint(&settings.get()));
        }
        EndpointAction::Set { url } => {
            let trimmed = url.trim();
            if !trimmed.is_empty()
                && !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
            {
                eprintln!("Warning: {} is not an http(s) URL", trimmed);
            }
            settings
                .try_set(trimmed)
                .context("failed to save endpoint")?;
            println!("Endpoint: {}", describe_endpoint(&settings.get()));
        }
        EndpointAction::Clear => {
            settings.try_set("").context("failed to save endpoint")?;
            println!("Endpoint: {}", describe_endpoint(&settings.get()));
        }
    }

    Ok(())
}

fn cmd_status(config: &Config, config_override: Option<&Path>) -> Result<()> {
    let config_path = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);

    println!("alertmate Status");
    println!("================");
    println!();
    println!(
        "Config:          {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!("Settings:        {}", Config::settings_path().display());
    println!("Logs:            {}", alertmate_core::logging::log_dir().display());
    println!();

    let settings = SettingsStore::open(Config::settings_path());
    let device_id = device::resolve(config.device.id.as_deref(), &Config::device_id_path());

    println!("Endpoint:        {}", describe_endpoint(&settings.get()));
    println!("Device ID:       {}", device_id);
    println!("Self source ID:  {}", config.capture.self_source_id);
    println!(
        "Timeout:         {}",
        config
            .forwarder
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "transport default".to_string())
    );

    Ok(())
}

fn describe_endpoint(url: &str) -> String {
    if url.is_empty() {
        "disabled (no endpoint set)".to_string()
    } else {
        url.to_string()
    }
}
