//! jiggled - anti-sleep daemon.
//!
//! Watches for human input and nudges the pointer (one pixel out and back)
//! once the session has been idle long enough, so the OS idle timers never
//! fire.

mod activity;
mod config;
mod input;
mod pointer;
mod scheduler;

use crate::activity::ActivityTracker;
use crate::config::Config;
use crate::input::InputWatcher;
use crate::pointer::{NullPointer, PointerSink, X11Pointer};
use crate::scheduler::{JigglePolicy, JiggleScheduler};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code when physical mode is requested without a usable display.
const EXIT_NO_DISPLAY: i32 = 2;

/// Anti-sleep daemon.
///
/// Keeps the workstation awake by jiggling the pointer after a period of
/// inactivity. Flags override values from the config file.
#[derive(Parser, Debug)]
#[command(name = "jiggled")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seconds without activity before jiggling starts.
    #[arg(long)]
    idle: Option<u64>,

    /// Minimum seconds between jiggles while inactivity continues.
    #[arg(long)]
    interval: Option<u64>,

    /// Pixels moved per jiggle (out and back).
    #[arg(long)]
    pixels: Option<u16>,

    /// Show a log line for every jiggle.
    #[arg(short, long)]
    verbose: bool,

    /// Don't move the pointer or register input hooks; bookkeeping and
    /// logging only. Works without a display.
    #[arg(long)]
    dry_run: bool,

    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.verbose)?;

    info!("jiggled v{} starting", env!("CARGO_PKG_VERSION"));

    // Load config and apply CLI overrides
    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(idle) = args.idle {
        config.idle_seconds = idle;
    }
    if let Some(interval) = args.interval {
        config.interval_seconds = interval;
    }
    if let Some(pixels) = args.pixels {
        config.pixels = pixels;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    config.validate().context("Invalid configuration")?;

    // Check the environment before touching the display
    if !config.dry_run && env::var("DISPLAY").is_err() {
        error!("No X display detected (DISPLAY is not set).");
        error!("Use --dry-run to exercise the scheduler in headless environments.");
        process::exit(EXIT_NO_DISPLAY);
    }

    run_daemon(&config).await
}

/// Initialize logging with the specified level.
///
/// `--verbose` lowers the default filter to debug so per-jiggle lines show.
fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let level = if verbose && level == "info" {
        "debug"
    } else {
        level
    };
    let filter = EnvFilter::try_new(format!("jiggled={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Run the polling loop until interrupted.
async fn run_daemon(config: &Config) -> Result<()> {
    let tracker = Arc::new(ActivityTracker::new(Instant::now()));

    // Acquire the display collaborators, or none in dry-run mode
    let (sink, watcher): (Box<dyn PointerSink>, Option<InputWatcher>) = if config.dry_run {
        (Box::new(NullPointer), None)
    } else {
        let sink = match X11Pointer::connect() {
            Ok(sink) => sink,
            Err(e) => {
                error!("Input subsystem unavailable: {e}");
                process::exit(EXIT_NO_DISPLAY);
            }
        };
        let watcher = match InputWatcher::start(tracker.clone()) {
            Ok(watcher) => watcher,
            Err(e) => {
                error!("Input subsystem unavailable: {e:#}");
                process::exit(EXIT_NO_DISPLAY);
            }
        };
        (Box::new(sink), Some(watcher))
    };

    let policy = JigglePolicy {
        idle_threshold: Duration::from_secs(config.idle_seconds),
        jiggle_interval: Duration::from_secs(config.interval_seconds),
        pixels: config.pixel_delta(),
    };
    let mut scheduler = JiggleScheduler::new(policy, tracker.clone(), sink, StdRng::from_entropy());

    let mode = if config.dry_run { "DRY-RUN" } else { "NORMAL" };
    info!("Anti-sleep active ({mode}). Ctrl+C to exit.");
    info!(
        "Idle: {}s | Interval: {}s | Pixels: {}",
        config.idle_seconds, config.interval_seconds, config.pixels
    );

    // Fixed sub-second cadence, independent of the policy thresholds
    let mut poll = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                scheduler.tick(Instant::now());
            }

            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for interrupt signal")?;
                info!("Interrupt received, shutting down");
                break;
            }
        }
    }

    if let Some(watcher) = watcher {
        watcher.shutdown();
    }
    info!("jiggled stopped");
    Ok(())
}
