//! acrl-publisher - runs the telemetry publisher against the simulated host
//!
//! The host loop is emulated at the configured tick rate until the tick limit
//! is reached or SIGINT/SIGTERM arrives.

use acrl_rs::{
    config::{AppConfig, AppPaths, CONFIG_FILENAME},
    host::{MockTelemetrySource, RecordingHostActions},
    logging, AcrlApp,
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "acrl-publisher", version, about = "Publish simulated telemetry over UDP")]
struct Cli {
    /// TOML config file (defaults to acrl.toml next to the executable, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the documents directory
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    /// Override the application directory
    #[arg(long)]
    app_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Nothing can be logged until the config has picked the log targets, so a
    // broken default config file is reported after logging::init
    let (mut config, load_error) = match &cli.config {
        Some(path) => (
            AppConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None,
        ),
        None => {
            let default_path = AppPaths::resolve(&Default::default())
                .app_dir()
                .join(CONFIG_FILENAME);
            match AppConfig::load_if_present(&default_path) {
                Ok(config) => (config.unwrap_or_default(), None),
                Err(e) => (AppConfig::default(), Some(e)),
            }
        }
    };
    if cli.documents_dir.is_some() {
        config.paths.documents_dir = cli.documents_dir.clone();
    }
    if cli.app_dir.is_some() {
        config.paths.app_dir = cli.app_dir.clone();
    }

    let paths = AppPaths::resolve(&config.paths);
    let _log_guard = logging::init(&config.logging, &paths.debug_log_file());
    if let Some(e) = load_error {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("Failed to register SIGTERM handler")?;

    let tick_rate = config.host.tick_rate_hz.max(1);
    let period = Duration::from_secs_f64(1.0 / tick_rate as f64);

    let mut app = AcrlApp::new(
        config,
        paths,
        MockTelemetrySource::new(),
        RecordingHostActions::new(),
    );
    app.start();

    let mut last = Instant::now();
    while !shutdown.load(Ordering::Relaxed) {
        if cli.ticks.is_some_and(|limit| app.ticks() >= limit) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        app.source_mut().advance(dt);
        app.on_tick(dt);

        let spent = now.elapsed();
        if spent < period {
            std::thread::sleep(period - spent);
        }
    }

    tracing::info!("Shutting down...");
    app.shutdown();

    Ok(())
}
