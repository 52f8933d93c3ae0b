//! acrl-receiver - prints one summary per interval of received telemetry

use acrl_rs::{
    config::LoggingConfig,
    logging,
    receiver::{ReceiverConfig, TelemetryReceiver},
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "acrl-receiver", version, about = "Aggregate and print telemetry datagrams")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:9876")]
    bind: String,

    /// Milliseconds between summaries
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Receive timeout in milliseconds
    #[arg(short, long, default_value_t = 100)]
    timeout_ms: u64,

    /// JSON field printed from each summarized snapshot
    #[arg(short, long, default_value = "inputs")]
    field: String,

    /// Also write diagnostics to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = LoggingConfig {
        level: "info".to_string(),
        console: true,
        file: cli.log_file.is_some(),
    };
    let _log_guard = logging::init(
        &logging_config,
        cli.log_file.as_deref().unwrap_or_else(|| std::path::Path::new(".")),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("Failed to register SIGTERM handler")?;

    let mut receiver = TelemetryReceiver::bind(ReceiverConfig {
        bind: cli.bind.clone(),
        interval: Duration::from_millis(cli.interval_ms),
        timeout: Duration::from_millis(cli.timeout_ms),
        field: cli.field,
    })
    .with_context(|| format!("Failed to listen on {}", cli.bind))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summaries = receiver.run(&shutdown, &mut out)?;

    tracing::info!("Stopped after {} summaries", summaries);
    Ok(())
}
