//! Publisher application
//!
//! [`AcrlApp`] is what the host drives: `start` once, `on_tick` once per frame
//! and `shutdown` once at the end. It owns the [`TransportState`] and wires the
//! command channel and the telemetry publisher together.
//!
//! Within a tick the order is fixed:
//!
//! 1. the command file is read and applied
//! 2. every queued command datagram is drained and applied
//! 3. a snapshot is captured and delivered
//!
//! A failure anywhere in a tick is logged and the tick is abandoned; nothing
//! propagates back into the host loop, including panics from the telemetry
//! source.

use crate::command::{
    CommandMessage, CommandProcessor, CommandReport, CommandSource, FileCommandSource,
};
use crate::config::{AppConfig, AppPaths};
use crate::host::{HostActions, TelemetrySource};
use crate::telemetry::{Delivery, PublisherStats, TelemetryPublisher};
use crate::transport::TransportState;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// One report per command processed this tick
    pub commands: Vec<CommandReport>,
    /// Where the snapshot went
    pub delivery: Delivery,
}

/// Lifecycle of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Created,
    Running,
    Stopped,
}

/// Telemetry publisher and command channel bound to one host
pub struct AcrlApp<S: TelemetrySource, H: HostActions> {
    config: AppConfig,
    state: TransportState,
    processor: CommandProcessor,
    file_commands: FileCommandSource,
    publisher: TelemetryPublisher,
    source: S,
    host: H,
    phase: AppPhase,
    ticks: u64,
    elapsed: f64,
}

impl<S: TelemetrySource, H: HostActions> AcrlApp<S, H> {
    pub fn new(config: AppConfig, paths: AppPaths, source: S, host: H) -> Self {
        let state = TransportState::new(&config);
        let publisher = TelemetryPublisher::new(config.app_name.clone(), paths.telemetry_file());

        Self {
            config,
            state,
            processor: CommandProcessor::new(),
            file_commands: FileCommandSource::new(paths),
            publisher,
            source,
            host,
            phase: AppPhase::Created,
            ticks: 0,
            elapsed: 0.0,
        }
    }

    /// Open the enabled transports
    pub fn start(&mut self) {
        if self.phase != AppPhase::Created {
            tracing::debug!("start() ignored in phase {:?}", self.phase);
            return;
        }

        tracing::info!("{} started", self.config.app_name);
        tracing::info!(
            "Telemetry file: {:?}, input file: {:?}",
            self.publisher.telemetry_file(),
            self.file_commands.paths().input_file()
        );
        self.state.start();
        self.phase = AppPhase::Running;
    }

    /// Run one tick
    ///
    /// Returns `None` when the app is not running or the tick was abandoned.
    pub fn on_tick(&mut self, delta_t: f64) -> Option<TickReport> {
        if self.phase != AppPhase::Running {
            return None;
        }

        self.ticks += 1;
        if delta_t.is_finite() && delta_t > 0.0 {
            self.elapsed += delta_t;
        }

        match catch_unwind(AssertUnwindSafe(|| self.tick())) {
            Ok(report) => Some(report),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Tick {} abandoned: {}", self.ticks, message);
                None
            }
        }
    }

    fn tick(&mut self) -> TickReport {
        let mut commands = Vec::new();

        if let Some(pending) = self.file_commands.read_pending() {
            commands.push(self.processor.process(
                &mut self.state,
                &pending.message,
                CommandSource::File(&pending.path),
                &mut self.host,
            ));
        }

        if self.state.command_enabled() {
            for datagram in self.state.command().poll() {
                match CommandMessage::from_slice(&datagram.payload) {
                    Ok(message) => commands.push(self.processor.process(
                        &mut self.state,
                        &message,
                        CommandSource::Datagram(datagram.source),
                        &mut self.host,
                    )),
                    Err(e) => {
                        tracing::warn!("Error parsing input UDP from {}: {}", datagram.source, e)
                    }
                }
            }
        }

        let delivery = self.publisher.publish_tick(&self.state, &mut self.source);

        TickReport { commands, delivery }
    }

    /// Close both transports; only the first call does anything
    pub fn shutdown(&mut self) {
        if self.phase == AppPhase::Stopped {
            return;
        }

        self.state.shutdown();
        self.publisher.log_summary();
        tracing::info!(
            "{} shut down after {} ticks ({:.1}s), {} commands processed",
            self.config.app_name,
            self.ticks,
            self.elapsed,
            self.processor.processed()
        );
        self.phase = AppPhase::Stopped;
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn stats(&self) -> &PublisherStats {
        self.publisher.stats()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sum of all positive tick deltas
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<S: TelemetrySource, H: HostActions> Drop for AcrlApp<S, H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
