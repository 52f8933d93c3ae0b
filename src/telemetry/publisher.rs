//! Per-tick telemetry delivery
//!
//! Each tick the publisher captures a [`TelemetrySnapshot`] and delivers it
//! through the first path that works:
//!
//! 1. the telemetry UDP endpoint, if it is enabled and has a live socket
//! 2. an atomic rewrite of the telemetry file
//!
//! Nothing is buffered or retried across ticks.

use super::sampler::Sampler;
use super::snapshot::TelemetrySnapshot;
use crate::host::TelemetrySource;
use crate::storage::write_atomic;
use crate::transport::TransportState;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How often running statistics are logged
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Where a snapshot ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent as one datagram
    Udp,
    /// Written to the telemetry file
    File,
    /// Neither path worked
    Dropped,
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::Udp => write!(f, "UDP"),
            Delivery::File => write!(f, "file"),
            Delivery::Dropped => write!(f, "dropped"),
        }
    }
}

/// Running publisher counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherStats {
    /// Ticks published
    pub ticks: u64,
    /// Snapshots sent over UDP
    pub datagrams_sent: u64,
    /// Bytes sent over UDP
    pub bytes_sent: u64,
    /// Snapshots written to the telemetry file
    pub file_writes: u64,
    /// Snapshots that could not be delivered at all
    pub dropped: u64,
    /// Field queries that came back empty
    pub field_failures: u64,
}

impl std::fmt::Display for PublisherStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ticks, {} datagrams ({} bytes), {} file writes, {} dropped, {} field failures",
            self.ticks,
            self.datagrams_sent,
            self.bytes_sent,
            self.file_writes,
            self.dropped,
            self.field_failures
        )
    }
}

/// Captures and delivers one snapshot per tick
#[derive(Debug)]
pub struct TelemetryPublisher {
    app_name: String,
    telemetry_file: PathBuf,
    stats: PublisherStats,
    last_stats_log: Instant,
}

impl TelemetryPublisher {
    pub fn new(app_name: impl Into<String>, telemetry_file: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            telemetry_file: telemetry_file.into(),
            stats: PublisherStats::default(),
            last_stats_log: Instant::now(),
        }
    }

    /// Destination of the file fallback
    pub fn telemetry_file(&self) -> &Path {
        &self.telemetry_file
    }

    pub fn stats(&self) -> &PublisherStats {
        &self.stats
    }

    /// Capture a snapshot from `source` and deliver it
    pub fn publish_tick<S: TelemetrySource + ?Sized>(
        &mut self,
        state: &TransportState,
        source: &mut S,
    ) -> Delivery {
        self.stats.ticks += 1;

        let mut sampler = Sampler::new(source);
        let snapshot = TelemetrySnapshot::capture_with(&self.app_name, &mut sampler);
        self.stats.field_failures += sampler.failures();

        let delivery = match snapshot.to_json_bytes() {
            Ok(bytes) => self.deliver(state, &bytes),
            Err(e) => {
                tracing::warn!("Error preparing telemetry payload: {}", e);
                self.stats.dropped += 1;
                Delivery::Dropped
            }
        };

        if self.last_stats_log.elapsed() >= STATS_LOG_INTERVAL {
            tracing::debug!("Telemetry: {}", self.stats);
            self.last_stats_log = Instant::now();
        }

        delivery
    }

    /// Deliver an already serialized snapshot
    pub fn deliver(&mut self, state: &TransportState, bytes: &[u8]) -> Delivery {
        if state.telemetry_ready() {
            if state.telemetry().send(bytes) {
                self.stats.datagrams_sent += 1;
                self.stats.bytes_sent += bytes.len() as u64;
                return Delivery::Udp;
            }
            tracing::debug!("Telemetry send failed, writing to file instead");
        }

        match write_atomic(&self.telemetry_file, bytes) {
            Ok(()) => {
                self.stats.file_writes += 1;
                Delivery::File
            }
            Err(e) => {
                tracing::warn!("Error writing telemetry file: {}", e);
                self.stats.dropped += 1;
                Delivery::Dropped
            }
        }
    }

    /// Log the final counters
    pub fn log_summary(&self) {
        tracing::info!("Telemetry publisher finished: {}", self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, TELEMETRY_FILENAME};
    use crate::host::{FieldGroup, MockTelemetrySource};
    use std::net::UdpSocket;
    use std::time::Duration;

    fn state_sending_to(port: u16) -> TransportState {
        let mut config = AppConfig::default();
        config.telemetry.port = port;
        config.input.enabled = false;
        let mut state = TransportState::new(&config);
        state.start();
        state
    }

    #[test]
    fn test_delivers_over_udp() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let dir = tempfile::tempdir().unwrap();
        let mut publisher = TelemetryPublisher::new("AC_RL", dir.path().join(TELEMETRY_FILENAME));
        let state = state_sending_to(port);
        let mut source = MockTelemetrySource::new();

        assert_eq!(publisher.publish_tick(&state, &mut source), Delivery::Udp);

        let mut buf = vec![0u8; 65536];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(value["app"], "AC_RL");
        assert!(!publisher.telemetry_file().exists());
        assert_eq!(publisher.stats().datagrams_sent, 1);
        assert_eq!(publisher.stats().bytes_sent, len as u64);
    }

    #[test]
    fn test_falls_back_to_file_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TELEMETRY_FILENAME);
        let mut publisher = TelemetryPublisher::new("AC_RL", &path);

        let mut config = AppConfig::default();
        config.telemetry.enabled = false;
        config.input.enabled = false;
        let state = TransportState::new(&config);

        let mut source = MockTelemetrySource::new();
        assert_eq!(publisher.publish_tick(&state, &mut source), Delivery::File);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tyres"].as_array().unwrap().len(), 4);
        assert_eq!(publisher.stats().file_writes, 1);
    }

    #[test]
    fn test_dropped_when_file_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(TELEMETRY_FILENAME);
        let mut publisher = TelemetryPublisher::new("AC_RL", path);
        let state = TransportState::new(&AppConfig::default());

        let mut source = MockTelemetrySource::new();
        assert_eq!(publisher.publish_tick(&state, &mut source), Delivery::Dropped);
        assert_eq!(publisher.stats().dropped, 1);
    }

    #[test]
    fn test_counts_field_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut publisher = TelemetryPublisher::new("AC_RL", dir.path().join(TELEMETRY_FILENAME));
        let state = TransportState::new(&AppConfig::default());

        let mut source = MockTelemetrySource::new().with_failing_group(FieldGroup::Inputs);
        assert_eq!(publisher.publish_tick(&state, &mut source), Delivery::File);
        assert_eq!(publisher.stats().field_failures, 5);
    }
}
