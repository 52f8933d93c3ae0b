//! Aggregating telemetry receiver
//!
//! A standalone consumer of the telemetry stream. It listens on one UDP
//! address, aggregates packets per interval and writes one summary per
//! interval to any [`Write`] sink:
//!
//! ```text
//! got 58 packets, last 2417 bytes from 127.0.0.1:53012
//! {
//!   "gas": 0.83,
//!   ...
//! }
//! ```

pub mod aggregator;
pub mod payload;

pub use aggregator::{Aggregator, Summary};
pub use payload::{classify, hexdump, PayloadView};

use crate::config::{DEFAULT_TELEMETRY_HOST, DEFAULT_TELEMETRY_PORT};
use crate::error::{AcrlError, Result};
use crate::transport::MAX_DATAGRAM_SIZE;
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Receiver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Address to listen on
    pub bind: String,
    /// Minimum time between summaries
    pub interval: Duration,
    /// Receive timeout; bounds how late a summary or a stop request is noticed
    pub timeout: Duration,
    /// JSON field shown from each summarized snapshot
    pub field: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind: format!("{}:{}", DEFAULT_TELEMETRY_HOST, DEFAULT_TELEMETRY_PORT),
            interval: Duration::from_millis(1000),
            timeout: Duration::from_millis(100),
            field: "inputs".to_string(),
        }
    }
}

/// Bound receiver socket plus aggregation state
#[derive(Debug)]
pub struct TelemetryReceiver {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: ReceiverConfig,
    aggregator: Aggregator,
    buf: Vec<u8>,
    received: u64,
}

impl TelemetryReceiver {
    /// Bind the listening socket
    pub fn bind(config: ReceiverConfig) -> Result<Self> {
        let transport_err = |source| AcrlError::Transport {
            endpoint: config.bind.clone(),
            source,
        };

        let socket = UdpSocket::bind(config.bind.as_str()).map_err(transport_err)?;
        // A zero timeout would mean "block forever"
        let timeout = config.timeout.max(Duration::from_millis(1));
        socket.set_read_timeout(Some(timeout)).map_err(transport_err)?;
        let local_addr = socket.local_addr().map_err(transport_err)?;

        tracing::info!("Telemetry receiver listening on {}", local_addr);

        Ok(Self {
            socket,
            local_addr,
            aggregator: Aggregator::new(config.interval),
            config,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
            received: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Total packets received
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Receive at most one packet, then print a summary if one is due
    ///
    /// Returns whether a summary was written.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<bool> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, from)) => {
                self.aggregator.record(self.buf[..len].to_vec(), from);
                self.received += 1;
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => tracing::warn!("Receive error on {}: {}", self.local_addr, e),
        }

        match self.aggregator.flush_due(Instant::now()) {
            Some(summary) => {
                write_summary(out, &summary, &self.config.field)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Loop until `shutdown` is set
    ///
    /// Returns the number of summaries written.
    pub fn run<W: Write>(&mut self, shutdown: &AtomicBool, out: &mut W) -> Result<u64> {
        let mut summaries = 0;
        while !shutdown.load(Ordering::Relaxed) {
            if self.step(out)? {
                summaries += 1;
            }
        }
        Ok(summaries)
    }
}

impl Drop for TelemetryReceiver {
    fn drop(&mut self) {
        tracing::info!(
            "Telemetry receiver on {} closed after {} packets",
            self.local_addr,
            self.received
        );
    }
}

/// Write a summary line followed by the classified payload
pub fn write_summary<W: Write>(out: &mut W, summary: &Summary, field: &str) -> Result<()> {
    writeln!(out, "{}", summary)?;
    writeln!(out, "{}", classify(&summary.payload, field))?;
    out.flush()?;
    Ok(())
}
