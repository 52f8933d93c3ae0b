//! Per-interval packet aggregation
//!
//! The receiver never prints per packet. It counts packets and keeps only the
//! latest one; at most once per interval, and only if something arrived, the
//! count and the latest packet are handed out as a [`Summary`] and the
//! aggregator starts over.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One interval's worth of traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Packets received since the previous summary
    pub packet_count: u64,
    /// Most recent payload
    pub payload: Vec<u8>,
    /// Sender of the most recent payload
    pub from: SocketAddr,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "got {} packets, last {} bytes from {}",
            self.packet_count,
            self.payload.len(),
            self.from
        )
    }
}

#[derive(Debug)]
pub struct Aggregator {
    interval: Duration,
    last_packet: Option<(Vec<u8>, SocketAddr)>,
    packet_count: u64,
    last_print: Option<Instant>,
}

impl Aggregator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_packet: None,
            packet_count: 0,
            last_print: None,
        }
    }

    /// Packets counted since the last summary
    pub fn pending(&self) -> u64 {
        self.packet_count
    }

    pub fn record(&mut self, payload: Vec<u8>, from: SocketAddr) {
        self.last_packet = Some((payload, from));
        self.packet_count += 1;
    }

    /// Take a summary if a packet is waiting and the interval has passed
    ///
    /// The very first packet is summarized right away.
    pub fn flush_due(&mut self, now: Instant) -> Option<Summary> {
        if self.last_packet.is_none() {
            return None;
        }
        if let Some(last) = self.last_print {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }

        let (payload, from) = self.last_packet.take()?;
        let summary = Summary {
            packet_count: self.packet_count,
            payload,
            from,
        };
        self.packet_count = 0;
        self.last_print = Some(now);
        Some(summary)
    }
}
