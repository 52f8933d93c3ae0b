//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use serde_json::Value;
use std::net::UdpSocket;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(100)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// A loopback UDP port that was free a moment ago
pub fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind ephemeral port");
    socket.local_addr().expect("local addr").port()
}

/// Receive one datagram and parse it as JSON
pub fn recv_json(socket: &UdpSocket) -> Value {
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set read timeout");
    let mut buf = vec![0u8; 65536];
    let (len, _) = socket.recv_from(&mut buf).expect("datagram within timeout");
    serde_json::from_slice(&buf[..len]).expect("JSON datagram")
}

/// Discard queued datagrams; returns how many were read
///
/// Waits up to [`test_timeout`] for each datagram.
pub fn drain_datagrams(socket: &UdpSocket) -> usize {
    socket
        .set_read_timeout(Some(test_timeout()))
        .expect("set read timeout");
    let mut buf = vec![0u8; 65536];
    let mut count = 0;
    while socket.recv_from(&mut buf).is_ok() {
        count += 1;
    }
    count
}

/// Read and parse a JSON file
pub fn read_json(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path).expect("readable file");
    serde_json::from_str(&text).expect("JSON file")
}
