//! Integration tests for the aggregating receiver

mod common;

use acrl_rs::{ReceiverConfig, TelemetryReceiver};
use std::net::UdpSocket;
use std::time::{Duration, Instant};

fn receiver(interval: Duration) -> TelemetryReceiver {
    TelemetryReceiver::bind(ReceiverConfig {
        bind: "127.0.0.1:0".to_string(),
        interval,
        timeout: Duration::from_millis(10),
        field: "inputs".to_string(),
    })
    .unwrap()
}

/// Step until `summaries` summaries were written or `limit` passes
fn collect(receiver: &mut TelemetryReceiver, summaries: usize, limit: Duration) -> String {
    let mut out = Vec::new();
    let mut written = 0;
    let deadline = Instant::now() + limit;
    while written < summaries && Instant::now() < deadline {
        if receiver.step(&mut out).unwrap() {
            written += 1;
        }
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn test_one_summary_for_many_packets() {
    let mut receiver = receiver(Duration::from_millis(500));
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = receiver.local_addr();

    sender.send_to(b"warmup", addr).unwrap();
    let warmup = collect(&mut receiver, 1, Duration::from_secs(2));
    assert!(warmup.starts_with("got 1 packets, last 6 bytes from "));
    assert!(warmup.contains("warmup"));

    for i in 0..5 {
        let payload = format!(r#"{{"inputs":{{"gas":{}}}}}"#, i);
        sender.send_to(payload.as_bytes(), addr).unwrap();
    }

    let text = collect(&mut receiver, 1, Duration::from_secs(3));
    let summaries: Vec<&str> = text.lines().filter(|l| l.starts_with("got ")).collect();
    assert_eq!(summaries.len(), 1, "output: {}", text);
    assert!(summaries[0].starts_with("got 5 packets, last 20 bytes from "));
    assert!(text.contains("\"gas\": 4"));
    assert_eq!(receiver.received(), 6);
}

#[test]
fn test_binary_payload_is_hexdumped() {
    let mut receiver = receiver(Duration::from_millis(100));
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender
        .send_to(&[0xff, 0x00, 0x41, 0x42], receiver.local_addr())
        .unwrap();

    let text = collect(&mut receiver, 1, Duration::from_secs(2));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], "binary data:");
    assert_eq!(lines[2], format!("00000000  {:<48}  ..AB", "ff 00 41 42"));
}

#[test]
fn test_quiet_interval_prints_nothing() {
    let mut receiver = receiver(Duration::from_millis(50));
    let text = collect(&mut receiver, 1, Duration::from_millis(200));
    assert!(text.is_empty());
}
