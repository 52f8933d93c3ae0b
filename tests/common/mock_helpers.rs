//! Mock construction helpers

use acrl_rs::config::AppConfig;
use acrl_rs::host::{MockTelemetrySource, RecordingHostActions};
use acrl_rs::AcrlApp;
use std::net::{SocketAddr, UdpSocket};

use super::builders::TestDirs;

pub type TestApp = AcrlApp<MockTelemetrySource, RecordingHostActions>;

/// Started app against the simulated host
pub fn create_test_app(config: AppConfig, dirs: &TestDirs) -> TestApp {
    create_test_app_with_source(config, dirs, MockTelemetrySource::new())
}

pub fn create_test_app_with_source(
    config: AppConfig,
    dirs: &TestDirs,
    source: MockTelemetrySource,
) -> TestApp {
    let mut app = AcrlApp::new(config, dirs.paths(), source, RecordingHostActions::new());
    app.start();
    app
}

/// Loopback socket standing in for a telemetry consumer
pub fn bind_test_receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    let port = socket.local_addr().expect("local addr").port();
    (socket, port)
}

/// Send one command datagram to `addr`
pub fn send_command(bytes: &[u8], addr: SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind sender");
    socket.send_to(bytes, addr).expect("send command");
}

/// Address of the app's live command endpoint
pub fn command_addr(app: &TestApp) -> SocketAddr {
    app.state()
        .command()
        .local_addr()
        .expect("command endpoint is live")
}

/// Tick until `done` holds, sleeping briefly between ticks
///
/// Returns whether `done` held within `max_ticks`.
pub fn tick_until(
    app: &mut TestApp,
    max_ticks: usize,
    mut done: impl FnMut(&TestApp) -> bool,
) -> bool {
    for _ in 0..max_ticks {
        app.on_tick(1.0 / 60.0);
        if done(app) {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    false
}
