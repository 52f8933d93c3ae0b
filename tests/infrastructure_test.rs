//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{ConfigBuilder, TestDirs};
use common::mock_helpers::create_test_app;

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let config = ConfigBuilder::new()
        .telemetry_enabled(false)
        .input_enabled(false)
        .build();
    let dirs = TestDirs::new();

    assert!(!config.telemetry.enabled);
    assert_eq!(config.input.port, 0);
    assert_eq!(dirs.paths().data_dir(), dirs.documents.path());

    let app = create_test_app(config, &dirs);
    assert!(!app.state().telemetry().is_live());
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}

#[test]
fn test_free_udp_port_is_bindable() {
    let port = common::free_udp_port();
    assert!(std::net::UdpSocket::bind(("127.0.0.1", port)).is_ok());
}
