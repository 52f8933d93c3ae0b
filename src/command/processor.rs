//! Command processing
//!
//! [`CommandProcessor::process`] applies one [`CommandMessage`] to the
//! [`TransportState`]. Each recognized key is handled on its own: a malformed
//! value is logged and skips only that action, the rest of the message still
//! applies.
//!
//! # Actions
//!
//! | Keys                                       | Effect                                    |
//! |--------------------------------------------|-------------------------------------------|
//! | `telemetry_udp_host` / `telemetry_udp_port` | New send-to destination, socket untouched |
//! | `use_udp_telemetry`                        | Open/close the telemetry socket           |
//! | `input_udp_host` / `input_udp_port`         | Close and rebind the command socket       |
//! | `use_input_udp`                            | Open/close the command socket             |
//! | `reset: true`                              | Host commands 68, 69; file rewritten      |
//!
//! Enabling an enabled transport or disabling a disabled one changes nothing.

use super::message::{
    CommandMessage, KEY_INPUT_HOST, KEY_INPUT_PORT, KEY_TELEMETRY_HOST, KEY_TELEMETRY_PORT,
    KEY_USE_INPUT, KEY_USE_TELEMETRY,
};
use crate::error::Result;
use crate::host::{HostActions, RESET_COMMAND_SEQUENCE};
use crate::storage::write_atomic;
use crate::transport::TransportState;
use std::net::SocketAddr;
use std::path::Path;

/// Where a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource<'a> {
    /// The persisted command file; rewritten after a reset
    File(&'a Path),
    /// A datagram on the command endpoint
    Datagram(SocketAddr),
}

impl std::fmt::Display for CommandSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSource::File(path) => write!(f, "file {}", path.display()),
            CommandSource::Datagram(addr) => write!(f, "UDP from {}", addr),
        }
    }
}

/// One independently applied part of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    TelemetryTarget,
    TelemetryTransport,
    InputTarget,
    InputTransport,
    Reset,
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandAction::TelemetryTarget => write!(f, "telemetry target"),
            CommandAction::TelemetryTransport => write!(f, "telemetry transport"),
            CommandAction::InputTarget => write!(f, "input target"),
            CommandAction::InputTransport => write!(f, "input transport"),
            CommandAction::Reset => write!(f, "reset"),
        }
    }
}

/// What a processed command did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReport {
    /// Actions that changed state or ran host commands
    pub applied: Vec<CommandAction>,
    /// Actions that were already in effect
    pub unchanged: Vec<CommandAction>,
    /// Actions skipped because of malformed values
    pub skipped: Vec<(CommandAction, String)>,
    /// Host reset commands were issued
    pub reset_triggered: bool,
    /// The command file was rewritten with `reset: false`
    pub file_rewritten: bool,
}

impl CommandReport {
    /// Whether anything changed
    pub fn changed_anything(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Applies command messages to the transport state
#[derive(Debug, Default)]
pub struct CommandProcessor {
    processed: u64,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages processed so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Apply `message` to `state`
    pub fn process(
        &mut self,
        state: &mut TransportState,
        message: &CommandMessage,
        source: CommandSource<'_>,
        host: &mut dyn HostActions,
    ) -> CommandReport {
        self.processed += 1;
        let mut report = CommandReport::default();

        if message.is_noop() {
            tracing::trace!("Command from {} has no recognized keys", source);
            return report;
        }

        if message.contains(KEY_TELEMETRY_HOST) || message.contains(KEY_TELEMETRY_PORT) {
            apply_telemetry_target(state, message, &mut report);
        }
        if let Some(flag) = message.flag(KEY_USE_TELEMETRY) {
            match flag {
                Ok(enable) => apply_telemetry_transport(state, enable, &mut report),
                Err(e) => skip(&mut report, CommandAction::TelemetryTransport, e.to_string()),
            }
        }
        if message.contains(KEY_INPUT_HOST) || message.contains(KEY_INPUT_PORT) {
            apply_input_target(state, message, &mut report);
        }
        if let Some(flag) = message.flag(KEY_USE_INPUT) {
            match flag {
                Ok(enable) => apply_input_transport(state, enable, &mut report),
                Err(e) => skip(&mut report, CommandAction::InputTransport, e.to_string()),
            }
        }
        if message.reset_requested() {
            apply_reset(message, source, host, &mut report);
        }

        if report.changed_anything() {
            tracing::debug!("Command from {} applied: {:?}", source, report.applied);
        }
        report
    }
}

fn skip(report: &mut CommandReport, action: CommandAction, reason: String) {
    tracing::warn!("Skipping {} from command: {}", action, reason);
    report.skipped.push((action, reason));
}

/// Resolve a (host, port) pair, defaulting each half to its current value
fn target_from(
    message: &CommandMessage,
    host_key: &str,
    port_key: &str,
    current_host: &str,
    current_port: u16,
) -> Result<(String, u16)> {
    let host = match message.host(host_key) {
        Some(host) => host?,
        None => current_host.to_string(),
    };
    let port = match message.port(port_key) {
        Some(port) => port?,
        None => current_port,
    };
    Ok((host, port))
}

fn apply_telemetry_target(
    state: &mut TransportState,
    message: &CommandMessage,
    report: &mut CommandReport,
) {
    let current = state.telemetry().endpoint();
    let target = target_from(
        message,
        KEY_TELEMETRY_HOST,
        KEY_TELEMETRY_PORT,
        &current.host,
        current.port,
    );

    match target {
        Ok((host, port)) if host == current.host && port == current.port => {
            report.unchanged.push(CommandAction::TelemetryTarget);
        }
        Ok((host, port)) => {
            state.telemetry_mut().retarget(host, port);
            tracing::info!(
                "Telemetry UDP target updated to {} via input",
                state.telemetry().endpoint()
            );
            report.applied.push(CommandAction::TelemetryTarget);
        }
        Err(e) => skip(report, CommandAction::TelemetryTarget, e.to_string()),
    }
}

fn apply_telemetry_transport(state: &mut TransportState, enable: bool, report: &mut CommandReport) {
    if enable {
        if state.telemetry_enabled() && state.telemetry().is_live() {
            report.unchanged.push(CommandAction::TelemetryTransport);
            return;
        }
        state.set_telemetry_enabled(true);
        if state.telemetry_mut().open() {
            tracing::info!(
                "Telemetry UDP enabled via input to {}",
                state.telemetry().endpoint()
            );
        } else {
            tracing::warn!("Could not enable telemetry UDP via input");
        }
        report.applied.push(CommandAction::TelemetryTransport);
    } else {
        if !state.telemetry_enabled() && !state.telemetry().is_live() {
            report.unchanged.push(CommandAction::TelemetryTransport);
            return;
        }
        state.telemetry_mut().close();
        state.set_telemetry_enabled(false);
        tracing::info!("Telemetry UDP disabled via input");
        report.applied.push(CommandAction::TelemetryTransport);
    }
}

fn apply_input_target(
    state: &mut TransportState,
    message: &CommandMessage,
    report: &mut CommandReport,
) {
    let current = state.command().endpoint();
    let target = target_from(message, KEY_INPUT_HOST, KEY_INPUT_PORT, &current.host, current.port);

    let (host, port) = match target {
        Ok(target) => target,
        Err(e) => return skip(report, CommandAction::InputTarget, e.to_string()),
    };

    let same_address = host == current.host && port == current.port;
    if same_address && (state.command().is_live() || !state.command_enabled()) {
        report.unchanged.push(CommandAction::InputTarget);
        return;
    }

    if state.command_enabled() {
        if state.command_mut().rebind(host, port) {
            tracing::info!("Input UDP socket bound to {}", state.command().endpoint());
        } else {
            tracing::warn!(
                "Could not bind input UDP socket to {}",
                state.command().endpoint()
            );
        }
    } else {
        state.command_mut().retarget(host, port);
        tracing::info!(
            "Input UDP address set to {} (transport disabled)",
            state.command().endpoint()
        );
    }
    report.applied.push(CommandAction::InputTarget);
}

fn apply_input_transport(state: &mut TransportState, enable: bool, report: &mut CommandReport) {
    if enable {
        if state.command_enabled() && state.command().is_live() {
            report.unchanged.push(CommandAction::InputTransport);
            return;
        }
        state.set_command_enabled(true);
        if state.command_mut().open() {
            tracing::info!(
                "Input UDP enabled via input to {}",
                state.command().endpoint()
            );
        } else {
            tracing::warn!("Could not enable input UDP via input");
        }
        report.applied.push(CommandAction::InputTransport);
    } else {
        if !state.command_enabled() && !state.command().is_live() {
            report.unchanged.push(CommandAction::InputTransport);
            return;
        }
        state.command_mut().close();
        state.set_command_enabled(false);
        tracing::info!("Input UDP disabled via input");
        report.applied.push(CommandAction::InputTransport);
    }
}

fn apply_reset(
    message: &CommandMessage,
    source: CommandSource<'_>,
    host: &mut dyn HostActions,
    report: &mut CommandReport,
) {
    for code in RESET_COMMAND_SEQUENCE {
        if let Err(e) = host.send_command(code) {
            tracing::warn!("Error calling reset command {}: {}", code, e);
        }
    }
    report.reset_triggered = true;
    report.applied.push(CommandAction::Reset);
    tracing::info!("Reset requested via {}", source);

    if let CommandSource::File(path) = source {
        let written = message
            .with_reset_cleared()
            .to_json_bytes()
            .and_then(|bytes| write_atomic(path, &bytes));
        match written {
            Ok(()) => report.file_rewritten = true,
            Err(e) => tracing::warn!("Error writing input file after reset: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::message::KEY_RESET;
    use crate::config::AppConfig;
    use crate::error::AcrlError;
    use crate::host::{MockHostActions, RecordingHostActions};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn started_state() -> TransportState {
        let mut config = AppConfig::default();
        config.input.port = 0;
        let mut state = TransportState::new(&config);
        state.start();
        state
    }

    fn datagram_source() -> CommandSource<'static> {
        CommandSource::Datagram("127.0.0.1:50000".parse().unwrap())
    }

    fn run(state: &mut TransportState, message: CommandMessage) -> CommandReport {
        let mut host = RecordingHostActions::new();
        CommandProcessor::new().process(state, &message, datagram_source(), &mut host)
    }

    #[test]
    fn test_retarget_telemetry_keeps_socket() {
        let mut state = started_state();
        let before = state.telemetry().local_addr();

        let report = run(&mut state, CommandMessage::new().with(KEY_TELEMETRY_PORT, 9999));

        assert_eq!(report.applied, vec![CommandAction::TelemetryTarget]);
        assert_eq!(state.telemetry().endpoint().port, 9999);
        assert_eq!(state.telemetry().endpoint().host, "127.0.0.1");
        assert_eq!(state.telemetry().local_addr(), before);
    }

    #[test]
    fn test_malformed_port_skips_only_that_action() {
        let mut state = started_state();
        let message = CommandMessage::new()
            .with(KEY_TELEMETRY_PORT, "not-a-port")
            .with(KEY_USE_TELEMETRY, false);

        let report = run(&mut state, message);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, CommandAction::TelemetryTarget);
        assert_eq!(report.applied, vec![CommandAction::TelemetryTransport]);
        assert_eq!(state.telemetry().endpoint().port, 9876);
        assert!(!state.telemetry_enabled());
    }

    #[test]
    fn test_disable_twice_is_idempotent() {
        let mut state = started_state();
        let disable = CommandMessage::new().with(KEY_USE_TELEMETRY, false);

        let first = run(&mut state, disable.clone());
        assert_eq!(first.applied, vec![CommandAction::TelemetryTransport]);

        let second = run(&mut state, disable);
        assert!(second.applied.is_empty());
        assert_eq!(second.unchanged, vec![CommandAction::TelemetryTransport]);
        assert!(!state.telemetry().is_live());
    }

    #[test]
    fn test_enable_when_enabled_keeps_handle() {
        let mut state = started_state();
        let before = state.command().local_addr();

        let report = run(&mut state, CommandMessage::new().with(KEY_USE_INPUT, true));

        assert_eq!(report.unchanged, vec![CommandAction::InputTransport]);
        assert_eq!(state.command().local_addr(), before);
    }

    #[test]
    fn test_input_rebind() {
        let mut state = started_state();
        let before = state.command().local_addr().unwrap();

        let report = run(&mut state, CommandMessage::new().with(KEY_INPUT_PORT, 0));

        // Same address as configured and already bound
        assert_eq!(report.unchanged, vec![CommandAction::InputTarget]);
        assert_eq!(state.command().local_addr(), Some(before));

        let probe = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let free_port = probe.local_addr().unwrap().port();
        drop(probe);

        let report = run(&mut state, CommandMessage::new().with(KEY_INPUT_PORT, free_port));
        assert_eq!(report.applied, vec![CommandAction::InputTarget]);
        assert_eq!(state.command().local_addr().map(|a| a.port()), Some(free_port));
    }

    #[test]
    fn test_input_target_while_disabled_only_retargets() {
        let mut state = started_state();
        run(&mut state, CommandMessage::new().with(KEY_USE_INPUT, false));

        let message = CommandMessage::new()
            .with(KEY_INPUT_PORT, 0)
            .with(KEY_INPUT_HOST, "localhost");
        let report = run(&mut state, message);

        assert_eq!(report.applied, vec![CommandAction::InputTarget]);
        assert!(!state.command().is_live());
        assert_eq!(state.command().endpoint().host, "localhost");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut state = started_state();
        let report = run(&mut state, CommandMessage::new().with("brake_bias", 0.6));
        assert_eq!(report, CommandReport::default());
    }

    #[test]
    fn test_processed_counts_every_message() {
        let mut state = started_state();
        let mut host = RecordingHostActions::new();
        let mut processor = CommandProcessor::new();

        processor.process(&mut state, &CommandMessage::new(), datagram_source(), &mut host);
        processor.process(
            &mut state,
            &CommandMessage::new().with(KEY_TELEMETRY_PORT, 9999),
            datagram_source(),
            &mut host,
        );

        assert_eq!(processor.processed(), 2);
    }

    #[test]
    fn test_reset_calls_host_in_order() {
        let mut state = started_state();
        let mut host = MockHostActions::new();
        let mut seq = Sequence::new();
        host.expect_send_command()
            .with(eq(68))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        host.expect_send_command()
            .with(eq(69))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let report = CommandProcessor::new().process(
            &mut state,
            &CommandMessage::new().with(KEY_RESET, true),
            datagram_source(),
            &mut host,
        );

        assert!(report.reset_triggered);
        assert!(!report.file_rewritten);
    }

    #[test]
    fn test_reset_host_failure_is_not_propagated() {
        let mut state = started_state();
        let mut host = MockHostActions::new();
        host.expect_send_command()
            .times(2)
            .returning(|code| Err(AcrlError::HostAction(format!("{} failed", code))));

        let report = CommandProcessor::new().process(
            &mut state,
            &CommandMessage::new().with(KEY_RESET, true),
            datagram_source(),
            &mut host,
        );
        assert!(report.reset_triggered);
    }

    #[test]
    fn test_reset_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AC_RL_input.json");
        std::fs::write(&path, r#"{"reset": true, "note": "keep"}"#).unwrap();

        let mut state = started_state();
        let mut host = RecordingHostActions::new();
        let message = CommandMessage::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let report = CommandProcessor::new().process(
            &mut state,
            &message,
            CommandSource::File(&path),
            &mut host,
        );

        assert!(report.file_rewritten);
        assert_eq!(host.commands(), &RESET_COMMAND_SEQUENCE);
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["reset"], serde_json::json!(false));
        assert_eq!(on_disk["note"], serde_json::json!("keep"));
    }
}
