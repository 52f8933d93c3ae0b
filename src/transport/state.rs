//! Process-wide transport state
//!
//! One [`TransportState`] is owned by the tick handler and passed by reference
//! to the components that need it. Readers get shared references; only the
//! command processor (and the start/shutdown lifecycle) receives `&mut` access
//! to the endpoints.

use super::endpoint::{Endpoint, EndpointRole, ManagedEndpoint};
use crate::config::AppConfig;

/// Enabled flags and endpoints of both transports
#[derive(Debug)]
pub struct TransportState {
    telemetry_enabled: bool,
    command_enabled: bool,
    telemetry: ManagedEndpoint,
    command: ManagedEndpoint,
}

impl TransportState {
    /// Create the startup state from config; nothing is opened yet
    pub fn new(config: &AppConfig) -> Self {
        Self {
            telemetry_enabled: config.telemetry.enabled,
            command_enabled: config.input.enabled,
            telemetry: ManagedEndpoint::new(
                Endpoint::from_config(&config.telemetry, EndpointRole::Telemetry),
                EndpointRole::Telemetry,
            ),
            command: ManagedEndpoint::new(
                Endpoint::from_config(&config.input, EndpointRole::Command),
                EndpointRole::Command,
            ),
        }
    }

    /// Open every enabled transport
    pub fn start(&mut self) {
        tracing::info!(
            "Telemetry configured for UDP {} (enabled: {}), input UDP {} (enabled: {})",
            self.telemetry.endpoint(),
            self.telemetry_enabled,
            self.command.endpoint(),
            self.command_enabled
        );

        if self.telemetry_enabled {
            self.telemetry.open();
        }
        if self.command_enabled {
            self.command.open();
        }
    }

    /// Release both sockets and mark both transports disabled
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.telemetry.close();
        self.command.close();
        self.telemetry_enabled = false;
        self.command_enabled = false;
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    pub fn command_enabled(&self) -> bool {
        self.command_enabled
    }

    /// Telemetry-out endpoint
    pub fn telemetry(&self) -> &ManagedEndpoint {
        &self.telemetry
    }

    /// Command-in endpoint
    pub fn command(&self) -> &ManagedEndpoint {
        &self.command
    }

    /// Whether a snapshot can go out over UDP this tick
    pub fn telemetry_ready(&self) -> bool {
        self.telemetry_enabled && self.telemetry.is_live()
    }

    pub(crate) fn set_telemetry_enabled(&mut self, enabled: bool) {
        self.telemetry_enabled = enabled;
    }

    pub(crate) fn set_command_enabled(&mut self, enabled: bool) {
        self.command_enabled = enabled;
    }

    pub(crate) fn telemetry_mut(&mut self) -> &mut ManagedEndpoint {
        &mut self.telemetry
    }

    pub(crate) fn command_mut(&mut self) -> &mut ManagedEndpoint {
        &mut self.command
    }
}
