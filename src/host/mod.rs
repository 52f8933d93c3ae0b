//! Host integration traits
//!
//! The host process (a simulator, a game, a test) is a black box reached
//! through two traits:
//!
//! - [`TelemetrySource`] answers named queries per field group. Every call is
//!   independently fallible and a whole group may be missing.
//! - [`HostActions`] executes numbered host commands (used by `reset`).
//!
//! [`mock`] provides a simulated host used by the `acrl-publisher` binary and
//! by the tests.

pub mod mock;

pub use mock::{MockTelemetrySource, RecordingHostActions};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host commands issued for a `reset` request, in order
pub const RESET_COMMAND_SEQUENCE: [u32; 2] = [68, 69];

/// Field groups of a telemetry snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldGroup {
    Session,
    Car,
    Inputs,
    Lap,
    Tyres,
    Stats,
}

impl std::fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldGroup::Session => "session_info",
            FieldGroup::Car => "car_info",
            FieldGroup::Inputs => "input_info",
            FieldGroup::Lap => "lap_info",
            FieldGroup::Tyres => "tyre_info",
            FieldGroup::Stats => "car_stats",
        };
        write!(f, "{}", name)
    }
}

/// Argument passed along with a host query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryArg {
    /// Car or tyre index
    Index(u32),
    /// Unit or selector such as `"kmh"` or `"i"`
    Text(&'static str),
    /// Boolean option such as "formatted"
    Flag(bool),
}

/// Source of host state sampled once per tick
///
/// # Example
///
/// ```ignore
/// let rpm = source.query(FieldGroup::Car, "get_rpm", &[QueryArg::Index(0)])?;
/// ```
pub trait TelemetrySource {
    /// Whether the provider for `group` is present at all
    fn provides(&self, _group: FieldGroup) -> bool {
        true
    }

    /// Run the named query; the returned value is passed through unchanged
    fn query(&mut self, group: FieldGroup, name: &str, args: &[QueryArg]) -> Result<Value>;
}

/// Actions the host can perform on request
#[cfg_attr(test, mockall::automock)]
pub trait HostActions {
    /// Execute a numbered host command
    fn send_command(&mut self, code: u32) -> Result<()>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn provides(&self, group: FieldGroup) -> bool {
        (**self).provides(group)
    }

    fn query(&mut self, group: FieldGroup, name: &str, args: &[QueryArg]) -> Result<Value> {
        (**self).query(group, name, args)
    }
}

impl<T: HostActions + ?Sized> HostActions for Box<T> {
    fn send_command(&mut self, code: u32) -> Result<()> {
        (**self).send_command(code)
    }
}
