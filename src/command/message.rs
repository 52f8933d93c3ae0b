//! Command messages
//!
//! A command is a JSON object. Every recognized key is optional and
//! unrecognized keys are carried along untouched, so a file rewritten after a
//! `reset` keeps whatever else the writer put in it.

use crate::error::{AcrlError, Result};
use serde_json::{Map, Value};

/// Retarget the telemetry destination host
pub const KEY_TELEMETRY_HOST: &str = "telemetry_udp_host";
/// Retarget the telemetry destination port
pub const KEY_TELEMETRY_PORT: &str = "telemetry_udp_port";
/// Enable/disable the telemetry transport
pub const KEY_USE_TELEMETRY: &str = "use_udp_telemetry";
/// Rebind the command endpoint host
pub const KEY_INPUT_HOST: &str = "input_udp_host";
/// Rebind the command endpoint port
pub const KEY_INPUT_PORT: &str = "input_udp_port";
/// Enable/disable the command transport
pub const KEY_USE_INPUT: &str = "use_input_udp";
/// One-shot reset trigger
pub const KEY_RESET: &str = "reset";

/// All keys the processor acts on
pub const RECOGNIZED_KEYS: [&str; 7] = [
    KEY_TELEMETRY_HOST,
    KEY_TELEMETRY_PORT,
    KEY_USE_TELEMETRY,
    KEY_INPUT_HOST,
    KEY_INPUT_PORT,
    KEY_USE_INPUT,
    KEY_RESET,
];

/// A decoded control message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandMessage {
    fields: Map<String, Value>,
}

impl CommandMessage {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Decode from a parsed JSON value; only objects are accepted
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AcrlError::MalformedCommand(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Decode from raw UTF-8 JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| AcrlError::MalformedCommand(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Encode as compact JSON
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    /// Whether `key` is present (with any value)
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the message has none of the recognized keys
    pub fn is_noop(&self) -> bool {
        !RECOGNIZED_KEYS.iter().any(|key| self.contains(key))
    }

    /// Host value of `key`: `None` if absent, `Err` if not a non-empty string
    pub fn host(&self, key: &str) -> Option<Result<String>> {
        self.get(key).map(|value| match value {
            Value::String(host) if !host.trim().is_empty() => Ok(host.trim().to_string()),
            other => Err(AcrlError::MalformedCommand(format!(
                "{} must be a non-empty string, got {}",
                key, other
            ))),
        })
    }

    /// Port value of `key`: integers and numeric strings within 0..=65535
    pub fn port(&self, key: &str) -> Option<Result<u16>> {
        self.get(key).map(|value| {
            let parsed = match value {
                Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
                Value::String(s) => s.trim().parse::<u16>().ok(),
                _ => None,
            };
            parsed.ok_or_else(|| {
                AcrlError::MalformedCommand(format!("invalid {}: {}", key, value))
            })
        })
    }

    /// Boolean value of `key`
    pub fn flag(&self, key: &str) -> Option<Result<bool>> {
        self.get(key).map(|value| {
            value.as_bool().ok_or_else(|| {
                AcrlError::MalformedCommand(format!("{} must be a boolean, got {}", key, value))
            })
        })
    }

    /// Whether `reset` is exactly `true`
    pub fn reset_requested(&self) -> bool {
        matches!(self.get(KEY_RESET), Some(Value::Bool(true)))
    }

    /// Copy of this message with `reset` set back to `false`
    pub fn with_reset_cleared(&self) -> Self {
        let mut cleared = self.clone();
        cleared.fields.insert(KEY_RESET.to_string(), Value::Bool(false));
        cleared
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
