//! Simulated host for running without a game
//!
//! [`MockTelemetrySource`] produces a plausible, deterministic driving session
//! from a simulated clock. Individual queries, whole groups or group providers
//! can be made to fail, which is how the tests exercise partial sampling.
//!
//! [`RecordingHostActions`] records every host command it is asked to run.
//!
//! # Example
//!
//! ```ignore
//! use acrl_rs::host::{FieldGroup, MockTelemetrySource};
//!
//! let mut source = MockTelemetrySource::new()
//!     .with_failing_group(FieldGroup::Lap)
//!     .with_missing_group(FieldGroup::Stats);
//! source.advance(0.016);
//! ```

use super::{FieldGroup, HostActions, QueryArg, TelemetrySource};
use crate::error::{AcrlError, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Simulated lap length in seconds
const LAP_SECONDS: f64 = 90.0;

/// Simulated track length in metres
const TRACK_LENGTH_M: f64 = 3600.0;

/// Deterministic telemetry source driven by a simulated clock
#[derive(Debug, Clone, Default)]
pub struct MockTelemetrySource {
    /// Simulated seconds since session start
    time: f64,
    missing_groups: HashSet<FieldGroup>,
    failing_groups: HashSet<FieldGroup>,
    failing_queries: HashSet<String>,
    overrides: HashMap<String, Value>,
    query_count: u64,
}

impl MockTelemetrySource {
    /// Create a source at session time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the provider for `group` as absent
    pub fn with_missing_group(mut self, group: FieldGroup) -> Self {
        self.missing_groups.insert(group);
        self
    }

    /// Make every query in `group` fail
    pub fn with_failing_group(mut self, group: FieldGroup) -> Self {
        self.failing_groups.insert(group);
        self
    }

    /// Make one named query fail
    pub fn with_failing_query(mut self, name: impl Into<String>) -> Self {
        self.failing_queries.insert(name.into());
        self
    }

    /// Return a fixed value for one named query
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(name.into(), value);
        self
    }

    /// Advance the simulated clock
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }

    /// Simulated session time
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of queries answered or failed so far
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    fn speed_kmh(&self) -> f64 {
        140.0 + 60.0 * (self.time * 0.4).sin()
    }

    fn throttle(&self) -> f64 {
        ((self.time * 0.4).cos() * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    fn lap_progress(&self) -> f64 {
        (self.time % LAP_SECONDS) / LAP_SECONDS
    }

    fn completed_laps(&self) -> u64 {
        (self.time / LAP_SECONDS) as u64
    }

    fn simulate(&self, group: FieldGroup, name: &str, args: &[QueryArg]) -> Option<Value> {
        let t = self.time;
        let speed = self.speed_kmh();
        let throttle = self.throttle();
        let index = args
            .iter()
            .find_map(|arg| match arg {
                QueryArg::Index(i) => Some(*i),
                _ => None,
            })
            .unwrap_or(0);
        let text = args.iter().find_map(|arg| match arg {
            QueryArg::Text(s) => Some(*s),
            _ => None,
        });

        let value = match (group, name) {
            (FieldGroup::Session, "get_session_type") => json!(2),
            (FieldGroup::Session, "get_driver_name") => json!("Simulated Driver"),
            (FieldGroup::Session, "get_track_name") => json!("mock_ring"),
            (FieldGroup::Session, "get_track_config") => json!("gp"),
            (FieldGroup::Session, "get_track_length") => json!(TRACK_LENGTH_M),
            (FieldGroup::Session, "get_cars_count") => json!(1),
            (FieldGroup::Session, "get_session_status") => json!(2),
            (FieldGroup::Session, "get_air_temp") => json!(24.0),
            (FieldGroup::Session, "get_road_temp") => json!(31.0),

            (FieldGroup::Car, "get_speed") => match text.unwrap_or("kmh") {
                "mph" => json!(speed * 0.621_371),
                "ms" => json!(speed / 3.6),
                _ => json!(speed),
            },
            (FieldGroup::Car, "get_location") => json!(self.lap_progress()),
            (FieldGroup::Car, "get_world_location") => {
                let angle = self.lap_progress() * std::f64::consts::TAU;
                json!([500.0 * angle.cos(), 0.0, 500.0 * angle.sin()])
            }
            (FieldGroup::Car, "get_position") => json!(1),
            (FieldGroup::Car, "get_drs_available") => json!(false),
            (FieldGroup::Car, "get_drs_enabled") => json!(false),
            (FieldGroup::Car, "get_gear") => json!(((speed / 45.0) as i64 + 1).clamp(1, 6)),
            (FieldGroup::Car, "get_rpm") => json!(2500.0 + throttle * 5000.0),
            (FieldGroup::Car, "get_fuel") => json!((60.0 - t * 0.01).max(0.0)),
            (FieldGroup::Car, "get_tyres_off_track") => json!(0),
            (FieldGroup::Car, "get_car_in_pit_lane") => json!(false),
            (FieldGroup::Car, "get_total_damage") => json!([0.0, 0.0, 0.0, 0.0, 0.0]),
            (FieldGroup::Car, "get_cg_height") => json!(0.32),
            (FieldGroup::Car, "get_drive_train_speed") => json!(speed * 0.98),
            (FieldGroup::Car, "get_velocity") => json!([speed / 3.6, 0.0, 0.0]),
            (FieldGroup::Car, "get_acceleration") => {
                json!([(t * 0.4).cos() * 0.4 * 60.0 / 3.6 / 9.81, 0.0, 0.0])
            }

            (FieldGroup::Inputs, "get_gas_input") => json!(throttle),
            (FieldGroup::Inputs, "get_brake_input") => json!((1.0 - throttle - 0.6).max(0.0)),
            (FieldGroup::Inputs, "get_clutch") => json!(1.0),
            (FieldGroup::Inputs, "get_steer_input") => json!(90.0 * (t * 0.8).sin()),
            (FieldGroup::Inputs, "get_last_ff") => json!(0.3 * (t * 0.8).sin().abs()),

            (FieldGroup::Lap, "get_current_lap_time") => json!((t % LAP_SECONDS) * 1000.0),
            (FieldGroup::Lap, "get_last_lap_time") | (FieldGroup::Lap, "get_best_lap_time") => {
                if self.completed_laps() > 0 {
                    json!(LAP_SECONDS * 1000.0)
                } else {
                    json!(0)
                }
            }
            (FieldGroup::Lap, "get_splits") => json!([30000, 30000, 30000]),
            (FieldGroup::Lap, "get_split") => json!("00:30:000"),
            (FieldGroup::Lap, "get_invalid") => json!(false),
            (FieldGroup::Lap, "get_lap_count") => json!(self.completed_laps()),
            (FieldGroup::Lap, "get_laps") => json!(0),
            (FieldGroup::Lap, "get_lap_delta") => json!(0.0),
            (FieldGroup::Lap, "get_current_sector") => json!((self.lap_progress() * 3.0) as u64),

            (FieldGroup::Tyres, "get_tyre_wear_value") => json!(100.0 - t * 0.002),
            (FieldGroup::Tyres, "get_tyre_dirty") => json!(0.0),
            (FieldGroup::Tyres, "get_tyre_pressure") => json!(26.0 + 0.1 * index as f64),
            (FieldGroup::Tyres, "get_tyre_temp") => {
                let base = 80.0 + 5.0 * (t * 0.1).sin();
                match text.unwrap_or("m") {
                    "i" => json!(base + 4.0),
                    "o" => json!(base - 3.0),
                    _ => json!(base),
                }
            }
            (FieldGroup::Tyres, "get_slip_ratio") => json!(0.02 * throttle),
            (FieldGroup::Tyres, "get_slip_angle") => json!(1.5 * (t * 0.8).sin()),
            (FieldGroup::Tyres, "get_tyre_heading_vector") => json!([0.0, 0.0, 1.0]),
            (FieldGroup::Tyres, "get_angular_speed") => json!(speed / 3.6 / 0.33),

            (FieldGroup::Stats, "get_has_drs") => json!(false),
            (FieldGroup::Stats, "get_has_ers") => json!(false),
            (FieldGroup::Stats, "get_has_kers") => json!(false),
            (FieldGroup::Stats, "abs_level") => json!(1),
            (FieldGroup::Stats, "get_max_rpm") => json!(8000),
            (FieldGroup::Stats, "get_max_fuel") => json!(60),

            _ => return None,
        };

        Some(value)
    }
}

impl TelemetrySource for MockTelemetrySource {
    fn provides(&self, group: FieldGroup) -> bool {
        !self.missing_groups.contains(&group)
    }

    fn query(&mut self, group: FieldGroup, name: &str, args: &[QueryArg]) -> Result<Value> {
        self.query_count += 1;

        if self.missing_groups.contains(&group) {
            return Err(AcrlError::ProviderUnavailable(group.to_string()));
        }
        if self.failing_groups.contains(&group) || self.failing_queries.contains(name) {
            return Err(AcrlError::query(name, "simulated failure"));
        }
        if let Some(value) = self.overrides.get(name) {
            return Ok(value.clone());
        }

        self.simulate(group, name, args)
            .ok_or_else(|| AcrlError::query(format!("{}.{}", group, name), "unknown query"))
    }
}

/// Host actions that only record what they were asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingHostActions {
    commands: Vec<u32>,
    fail: bool,
}

impl RecordingHostActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record commands but report every one as failed
    pub fn failing() -> Self {
        Self {
            commands: Vec::new(),
            fail: true,
        }
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> &[u32] {
        &self.commands
    }
}

impl HostActions for RecordingHostActions {
    fn send_command(&mut self, code: u32) -> Result<()> {
        self.commands.push(code);
        tracing::debug!("Host command {} executed", code);
        if self.fail {
            return Err(AcrlError::HostAction(format!("command {} rejected", code)));
        }
        Ok(())
    }
}
