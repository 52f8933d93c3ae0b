//! Telemetry snapshot
//!
//! One snapshot is captured per tick and serialized as a JSON object:
//!
//! ```json
//! {
//!     "app": "AC_RL",
//!     "timestamp": 1760000000.123,
//!     "session": { "track_name": "...", ... },
//!     "car": { "speed_kmh": 142.1, ... },
//!     "inputs": { "gas": 0.8, ... },
//!     "lap": { "get_current_lap_time": 51234, ... },
//!     "tyres": [ { "index": 0, ... }, { "index": 1, ... }, { "index": 2, ... }, { "index": 3, ... } ],
//!     "stats": { "max_rpm": 8000, ... }
//! }
//! ```
//!
//! Field values are passed through from the host untouched. A field whose
//! query failed is `null`; a group whose provider is missing is `null` as a
//! whole. `tyres` always holds four entries.

use super::sampler::Sampler;
use crate::host::{FieldGroup, QueryArg, TelemetrySource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of tyres reported per snapshot
pub const TYRE_COUNT: usize = 4;

/// A nullable passthrough value
pub type Field = Option<Value>;

const CAR: QueryArg = QueryArg::Index(0);

/// Session and track information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_type: Field,
    pub driver_name: Field,
    pub track_name: Field,
    pub track_config: Field,
    pub track_length: Field,
    pub cars_count: Field,
    pub session_status: Field,
    pub air_temp: Field,
    pub road_temp: Field,
}

impl SessionInfo {
    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>) -> Self {
        let g = FieldGroup::Session;
        Self {
            session_type: s.sample(g, "get_session_type", &[]),
            driver_name: s.sample(g, "get_driver_name", &[]),
            track_name: s.sample(g, "get_track_name", &[]),
            track_config: s.sample(g, "get_track_config", &[]),
            track_length: s.sample(g, "get_track_length", &[]),
            cars_count: s.sample(g, "get_cars_count", &[]),
            session_status: s.sample(g, "get_session_status", &[]),
            air_temp: s.sample(g, "get_air_temp", &[]),
            road_temp: s.sample(g, "get_road_temp", &[]),
        }
    }
}

/// State of the player's car
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarInfo {
    pub speed_kmh: Field,
    pub speed_mph: Field,
    pub speed_ms: Field,
    pub location: Field,
    pub world_location: Field,
    pub position: Field,
    pub drs_available: Field,
    pub drs_enabled: Field,
    pub gear: Field,
    pub rpm: Field,
    pub fuel: Field,
    pub tyres_off_track: Field,
    pub in_pit_lane: Field,
    pub damage: Field,
    pub cg_height: Field,
    pub drive_train_speed: Field,
    pub velocity: Field,
    pub acceleration: Field,
}

impl CarInfo {
    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>) -> Self {
        let g = FieldGroup::Car;
        Self {
            speed_kmh: s.sample(g, "get_speed", &[CAR, QueryArg::Text("kmh")]),
            speed_mph: s.sample(g, "get_speed", &[CAR, QueryArg::Text("mph")]),
            speed_ms: s.sample(g, "get_speed", &[CAR, QueryArg::Text("ms")]),
            location: s.sample(g, "get_location", &[CAR]),
            world_location: s.sample(g, "get_world_location", &[CAR]),
            position: s.sample(g, "get_position", &[CAR]),
            drs_available: s.sample(g, "get_drs_available", &[]),
            drs_enabled: s.sample(g, "get_drs_enabled", &[]),
            // Formatted gear: 0 is reverse, 1 neutral
            gear: s.sample(g, "get_gear", &[CAR, QueryArg::Flag(true)]),
            rpm: s.sample(g, "get_rpm", &[CAR]),
            fuel: s.sample(g, "get_fuel", &[]),
            tyres_off_track: s.sample(g, "get_tyres_off_track", &[]),
            in_pit_lane: s.sample(g, "get_car_in_pit_lane", &[]),
            damage: s.sample(g, "get_total_damage", &[]),
            cg_height: s.sample(g, "get_cg_height", &[CAR]),
            drive_train_speed: s.sample(g, "get_drive_train_speed", &[CAR]),
            velocity: s.sample(g, "get_velocity", &[]),
            acceleration: s.sample(g, "get_acceleration", &[]),
        }
    }
}

/// Driver inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    pub gas: Field,
    pub brake: Field,
    pub clutch: Field,
    pub steer: Field,
    pub last_ff: Field,
}

impl InputInfo {
    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>) -> Self {
        let g = FieldGroup::Inputs;
        Self {
            gas: s.sample(g, "get_gas_input", &[CAR]),
            brake: s.sample(g, "get_brake_input", &[CAR]),
            clutch: s.sample(g, "get_clutch", &[CAR]),
            steer: s.sample(g, "get_steer_input", &[CAR]),
            last_ff: s.sample(g, "get_last_ff", &[CAR]),
        }
    }
}

/// Lap timing, keyed by the host query names on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapInfo {
    #[serde(rename = "get_current_lap_time")]
    pub current_lap_time: Field,
    #[serde(rename = "get_last_lap_time")]
    pub last_lap_time: Field,
    #[serde(rename = "get_best_lap_time")]
    pub best_lap_time: Field,
    #[serde(rename = "get_splits")]
    pub splits: Field,
    #[serde(rename = "get_split")]
    pub split: Field,
    #[serde(rename = "get_invalid")]
    pub invalid: Field,
    #[serde(rename = "get_lap_count")]
    pub lap_count: Field,
    #[serde(rename = "get_laps")]
    pub laps: Field,
    #[serde(rename = "get_lap_delta")]
    pub lap_delta: Field,
    #[serde(rename = "get_current_sector")]
    pub current_sector: Field,
}

impl LapInfo {
    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>) -> Self {
        let g = FieldGroup::Lap;
        let raw_ms = [CAR, QueryArg::Flag(false)];
        Self {
            current_lap_time: s.sample(g, "get_current_lap_time", &raw_ms),
            last_lap_time: s.sample(g, "get_last_lap_time", &raw_ms),
            best_lap_time: s.sample(g, "get_best_lap_time", &raw_ms),
            splits: s.sample(g, "get_splits", &raw_ms),
            split: s.sample(g, "get_split", &[]),
            invalid: s.sample(g, "get_invalid", &[CAR]),
            lap_count: s.sample(g, "get_lap_count", &[CAR]),
            laps: s.sample(g, "get_laps", &[]),
            lap_delta: s.sample(g, "get_lap_delta", &[CAR]),
            current_sector: s.sample(g, "get_current_sector", &[]),
        }
    }
}

/// One tyre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TyreSample {
    pub index: u32,
    pub wear: Field,
    pub dirty: Field,
    pub pressure: Field,
    pub temp_inner: Field,
    pub temp_middle: Field,
    pub temp_outer: Field,
    pub slip_ratio: Field,
    pub slip_angle: Field,
    pub heading_vector: Field,
    pub angular_speed: Field,
}

impl TyreSample {
    /// A tyre with every measurement null
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>, index: u32) -> Self {
        let g = FieldGroup::Tyres;
        let tyre = QueryArg::Index(index);
        Self {
            index,
            wear: s.sample(g, "get_tyre_wear_value", &[tyre]),
            dirty: s.sample(g, "get_tyre_dirty", &[tyre]),
            pressure: s.sample(g, "get_tyre_pressure", &[tyre]),
            temp_inner: s.sample(g, "get_tyre_temp", &[tyre, QueryArg::Text("i")]),
            temp_middle: s.sample(g, "get_tyre_temp", &[tyre, QueryArg::Text("m")]),
            temp_outer: s.sample(g, "get_tyre_temp", &[tyre, QueryArg::Text("o")]),
            slip_ratio: s.sample(g, "get_slip_ratio", &[tyre]),
            slip_angle: s.sample(g, "get_slip_angle", &[tyre]),
            heading_vector: s.sample(g, "get_tyre_heading_vector", &[tyre]),
            angular_speed: s.sample(g, "get_angular_speed", &[tyre]),
        }
    }
}

/// Static car capabilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarStats {
    pub has_drs: Field,
    pub has_ers: Field,
    pub has_kers: Field,
    pub abs_level: Field,
    pub max_rpm: Field,
    pub max_fuel: Field,
}

impl CarStats {
    fn capture<S: TelemetrySource + ?Sized>(s: &mut Sampler<'_, S>) -> Self {
        let g = FieldGroup::Stats;
        Self {
            has_drs: s.sample(g, "get_has_drs", &[]),
            has_ers: s.sample(g, "get_has_ers", &[]),
            has_kers: s.sample(g, "get_has_kers", &[]),
            abs_level: s.sample(g, "abs_level", &[]),
            max_rpm: s.sample(g, "get_max_rpm", &[]),
            max_fuel: s.sample(g, "get_max_fuel", &[]),
        }
    }
}

/// A complete per-tick sample of host state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "app")]
    pub app_name: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub session: Option<SessionInfo>,
    pub car: Option<CarInfo>,
    pub inputs: Option<InputInfo>,
    pub lap: Option<LapInfo>,
    pub tyres: [TyreSample; TYRE_COUNT],
    pub stats: Option<CarStats>,
}

impl TelemetrySnapshot {
    /// A snapshot with every group absent
    pub fn empty(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            timestamp: now_epoch_seconds(),
            session: None,
            car: None,
            inputs: None,
            lap: None,
            tyres: std::array::from_fn(|i| TyreSample::empty(i as u32)),
            stats: None,
        }
    }

    /// Sample every group from `source`
    pub fn capture<S: TelemetrySource + ?Sized>(app_name: &str, source: &mut S) -> Self {
        Self::capture_with(app_name, &mut Sampler::new(source))
    }

    /// Sample every group through an existing sampler
    pub fn capture_with<S: TelemetrySource + ?Sized>(
        app_name: &str,
        sampler: &mut Sampler<'_, S>,
    ) -> Self {
        let session = group(sampler, FieldGroup::Session, SessionInfo::capture);
        let car = group(sampler, FieldGroup::Car, CarInfo::capture);
        let inputs = group(sampler, FieldGroup::Inputs, InputInfo::capture);
        let lap = group(sampler, FieldGroup::Lap, LapInfo::capture);

        let tyres = if sampler.provides(FieldGroup::Tyres) {
            std::array::from_fn(|i| TyreSample::capture(&mut *sampler, i as u32))
        } else {
            std::array::from_fn(|i| TyreSample::empty(i as u32))
        };

        let stats = group(sampler, FieldGroup::Stats, CarStats::capture);

        Self {
            app_name: app_name.to_string(),
            timestamp: now_epoch_seconds(),
            session,
            car,
            inputs,
            lap,
            tyres,
            stats,
        }
    }

    /// Serialize to the wire format
    pub fn to_json_bytes(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn group<S, T>(
    sampler: &mut Sampler<'_, S>,
    group: FieldGroup,
    capture: impl FnOnce(&mut Sampler<'_, S>) -> T,
) -> Option<T>
where
    S: TelemetrySource + ?Sized,
{
    if sampler.provides(group) {
        Some(capture(sampler))
    } else {
        tracing::trace!("{} provider missing", group);
        None
    }
}

fn now_epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
