//! Telemetry sampling and publishing

pub mod publisher;
pub mod sampler;
pub mod snapshot;

pub use publisher::{Delivery, PublisherStats, TelemetryPublisher};
pub use sampler::{sample, Sampler};
pub use snapshot::{
    CarInfo, CarStats, InputInfo, LapInfo, SessionInfo, TelemetrySnapshot, TyreSample, TYRE_COUNT,
};
