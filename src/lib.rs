//! # acrl-rs: telemetry bridge for a racing simulator
//!
//! Samples live car and session state from a host process once per tick and
//! publishes it as JSON, while accepting runtime commands that retarget the
//! transports or reset the session.
//!
//! ## Architecture
//!
//! - **Transport**: two UDP endpoints, telemetry-out and command-in, owned by one
//!   [`TransportState`]
//! - **Command**: JSON commands from the command endpoint or a persisted file,
//!   applied by the [`CommandProcessor`]
//! - **Telemetry**: per-tick [`TelemetrySnapshot`] capture with per-field fault
//!   isolation, delivered over UDP or written atomically to a file
//! - **Receiver**: standalone consumer that prints one summary per interval
//! - **Host**: the [`TelemetrySource`] and [`HostActions`] traits standing in
//!   for the simulator, plus a simulated host
//!
//! ## Files
//!
//! `AC_RL_telemetry.json` and `AC_RL_input.json` live in the documents
//! directory, falling back to the application directory. `AC_RL_debug.log`
//! always lives in the application directory.
//!
//! ## Example
//!
//! ```ignore
//! use acrl_rs::{AcrlApp, AppConfig, AppPaths};
//! use acrl_rs::host::{MockTelemetrySource, RecordingHostActions};
//!
//! let config = AppConfig::default();
//! let paths = AppPaths::resolve(&config.paths);
//! let mut app = AcrlApp::new(config, paths, MockTelemetrySource::new(), RecordingHostActions::new());
//!
//! app.start();
//! app.on_tick(1.0 / 60.0);
//! app.shutdown();
//! ```

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod receiver;
pub mod storage;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types
pub use app::{AcrlApp, AppPhase, TickReport};
pub use command::{CommandMessage, CommandProcessor, CommandReport, CommandSource};
pub use config::{AppConfig, AppPaths};
pub use error::{AcrlError, Result};
pub use host::{HostActions, TelemetrySource};
pub use receiver::{ReceiverConfig, TelemetryReceiver};
pub use telemetry::{Delivery, TelemetryPublisher, TelemetrySnapshot};
pub use transport::TransportState;
