//! Command channel
//!
//! Commands reconfigure the transports at runtime and can trigger a host
//! reset. They arrive as JSON objects over the command UDP endpoint or in the
//! persisted command file:
//!
//! ```json
//! {
//!     "telemetry_udp_host": "127.0.0.1",
//!     "telemetry_udp_port": 9876,
//!     "use_udp_telemetry": true,
//!     "input_udp_host": "127.0.0.1",
//!     "input_udp_port": 9877,
//!     "use_input_udp": true,
//!     "reset": false
//! }
//! ```

pub mod file_source;
pub mod message;
pub mod processor;

pub use file_source::{FileCommandSource, PendingCommand};
pub use message::CommandMessage;
pub use processor::{CommandAction, CommandProcessor, CommandReport, CommandSource};
