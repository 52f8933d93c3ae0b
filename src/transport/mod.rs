//! UDP transports for telemetry and commands
//!
//! - [`endpoint`] - Socket lifecycle: open, close, poll, send, rebind
//! - [`state`] - The process-wide [`TransportState`] holding both endpoints
//!
//! Two independent channels exist:
//!
//! | Endpoint  | Default         | Socket                             |
//! |-----------|-----------------|------------------------------------|
//! | telemetry | 127.0.0.1:9876  | ephemeral local port, send-to only |
//! | input     | 127.0.0.1:9877  | bound, drained every tick          |

pub mod endpoint;
pub mod state;

pub use endpoint::{
    Datagram, Endpoint, EndpointHandle, EndpointRole, ManagedEndpoint, MAX_DATAGRAM_SIZE,
};
pub use state::TransportState;
