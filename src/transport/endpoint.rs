//! UDP endpoint lifecycle
//!
//! An [`Endpoint`] is a (host, port) pair plus the flags used to create its
//! socket. A [`ManagedEndpoint`] owns the endpoint together with at most one
//! live [`EndpointHandle`]; opening always tears down the previous handle first.
//! A telemetry endpoint resolves its destination when it is opened or
//! retargeted, never per send, so a slow resolver cannot stall a tick.
//!
//! None of the operations here return errors to the caller. Failures are logged
//! and reported as `None`, `false` or an empty datagram list so the host's
//! update loop keeps running.

use crate::config::EndpointConfig;
use crate::error::AcrlError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Largest datagram accepted by [`poll`]
pub const MAX_DATAGRAM_SIZE: usize = 65536;

/// Which logical endpoint a socket belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointRole {
    /// Outbound telemetry; the address is a send-to destination
    Telemetry,
    /// Inbound commands; the address is bound locally
    Command,
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointRole::Telemetry => write!(f, "telemetry"),
            EndpointRole::Command => write!(f, "input"),
        }
    }
}

/// Address and socket flags of one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Bind to (host, port) instead of an ephemeral local port
    pub bound: bool,
    pub blocking: bool,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(host: impl Into<String>, port: u16, bound: bool) -> Self {
        Self {
            host: host.into(),
            port,
            bound,
            blocking: false,
        }
    }

    /// Set blocking mode
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Build from config for the given role
    pub fn from_config(config: &EndpointConfig, role: EndpointRole) -> Self {
        Self::new(config.host.clone(), config.port, role == EndpointRole::Command)
            .with_blocking(config.blocking)
    }

    /// Resolve (host, port) to the first matching socket address
    pub fn socket_addr(&self) -> std::io::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    ErrorKind::AddrNotAvailable,
                    format!("no address for {}", self.host),
                )
            })
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A received datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub source: SocketAddr,
}

/// A live UDP socket
#[derive(Debug)]
pub struct EndpointHandle {
    socket: UdpSocket,
    blocking: bool,
}

impl EndpointHandle {
    /// Local address of the socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}

/// Allocate a UDP socket for `endpoint`
///
/// With `bind` the socket is bound to (host, port); otherwise to an ephemeral
/// port on the unspecified address of the destination's family.
pub fn open(endpoint: &Endpoint, bind: bool) -> Option<EndpointHandle> {
    open_resolved(endpoint, bind, endpoint.socket_addr())
}

fn open_resolved(
    endpoint: &Endpoint,
    bind: bool,
    resolved: std::io::Result<SocketAddr>,
) -> Option<EndpointHandle> {
    match try_open(endpoint, bind, resolved) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(
                "Failed to create UDP socket host={} port={} bind={}: {}",
                endpoint.host,
                endpoint.port,
                bind,
                e
            );
            None
        }
    }
}

fn try_open(
    endpoint: &Endpoint,
    bind: bool,
    resolved: std::io::Result<SocketAddr>,
) -> std::io::Result<EndpointHandle> {
    let socket = if bind {
        UdpSocket::bind(resolved?)?
    } else {
        let local: SocketAddr = match resolved {
            Ok(SocketAddr::V6(_)) => "[::]:0".parse().map_err(invalid_input)?,
            _ => "0.0.0.0:0".parse().map_err(invalid_input)?,
        };
        UdpSocket::bind(local)?
    };
    socket.set_nonblocking(!endpoint.blocking)?;

    Ok(EndpointHandle {
        socket,
        blocking: endpoint.blocking,
    })
}

fn invalid_input(e: std::net::AddrParseError) -> std::io::Error {
    std::io::Error::new(ErrorKind::InvalidInput, e)
}

/// Release a handle; a no-op for `None`
pub fn close(handle: &mut Option<EndpointHandle>, role: EndpointRole) {
    if let Some(handle) = handle.take() {
        drop(handle);
        tracing::info!("Socket {} closed", role);
    }
}

/// Drain every queued datagram without blocking
pub fn poll(handle: Option<&EndpointHandle>) -> Vec<Datagram> {
    let Some(handle) = handle else {
        return Vec::new();
    };

    if handle.blocking {
        if let Err(e) = handle.socket.set_nonblocking(true) {
            tracing::warn!("Cannot poll blocking socket: {}", e);
            return Vec::new();
        }
    }

    let mut datagrams = Vec::new();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        match handle.socket.recv_from(&mut buf) {
            Ok((len, source)) => datagrams.push(Datagram {
                payload: buf[..len].to_vec(),
                source,
            }),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            // ICMP port-unreachable from an earlier send surfaces here on some platforms
            Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
            Err(e) => {
                tracing::warn!("Error reading from UDP socket: {}", e);
                break;
            }
        }
    }

    if handle.blocking {
        let _ = handle.socket.set_nonblocking(false);
    }

    datagrams
}

/// Send one datagram; `false` on any failure
pub fn send(handle: Option<&EndpointHandle>, bytes: &[u8], dest: SocketAddr) -> bool {
    let Some(handle) = handle else {
        return false;
    };

    match handle.socket.send_to(bytes, dest) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Error sending {} bytes to {}: {}", bytes.len(), dest, e);
            false
        }
    }
}

/// An endpoint together with its (at most one) live socket
#[derive(Debug)]
pub struct ManagedEndpoint {
    endpoint: Endpoint,
    role: EndpointRole,
    handle: Option<EndpointHandle>,
    /// Resolved send-to address; telemetry only
    destination: Option<SocketAddr>,
}

impl ManagedEndpoint {
    /// Create a closed endpoint
    pub fn new(endpoint: Endpoint, role: EndpointRole) -> Self {
        Self {
            endpoint,
            role,
            handle: None,
            destination: None,
        }
    }

    /// Endpoint address and flags
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Role of this endpoint
    pub fn role(&self) -> EndpointRole {
        self.role
    }

    /// Whether a socket is currently held
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Live socket, if any
    pub fn handle(&self) -> Option<&EndpointHandle> {
        self.handle.as_ref()
    }

    /// Local address of the live socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.as_ref().and_then(EndpointHandle::local_addr)
    }

    /// Resolved destination of a telemetry endpoint
    ///
    /// `None` for command endpoints and when the host did not resolve.
    pub fn destination(&self) -> Option<SocketAddr> {
        self.destination
    }

    /// Close any live socket and open a new one for the current endpoint
    pub fn open(&mut self) -> bool {
        let resolved = self.endpoint.socket_addr();
        if self.role == EndpointRole::Telemetry {
            self.destination = match &resolved {
                Ok(addr) => Some(*addr),
                Err(e) => {
                    self.log_unresolved(e);
                    None
                }
            };
        }
        self.reopen(resolved)
    }

    fn reopen(&mut self, resolved: std::io::Result<SocketAddr>) -> bool {
        self.close();
        self.handle = open_resolved(&self.endpoint, self.endpoint.bound, resolved);
        if let Some(addr) = self.local_addr() {
            tracing::info!("{} UDP socket ready for {} (local {})", self.role, self.endpoint, addr);
        }
        self.handle.is_some()
    }

    /// Close the live socket, if any
    pub fn close(&mut self) {
        close(&mut self.handle, self.role);
    }

    /// Change the address without rebinding
    ///
    /// A telemetry endpoint resolves the new destination here. Its sending
    /// socket is kept unless the destination switches address family.
    pub fn retarget(&mut self, host: impl Into<String>, port: u16) {
        self.endpoint.host = host.into();
        self.endpoint.port = port;
        if self.role != EndpointRole::Telemetry {
            return;
        }

        self.destination = match self.endpoint.socket_addr() {
            Ok(addr) => Some(addr),
            Err(e) => {
                self.log_unresolved(&e);
                None
            }
        };

        if let (Some(dest), Some(local)) = (self.destination, self.local_addr()) {
            if dest.is_ipv4() != local.is_ipv4() {
                tracing::info!("Reopening {} socket for {}", self.role, dest);
                self.reopen(Ok(dest));
            }
        }
    }

    /// Change the address and reopen the socket on it
    pub fn rebind(&mut self, host: impl Into<String>, port: u16) -> bool {
        self.endpoint.host = host.into();
        self.endpoint.port = port;
        self.open()
    }

    /// Drain queued datagrams
    pub fn poll(&self) -> Vec<Datagram> {
        poll(self.handle.as_ref())
    }

    /// Send to the resolved destination; `false` when there is none
    pub fn send(&self, bytes: &[u8]) -> bool {
        match self.destination {
            Some(dest) => send(self.handle.as_ref(), bytes, dest),
            None => false,
        }
    }

    fn log_unresolved(&self, e: &std::io::Error) {
        let err = AcrlError::Transport {
            endpoint: self.endpoint.to_string(),
            source: std::io::Error::new(e.kind(), e.to_string()),
        };
        tracing::warn!("{}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback_receiver() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[test]
    fn test_open_bound_ephemeral() {
        let endpoint = Endpoint::new("127.0.0.1", 0, true);
        let handle = open(&endpoint, true).unwrap();
        let addr = handle.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_open_unassignable_address_returns_none() {
        // TEST-NET-1, never assigned to a local interface
        let endpoint = Endpoint::new("192.0.2.1", 9, true);
        assert!(open(&endpoint, true).is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut handle = open(&Endpoint::new("127.0.0.1", 0, true), true);
        assert!(handle.is_some());
        close(&mut handle, EndpointRole::Command);
        assert!(handle.is_none());
        close(&mut handle, EndpointRole::Command);
        assert!(handle.is_none());
    }

    #[test]
    fn test_poll_none_is_empty() {
        assert!(poll(None).is_empty());
    }

    #[test]
    fn test_poll_drains_all_pending() {
        let handle = open(&Endpoint::new("127.0.0.1", 0, true), true).unwrap();
        let dest = handle.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();

        for i in 0..5u8 {
            sender.send_to(&[i], dest).unwrap();
        }
        std::thread::sleep(Duration::from_millis(50));

        let datagrams = poll(Some(&handle));
        assert_eq!(datagrams.len(), 5);
        assert_eq!(datagrams[0].source, sender.local_addr().unwrap());
        assert!(poll(Some(&handle)).is_empty());
    }

    #[test]
    fn test_poll_blocking_socket_does_not_block() {
        let endpoint = Endpoint::new("127.0.0.1", 0, true).with_blocking(true);
        let handle = open(&endpoint, true).unwrap();
        assert!(poll(Some(&handle)).is_empty());
    }

    #[test]
    fn test_send_none_is_false() {
        let dest: SocketAddr = "127.0.0.1:9".parse().unwrap();
        assert!(!send(None, b"x", dest));
    }

    #[test]
    fn test_managed_send_reaches_destination() {
        let (receiver, addr) = loopback_receiver();
        let mut managed = ManagedEndpoint::new(
            Endpoint::new("127.0.0.1", addr.port(), false),
            EndpointRole::Telemetry,
        );
        assert!(!managed.send(b"early"));
        assert!(managed.open());
        assert!(managed.send(b"hello"));

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"hello");
    }

    #[test]
    fn test_rebind_replaces_handle() {
        let mut managed = ManagedEndpoint::new(
            Endpoint::new("127.0.0.1", 0, true),
            EndpointRole::Command,
        );
        assert!(managed.open());

        let (holder, taken) = loopback_receiver();
        // Rebinding onto a port in use fails and leaves nothing open
        assert!(!managed.rebind("127.0.0.1", taken.port()));
        assert!(!managed.is_live());
        drop(holder);

        assert!(managed.rebind("127.0.0.1", 0));
        assert!(managed.is_live());
        assert!(managed.local_addr().is_some());
    }

    #[test]
    fn test_retarget_resolves_once() {
        let (receiver, addr) = loopback_receiver();
        let mut managed = ManagedEndpoint::new(
            Endpoint::new("127.0.0.1", 9, false),
            EndpointRole::Telemetry,
        );
        assert!(managed.open());

        // .invalid never resolves; the failed lookup leaves no destination
        managed.retarget("acrl-unresolvable.invalid", addr.port());
        assert!(managed.destination().is_none());
        assert!(managed.is_live());
        for _ in 0..5 {
            assert!(!managed.send(b"lost"));
        }

        managed.retarget("127.0.0.1", addr.port());
        assert_eq!(managed.destination(), Some(addr));
        assert!(managed.send(b"found"));

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"found");
    }

    #[test]
    fn test_command_retarget_does_not_resolve() {
        let mut managed = ManagedEndpoint::new(
            Endpoint::new("127.0.0.1", 0, true),
            EndpointRole::Command,
        );
        managed.retarget("127.0.0.1", 9);
        assert!(managed.destination().is_none());
        assert!(!managed.send(b"x"));
    }

    #[test]
    fn test_retarget_across_families_reopens_socket() {
        let (receiver, addr) = loopback_receiver();
        let mut managed = ManagedEndpoint::new(
            Endpoint::new("127.0.0.1", addr.port(), false),
            EndpointRole::Telemetry,
        );
        assert!(managed.open());
        assert!(managed.local_addr().unwrap().is_ipv4());

        // Without IPv6 support the reopen fails and the socket is gone
        managed.retarget("::1", addr.port());
        assert!(managed.local_addr().map_or(true, |local| local.is_ipv6()));

        managed.retarget("127.0.0.1", addr.port());
        if !managed.is_live() {
            assert!(managed.open());
        }
        assert!(managed.local_addr().unwrap().is_ipv4());
        assert!(managed.send(b"back"));

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"back");
    }
}
