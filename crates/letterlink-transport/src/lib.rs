//! TCP and UDP socket plumbing for letterlink.
//!
//! Provides the blocking socket types both endpoints build on:
//! - [`TcpTransport`]: a listener whose accept can be polled against shutdown
//! - [`LinkStream`]: a connected TCP stream with timeout control
//! - [`DatagramSocket`]: a UDP socket whose receive reports timeouts as `None`
//!
//! This is the lowest layer of letterlink. Nothing here knows about the
//! letter protocol.

pub mod error;
pub mod stream;
pub mod tcp;
pub mod udp;

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs};

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::TcpTransport;
pub use udp::DatagramSocket;

/// Resolve `host:port` style input to the first matching socket address.
pub fn resolve(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<SocketAddr> {
    let described = format!("{addr:?}");
    addr.to_socket_addrs()
        .map_err(|_| TransportError::Resolve(described.clone()))?
        .next()
        .ok_or(TransportError::Resolve(described))
}

/// Blocking sockets report an expired read timeout as `WouldBlock` on Unix
/// and `TimedOut` on Windows.
pub(crate) fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_loopback_literal() {
        let addr = resolve("127.0.0.1:5001").unwrap();
        assert_eq!(addr.port(), 5001);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn resolve_tuple_form() {
        let addr = resolve(("127.0.0.1", 5000)).unwrap();
        assert_eq!(addr, "127.0.0.1:5000".parse().unwrap());
    }

    #[test]
    fn resolve_rejects_garbage() {
        let err = resolve("not an address").unwrap_err();
        assert!(matches!(err, TransportError::Resolve(_)));
    }

    #[test]
    fn timeout_kinds_are_recognised() {
        assert!(is_timeout(&std::io::Error::from(ErrorKind::WouldBlock)));
        assert!(is_timeout(&std::io::Error::from(ErrorKind::TimedOut)));
        assert!(!is_timeout(&std::io::Error::from(ErrorKind::ConnectionReset)));
    }
}
