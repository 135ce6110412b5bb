use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// UDP datagram transport.
///
/// Receives report an expired read timeout as `Ok(None)` so callers can treat
/// it as a polling tick or a retry signal instead of an error.
#[derive(Debug)]
pub struct DatagramSocket {
    socket: UdpSocket,
    addr: SocketAddr,
}

impl DatagramSocket {
    /// Bind a UDP socket to `addr`. Port 0 picks an ephemeral port.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let addr = socket
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;
        info!(%addr, "bound udp socket");
        Ok(Self { socket, addr })
    }

    /// Bind an ephemeral socket on the wildcard address of `peer`'s family,
    /// suitable for sending to `peer` and receiving its replies.
    pub fn bind_for(peer: SocketAddr) -> Result<Self> {
        let local = match peer {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        Self::bind(local)
    }

    /// Set read timeout for [`recv_from`](Self::recv_from). `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Receive one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when the read timeout expires or the call is
    /// interrupted. A datagram larger than `buf` is truncated to `buf.len()`.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => {
                debug!(%from, len, "received datagram");
                Ok(Some((len, from)))
            }
            Err(err) if crate::is_timeout(&err) || err.kind() == ErrorKind::Interrupted => {
                Ok(None)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    /// Send one datagram to `target`.
    pub fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        let sent = self.socket.send_to(payload, target)?;
        if sent != payload.len() {
            return Err(TransportError::Io(std::io::Error::new(
                ErrorKind::WriteZero,
                format!("sent {sent} of {} datagram bytes", payload.len()),
            )));
        }
        debug!(%target, len = sent, "sent datagram");
        Ok(())
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
