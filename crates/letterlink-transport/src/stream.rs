use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected TCP stream, one per request exchange.
///
/// This is the I/O type both endpoints read and write messages over. The
/// connection is closed when the value is dropped, so every exit path of the
/// owning handler releases it.
pub struct LinkStream {
    inner: TcpStream,
    peer: SocketAddr,
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl LinkStream {
    pub(crate) fn from_tcp(inner: TcpStream, peer: SocketAddr) -> Self {
        Self { inner, peer }
    }

    /// Connect to `addr`, bounding the connect itself and every later
    /// read and write by `timeout`.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let inner = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|source| TransportError::Connect { addr, source })?;
        let stream = Self::from_tcp(inner, addr);
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        debug!(%addr, "connected");
        Ok(stream)
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("peer", &self.peer)
            .finish()
    }
}
