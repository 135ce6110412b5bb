use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// TCP listening transport.
///
/// The listener runs in non-blocking mode so the accept loop can wake up at a
/// bounded interval and check for shutdown. Accepted connections are switched
/// back to blocking mode before they are handed out.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`. Port 0 picks an ephemeral port.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%addr, "listening on tcp");

        Ok(Self { listener, addr })
    }

    /// Accept one pending connection, or wait up to `wait` and return `None`
    /// when nothing arrived.
    pub fn poll_accept(&self, wait: Duration) -> Result<Option<LinkStream>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                debug!(%peer, "accepted connection");
                Ok(Some(LinkStream::from_tcp(stream, peer)))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(wait);
                Ok(None)
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Instant;

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn accept_within(transport: &TcpTransport, limit: Duration) -> LinkStream {
        let start = Instant::now();
        loop {
            if let Some(stream) = transport.poll_accept(Duration::from_millis(5)).unwrap() {
                return stream;
            }
            assert!(start.elapsed() < limit, "no connection within {limit:?}");
        }
    }

    #[test]
    fn bind_assigns_ephemeral_port() {
        let transport = TcpTransport::bind(loopback()).unwrap();
        assert_ne!(transport.local_addr().port(), 0);
    }

    #[test]
    fn poll_accept_times_out_without_clients() {
        let transport = TcpTransport::bind(loopback()).unwrap();
        let start = Instant::now();
        let accepted = transport.poll_accept(Duration::from_millis(20)).unwrap();
        assert!(accepted.is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn accepted_stream_is_blocking() {
        let transport = TcpTransport::bind(loopback()).unwrap();
        let addr = transport.local_addr();

        let client = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            std::thread::sleep(Duration::from_millis(50));
            stream.write_all(b"xyz").unwrap();
        });

        let mut server = accept_within(&transport, Duration::from_secs(2));
        // A non-blocking stream would fail with WouldBlock before the late write.
        let mut buf = [0u8; 3];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"xyz");

        client.join().unwrap();
    }

    #[test]
    fn bind_twice_fails() {
        let first = TcpTransport::bind(loopback()).unwrap();
        let result = TcpTransport::bind(first.local_addr());
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }
}
