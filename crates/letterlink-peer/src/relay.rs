use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use letterlink_frame::{
    encode_udp_response, sum_values, LetterTriple, MessageReader, MessageWriter, TcpResponse,
};
use letterlink_transport::{DatagramSocket, LinkStream};
use tracing::{debug, error, info, warn};

use crate::error::{PeerError, Result};
use crate::shutdown::Shutdown;

/// Relay behavior configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bound on connecting to, writing to, and reading from endpoint A.
    pub tcp_timeout: Duration,
    /// How long one receive waits before checking for shutdown.
    pub poll_interval: Duration,
    /// Receive buffer size. Datagrams are only ever served at 3 bytes, but
    /// larger ones must be seen at their real length to be ignored.
    pub max_datagram: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tcp_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
            max_datagram: 4096,
        }
    }
}

/// Run one TCP exchange with endpoint A over a fresh connection.
///
/// `letters` are sent exactly as given. The connection is closed when this
/// returns.
pub fn query_upstream(
    upstream: SocketAddr,
    letters: &LetterTriple,
    timeout: Duration,
) -> Result<TcpResponse> {
    let stream = LinkStream::connect(upstream, timeout)?;

    let mut writer = MessageWriter::new(stream);
    writer.send_request(letters)?;
    debug!(%upstream, %letters, "sent tcp request");

    let mut reader = MessageReader::new(writer.into_inner());
    let response = reader.read_response()?;
    debug!(%upstream, status = response.status(), "received tcp response");
    Ok(response)
}

/// Endpoint B: UDP server that forwards each request to endpoint A over TCP.
pub struct RelayServer {
    socket: Arc<DatagramSocket>,
    upstream: SocketAddr,
    config: RelayConfig,
}

impl RelayServer {
    /// Bind the UDP socket. `upstream` is endpoint A's TCP address.
    pub fn bind(addr: SocketAddr, upstream: SocketAddr, config: RelayConfig) -> Result<Self> {
        let socket = DatagramSocket::bind(addr)?;
        Ok(Self {
            socket: Arc::new(socket),
            upstream,
            config,
        })
    }

    /// Bound UDP address.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    /// Receive datagrams until `shutdown` is triggered, handling each on its
    /// own thread.
    ///
    /// A failure to receive ends the loop and is returned; failures while
    /// handling a datagram are logged and only drop that request.
    pub fn serve(self, shutdown: &Shutdown) -> Result<()> {
        self.socket.set_read_timeout(Some(self.config.poll_interval))?;
        info!(
            addr = %self.local_addr(),
            upstream = %self.upstream,
            "udp relay listening"
        );

        let mut buf = vec![0u8; self.config.max_datagram];
        let mut handlers: Vec<JoinHandle<()>> = Vec::new();

        let outcome = loop {
            if shutdown.is_triggered() {
                break Ok(());
            }

            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(Some(received)) => received,
                Ok(None) => continue,
                Err(err) => {
                    error!(error = %err, "udp receive failed");
                    break Err(PeerError::from(err));
                }
            };

            let Ok(letters) = LetterTriple::from_slice(&buf[..len]) else {
                debug!(%from, len, "ignoring datagram with invalid length");
                continue;
            };

            handlers.retain(|handle| !handle.is_finished());

            let socket = Arc::clone(&self.socket);
            let upstream = self.upstream;
            let timeout = self.config.tcp_timeout;
            let spawned = thread::Builder::new()
                .name(format!("letterlink-relay-{from}"))
                .spawn(move || run_datagram(&socket, upstream, letters, from, timeout));
            match spawned {
                Ok(handle) => handlers.push(handle),
                Err(err) => warn!(%from, error = %err, "failed to spawn datagram handler"),
            }
        };

        info!(in_flight = handlers.len(), "udp relay shutting down");
        for handle in handlers {
            if handle.join().is_err() {
                warn!("datagram handler panicked");
            }
        }
        outcome
    }
}

/// Reverse, forward to endpoint A, and reply with the sum when A accepts.
///
/// Returns the sum that was sent, or `None` when A rejected the letters.
fn relay_datagram(
    socket: &DatagramSocket,
    upstream: SocketAddr,
    letters: LetterTriple,
    from: SocketAddr,
    timeout: Duration,
) -> Result<Option<u64>> {
    let reversed = letters.reversed();
    info!(%from, %letters, %reversed, "handling request");

    match query_upstream(upstream, &reversed, timeout)? {
        TcpResponse::Invalid => Ok(None),
        TcpResponse::Valid(values) => {
            let sum = sum_values(values);
            debug!(?values, sum, "valid tcp response");
            socket.send_to(&encode_udp_response(sum)?, from)?;
            Ok(Some(sum))
        }
    }
}

fn run_datagram(
    socket: &DatagramSocket,
    upstream: SocketAddr,
    letters: LetterTriple,
    from: SocketAddr,
    timeout: Duration,
) {
    match relay_datagram(socket, upstream, letters, from, timeout) {
        Ok(Some(sum)) => info!(%from, sum, "sent udp response"),
        Ok(None) => info!(%from, %letters, "endpoint A rejected letters, no udp response"),
        Err(err) if err.is_timeout() => warn!(%from, %upstream, "endpoint A timed out"),
        Err(err) => warn!(%from, error = %err, "error while relaying request"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use letterlink_frame::{decode_udp_response, encode_tcp_response_valid};

    use super::*;
    use crate::server::{LetterServer, ServerConfig};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    struct Harness {
        relay_addr: SocketAddr,
        shutdown: Shutdown,
        threads: Vec<JoinHandle<()>>,
    }

    impl Harness {
        fn start(upstream: SocketAddr, config: RelayConfig) -> Self {
            let relay = RelayServer::bind(loopback(), upstream, config).unwrap();
            let relay_addr = relay.local_addr();
            let shutdown = Shutdown::new();
            let relay_thread = {
                let shutdown = shutdown.clone();
                thread::spawn(move || relay.serve(&shutdown).unwrap())
            };
            Self {
                relay_addr,
                shutdown,
                threads: vec![relay_thread],
            }
        }

        fn with_letter_server() -> Self {
            let server = LetterServer::bind(loopback(), ServerConfig::default()).unwrap();
            let upstream = server.local_addr();
            let mut harness = Self::start(upstream, fast_relay());
            let shutdown = harness.shutdown.clone();
            harness
                .threads
                .push(thread::spawn(move || server.serve(&shutdown)));
            harness
        }

        fn ask(&self, payload: &[u8], wait: Duration) -> Option<Vec<u8>> {
            let client = DatagramSocket::bind(loopback()).unwrap();
            client.set_read_timeout(Some(wait)).unwrap();
            client.send_to(payload, self.relay_addr).unwrap();
            let mut buf = [0u8; 64];
            client
                .recv_from(&mut buf)
                .unwrap()
                .map(|(len, _)| buf[..len].to_vec())
        }

        fn stop(self) {
            self.shutdown.trigger();
            for handle in self.threads {
                handle.join().unwrap();
            }
        }
    }

    fn fast_relay() -> RelayConfig {
        RelayConfig {
            tcp_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(50),
            ..RelayConfig::default()
        }
    }

    #[test]
    fn valid_letters_return_reversed_sum() {
        let harness = Harness::with_letter_server();

        let reply = harness
            .ask(b"xyz", Duration::from_secs(3))
            .expect("relay should answer consonants");
        // zyx -> 163 + 162 + 161
        assert_eq!(decode_udp_response(&reply).unwrap(), 486);

        harness.stop();
    }

    #[test]
    fn short_datagram_gets_no_reply() {
        let harness = Harness::with_letter_server();
        assert!(harness.ask(b"xy", Duration::from_millis(300)).is_none());
        harness.stop();
    }

    #[test]
    fn long_datagram_gets_no_reply() {
        let harness = Harness::with_letter_server();
        assert!(harness.ask(b"xyzw", Duration::from_millis(300)).is_none());
        harness.stop();
    }

    #[test]
    fn rejected_letters_get_no_reply() {
        let harness = Harness::with_letter_server();
        assert!(harness.ask(b"aei", Duration::from_millis(300)).is_none());
        // Relay keeps serving after a rejection.
        assert!(harness.ask(b"bcd", Duration::from_secs(3)).is_some());
        harness.stop();
    }

    #[test]
    fn unreachable_upstream_drops_request_and_keeps_serving() {
        let dead = TcpListener::bind(loopback()).unwrap().local_addr().unwrap();
        let harness = Harness::start(dead, fast_relay());

        assert!(harness.ask(b"xyz", Duration::from_millis(800)).is_none());
        assert!(harness.ask(b"bcd", Duration::from_millis(800)).is_none());

        harness.stop();
    }

    #[test]
    fn upstream_receives_reversed_letters() {
        let upstream = TcpListener::bind(loopback()).unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let fake_a = thread::spawn(move || {
            let (mut conn, _) = upstream.accept().unwrap();
            let mut request = [0u8; 3];
            conn.read_exact(&mut request).unwrap();
            conn.write_all(&encode_tcp_response_valid(1, 2, 3)).unwrap();
            request
        });

        let harness = Harness::start(upstream_addr, fast_relay());
        let reply = harness.ask(b"pqr", Duration::from_secs(3)).unwrap();
        assert_eq!(decode_udp_response(&reply).unwrap(), 6);
        assert_eq!(&fake_a.join().unwrap(), b"rqp");

        harness.stop();
    }

    #[test]
    fn upstream_closing_mid_response_drops_request() {
        let upstream = TcpListener::bind(loopback()).unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let fake_a = thread::spawn(move || {
            let (mut conn, _) = upstream.accept().unwrap();
            let mut request = [0u8; 3];
            conn.read_exact(&mut request).unwrap();
            // Valid status, then only half the values.
            conn.write_all(&[0x01, 0x00, 0x8B]).unwrap();
        });

        let harness = Harness::start(upstream_addr, fast_relay());
        assert!(harness.ask(b"bcd", Duration::from_millis(500)).is_none());
        fake_a.join().unwrap();

        harness.stop();
    }

    #[test]
    fn query_upstream_times_out_on_silent_server() {
        let upstream = TcpListener::bind(loopback()).unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let silent_a = thread::spawn(move || {
            let (conn, _) = upstream.accept().unwrap();
            thread::sleep(Duration::from_millis(500));
            drop(conn);
        });

        let err = query_upstream(
            upstream_addr,
            &LetterTriple::new(*b"bcd"),
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");

        silent_a.join().unwrap();
    }

    #[test]
    fn query_upstream_sends_letters_verbatim() {
        let server = LetterServer::bind(loopback(), ServerConfig::default()).unwrap();
        let addr = server.local_addr();
        let shutdown = Shutdown::new();
        let handle = {
            let shutdown = shutdown.clone();
            thread::spawn(move || server.serve(&shutdown))
        };

        let response =
            query_upstream(addr, &LetterTriple::new(*b"bcd"), Duration::from_secs(2)).unwrap();
        assert_eq!(response, TcpResponse::Valid([139, 140, 141]));

        let response =
            query_upstream(addr, &LetterTriple::new(*b"aei"), Duration::from_secs(2)).unwrap();
        assert_eq!(response, TcpResponse::Invalid);

        shutdown.trigger();
        handle.join().unwrap();
    }

    #[test]
    fn serve_returns_after_shutdown() {
        let dead = TcpListener::bind(loopback()).unwrap().local_addr().unwrap();
        let relay = RelayServer::bind(loopback(), dead, fast_relay()).unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();
        relay.serve(&shutdown).unwrap();
    }
}
