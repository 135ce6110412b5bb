use std::net::SocketAddr;
use std::time::{Duration, Instant};

use letterlink_frame::{decode_udp_response, encode_udp_request, LetterTriple, UDP_RESPONSE_LEN};
use letterlink_transport::DatagramSocket;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::shutdown::Shutdown;

/// Upper bound on a single blocking receive, so shutdown is noticed even when
/// the response timeout is long.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Room for oversized replies, so they are seen at their real length instead
/// of being truncated to a plausible 4 bytes.
const RECV_BUFFER_LEN: usize = 512;

/// Client behavior configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for a reply before retrying with new letters.
    pub response_timeout: Duration,
    /// Keep sending new requests after each successful reply.
    pub keep_going: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(500),
            keep_going: false,
        }
    }
}

type Generator = Box<dyn FnMut() -> LetterTriple + Send>;

/// UDP side of endpoint A.
///
/// Sends random letter triples to endpoint B until one earns a reply. Every
/// retry uses freshly generated letters; nothing is retransmitted.
pub struct LetterClient {
    socket: DatagramSocket,
    peer: SocketAddr,
    config: ClientConfig,
    generate: Generator,
}

impl LetterClient {
    /// Bind an ephemeral socket for talking to `peer`.
    pub fn connect(peer: SocketAddr, config: ClientConfig) -> Result<Self> {
        let socket = DatagramSocket::bind_for(peer)?;
        Ok(Self {
            socket,
            peer,
            config,
            generate: Box::new(|| LetterTriple::random(&mut rand::rng())),
        })
    }

    /// Replace the letter source used for each attempt.
    pub fn with_generator(
        mut self,
        generate: impl FnMut() -> LetterTriple + Send + 'static,
    ) -> Self {
        self.generate = Box::new(generate);
        self
    }

    /// Local address replies are received on.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    /// Send requests until one is answered.
    ///
    /// Returns `Ok(None)` if `shutdown` fires first. Timeouts are retried
    /// without limit; any other socket failure is returned.
    ///
    /// Replies carry no request id, so a late reply to an earlier attempt is
    /// accepted as the answer to the current one.
    pub fn request_sum(&mut self, shutdown: &Shutdown) -> Result<Option<u32>> {
        let mut attempt = 0u64;

        while !shutdown.is_triggered() {
            attempt += 1;
            let letters = (self.generate)();
            let payload = encode_udp_request(letters.as_ref())?;

            info!(%letters, peer = %self.peer, attempt, "sending request");
            self.socket.send_to(&payload, self.peer)?;

            if let Some(sum) = self.await_response(shutdown)? {
                info!(sum, attempt, "received sum");
                return Ok(Some(sum));
            }

            if !shutdown.is_triggered() {
                info!(attempt, "timeout waiting for response, retrying with new letters");
            }
        }

        debug!("client stopped by shutdown");
        Ok(None)
    }

    /// Request sums, calling `on_sum` for each one.
    ///
    /// Stops after the first sum unless `keep_going` is configured, in which
    /// case it runs until `shutdown`. Returns how many sums were delivered.
    pub fn run(&mut self, shutdown: &Shutdown, mut on_sum: impl FnMut(u32)) -> Result<usize> {
        let mut delivered = 0usize;

        while let Some(sum) = self.request_sum(shutdown)? {
            on_sum(sum);
            delivered += 1;

            if !self.config.keep_going {
                break;
            }
            debug!(delivered, "keep-going mode, sending another request");
        }

        Ok(delivered)
    }

    /// Wait for a 4-byte reply until this attempt's deadline.
    ///
    /// Replies of any other length are discarded and the wait continues for
    /// the same outstanding request.
    fn await_response(&self, shutdown: &Shutdown) -> Result<Option<u32>> {
        let deadline = Instant::now() + self.config.response_timeout;
        let mut buf = [0u8; RECV_BUFFER_LEN];

        loop {
            if shutdown.is_triggered() {
                return Ok(None);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            self.socket
                .set_read_timeout(Some(remaining.min(SHUTDOWN_POLL)))?;
            let Some((len, from)) = self.socket.recv_from(&mut buf)? else {
                continue;
            };

            if len != UDP_RESPONSE_LEN {
                warn!(%from, len, "ignoring response with wrong length");
                continue;
            }

            return Ok(Some(decode_udp_response(&buf[..len])?));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use letterlink_frame::encode_udp_response;

    use super::*;

    fn fake_peer() -> DatagramSocket {
        let peer = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        peer
    }

    fn recv(peer: &DatagramSocket) -> (Vec<u8>, SocketAddr) {
        let mut buf = [0u8; 64];
        let (len, from) = peer
            .recv_from(&mut buf)
            .unwrap()
            .expect("client should send a request");
        (buf[..len].to_vec(), from)
    }

    fn sequence(items: &'static [&'static [u8; 3]]) -> impl FnMut() -> LetterTriple + Send {
        let mut next = 0usize;
        move || {
            let letters = LetterTriple::new(*items[next % items.len()]);
            next += 1;
            letters
        }
    }

    fn fast_config() -> ClientConfig {
        ClientConfig {
            response_timeout: Duration::from_millis(150),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn retries_with_fresh_letters_until_answered() {
        let peer = fake_peer();
        let mut client = LetterClient::connect(peer.local_addr(), fast_config())
            .unwrap()
            .with_generator(sequence(&[b"bcd", b"fgh", b"jkl", b"mnp"]));

        let server = thread::spawn(move || {
            let mut seen = Vec::new();
            // Stay silent for the first two attempts.
            for _ in 0..2 {
                seen.push(recv(&peer).0);
            }
            let (third, from) = recv(&peer);
            seen.push(third);
            peer.send_to(&encode_udp_response(1234).unwrap(), from)
                .unwrap();
            seen
        });

        let sum = client.request_sum(&Shutdown::new()).unwrap();
        assert_eq!(sum, Some(1234));

        let seen = server.join().unwrap();
        assert_eq!(seen, [b"bcd".to_vec(), b"fgh".to_vec(), b"jkl".to_vec()]);
    }

    #[test]
    fn default_generator_sends_distinct_lowercase_payloads() {
        let peer = fake_peer();
        let mut client = LetterClient::connect(peer.local_addr(), fast_config()).unwrap();

        let server = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..2 {
                seen.push(recv(&peer).0);
            }
            let (third, from) = recv(&peer);
            seen.push(third);
            peer.send_to(&encode_udp_response(7).unwrap(), from).unwrap();
            seen
        });

        assert_eq!(client.request_sum(&Shutdown::new()).unwrap(), Some(7));

        let seen = server.join().unwrap();
        for payload in &seen {
            assert_eq!(payload.len(), 3);
            assert!(payload.iter().all(u8::is_ascii_lowercase));
        }
    }

    #[test]
    fn wrong_length_reply_keeps_waiting_on_same_request() {
        let peer = fake_peer();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let config = ClientConfig {
            response_timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        };
        let mut client = LetterClient::connect(peer.local_addr(), config)
            .unwrap()
            .with_generator(move || {
                counted.fetch_add(1, Ordering::SeqCst);
                LetterTriple::new(*b"xyz")
            });

        let server = thread::spawn(move || {
            let (_, from) = recv(&peer);
            peer.send_to(&[0xAA, 0xBB], from).unwrap();
            peer.send_to(&[0, 0, 0, 0, 0], from).unwrap();
            thread::sleep(Duration::from_millis(50));
            peer.send_to(&encode_udp_response(486).unwrap(), from)
                .unwrap();
        });

        assert_eq!(client.request_sum(&Shutdown::new()).unwrap(), Some(486));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        server.join().unwrap();
    }

    #[test]
    fn late_reply_answers_current_attempt() {
        let peer = fake_peer();
        let config = ClientConfig {
            response_timeout: Duration::from_millis(300),
            ..ClientConfig::default()
        };
        let mut client = LetterClient::connect(peer.local_addr(), config)
            .unwrap()
            .with_generator(sequence(&[b"bcd", b"fgh"]));

        let server = thread::spawn(move || {
            let (first, from) = recv(&peer);
            // Reply to the first request only after the client gave up on it.
            thread::sleep(Duration::from_millis(450));
            peer.send_to(&encode_udp_response(417).unwrap(), from)
                .unwrap();
            let (second, _) = recv(&peer);
            (first, second)
        });

        assert_eq!(client.request_sum(&Shutdown::new()).unwrap(), Some(417));

        let (first, second) = server.join().unwrap();
        assert_eq!(first, b"bcd");
        assert_eq!(second, b"fgh");
    }

    #[test]
    fn shutdown_cancels_retry_loop() {
        let peer = fake_peer();
        let mut client = LetterClient::connect(peer.local_addr(), fast_config()).unwrap();
        let shutdown = Shutdown::new();

        let trigger = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(400));
                shutdown.trigger();
            })
        };

        let start = Instant::now();
        assert_eq!(client.request_sum(&shutdown).unwrap(), None);
        assert!(start.elapsed() < Duration::from_secs(2));
        trigger.join().unwrap();
        drop(peer);
    }

    #[test]
    fn shutdown_interrupts_long_wait() {
        let peer = fake_peer();
        let config = ClientConfig {
            response_timeout: Duration::from_secs(30),
            ..ClientConfig::default()
        };
        let mut client = LetterClient::connect(peer.local_addr(), config).unwrap();
        let shutdown = Shutdown::new();

        let trigger = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(150));
                shutdown.trigger();
            })
        };

        let start = Instant::now();
        assert_eq!(client.request_sum(&shutdown).unwrap(), None);
        assert!(start.elapsed() < Duration::from_secs(2));
        trigger.join().unwrap();
    }

    #[test]
    fn already_cancelled_sends_nothing() {
        let peer = fake_peer();
        peer.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut client = LetterClient::connect(peer.local_addr(), fast_config()).unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();

        assert_eq!(client.request_sum(&shutdown).unwrap(), None);
        let mut buf = [0u8; 8];
        assert!(peer.recv_from(&mut buf).unwrap().is_none());
    }

    #[test]
    fn single_shot_run_delivers_once() {
        let peer = fake_peer();
        let mut client = LetterClient::connect(peer.local_addr(), fast_config()).unwrap();

        let server = thread::spawn(move || {
            let (_, from) = recv(&peer);
            peer.send_to(&encode_udp_response(42).unwrap(), from).unwrap();
        });

        let mut sums = Vec::new();
        let delivered = client.run(&Shutdown::new(), |sum| sums.push(sum)).unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(sums, [42]);
        server.join().unwrap();
    }

    #[test]
    fn keep_going_runs_until_shutdown() {
        let peer = fake_peer();
        let config = ClientConfig {
            keep_going: true,
            ..fast_config()
        };
        let mut client = LetterClient::connect(peer.local_addr(), config).unwrap();
        let shutdown = Shutdown::new();

        let server = thread::spawn(move || {
            for answer in 1..=3u64 {
                let (_, from) = recv(&peer);
                peer.send_to(&encode_udp_response(answer).unwrap(), from)
                    .unwrap();
            }
        });

        let mut sums = Vec::new();
        let stop = shutdown.clone();
        let delivered = client
            .run(&shutdown, |sum| {
                sums.push(sum);
                if sums.len() == 3 {
                    stop.trigger();
                }
            })
            .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(sums, [1, 2, 3]);
        server.join().unwrap();
    }
}
