use std::io::{Read, Write};
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use letterlink_frame::{LetterTriple, MessageReader, MessageWriter, TcpResponse};
use letterlink_transport::{LinkStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::shutdown::Shutdown;

/// Server behavior configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Read timeout applied to each accepted connection.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to each accepted connection.
    pub write_timeout: Option<Duration>,
    /// How long one accept poll waits before checking for shutdown.
    pub accept_poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(Duration::from_secs(5)),
            write_timeout: Some(Duration::from_secs(5)),
            accept_poll_interval: Duration::from_millis(50),
        }
    }
}

/// One completed request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// The request as received.
    pub letters: LetterTriple,
    /// The response that was sent.
    pub response: TcpResponse,
}

/// The response a request earns: values for a valid triple, a bare
/// invalid status otherwise.
pub fn respond_to(letters: &LetterTriple) -> TcpResponse {
    match letters.values() {
        Some(values) => TcpResponse::Valid(values),
        None => TcpResponse::Invalid,
    }
}

/// Serve one request over `stream`: read 3 bytes, validate, reply.
///
/// Nothing is written unless a complete request was read. The stream is
/// consumed, so it is closed when this returns on any path.
pub fn handle_connection<S: Read + Write>(stream: S) -> Result<Exchange> {
    let mut reader = MessageReader::new(stream);
    let letters = reader.read_request()?;
    debug!(%letters, "received request");

    let response = respond_to(&letters);
    let mut writer = MessageWriter::new(reader.into_inner());
    writer.send_response(&response)?;

    Ok(Exchange { letters, response })
}

/// TCP side of endpoint A.
///
/// Accepts connections until shutdown and serves each one on its own thread.
pub struct LetterServer {
    transport: TcpTransport,
    config: ServerConfig,
}

impl LetterServer {
    /// Bind the listening socket.
    pub fn bind(addr: SocketAddr, config: ServerConfig) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self { transport, config })
    }

    /// Bound listening address.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Run the accept loop until `shutdown` is triggered.
    ///
    /// After the loop stops accepting, in-flight connections are allowed to
    /// finish before the listener is released.
    pub fn serve(self, shutdown: &Shutdown) {
        info!(addr = %self.local_addr(), "tcp server accepting connections");
        let mut handlers: Vec<JoinHandle<()>> = Vec::new();

        while !shutdown.is_triggered() {
            let stream = match self.transport.poll_accept(self.config.accept_poll_interval) {
                Ok(Some(stream)) => stream,
                Ok(None) => continue,
                Err(err) => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    warn!(error = %err, "accept failed");
                    thread::sleep(self.config.accept_poll_interval);
                    continue;
                }
            };

            handlers.retain(|handle| !handle.is_finished());

            let peer = stream.peer_addr();
            let config = self.config.clone();
            let spawned = thread::Builder::new()
                .name(format!("letterlink-tcp-{peer}"))
                .spawn(move || run_connection(stream, &config));
            match spawned {
                Ok(handle) => handlers.push(handle),
                Err(err) => warn!(%peer, error = %err, "failed to spawn connection handler"),
            }
        }

        info!(in_flight = handlers.len(), "tcp server shutting down");
        for handle in handlers {
            if handle.join().is_err() {
                warn!("connection handler panicked");
            }
        }
    }
}

fn run_connection(stream: LinkStream, config: &ServerConfig) {
    let peer = stream.peer_addr();
    debug!(%peer, "connection opened");

    let prepared = stream
        .set_read_timeout(config.read_timeout)
        .and_then(|()| stream.set_write_timeout(config.write_timeout));
    if let Err(err) = prepared {
        warn!(%peer, error = %err, "failed to configure connection");
        return;
    }

    match handle_connection(stream) {
        Ok(Exchange {
            letters,
            response: TcpResponse::Invalid,
        }) => info!(%peer, %letters, "invalid request, responded with status 0"),
        Ok(Exchange {
            letters,
            response: TcpResponse::Valid(values),
        }) => info!(%peer, %letters, ?values, "valid request"),
        Err(err) if err.is_timeout() => warn!(%peer, "timed out waiting for request"),
        Err(err) => warn!(%peer, error = %err, "error while handling connection"),
    }

    debug!(%peer, "connection closed");
}
