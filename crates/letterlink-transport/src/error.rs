use std::net::SocketAddr;

/// Errors that can occur in socket transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on a socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The address could not be resolved to a socket address.
    #[error("could not resolve address {0}")]
    Resolve(String),
}

impl TransportError {
    /// Whether this error is a socket timeout rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Io(err)
            | TransportError::Accept(err)
            | TransportError::Connect { source: err, .. } => crate::is_timeout(err),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
