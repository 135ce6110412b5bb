/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] letterlink_transport::TransportError),

    /// Message-level error.
    #[error("frame error: {0}")]
    Frame(#[from] letterlink_frame::FrameError),
}

impl PeerError {
    /// Whether the underlying failure is an expired socket timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            PeerError::Transport(err) => err.is_timeout(),
            PeerError::Frame(err) => err.is_timeout(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;
