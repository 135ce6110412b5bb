/// Errors that can occur during message encoding, decoding, and exact reads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A payload or message had the wrong size for its type.
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// Zero bytes were supplied where a message was expected.
    #[error("empty input where a message was expected")]
    EmptyInput,

    /// The peer closed the stream before the requested bytes arrived.
    #[error("connection closed while reading, {remaining} bytes remaining")]
    ConnectionClosed { remaining: usize },

    /// An I/O error occurred on the underlying stream, including timeouts.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value fell outside the bounds the protocol defines for it.
    #[error("{what} out of range: {value}")]
    Range { what: &'static str, value: u64 },
}

impl FrameError {
    /// Whether this error is an expired socket timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err) if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
