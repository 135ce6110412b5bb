use std::io::{ErrorKind, Write};

use crate::codec::{encode_tcp_request, TcpResponse};
use crate::error::{FrameError, Result};
use crate::letters::LetterTriple;

/// Writes complete protocol messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
}

impl<T: Write> MessageWriter<T> {
    /// Wrap `inner`. Timeouts are whatever the stream already has.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Send a 3-byte request.
    pub fn send_request(&mut self, letters: &LetterTriple) -> Result<()> {
        let wire = encode_tcp_request(letters.as_ref())?;
        self.write_message(&wire)
    }

    /// Send a TCP response.
    pub fn send_response(&mut self, response: &TcpResponse) -> Result<()> {
        self.write_message(&response.encode())
    }

    /// Write an already-encoded message in full, then flush.
    pub fn write_message(&mut self, wire: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < wire.len() {
            match self.inner.write(&wire[offset..]) {
                Ok(0) => {
                    return Err(FrameError::ConnectionClosed {
                        remaining: wire.len() - offset,
                    })
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
