use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::trace;

use crate::codec::{
    decode_tcp_response, TcpResponse, STATUS_INVALID, TCP_REQUEST_LEN, TCP_RESPONSE_HEADER_LEN,
    TCP_RESPONSE_VALID_LEN, TCP_RESPONSE_VALID_PAYLOAD_LEN,
};
use crate::error::{FrameError, Result};
use crate::letters::LetterTriple;

/// Read exactly `n` bytes from `reader`.
///
/// Partial reads are accumulated until `n` bytes are in hand. End-of-stream
/// before that fails with [`FrameError::ConnectionClosed`] carrying the count
/// still outstanding; any other I/O failure, timeouts included, fails with
/// [`FrameError::Io`].
pub fn read_exact<R: Read + ?Sized>(reader: &mut R, n: usize) -> Result<Bytes> {
    let mut buf = vec![0u8; n];
    let mut filled = 0usize;

    while filled < n {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FrameError::ConnectionClosed {
                    remaining: n - filled,
                })
            }
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    Ok(Bytes::from(buf))
}

/// Reads complete protocol messages from any `Read` stream.
///
/// Handles partial reads internally, so callers always get complete messages.
pub struct MessageReader<T> {
    inner: T,
}

impl<T: Read> MessageReader<T> {
    /// Wrap `inner`. Timeouts are whatever the stream already has.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read a 3-byte request (blocking).
    pub fn read_request(&mut self) -> Result<LetterTriple> {
        let data = read_exact(&mut self.inner, TCP_REQUEST_LEN)?;
        trace!(len = data.len(), "read request");
        LetterTriple::from_slice(&data)
    }

    /// Read a TCP response (blocking).
    ///
    /// Reads the status byte first and only reads the value payload when the
    /// status says one follows.
    pub fn read_response(&mut self) -> Result<TcpResponse> {
        let status = read_exact(&mut self.inner, TCP_RESPONSE_HEADER_LEN)?;
        if status[0] == STATUS_INVALID {
            trace!("read invalid response");
            return decode_tcp_response(&status);
        }

        let payload = read_exact(&mut self.inner, TCP_RESPONSE_VALID_PAYLOAD_LEN)?;
        let mut full = Vec::with_capacity(TCP_RESPONSE_VALID_LEN);
        full.extend_from_slice(&status);
        full.extend_from_slice(&payload);
        decode_tcp_response(&full)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
