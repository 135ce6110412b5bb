use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::letters::LETTER_COUNT;

/// TCP request: the three letter bytes, no prefix.
pub const TCP_REQUEST_LEN: usize = LETTER_COUNT;

/// UDP request: the three letter bytes, no prefix.
pub const UDP_REQUEST_LEN: usize = LETTER_COUNT;

/// TCP response status byte.
pub const TCP_RESPONSE_HEADER_LEN: usize = 1;

/// Payload following a valid status byte: three big-endian `u16`.
pub const TCP_RESPONSE_VALID_PAYLOAD_LEN: usize = 6;

/// Total size of a valid TCP response.
pub const TCP_RESPONSE_VALID_LEN: usize = TCP_RESPONSE_HEADER_LEN + TCP_RESPONSE_VALID_PAYLOAD_LEN;

/// UDP response: one big-endian `u32`.
pub const UDP_RESPONSE_LEN: usize = 4;

/// Status byte for a rejected request.
pub const STATUS_INVALID: u8 = 0x00;

/// Status byte for an accepted request.
pub const STATUS_VALID: u8 = 0x01;

/// A decoded TCP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpResponse {
    /// The request failed validation. Nothing follows the status byte.
    Invalid,
    /// The request passed validation; one value per letter, in order.
    Valid([u16; LETTER_COUNT]),
}

impl TcpResponse {
    /// The status byte this response is sent with.
    pub fn status(&self) -> u8 {
        match self {
            TcpResponse::Invalid => STATUS_INVALID,
            TcpResponse::Valid(_) => STATUS_VALID,
        }
    }

    /// The total wire size of this response.
    pub fn wire_size(&self) -> usize {
        match self {
            TcpResponse::Invalid => TCP_RESPONSE_HEADER_LEN,
            TcpResponse::Valid(_) => TCP_RESPONSE_VALID_LEN,
        }
    }

    /// Encode into the wire format.
    pub fn encode(&self) -> Bytes {
        match *self {
            TcpResponse::Invalid => encode_tcp_response_invalid(),
            TcpResponse::Valid([v1, v2, v3]) => encode_tcp_response_valid(v1, v2, v3),
        }
    }

    /// Sum of the values, for valid responses.
    pub fn sum(&self) -> Option<u64> {
        match *self {
            TcpResponse::Invalid => None,
            TcpResponse::Valid(values) => Some(sum_values(values)),
        }
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(FrameError::Length {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Encode a TCP request (B to A). The letters go on the wire unchanged.
pub fn encode_tcp_request(letters: &[u8]) -> Result<Bytes> {
    check_len(letters, TCP_REQUEST_LEN)?;
    Ok(Bytes::copy_from_slice(letters))
}

/// Encode an invalid TCP response: the single status byte `0x00`.
pub fn encode_tcp_response_invalid() -> Bytes {
    Bytes::from_static(&[STATUS_INVALID])
}

/// Encode a valid TCP response.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┐
/// │ Status   │ Value 1  │ Value 2  │ Value 3  │
/// │ 0x01     │ (2B BE)  │ (2B BE)  │ (2B BE)  │
/// └──────────┴──────────┴──────────┴──────────┘
/// ```
pub fn encode_tcp_response_valid(v1: u16, v2: u16, v3: u16) -> Bytes {
    let mut dst = BytesMut::with_capacity(TCP_RESPONSE_VALID_LEN);
    dst.put_u8(STATUS_VALID);
    dst.put_u16(v1);
    dst.put_u16(v2);
    dst.put_u16(v3);
    dst.freeze()
}

/// Decode a TCP response.
///
/// An invalid status decodes as [`TcpResponse::Invalid`] whatever follows
/// it. A valid status requires the complete 7-byte message.
pub fn decode_tcp_response(data: &[u8]) -> Result<TcpResponse> {
    let Some((&status, mut payload)) = data.split_first() else {
        return Err(FrameError::EmptyInput);
    };

    match status {
        STATUS_INVALID => Ok(TcpResponse::Invalid),
        STATUS_VALID => {
            check_len(data, TCP_RESPONSE_VALID_LEN)?;
            let values = [payload.get_u16(), payload.get_u16(), payload.get_u16()];
            Ok(TcpResponse::Valid(values))
        }
        other => Err(FrameError::Range {
            what: "status byte",
            value: u64::from(other),
        }),
    }
}

/// Encode a UDP request (A to B). The letters go on the wire unchanged.
pub fn encode_udp_request(letters: &[u8]) -> Result<Bytes> {
    check_len(letters, UDP_REQUEST_LEN)?;
    Ok(Bytes::copy_from_slice(letters))
}

/// Encode a UDP response carrying `sum` as a big-endian `u32`.
pub fn encode_udp_response(sum: u64) -> Result<Bytes> {
    let sum = u32::try_from(sum).map_err(|_| FrameError::Range {
        what: "udp response sum",
        value: sum,
    })?;
    let mut dst = BytesMut::with_capacity(UDP_RESPONSE_LEN);
    dst.put_u32(sum);
    Ok(dst.freeze())
}

/// Decode a UDP response into its sum.
pub fn decode_udp_response(data: &[u8]) -> Result<u32> {
    check_len(data, UDP_RESPONSE_LEN)?;
    let mut src = data;
    Ok(src.get_u32())
}

/// Sum of three response values.
pub fn sum_values(values: [u16; LETTER_COUNT]) -> u64 {
    values.iter().copied().map(u64::from).sum()
}
