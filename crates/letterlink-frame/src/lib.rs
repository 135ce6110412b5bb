//! Fixed-size wire codec and exact-read framing for letterlink.
//!
//! Every message on the wire has a size fixed by its type:
//! - TCP and UDP requests are 3 raw letter bytes
//! - TCP responses are a status byte, followed by three big-endian `u16`
//!   values when the status is valid
//! - UDP responses are one big-endian `u32`
//!
//! The fixed size is the framing, so readers never guess at message
//! boundaries and never return short reads.

pub mod codec;
pub mod error;
pub mod letters;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_tcp_response, decode_udp_response, encode_tcp_request, encode_tcp_response_invalid,
    encode_tcp_response_valid, encode_udp_request, encode_udp_response, sum_values,
    TcpResponse, STATUS_INVALID, STATUS_VALID, TCP_REQUEST_LEN, TCP_RESPONSE_HEADER_LEN,
    TCP_RESPONSE_VALID_LEN, TCP_RESPONSE_VALID_PAYLOAD_LEN, UDP_REQUEST_LEN, UDP_RESPONSE_LEN,
};
pub use error::{FrameError, Result};
pub use letters::{is_valid_letters, LetterTriple, LETTER_COUNT, VALUE_OFFSET};
pub use reader::{read_exact, MessageReader};
pub use writer::MessageWriter;
