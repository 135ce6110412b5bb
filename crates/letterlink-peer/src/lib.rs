//! letterlink endpoints.
//!
//! Endpoint A runs a [`LetterServer`] (TCP) and a [`LetterClient`] (UDP).
//! Endpoint B runs a [`RelayServer`] that turns each UDP request into one TCP
//! exchange with endpoint A and forwards the summed result back.
//!
//! Every long-running loop takes a [`Shutdown`] token and checks it at a
//! bounded interval.

pub mod client;
pub mod error;
pub mod relay;
pub mod server;
pub mod shutdown;

pub use client::{ClientConfig, LetterClient};
pub use error::{PeerError, Result};
pub use relay::{query_upstream, RelayConfig, RelayServer};
pub use server::{handle_connection, respond_to, Exchange, LetterServer, ServerConfig};
pub use shutdown::Shutdown;
