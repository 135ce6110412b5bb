//! Letter-triple exchange between two endpoints over UDP and TCP.
//!
//! Endpoint A serves letter requests over TCP and sends random letters to
//! endpoint B over UDP. Endpoint B relays each UDP request to A over TCP,
//! reversed, and answers with the sum of the values A returned.
//!
//! # Crate Structure
//!
//! - [`transport`] - TCP/UDP sockets with shutdown-friendly timeouts
//! - [`frame`] - Wire codec, letter validation, exact reads
//! - [`peer`] - Endpoint server, client, and relay loops (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use letterlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use letterlink_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use letterlink_peer::*;
}
