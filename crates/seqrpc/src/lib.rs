//! Sequence-correlated RPC over length-prefixed JSON frames.
//!
//! seqrpc multiplexes many concurrent calls over a single TCP connection.
//! Every request carries a client-assigned sequence number and the server
//! echoes it back, so responses can arrive in any order and still reach the
//! caller that asked.
//!
//! # Crate Structure
//!
//! - [`wire`] — Framing, the request/response envelope, and parameter marshaling
//! - [`client`] — Multiplexing client with a background dispatch thread
//! - [`server`] — Typed service registry and per-connection TCP dispatch
//! - [`StaticRoutes`] — In-process service directory for client-side routing

/// Re-export wire types.
pub mod wire {
    pub use seqrpc_wire::*;
}

/// Re-export client types.
pub mod client {
    pub use seqrpc_client::*;
}

/// Re-export server types.
pub mod server {
    pub use seqrpc_server::*;
}

pub mod directory;

pub use directory::StaticRoutes;
