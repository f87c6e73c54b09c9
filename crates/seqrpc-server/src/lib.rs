//! RPC server for seqrpc.
//!
//! Services are described with [`ServiceDef`] builders, installed into a
//! shared [`Registry`], and exposed over TCP by [`Server`]. Each accepted
//! connection gets its own handler thread; requests on a connection are
//! processed sequentially, so a client that wants parallelism multiplexes
//! calls over one connection and correlates responses by sequence number.

pub mod config;
pub mod error;
pub mod registrar;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use registrar::Registrar;
pub use registry::{Registry, ServiceDef, ServiceMethod};
pub use server::Server;
