//! RPC client for seqrpc.
//!
//! A [`Client`] owns one TCP connection and multiplexes arbitrarily many
//! concurrent calls over it. Each call is stamped with a unique sequence
//! number; a background dispatch thread reads responses off the connection
//! and hands each one to the caller whose request carried the same number,
//! regardless of arrival order.

pub mod client;
pub mod config;
pub mod error;
pub mod locator;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use locator::{connect_service, Locator};
