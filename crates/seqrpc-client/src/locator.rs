use std::net::SocketAddr;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::Result;

/// Resolves a logical service name to a network address.
///
/// Implementations range from a static table to a discovery backend; the
/// client does not care which, it only needs an address to dial.
pub trait Locator: Send + Sync {
    fn resolve(&self, service_name: &str) -> Result<SocketAddr>;
}

/// Resolve `service_name` through `locator` and connect to the result.
///
/// The address in `config` is ignored; everything else (timeouts, protocol)
/// applies to the new connection.
pub fn connect_service(
    locator: &dyn Locator,
    service_name: &str,
    config: ClientConfig,
) -> Result<Client> {
    let addr = locator.resolve(service_name)?;
    Client::connect(config.with_address(addr.to_string()))
}
