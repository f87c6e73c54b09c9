use std::time::Duration;

use seqrpc_wire::Protocol;

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (`host:port`).
    pub address: String,
    /// Maximum time a caller blocks waiting for its response.
    pub read_timeout: Duration,
    /// Optional TCP connect timeout. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Retry count. Declared for configuration compatibility; the call
    /// path does not consult it — there is no automatic retry.
    pub retries: u32,
    /// Protocol descriptor (framing is fixed, payload codec is pluggable).
    pub protocol: Protocol,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9999".to_string(),
            read_timeout: Duration::from_secs(2),
            connect_timeout: None,
            retries: 0,
            protocol: Protocol::json(),
        }
    }
}

impl ClientConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}
