use seqrpc_wire::Protocol;

/// Server construction options.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (`host:port`).
    pub address: String,
    /// Protocol descriptor shared by every accepted connection.
    pub protocol: Protocol,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:9999".to_string(),
            protocol: Protocol::json(),
        }
    }
}

impl ServerConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}
