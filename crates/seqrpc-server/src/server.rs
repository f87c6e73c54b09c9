use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use seqrpc_wire::{FrameReader, FrameWriter, Protocol, WireError};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::registrar::Registrar;
use crate::registry::{Registry, ServiceDef};

/// TCP front end over a shared [`Registry`].
///
/// Clones share the registry and registrar, so a clone can be moved into a
/// signal handler or another thread to keep registering services while the
/// original serves.
#[derive(Clone)]
pub struct Server {
    registry: Arc<Registry>,
    registrar: Option<Arc<dyn Registrar>>,
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            registrar: None,
            config,
        }
    }

    /// Attach an external announcement hook consulted on every `register`.
    pub fn with_registrar(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a service: validate it locally, announce it through the
    /// registrar (if any), then install it for dispatch. The registrar is
    /// only consulted for services that will actually become live, and a
    /// rejected announcement leaves the registry untouched.
    pub fn register(&self, def: ServiceDef) -> Result<()> {
        let resolved = def.resolve();
        let name = resolved.name().to_string();
        if name.is_empty() {
            return Err(ServerError::UnnamedService);
        }
        if self.registry.contains(&name) {
            warn!(service = %name, "duplicate registration rejected");
            return Err(ServerError::DuplicateService(name));
        }
        if resolved.method_count() == 0 {
            warn!(service = %name, "service has no usable methods, rejecting");
            return Err(ServerError::EmptyService(name));
        }

        if let Some(registrar) = &self.registrar {
            if let Err(err) = registrar.register(&name) {
                warn!(service = %name, %err, "registrar rejected service");
                return Err(ServerError::RegistrarRejected {
                    service: name,
                    reason: err.to_string(),
                });
            }
        }

        let installed = self.registry.insert(resolved);
        info!(service = %name, methods = installed, "service registered");
        Ok(())
    }

    /// Bind the configured address and serve until the listener fails.
    pub fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.address).map_err(|source| {
            ServerError::Bind {
                addr: self.config.address.clone(),
                source,
            }
        })?;
        info!(addr = %self.config.address, "listening");
        self.serve_on(listener)
    }

    /// Serve on an already-bound listener. Useful with an ephemeral port.
    pub fn serve_on(&self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let registry = Arc::clone(&self.registry);
                    let protocol = self.config.protocol.clone();
                    thread::spawn(move || handle_connection(registry, protocol, stream));
                }
                Err(err) => warn!(%err, "accept failed"),
            }
        }
        Ok(())
    }
}

/// Per-connection loop: decode a request, dispatch it, write the response.
///
/// Requests on one connection are handled strictly in order. Malformed
/// payloads are skipped because framing stays aligned; anything that can
/// desynchronize the stream ends the connection.
fn handle_connection(registry: Arc<Registry>, protocol: Protocol, stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    debug!(%peer, "connection accepted");

    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            error!(%peer, %err, "failed to clone connection stream");
            return;
        }
    };
    let mut reader = FrameReader::new(reader_stream);
    let mut writer = FrameWriter::new(stream);

    loop {
        let req = match protocol.read_request(&mut reader) {
            Ok(req) => req,
            Err(WireError::StreamEnded) => {
                debug!(%peer, "connection closed");
                break;
            }
            Err(err @ WireError::MalformedPayload(_)) => {
                warn!(%peer, %err, "discarding undecodable request");
                continue;
            }
            Err(err) => {
                error!(%peer, %err, "request stream failed");
                break;
            }
        };

        let resp = registry.dispatch(&req);
        if let Err(err) = protocol.write_response(&mut writer, &resp) {
            error!(%peer, %err, "failed to write response");
            break;
        }
    }
}
