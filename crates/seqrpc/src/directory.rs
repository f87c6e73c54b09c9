//! In-process service directory.
//!
//! [`StaticRoutes`] maps service names to addresses from configuration. On
//! the client side it acts as a [`Locator`] and caches one connection per
//! service; on the server side it doubles as a [`Registrar`] that only
//! admits services it has a route for, so a misconfigured deployment fails
//! at registration instead of at first call.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, RwLock};

use seqrpc_client::{Client, ClientConfig, ClientError, Locator};
use seqrpc_server::Registrar;
use seqrpc_wire::{Response, Value};
use tracing::debug;

pub struct StaticRoutes {
    routes: RwLock<HashMap<String, SocketAddr>>,
    clients: Mutex<HashMap<String, Client>>,
    config: ClientConfig,
}

impl StaticRoutes {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Connections opened through [`call`](Self::call) use this config, with
    /// the address replaced per service.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn add_route(&self, service_name: impl Into<String>, addr: SocketAddr) {
        self.write_routes().insert(service_name.into(), addr);
    }

    pub fn routes(&self) -> Vec<(String, SocketAddr)> {
        let mut routes: Vec<_> = self
            .read_routes()
            .iter()
            .map(|(name, addr)| (name.clone(), *addr))
            .collect();
        routes.sort();
        routes
    }

    /// Resolve the service, reuse (or open) its connection, and make one call.
    ///
    /// A transport failure evicts the cached connection so the next call
    /// dials fresh; the error is still returned to this caller.
    pub fn call(
        &self,
        service: &str,
        method: &str,
        params: Vec<Value>,
    ) -> seqrpc_client::Result<Response> {
        let client = self.client_for(service)?;
        let result = client.call(service, method, params);
        if let Err(ClientError::Closed | ClientError::Wire(_)) = &result {
            debug!(service, "dropping cached connection after transport error");
            self.lock_clients().remove(service);
        }
        result
    }

    fn client_for(&self, service: &str) -> seqrpc_client::Result<Client> {
        if let Some(client) = self.lock_clients().get(service) {
            return Ok(client.clone());
        }

        let addr = self.resolve(service)?;
        let client = Client::connect(self.config.clone().with_address(addr.to_string()))?;
        // A racing caller may have connected first; keep the winner.
        Ok(self
            .lock_clients()
            .entry(service.to_string())
            .or_insert(client)
            .clone())
    }

    fn read_routes(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, SocketAddr>> {
        match self.routes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_routes(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, SocketAddr>> {
        match self.routes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_clients(&self) -> std::sync::MutexGuard<'_, HashMap<String, Client>> {
        match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for StaticRoutes {
    fn default() -> Self {
        Self::new()
    }
}

impl Locator for StaticRoutes {
    fn resolve(&self, service_name: &str) -> seqrpc_client::Result<SocketAddr> {
        self.read_routes()
            .get(service_name)
            .copied()
            .ok_or_else(|| ClientError::Resolve {
                name: service_name.to_string(),
                reason: "no route configured".to_string(),
            })
    }
}

impl Registrar for StaticRoutes {
    /// Admits only services the directory has a route for.
    fn register(
        &self,
        service_name: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.read_routes().contains_key(service_name) {
            Ok(())
        } else {
            Err(format!("no route configured for '{service_name}'").into())
        }
    }
}
