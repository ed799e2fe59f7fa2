//! Downstream client registry.
//!
//! # Responsibilities
//! - Build one [`DownstreamClient`] per configured downstream
//! - Share a single [`ConnectionPool`] between all of them
//! - Point every client at a local port for tests

use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::client::downstream::DownstreamClient;
use crate::client::pool::ConnectionPool;
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};

/// All downstream clients of this service, keyed by name.
#[derive(Debug, Clone)]
pub struct DownstreamRegistry {
    pool: Arc<ConnectionPool>,
    clients: HashMap<String, DownstreamClient>,
}

impl DownstreamRegistry {
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        let pool = Arc::new(ConnectionPool::new(&config.client)?);
        let identity = Arc::new(config.service.clone());

        let clients = config
            .downstreams
            .iter()
            .map(|downstream| {
                let client = DownstreamClient::from_config(
                    downstream,
                    &config.client,
                    pool.clone(),
                    identity.clone(),
                );
                (downstream.name.clone(), client)
            })
            .collect::<HashMap<_, _>>();

        tracing::info!(
            service = %config.service.name,
            downstreams = clients.len(),
            "Downstream registry built"
        );

        Ok(Self { pool, clients })
    }

    pub fn get(&self, name: &str) -> Option<&DownstreamClient> {
        self.clients.get(name)
    }

    /// Like [`get`](Self::get), failing with `NotFound` for unknown names.
    pub fn client(&self, name: &str) -> ServiceResult<&DownstreamClient> {
        self.get(name)
            .ok_or_else(|| ServiceError::not_found(format!("Unknown downstream: {}", name)))
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Rewrite every client's host to `http://127.0.0.1:<port>`, keeping the
    /// host's path prefix.
    pub fn with_host_override(mut self, port: u16) -> Self {
        for client in self.clients.values_mut() {
            let host = local_host(client.host(), port);
            tracing::debug!(
                downstream = %client.name(),
                host = %host,
                "Overriding downstream host"
            );
            client.set_host(host);
        }
        self
    }
}

fn local_host(host: &str, port: u16) -> String {
    let path = Url::parse(host)
        .map(|url| url.path().to_string())
        .unwrap_or_default();
    let path = if path == "/" && !host.ends_with('/') {
        String::new()
    } else {
        path
    };
    format!("http://127.0.0.1:{}{}", port, path)
}
