//! Shared outbound connection pool.
//!
//! # Responsibilities
//! - Own the single `reqwest::Client` every downstream call goes through
//! - Cap concurrent calls in total and per destination host (0 = unbounded)
//! - Track in-flight calls for diagnostics
//!
//! # Design Decisions
//! - Caps are tokio semaphores; a call holds a [`PoolPermit`] for its whole
//!   lifetime and releases it on drop, including on timeout or cancellation
//! - The per-host permit is taken before the global one so a saturated host
//!   never holds global slots while it waits
//! - Built once by the host process and shared as `Arc<ConnectionPool>`

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ClientConfig;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug)]
struct HostSlot {
    limit: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
}

impl HostSlot {
    fn new(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then(|| Arc::new(Semaphore::new(limit))),
            in_flight: AtomicUsize::new(0),
        }
    }
}

/// Pooled HTTP client with concurrency caps.
#[derive(Debug)]
pub struct ConnectionPool {
    client: reqwest::Client,
    total_limit: Option<Arc<Semaphore>>,
    per_host_limit: usize,
    hosts: DashMap<String, Arc<HostSlot>>,
    in_flight: Arc<AtomicUsize>,
}

impl ConnectionPool {
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if config.concurrency_limit_per_host > 0 {
            builder = builder.pool_max_idle_per_host(config.concurrency_limit_per_host);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::transport(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            concurrency_limit = config.concurrency_limit,
            concurrency_limit_per_host = config.concurrency_limit_per_host,
            "Connection pool created"
        );

        Ok(Self {
            client,
            total_limit: (config.concurrency_limit > 0)
                .then(|| Arc::new(Semaphore::new(config.concurrency_limit))),
            per_host_limit: config.concurrency_limit_per_host,
            hosts: DashMap::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Wait for a free slot towards `host`.
    pub async fn acquire(&self, host: &str) -> ServiceResult<PoolPermit> {
        let slot = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostSlot::new(self.per_host_limit)))
            .clone();

        let host_permit = acquire_owned(slot.limit.as_ref()).await?;
        let total_permit = acquire_owned(self.total_limit.as_ref()).await?;

        self.in_flight.fetch_add(1, Ordering::Relaxed);
        slot.in_flight.fetch_add(1, Ordering::Relaxed);

        Ok(PoolPermit {
            _host_permit: host_permit,
            _total_permit: total_permit,
            slot,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Calls currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn in_flight_for(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map(|slot| slot.in_flight.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

async fn acquire_owned(
    limit: Option<&Arc<Semaphore>>,
) -> ServiceResult<Option<OwnedSemaphorePermit>> {
    match limit {
        Some(semaphore) => semaphore
            .clone()
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|_| ServiceError::transport("Connection pool closed")),
        None => Ok(None),
    }
}

/// RAII guard for one in-flight call.
#[derive(Debug)]
pub struct PoolPermit {
    _host_permit: Option<OwnedSemaphorePermit>,
    _total_permit: Option<OwnedSemaphorePermit>,
    slot: Arc<HostSlot>,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.slot.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(total: usize, per_host: usize) -> ConnectionPool {
        ConnectionPool::new(&ClientConfig {
            concurrency_limit: total,
            concurrency_limit_per_host: per_host,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_permit_tracks_in_flight() {
        let pool = pool(0, 0);
        let a = pool.acquire("users:80").await.unwrap();
        let b = pool.acquire("orders:80").await.unwrap();
        assert_eq!(pool.in_flight(), 2);
        assert_eq!(pool.in_flight_for("users:80"), 1);

        drop(a);
        assert_eq!(pool.in_flight(), 1);
        assert_eq!(pool.in_flight_for("users:80"), 0);
        drop(b);
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.in_flight_for("unknown:80"), 0);
    }

    #[tokio::test]
    async fn test_per_host_cap_blocks_same_host_only() {
        let pool = pool(0, 1);
        let held = pool.acquire("users:80").await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), pool.acquire("users:80")).await;
        assert!(blocked.is_err());

        let other =
            tokio::time::timeout(Duration::from_millis(50), pool.acquire("orders:80")).await;
        assert!(other.is_ok());

        drop(held);
        let freed = tokio::time::timeout(Duration::from_millis(50), pool.acquire("users:80")).await;
        assert!(freed.is_ok());
    }

    #[tokio::test]
    async fn test_total_cap() {
        let pool = pool(1, 0);
        let _held = pool.acquire("users:80").await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), pool.acquire("orders:80")).await;
        assert!(blocked.is_err());
        assert_eq!(pool.in_flight(), 1);
    }
}
