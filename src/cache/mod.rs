//! Advisory key-value cache.
//!
//! The cache is an optimization only. [`CacheClient`] turns every backend
//! error, timeout, or missing backend into a miss or a no-op so callers never
//! have to handle cache failures.
//!
//! # Backends
//!
//! | Backend | Feature | Notes |
//! |---------|---------|-------|
//! | [`MemoryCache`] | always | Per-process map with expiry instants |
//! | [`RedisCache`] | `redis` | `SET EX` / `GET` / `DEL` over a connection manager |

mod memory;
mod redis;

pub use self::redis::RedisCache;
pub use memory::MemoryCache;

use crate::config::DEFAULT_CACHE_TTL_SECS;
use crate::{Result, with_timeout};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A string key-value store with per-entry expiry.
///
/// A `ttl_secs` of zero stores the entry without expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Fail-silent front for an optional [`Cache`] backend.
#[derive(Clone)]
pub struct CacheClient {
    backend: Option<Arc<dyn Cache>>,
    timeout: Duration,
    default_ttl_secs: u64,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("timeout", &self.timeout)
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish()
    }
}

impl CacheClient {
    /// Wraps a backend with a per-call timeout.
    #[must_use]
    pub fn new(backend: Arc<dyn Cache>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
            default_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// A client with no backend. Every read misses and every write is dropped.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            backend: None,
            timeout: Duration::ZERO,
            default_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// Sets the TTL used by [`Self::set_json`].
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    /// Returns true when a backend is attached.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Returns the default TTL in seconds.
    #[must_use]
    pub const fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Reads `key`. Any failure is logged and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        let start = Instant::now();
        let result = with_timeout("cache_get", self.timeout, backend.get(key)).await;
        match result {
            Ok(Some(value)) => {
                record("get", "hit", backend.name(), start);
                Some(value)
            },
            Ok(None) => {
                record("get", "miss", backend.name(), start);
                None
            },
            Err(e) => {
                record("get", "error", backend.name(), start);
                tracing::warn!(key, backend = backend.name(), error = %e, "Cache read failed");
                None
            },
        }
    }

    /// Writes `key`. Any failure is logged and dropped.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let start = Instant::now();
        match with_timeout("cache_set", self.timeout, backend.set(key, value, ttl_secs)).await {
            Ok(()) => record("set", "success", backend.name(), start),
            Err(e) => {
                record("set", "error", backend.name(), start);
                tracing::warn!(key, backend = backend.name(), error = %e, "Cache write failed");
            },
        }
    }

    /// Removes `key`. Any failure is logged and dropped.
    pub async fn delete(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let start = Instant::now();
        match with_timeout("cache_delete", self.timeout, backend.delete(key)).await {
            Ok(()) => record("delete", "success", backend.name(), start),
            Err(e) => {
                record("delete", "error", backend.name(), start);
                tracing::warn!(key, backend = backend.name(), error = %e, "Cache delete failed");
            },
        }
    }

    /// Reads and decodes a JSON value. Undecodable entries count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            },
        }
    }

    /// Encodes `value` as JSON and stores it with the default TTL.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) {
        if !self.is_enabled() {
            return;
        }
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, self.default_ttl_secs).await,
            Err(e) => tracing::warn!(key, error = %e, "Failed to encode cache entry"),
        }
    }

    /// Closes the backend, logging any failure.
    pub async fn close(&self) {
        if let Some(backend) = self.backend.as_ref() {
            if let Err(e) = backend.close().await {
                tracing::warn!(backend = backend.name(), error = %e, "Cache close failed");
            }
        }
    }
}

fn record(operation: &'static str, status: &'static str, backend: &'static str, start: Instant) {
    metrics::counter!(
        "cache_requests_total",
        "operation" => operation,
        "status" => status,
        "backend" => backend
    )
    .increment(1);
    metrics::histogram!("cache_request_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
