//! In-process cache backend.

use super::Cache;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A per-process cache with lazy expiry.
///
/// Expired entries are dropped when read. There is no capacity bound.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Returns true when no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires_at = (ttl_secs > 0).then(|| Instant::now() + Duration::from_secs(ttl_secs));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_is_byte_exact() {
        let cache = MemoryCache::new();
        let value = "{\"temperature\":28.5,\"description\":\"ciel dégagé\"}";
        cache.set("weather:Pune", value, 300).await.expect("set");
        assert_eq!(
            cache.get("weather:Pune").await.expect("get").as_deref(),
            Some(value)
        );
    }

    #[tokio::test]
    async fn test_unset_key_is_absent() {
        let cache = MemoryCache::new();
        assert!(cache.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 1).await.expect("set");
        {
            let mut entries = cache.entries.lock().expect("lock");
            if let Some(entry) = entries.get_mut("k") {
                entry.expires_at = Some(Instant::now());
            }
        }
        assert!(cache.get("k").await.expect("get").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 0).await.expect("set");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() {
        let cache = MemoryCache::new();
        cache.set("k", "a", 60).await.expect("set");
        cache.set("k", "b", 60).await.expect("set");
        assert_eq!(cache.get("k").await.expect("get").as_deref(), Some("b"));
        cache.delete("k").await.expect("delete");
        assert!(cache.get("k").await.expect("get").is_none());
    }
}
