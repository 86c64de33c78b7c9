//! Per-run resolution cache
//!
//! Maps (region, identifier) to fetched content. Concurrent first requests
//! for the same key share a single store call; distinct keys are fetched
//! independently. Failed fetches leave the slot empty so the next lookup
//! retries the store.

use crate::types::SecretContent;
use extsecret_core::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

/// Composite cache key; an absent region is stored as ""
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub region: String,
    pub secret_id: String,
}

impl CacheKey {
    pub fn new(region: Option<&str>, secret_id: &str) -> Self {
        Self {
            region: region.unwrap_or_default().to_string(),
            secret_id: secret_id.to_string(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.region.is_empty() {
            write!(f, "{}", self.secret_id)
        } else {
            write!(f, "{}:{}", self.region, self.secret_id)
        }
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served without a store call
    pub hits: u64,
    /// Lookups that invoked the fetch function
    pub misses: u64,
    /// Keys holding fetched content
    pub entries: usize,
}

type Slot = Arc<OnceCell<Arc<SecretContent>>>;

/// Cache owned by a single generation run
#[derive(Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    lookups: AtomicU64,
    fetches: AtomicU64,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached content for the key, or run `fetch` once to fill it
    pub async fn get_or_fetch<F, Fut>(
        &self,
        region: Option<&str>,
        secret_id: &str,
        fetch: F,
    ) -> Result<Arc<SecretContent>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SecretContent>>,
    {
        let key = CacheKey::new(region, secret_id);
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let slot = self.slot(&key);
        if let Some(content) = slot.get() {
            debug!("Cache hit for: {}", key);
            return Ok(Arc::clone(content));
        }

        let content = slot
            .get_or_try_init(|| async move {
                self.fetches.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for: {}", key);
                fetch().await.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(content))
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let fetches = self.fetches.load(Ordering::Relaxed);
        let entries = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count();

        CacheStats {
            hits: lookups.saturating_sub(fetches),
            misses: fetches,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.stats().entries
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("stats", &self.stats())
            .finish()
    }
}
