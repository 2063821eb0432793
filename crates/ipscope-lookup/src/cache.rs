//! In-memory TTL cache shared by every upstream call.
//!
//! Values of any cloneable type are stored behind `Arc<dyn Any>` and keyed
//! by the scope (which function produced them) plus the call arguments.
//! Only successful computations are stored.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifies one memoized call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: &'static str,
    args: String,
}

impl CacheKey {
    pub fn new(scope: &'static str, args: impl Into<String>) -> Self {
        Self {
            scope,
            args: args.into(),
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }
}

struct CacheEntry {
    stored_at: Instant,
    ttl: Duration,
    value: Arc<dyn Any + Send + Sync>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

#[derive(Default)]
pub struct TtlCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `compute` and remember its `Ok` result.
    ///
    /// The lock is never held while `compute` runs, so two concurrent misses
    /// for the same key may both compute; the later write wins.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key, ttl) {
            tracing::debug!(scope = key.scope, "cache hit");
            return Ok(hit);
        }

        let value = compute().await?;
        self.insert(key, ttl, value.clone());
        Ok(value)
    }

    fn get<T: Clone + 'static>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if Instant::now().duration_since(entry.stored_at) >= ttl {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    fn insert<T: Send + Sync + 'static>(&self, key: CacheKey, ttl: Duration, value: T) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                stored_at: now,
                ttl,
                value: Arc::new(value),
            },
        );

        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} expired cache entries", evicted);
        }
    }

    /// Drop every entry.
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        tracing::info!("Cleared {} cache entries", count);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
