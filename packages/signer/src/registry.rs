//! Copy-on-write cache of live signers
//!
//! Readers load an immutable snapshot through an atomic pointer and never
//! block. Writers (miss fills and invalidations) serialize on one mutex,
//! clone the current map, modify the clone and publish it with a single
//! swap, so a reader sees either the old map or the new one in full.
//!
//! Concurrent misses for the same id are not merged: each caller runs its
//! own loader and the last publish wins. Loaders run outside the writer
//! mutex.

use arc_swap::ArcSwap;
use northfoot_common::LoggingTransformer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::Signer;
use crate::config::SignerId;
use crate::error::Result;

/// Immutable view of the cache at one instant
pub type Snapshot<V> = Arc<HashMap<SignerId, Arc<V>>>;

/// Registry of live signers
pub type SignerRegistry = Registry<Signer>;

/// Lock-free-read, copy-on-write map from signer id to value
pub struct Registry<V> {
    snapshot: ArcSwap<HashMap<SignerId, Arc<V>>>,
    writer: Mutex<()>,
}

impl<V> Registry<V> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Cached value for `id`, without loading
    pub fn get(&self, id: SignerId) -> Option<Arc<V>> {
        self.snapshot.load().get(&id).cloned()
    }

    /// Cached value for `id`, running `load(id)` on a miss
    ///
    /// The loader runs without any lock held. On success its value is
    /// published and returned; on failure the snapshot is left untouched and
    /// the error is returned as is.
    pub async fn get_or_load<F, Fut>(&self, id: SignerId, load: F) -> Result<Arc<V>>
    where
        F: FnOnce(SignerId) -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(id) {
            return Ok(value);
        }

        LoggingTransformer::log_cache_event("miss", id, self.len());
        let value = Arc::new(load(id).await?);
        self.publish(id, Arc::clone(&value));
        Ok(value)
    }

    /// Drop the entry for `id`; returns whether one was present
    ///
    /// Callers still holding the evicted value keep a working reference.
    pub fn invalidate(&self, id: SignerId) -> bool {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.snapshot.load_full();
        if !current.contains_key(&id) {
            return false;
        }

        let mut next = HashMap::clone(&current);
        next.remove(&id);
        let cached = next.len();
        self.snapshot.store(Arc::new(next));

        LoggingTransformer::log_cache_event("invalidate", id, cached);
        true
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Snapshot<V> {
        self.snapshot.load_full()
    }

    /// Whether `id` is cached
    pub fn contains(&self, id: SignerId) -> bool {
        self.snapshot.load().contains_key(&id)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    fn publish(&self, id: SignerId, value: Arc<V>) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = HashMap::clone(&self.snapshot.load());
        next.insert(id, value);
        let cached = next.len();
        self.snapshot.store(Arc::new(next));

        LoggingTransformer::log_cache_event("publish", id, cached);
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.load();
        let mut ids: Vec<_> = snapshot.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("Registry").field("cached", &ids).finish()
    }
}
