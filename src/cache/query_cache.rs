//! Query result cache with in-flight de-duplication.
//!
//! Each `QueryResultCache<T>` holds two tables keyed by [`QueryKey`]:
//!
//! - `entries`: the last settled outcome of a query (success or rejection) and
//!   when it settled
//! - `in_flight`: the shared pending fetch for a key, tagged with a generation
//!   number
//!
//! Every caller asking for a key that is already being fetched awaits the same
//! shared future. When the fetch settles it writes its outcome to `entries` only
//! if its generation is still the registered one; a fetch whose key was
//! invalidated in the meantime hands its result to the callers already waiting
//! on it and is otherwise discarded.
//!
//! The in-flight table only holds a weak handle. Once every caller awaiting a
//! fetch has been dropped the fetch is cancelled and its slot released.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tracing::debug;

use super::query_key::QueryKey;
use crate::config::CacheTypeConfig;
use crate::error::ConsoleResult;
use crate::logging::log_query_operation;

type SharedFetch<T> = Shared<BoxFuture<'static, ConsoleResult<T>>>;

/// Whether a fetch may be answered from a fresh cached value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchMode {
    /// Serve a value younger than the TTL, otherwise fetch
    #[default]
    Cached,
    /// Always fetch, joining a fetch already in flight
    Fresh,
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    result: ConsoleResult<T>,
    updated_at: Instant,
}

struct InFlightFetch<T> {
    generation: u64,
    future: WeakShared<BoxFuture<'static, ConsoleResult<T>>>,
}

impl<T: Clone> InFlightFetch<T> {
    fn is_live(&self) -> bool {
        self.future.upgrade().is_some()
    }
}

struct CacheInner<T> {
    name: &'static str,
    entries: DashMap<QueryKey, CacheEntry<T>>,
    in_flight: DashMap<QueryKey, InFlightFetch<T>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
    next_generation: AtomicU64,
}

/// Point-in-time size of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
}

/// Typed cache for one kind of query result
pub struct QueryResultCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for QueryResultCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for QueryResultCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResultCache")
            .field("name", &self.inner.name)
            .field("entries", &self.inner.entries.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("ttl", &self.inner.ttl)
            .field("max_entries", &self.inner.max_entries)
            .field("enabled", &self.inner.enabled)
            .finish()
    }
}

impl<T> QueryResultCache<T> {
    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}

impl<T> QueryResultCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration, max_entries: usize) -> Self {
        Self::build(name, ttl, max_entries, true)
    }

    pub fn from_config(name: &'static str, config: &CacheTypeConfig, enabled: bool) -> Self {
        Self::build(name, config.ttl_duration(), config.max_entries, enabled)
    }

    /// A cache that never stores results but still shares in-flight fetches
    pub fn disabled(name: &'static str) -> Self {
        Self::build(name, Duration::ZERO, 0, false)
    }

    fn build(name: &'static str, ttl: Duration, max_entries: usize, enabled: bool) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                name,
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                ttl,
                max_entries,
                enabled,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Successful value younger than the TTL
    pub fn get(&self, key: &QueryKey) -> Option<T> {
        let entry = self.inner.entries.get(key)?;
        match &entry.result {
            Ok(value) if entry.updated_at.elapsed() < self.inner.ttl => Some(value.clone()),
            _ => None,
        }
    }

    /// Last successful value regardless of age
    pub fn get_data(&self, key: &QueryKey) -> Option<T> {
        let entry = self.inner.entries.get(key)?;
        entry.result.as_ref().ok().cloned()
    }

    /// Last settled outcome, including a cached rejection
    pub fn get_state(&self, key: &QueryKey) -> Option<ConsoleResult<T>> {
        self.inner.entries.get(key).map(|entry| entry.result.clone())
    }

    pub fn updated_at(&self, key: &QueryKey) -> Option<Instant> {
        self.inner.entries.get(key).map(|entry| entry.updated_at)
    }

    pub fn set(&self, key: QueryKey, value: T) {
        if !self.inner.enabled {
            return;
        }
        log_query_operation("set", self.inner.name, &key.to_string(), "stored", None);
        self.inner.entries.insert(
            key,
            CacheEntry {
                result: Ok(value),
                updated_at: Instant::now(),
            },
        );
        self.inner.evict_over_capacity();
    }

    /// Drop the entry for `key` and orphan any in-flight fetch for it
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let had_fetch = self.inner.in_flight.remove(key).is_some();
        let had_entry = self.inner.entries.remove(key).is_some();
        log_query_operation(
            "invalidate",
            self.inner.name,
            &key.to_string(),
            if had_entry || had_fetch { "invalidated" } else { "absent" },
            None,
        );
        had_entry || had_fetch
    }

    /// Invalidate every key matching `predicate`, returning how many keys were touched
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let keys: Vec<QueryKey> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.inner.in_flight.iter().map(|entry| entry.key().clone()))
            .filter(|key| predicate(key))
            .collect();

        let mut touched = 0;
        for key in keys {
            if self.invalidate(&key) {
                touched += 1;
            }
        }
        touched
    }

    pub fn clear(&self) {
        self.inner.in_flight.clear();
        self.inner.entries.clear();
        debug!(cache = self.inner.name, "Cleared query cache");
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.inner
            .in_flight
            .get(key)
            .is_some_and(|fetch| fetch.is_live())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entries.len(),
            in_flight: self
                .inner
                .in_flight
                .iter()
                .filter(|fetch| fetch.is_live())
                .count(),
        }
    }

    /// Return the fresh cached value for `key`, or run `fetcher` and cache its outcome.
    ///
    /// Concurrent calls for the same key share one fetch. A cached rejection is
    /// never served from here; calling `fetch` again retries.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> ConsoleResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConsoleResult<T>> + Send + 'static,
    {
        if let Some(value) = self.get(&key) {
            log_query_operation("fetch", self.inner.name, &key.to_string(), "hit", None);
            return Ok(value);
        }
        self.join_or_start(key, fetcher).await
    }

    /// Like [`fetch`](Self::fetch) but ignores a fresh cached value.
    ///
    /// Still attaches to a fetch already in flight for the key.
    pub async fn refetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> ConsoleResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConsoleResult<T>> + Send + 'static,
    {
        self.join_or_start(key, fetcher).await
    }

    /// [`fetch`](Self::fetch) or [`refetch`](Self::refetch), as `mode` says
    pub async fn fetch_with_mode<F, Fut>(
        &self,
        mode: FetchMode,
        key: QueryKey,
        fetcher: F,
    ) -> ConsoleResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConsoleResult<T>> + Send + 'static,
    {
        match mode {
            FetchMode::Cached => self.fetch(key, fetcher).await,
            FetchMode::Fresh => self.refetch(key, fetcher).await,
        }
    }

    fn join_or_start<F, Fut>(&self, key: QueryKey, fetcher: F) -> PendingFetch<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConsoleResult<T>> + Send + 'static,
    {
        let start = |generation: u64| {
            let pending = fetcher();
            let inner = Arc::clone(&self.inner);
            let settled_key = key.clone();
            async move {
                let result = pending.await;
                inner.settle(&settled_key, generation, &result);
                result
            }
            .boxed()
            .shared()
        };

        let (generation, started) = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(mut existing) => {
                if let Some(future) = existing.get().future.upgrade() {
                    let generation = existing.get().generation;
                    drop(existing);
                    log_query_operation("fetch", self.inner.name, &key.to_string(), "joined", None);
                    return PendingFetch {
                        future,
                        key,
                        generation,
                        inner: Arc::clone(&self.inner),
                    };
                }
                // Every caller of the previous fetch went away
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let started = start(generation);
                if let Some(future) = started.downgrade() {
                    existing.insert(InFlightFetch { generation, future });
                }
                (generation, started)
            }
            Entry::Vacant(slot) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let started = start(generation);
                if let Some(future) = started.downgrade() {
                    slot.insert(InFlightFetch { generation, future });
                }
                (generation, started)
            }
        };

        log_query_operation("fetch", self.inner.name, &key.to_string(), "miss", None);
        PendingFetch {
            future: started,
            key,
            generation,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A caller's handle on an in-flight fetch.
///
/// Dropping the last handle before the fetch settles cancels it and releases
/// its in-flight slot.
struct PendingFetch<T: Clone> {
    future: SharedFetch<T>,
    key: QueryKey,
    generation: u64,
    inner: Arc<CacheInner<T>>,
}

impl<T: Clone> Future for PendingFetch<T> {
    type Output = ConsoleResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().future).poll(cx)
    }
}

impl<T: Clone> Drop for PendingFetch<T> {
    fn drop(&mut self) {
        // None once the fetch has settled; settle() already released the slot
        if self.future.strong_count() != Some(1) {
            return;
        }
        let generation = self.generation;
        let released = self
            .inner
            .in_flight
            .remove_if(&self.key, |_, fetch| fetch.generation == generation)
            .is_some();
        if released {
            log_query_operation(
                "abandon",
                self.inner.name,
                &self.key.to_string(),
                "cancelled",
                None,
            );
        }
    }
}

impl<T: Clone> CacheInner<T> {
    fn settle(&self, key: &QueryKey, generation: u64, result: &ConsoleResult<T>) {
        let applied = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(current) if current.get().generation == generation => {
                if self.enabled {
                    self.entries.insert(
                        key.clone(),
                        CacheEntry {
                            result: result.clone(),
                            updated_at: Instant::now(),
                        },
                    );
                }
                current.remove();
                true
            }
            _ => false,
        };

        let status = match (applied, result.is_ok()) {
            (false, _) => "superseded",
            (true, true) => "fulfilled",
            (true, false) => "rejected",
        };
        log_query_operation("settle", self.name, &key.to_string(), status, None);

        if applied {
            self.evict_over_capacity();
        }
    }

    fn evict_over_capacity(&self) {
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.updated_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    debug!(cache = self.name, key = %key, "Evicted oldest query cache entry");
                }
                None => break,
            }
        }
    }
}
