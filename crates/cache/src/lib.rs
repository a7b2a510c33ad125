//! A simple cache system for slotscope
//! Stores objects in memory with a fixed time-to-live. Expired objects are evicted lazily,
//! the next time their key is looked up, and the whole cache is swept for expired objects at
//! most once per time-to-live, when a new object is stored.
//!
//! Concurrent lookups of a key which is not cached are coalesced: the first caller starts the
//! fetch, and every caller arriving while it is in flight awaits the same result. Fetches run
//! on their own task, so they complete and publish their result even if every caller goes away.

use futures::future::{BoxFuture, FutureExt, Shared};
use hashbrown::HashMap;
use std::{fmt::Debug, future::Future, hash::Hash, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, trace};

/// How a value returned by [`Cache::get_or_fetch`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The value was already cached.
    Hit,
    /// This caller ran the fetch.
    Fetched,
    /// Another caller was already fetching the value, and this caller awaited its result.
    Joined,
}

impl Lookup {
    /// Whether the value was served from the cache without awaiting an upstream fetch.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit)
    }
}

type InFlight<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// A cached value and the instant it was stored at.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

struct State<K, V, E> {
    entries: HashMap<K, Entry<V>>,
    /// Fetches in flight, tagged with an id so a finished fetch only deregisters itself
    in_flight: HashMap<K, (u64, InFlight<V, E>)>,
    next_fetch: u64,
    last_sweep: Instant,
}

impl<K, V, E> State<K, V, E>
where
    K: Eq + Hash,
    V: Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            next_fetch: 0,
            last_sweep: Instant::now(),
        }
    }

    /// Returns the cached value for `key`, evicting it if it has expired.
    fn fresh(&mut self, key: &K, ttl: Duration) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(ttl) => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Evict every expired entry, returning how many were removed.
    fn purge_expired(&mut self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        self.last_sweep = Instant::now();
        before - self.entries.len()
    }

    /// Store `value`, first sweeping expired entries if a full time-to-live has passed since
    /// the last sweep.
    fn insert(&mut self, key: K, value: V, ttl: Duration) -> usize {
        let purged =
            if self.last_sweep.elapsed() >= ttl { self.purge_expired(ttl) } else { 0 };
        self.entries.insert(key, Entry { value, stored_at: Instant::now() });
        purged
    }

    /// Deregister fetch `id` for `key` and cache its value if it succeeded. Returns false when
    /// the fetch was already completed by someone else.
    fn complete(&mut self, key: K, id: u64, result: &Result<V, E>, ttl: Duration) -> bool {
        if !self.in_flight.get(&key).is_some_and(|(current, _)| *current == id) {
            return false;
        }

        self.in_flight.remove(&key);
        if let Ok(value) = result {
            self.insert(key, value.clone(), ttl);
        }
        true
    }
}

/// A keyed, in-memory store of previously computed values with a fixed time-to-live.
///
/// Entries are owned exclusively by the cache and are never shared between keys. Failed
/// fetches are not cached.
pub struct Cache<K, V, E> {
    name: String,
    ttl: Duration,
    state: Arc<Mutex<State<K, V, E>>>,
}

impl<K, V, E> Debug for Cache<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("name", &self.name).field("ttl", &self.ttl).finish()
    }
}

impl<K, V, E> Cache<K, V, E>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache whose entries expire after `ttl`.
    pub fn new(name: &str, ttl: Duration) -> Self {
        Self { name: name.to_string(), ttl, state: Arc::new(Mutex::new(State::new())) }
    }

    /// The time-to-live of every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read a cached object, returning `None` if it is missing or expired
    ///
    /// ```
    /// use slotscope_cache::Cache;
    /// use std::time::Duration;
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let cache: Cache<String, u64, ()> = Cache::new("doc", Duration::from_secs(60));
    /// assert_eq!(cache.get(&"key".to_string()).await, None);
    ///
    /// cache.set("key".to_string(), 42).await;
    /// assert_eq!(cache.get(&"key".to_string()).await, Some(42));
    /// # }
    /// ```
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        state.fresh(key, self.ttl)
    }

    /// Store a value in the cache, replacing any previous value for the key.
    pub async fn set(&self, key: K, value: V) {
        let purged = self.state.lock().await.insert(key, value, self.ttl);
        if purged > 0 {
            trace!(cache = self.name, purged, "swept expired entries");
        }
    }

    /// Delete a cached object.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        state.entries.remove(key).map(|entry| entry.value)
    }

    /// The number of stored entries, including expired ones which have not been evicted yet.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The number of fetches currently in flight.
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Evict every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.state.lock().await.purge_expired(self.ttl);
        trace!(cache = self.name, purged, "purged expired entries");
        purged
    }

    /// Clear the cache, removing all objects. Fetches in flight are unaffected.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// Reading the cache and registering the fetch as in flight happen under one lock, so
    /// concurrent callers for the same key never run `fetch` more than once: the first caller
    /// registers it, and later callers await the same shared future. The fetch is also driven
    /// by a spawned task, so it runs to completion even if every caller is dropped. Its result
    /// is published to the cache once, by whichever of the task and the callers observes it
    /// first, and the in-flight entry is removed. Errors are handed to every waiting caller and
    /// are not cached.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// ```
    /// use slotscope_cache::{Cache, Lookup};
    /// use std::time::Duration;
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let cache: Cache<&'static str, u64, String> = Cache::new("doc", Duration::from_secs(60));
    ///
    /// let (value, lookup) = cache.get_or_fetch("key", || async { Ok(7) }).await.expect("!");
    /// assert_eq!((value, lookup), (7, Lookup::Fetched));
    ///
    /// let (value, lookup) = cache.get_or_fetch("key", || async { Ok(8) }).await.expect("!");
    /// assert_eq!((value, lookup), (7, Lookup::Hit));
    /// # }
    /// ```
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<(V, Lookup), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (id, pending, lookup) = {
            let mut state = self.state.lock().await;

            if let Some(value) = state.fresh(&key, self.ttl) {
                debug!(cache = self.name, ?key, "cache hit");
                return Ok((value, Lookup::Hit));
            }

            match state.in_flight.get(&key) {
                Some((id, pending)) => {
                    debug!(cache = self.name, ?key, "joining in-flight fetch");
                    (*id, pending.clone(), Lookup::Joined)
                }
                None => {
                    debug!(cache = self.name, ?key, "cache miss");
                    let id = state.next_fetch;
                    state.next_fetch += 1;

                    let pending = fetch().boxed().shared();
                    state.in_flight.insert(key.clone(), (id, pending.clone()));
                    self.drive(key.clone(), id, pending.clone());
                    (id, pending, Lookup::Fetched)
                }
            }
        };

        let result = pending.await;

        if self.state.lock().await.complete(key.clone(), id, &result, self.ttl) {
            trace!(cache = self.name, ?key, "published fetched value");
        }

        result.map(|value| (value, lookup))
    }

    /// Poll `pending` to completion on its own task and publish its result.
    fn drive(&self, key: K, id: u64, pending: InFlight<V, E>) {
        let state = Arc::clone(&self.state);
        let name = self.name.clone();
        let ttl = self.ttl;

        tokio::spawn(async move {
            let result = pending.await;
            if state.lock().await.complete(key.clone(), id, &result, ttl) {
                trace!(cache = name, ?key, "published fetched value without waiting callers");
            }
        });
    }
}
