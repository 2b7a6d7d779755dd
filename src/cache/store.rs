// Shared resource cache.
// Serves cached values, revalidates stale ones in the background and
// collapses concurrent fetches of one key into a single request.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::error::{FetchError, FetchResult};

use super::entry::CacheEntry;
use super::keys::CacheKey;

type Value = Arc<dyn Any + Send + Sync>;

/// One outstanding fetch; every reader of the key awaits the same cell.
type Flight = Arc<OnceCell<FetchResult<Value>>>;

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry<Value>>,
    in_flight: Option<Flight>,
}

struct Inner {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    ttl: Duration,
}

impl Inner {
    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// What a read found for a key.
enum Lookup {
    Hit { value: Value, refresh: Option<Flight> },
    Miss(Flight),
}

/// Outcome of [`ResourceCache::read`].
pub struct Read<T> {
    pub result: FetchResult<T>,
    /// Set when a stale value was served; resolves once the refresh settles.
    pub refresh: Option<JoinHandle<FetchResult<T>>>,
}

/// Process-wide cache keyed by [`CacheKey`]. Cloning shares the same store.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

impl ResourceCache {
    /// Create a cache treating entries older than `ttl` as stale.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Current value for a key without fetching, whatever its age.
    pub fn peek<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        let slots = self.inner.slots();
        slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .and_then(|entry| entry.data.downcast_ref::<T>())
            .cloned()
    }

    /// Whether a fetch for this key is outstanding.
    #[cfg(test)]
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner
            .slots()
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Whether a value is cached for this key.
    #[cfg(test)]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner
            .slots()
            .get(key)
            .is_some_and(|slot| slot.entry.is_some())
    }

    /// Read a key, fetching on a miss.
    ///
    /// A cached value is returned immediately. If it is stale, a background
    /// refresh is started (or an outstanding one reused). On a miss the
    /// caller joins any outstanding fetch for the key instead of starting
    /// another one.
    pub async fn get<T, F, Fut>(&self, key: CacheKey, fetch: F) -> FetchResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        self.read(key, fetch).await.result
    }

    /// Like [`ResourceCache::get`], but hands back the background refresh
    /// of a stale hit so the caller can pick up the new value.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Read<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let lookup = {
            let mut slots = self.inner.slots();
            let slot = slots.entry(key.clone()).or_default();
            match &slot.entry {
                Some(entry) => {
                    let value = entry.data.clone();
                    let refresh = entry
                        .is_stale(self.inner.ttl)
                        .then(|| slot.in_flight.get_or_insert_with(new_flight).clone());
                    Lookup::Hit { value, refresh }
                }
                None => Lookup::Miss(slot.in_flight.get_or_insert_with(new_flight).clone()),
            }
        };

        match lookup {
            Lookup::Hit { value, refresh } => {
                let refresh = refresh.map(|flight| {
                    tracing::debug!(%key, "serving stale entry, revalidating");
                    self.drive(key.clone(), flight, fetch)
                });
                Read {
                    result: downcast(&key, &value),
                    refresh,
                }
            }
            Lookup::Miss(flight) => Read {
                result: self.join(key, flight, fetch).await,
                refresh: None,
            },
        }
    }

    /// Fetch a key even if it is cached, sharing any outstanding fetch.
    pub async fn revalidate<T, F, Fut>(&self, key: CacheKey, fetch: F) -> FetchResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let flight = self.flight_for(&key);
        self.join(key, flight, fetch).await
    }

    /// Start populating a key with no consumer waiting on it.
    ///
    /// Does nothing if the key already has a value or a fetch in flight.
    /// Returns whether a fetch was started.
    pub fn preload<T, F, Fut>(&self, key: CacheKey, fetch: F) -> bool
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        {
            let slots = self.inner.slots();
            if let Some(slot) = slots.get(&key) {
                if slot.entry.is_some() || slot.in_flight.is_some() {
                    return false;
                }
            }
        }
        tracing::debug!(%key, "preload");
        self.spawn_fetch(key, fetch);
        true
    }

    /// Register (or reuse) the flight for a key and drive it on a task.
    fn spawn_fetch<T, F, Fut>(&self, key: CacheKey, fetch: F)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let flight = self.flight_for(&key);
        self.drive(key, flight, fetch);
    }

    /// Await a flight on its own task so no reader can cancel it midway.
    fn drive<T, F, Fut>(&self, key: CacheKey, flight: Flight, fetch: F) -> JoinHandle<FetchResult<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = cache.join::<T, F, Fut>(key.clone(), flight, fetch).await;
            if let Err(e) = &result {
                tracing::warn!(%key, error = %e, "background fetch failed");
            }
            result
        })
    }

    fn flight_for(&self, key: &CacheKey) -> Flight {
        let mut slots = self.inner.slots();
        let slot = slots.entry(key.clone()).or_default();
        slot.in_flight.get_or_insert_with(new_flight).clone()
    }

    /// Await a flight, running `fetch` only if nobody else is already
    /// initialising it.
    async fn join<T, F, Fut>(&self, key: CacheKey, flight: Flight, fetch: F) -> FetchResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let inner = self.inner.clone();
        let settle_key = key.clone();
        let settle_flight = flight.clone();
        let result = flight
            .get_or_init(move || async move {
                let result = fetch().await.map(|data| Arc::new(data) as Value);
                settle(&inner, settle_key, &settle_flight, &result);
                result
            })
            .await
            .clone();

        result.and_then(|value| downcast(&key, &value))
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(super::entry::DEFAULT_TTL)
    }
}

fn new_flight() -> Flight {
    Arc::new(OnceCell::new())
}

/// Store a finished fetch and retire its flight.
///
/// A failed fetch leaves the previous value in place.
fn settle(inner: &Inner, key: CacheKey, flight: &Flight, result: &FetchResult<Value>) {
    let mut slots = inner.slots();
    let slot = slots.entry(key.clone()).or_default();
    match result {
        Ok(value) => {
            slot.entry = Some(CacheEntry::new(value.clone()));
            tracing::debug!(%key, "cache updated");
        }
        Err(e) => tracing::debug!(%key, error = %e, "fetch failed, keeping previous entry"),
    }
    if slot
        .in_flight
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(current, flight))
    {
        slot.in_flight = None;
    }
}

fn downcast<T: Clone + 'static>(key: &CacheKey, value: &Value) -> FetchResult<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| FetchError::decode(key.resource(), "cached value has an unexpected type"))
}
