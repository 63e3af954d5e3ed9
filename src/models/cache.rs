//! In-memory expiring cache with get-or-fetch semantics.
//!
//! Every key owns a slot guarded by its own async mutex, so a slow fetch only
//! blocks callers asking for the same key. Expiry is lazy: each entry carries a
//! monotonic deadline that is checked on access, and [`ExpiringCache::purge_expired`]
//! (or the sweeper task) drops entries nobody reads anymore.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(data: V, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    /// An entry is stale once `now` is strictly past its deadline.
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

#[derive(Debug, Error)]
pub enum CacheError<E> {
    #[error("cache key must not be empty")]
    EmptyKey,

    #[error(transparent)]
    Fetch(E),
}

/// Point-in-time view of the cache contents.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
    /// Slots locked at the time of the snapshot, typically a fetch in progress.
    pub in_flight: usize,
    pub ttl_ms: u64,
}

pub struct ExpiringCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    ttl: Duration,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the slot for `key`, creating an empty one if needed.
    ///
    /// The map lock is released before returning, so it is never held across
    /// an `.await`.
    fn slot(&self, key: &str) -> Slot<V> {
        self.slots
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    fn existing_slot(&self, key: &str) -> Option<Slot<V>> {
        self.slots.lock().get(key).cloned()
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// Only one fetch per key runs at a time: concurrent callers for the same
    /// key wait for it and then read the stored value. A failed fetch stores
    /// nothing and its error is handed back unchanged, so the next caller
    /// fetches again. Waiters queued behind a failing fetch each run their own
    /// fetch in turn, so the last of N waiters may wait for N failed attempts.
    ///
    /// Dropping the returned future mid-fetch releases the slot without
    /// storing anything.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if !cached.is_expired(Instant::now()) {
                debug!("Cache hit for {}", key);
                return Ok(cached.data.clone());
            }
            debug!("Cache entry for {} expired", key);
            *entry = None;
        }

        debug!("Cache miss for {}", key);
        let data = fetch().await.map_err(CacheError::Fetch)?;
        *entry = Some(CacheEntry::new(data.clone(), self.ttl));

        Ok(data)
    }

    /// Stores `data` under `key`, replacing any previous value and its deadline.
    pub async fn insert(&self, key: &str, data: V) {
        let slot = self.slot(key);
        *slot.lock().await = Some(CacheEntry::new(data, self.ttl));
    }

    /// Looks `key` up without fetching. Waits if a fetch for the key is running.
    pub async fn get(&self, key: &str) -> Option<V> {
        let slot = self.existing_slot(key)?;
        let mut entry = slot.lock().await;
        if entry
            .as_ref()
            .is_some_and(|cached| cached.is_expired(Instant::now()))
        {
            *entry = None;
        }
        entry.as_ref().map(|cached| cached.data.clone())
    }

    /// Removes `key`, returning its value if it had not expired yet.
    pub async fn remove(&self, key: &str) -> Option<V> {
        let slot = self.existing_slot(key)?;
        let removed = slot.lock().await.take();
        removed
            .filter(|cached| !cached.is_expired(Instant::now()))
            .map(|cached| cached.data)
    }

    /// Drops every slot. Fetches already running finish against their detached
    /// slot and their results are not cached.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Removes expired entries and empty slots, returning how many entries were dropped.
    ///
    /// Slots some caller still holds are skipped; they are picked up on a later pass.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.slots.lock().retain(|_, slot| {
            // New handles are only cloned under the map lock, so a count of one
            // means nobody can be waiting on this slot.
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => match entry.as_ref() {
                    Some(cached) if !cached.is_expired(now) => true,
                    Some(_) => {
                        removed += 1;
                        false
                    }
                    None => false,
                },
                Err(_) => true,
            }
        });

        removed
    }

    /// Number of unexpired entries in slots that are not locked right now.
    ///
    /// A slot held by a running fetch or a concurrent lookup is not counted,
    /// see [`CacheStats::in_flight`].
    pub fn len(&self) -> usize {
        self.stats().valid_entries
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut stats = CacheStats {
            ttl_ms: u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX),
            ..CacheStats::default()
        };

        for slot in self.slots.lock().values() {
            match slot.try_lock() {
                Ok(entry) => {
                    if let Some(cached) = entry.as_ref() {
                        stats.total_entries += 1;
                        if cached.is_expired(now) {
                            stats.expired_entries += 1;
                        }
                    }
                }
                Err(_) => stats.in_flight += 1,
            }
        }
        stats.valid_entries = stats.total_entries - stats.expired_entries;

        stats
    }
}

impl<V: Clone + Send + 'static> ExpiringCache<V> {
    /// Spawns a task that calls [`purge_expired`](Self::purge_expired) every `period`.
    ///
    /// The task holds a weak handle and stops once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("Cache dropped, stopping sweeper");
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!("Swept {} expired cache entries", removed);
                }
            }
        })
    }
}
