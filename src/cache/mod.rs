//! Query cache for backend reads.
//!
//! DESIGN
//! ======
//! Entries are keyed by `(endpoint, params)`. A read returns fresh data
//! immediately; stale data is also returned immediately while one background
//! refetch runs. Misses join the key's in-flight fetch if there is one, so a
//! key never has more than one request on the wire.
//!
//! Every fetch runs as a spawned task and settles its own result into the
//! cache. Callers only await a shared handle, so dropping a caller (a view
//! navigating away) never cancels the fetch or loses its result.
//!
//! INVARIANTS
//! ==========
//! - At most one in-flight fetch per key.
//! - A fetch settles only if it is still the key's current fetch; results
//!   from fetches superseded by `remove`/`clear` are dropped.
//! - Entries are never evicted on a timer.

pub mod key;
pub mod scope;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorCode};
use crate::net::ApiClient;

pub use key::QueryKey;
pub use scope::ViewScope;

pub const DEFAULT_STALE_SECS: u64 = 300;
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1000;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which an entry is stale.
    pub stale_time: Duration,
    /// Extra attempts after a failed read. 401 and 403 are never retried.
    pub retries: u32,
    /// First retry delay; doubles per attempt up to 30s.
    pub retry_base: Duration,
    /// Whether `notify_window_focus` marks entries stale.
    pub refetch_on_window_focus: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(DEFAULT_STALE_SECS),
            retries: DEFAULT_RETRIES,
            retry_base: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            refetch_on_window_focus: false,
        }
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
    Error,
}

/// Read-only view of a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub data: Option<Value>,
    pub fetched_at: Instant,
    pub state: EntryState,
    pub error: Option<ApiError>,
    pub fetching: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    data: Option<Value>,
    fetched_at: Instant,
    error: Option<ApiError>,
    invalidated: bool,
}

impl Entry {
    fn state(&self, now: Instant, stale_time: Duration) -> EntryState {
        if self.error.is_some() {
            EntryState::Error
        } else if self.invalidated || now.saturating_duration_since(self.fetched_at) >= stale_time {
            EntryState::Stale
        } else {
            EntryState::Fresh
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct Slots {
    by_key: HashMap<QueryKey, Slot>,
    next_fetch_id: u64,
}

struct Inner {
    api: ApiClient,
    config: CacheConfig,
    slots: Mutex<Slots>,
}

// =============================================================================
// QUERY CACHE
// =============================================================================

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    #[must_use]
    pub fn new(api: ApiClient, config: CacheConfig) -> Self {
        Self { inner: Arc::new(Inner { api, config, slots: Mutex::new(Slots::default()) }) }
    }

    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    /// Read `key`, from cache when possible.
    ///
    /// Fresh and stale entries with data return immediately (stale ones also
    /// schedule a background refetch). Otherwise the caller awaits the key's
    /// single in-flight fetch.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after retries are exhausted.
    pub async fn fetch(&self, key: &QueryKey) -> Result<Value, ApiError> {
        let pending = {
            let mut guard = self.lock();
            let slots = &mut *guard;
            let now = Instant::now();
            let stale_time = self.inner.config.stale_time;
            let slot = slots.by_key.entry(key.clone()).or_default();

            if let Some(entry) = &slot.entry
                && let Some(data) = &entry.data
            {
                let data = data.clone();
                if entry.state(now, stale_time) != EntryState::Fresh && slot.in_flight.is_none() {
                    debug!(%key, "serving stale entry; refreshing in background");
                    let id = next_id(&mut slots.next_fetch_id);
                    slot.in_flight = Some(InFlight { id, fetch: self.spawn_fetch(key.clone(), id) });
                }
                return Ok(data);
            }

            if let Some(in_flight) = &slot.in_flight {
                debug!(%key, "joining in-flight fetch");
                in_flight.fetch.clone()
            } else {
                let id = next_id(&mut slots.next_fetch_id);
                let fetch = self.spawn_fetch(key.clone(), id);
                slot.in_flight = Some(InFlight { id, fetch: fetch.clone() });
                fetch
            }
        };
        pending.await
    }

    /// Issue a write (no retries) and, on success, invalidate every entry
    /// under the given endpoint prefixes.
    ///
    /// # Errors
    ///
    /// Propagates the API error; nothing is invalidated on failure.
    pub async fn mutate(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        invalidates: &[&str],
    ) -> Result<Value, ApiError> {
        let result = self.inner.api.request(method, endpoint, &[], body).await?;
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        Ok(result)
    }

    /// Mark entries whose endpoint is `prefix` or lies under `prefix/` as
    /// stale. Returns the number of entries marked.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut slots = self.lock();
        let mut marked = 0;
        for (key, slot) in &mut slots.by_key {
            if let Some(entry) = &mut slot.entry
                && key.is_under(prefix)
            {
                entry.invalidated = true;
                marked += 1;
            }
        }
        debug!(prefix, marked, "invalidated queries");
        marked
    }

    /// Window-focus hook. Refetch-on-focus is off by default, in which case
    /// this does nothing. Returns the number of entries marked stale.
    pub fn notify_window_focus(&self) -> usize {
        if !self.inner.config.refetch_on_window_focus {
            return 0;
        }
        self.invalidate("")
    }

    /// Drop one key. A fetch in flight for it will not repopulate it.
    pub fn remove(&self, key: &QueryKey) {
        self.lock().by_key.remove(key);
    }

    /// Drop every key. Fetches in flight will not repopulate the cache.
    pub fn clear(&self) {
        let mut slots = self.lock();
        let dropped = slots.by_key.len();
        slots.by_key.clear();
        debug!(dropped, "query cache cleared");
    }

    #[must_use]
    pub fn peek(&self, key: &QueryKey) -> Option<EntrySnapshot> {
        let slots = self.lock();
        let slot = slots.by_key.get(key)?;
        let entry = slot.entry.as_ref()?;
        Some(EntrySnapshot {
            data: entry.data.clone(),
            fetched_at: entry.fetched_at,
            state: entry.state(Instant::now(), self.inner.config.stale_time),
            error: entry.error.clone(),
            fetching: slot.in_flight.is_some(),
        })
    }

    /// Number of keys with a settled entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .by_key
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_fetch(&self, key: QueryKey, id: u64) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.fetch_with_retry(&key).await;
            inner.settle(&key, id, &result);
            result
        });
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ApiError::Network(format!("fetch task failed: {e}"))),
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    async fn fetch_with_retry(&self, key: &QueryKey) -> Result<Value, ApiError> {
        let query = key.query_pairs();
        let mut attempt = 0;
        loop {
            match self.api.get(key.endpoint(), &query).await {
                Ok(data) => return Ok(data),
                Err(e) if !e.is_auth_rejection() && attempt < self.config.retries => {
                    let delay = retry_delay(self.config.retry_base, attempt);
                    warn!(%key, attempt, delay_ms = delay.as_millis(), error = %e, "query failed; retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn settle(&self, key: &QueryKey, id: u64, result: &Result<Value, ApiError>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = slots.by_key.get_mut(key) else {
            debug!(%key, "discarding result for removed query");
            return;
        };
        if slot.in_flight.as_ref().is_none_or(|f| f.id != id) {
            debug!(%key, "discarding superseded result");
            return;
        }
        slot.in_flight = None;

        let now = Instant::now();
        match result {
            Ok(data) => {
                slot.entry = Some(Entry { data: Some(data.clone()), fetched_at: now, error: None, invalidated: false });
            }
            Err(e) => {
                warn!(%key, error = %e, code = e.error_code(), "query failed");
                // A rejected token must not leave the previous user's data readable.
                let keep_data = !e.is_unauthorized();
                let entry = slot.entry.get_or_insert_with(|| Entry {
                    data: None,
                    fetched_at: now,
                    error: None,
                    invalidated: false,
                });
                if !keep_data {
                    entry.data = None;
                }
                entry.error = Some(e.clone());
            }
        }
    }
}

fn next_id(counter: &mut u64) -> u64 {
    *counter = counter.wrapping_add(1);
    *counter
}

/// Exponential backoff: `base * 2^attempt`, capped at 30 seconds.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
