//! In-memory TTL caching for fetched data products.

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::{Granularity, PriceWindow, Symbol};

/// Time source for cache expiry.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}

/// Defines how a single lookup interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise fetch and write the result to the cache. (Default)
    Use,
    /// Always fetch, bypassing any cached entry, and write the new result.
    Refresh,
    /// Always fetch and neither read from nor write to the cache.
    Bypass,
}

impl Default for CacheMode {
    fn default() -> Self {
        Self::Use
    }
}

/// Process-wide cache key: operation, symbol and the operation's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum CacheKey {
    Price {
        symbol: Symbol,
        window: PriceWindow,
    },
    Statements {
        symbol: Symbol,
        granularity: Granularity,
    },
    CompanyInfo {
        symbol: Symbol,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Price { symbol, window } => write!(f, "price:{symbol}:{window}"),
            Self::Statements {
                symbol,
                granularity,
            } => write!(f, "statements:{symbol}:{}", granularity.as_str()),
            Self::CompanyInfo { symbol } => write!(f, "company_info:{symbol}"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Thread-safe in-memory cache with per-entry expiry.
///
/// Entries are invalidated by expiry only. Concurrent first lookups of one key
/// through [`get_or_try_insert_with`](TtlCache::get_or_try_insert_with) share
/// a single fetch.
pub struct TtlCache<K, V> {
    entries: Arc<tokio::sync::RwLock<HashMap<K, CacheEntry<V>>>>,
    gates: Arc<Mutex<HashMap<K, Gate>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            gates: Arc::clone(&self.gates),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, V> Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            gates: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Get the value for `key` if present and not yet expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` for `ttl`. A zero TTL stores nothing.
    pub async fn put(&self, key: K, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Return the cached value or run `fetch`, storing only successful results.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        mode: CacheMode,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if mode == CacheMode::Bypass {
            debug!(key = %key, "cache bypass");
            return fetch().await;
        }

        if mode == CacheMode::Use {
            if let Some(value) = self.get(&key).await {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
        }

        let gate = self.gate(&key);
        let _guard = gate.lock().await;

        // Another caller may have filled the entry while we waited.
        if mode == CacheMode::Use {
            if let Some(value) = self.get(&key).await {
                debug!(key = %key, "cache hit after wait");
                return Ok(value);
            }
        }

        debug!(key = %key, ?mode, "cache miss");
        let value = fetch().await?;
        self.put(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Remove expired entries and idle fetch gates.
    pub async fn clear_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        drop(entries);

        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.retain(|_, gate| Arc::strong_count(gate) > 1);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Number of stored entries, including expired ones not yet cleared.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn gate(&self, key: &K) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn cache() -> (TtlCache<String, String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let (cache, _) = cache();

        assert!(cache.get(&"key1".to_string()).await.is_none());

        cache.put("key1".to_string(), "value1".to_string(), TTL).await;
        assert_eq!(cache.get(&"key1".to_string()).await, Some("value1".to_string()));

        cache.put("key1".to_string(), "value2".to_string(), TTL).await;
        assert_eq!(cache.get(&"key1".to_string()).await, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let (cache, clock) = cache();

        cache.put("key1".to_string(), "value1".to_string(), TTL).await;
        clock.advance(TTL - Duration::from_secs(1));
        assert!(cache.get(&"key1".to_string()).await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&"key1".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear_expired() {
        let (cache, clock) = cache();

        cache.put("key1".to_string(), "value1".to_string(), Duration::from_secs(10)).await;
        cache.put("key2".to_string(), "value2".to_string(), TTL).await;
        assert_eq!(cache.len().await, 2);

        clock.advance(Duration::from_secs(30));
        cache.clear_expired().await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&"key2".to_string()).await.is_some());

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_stores_nothing() {
        let (cache, _) = cache();
        cache.put("key1".to_string(), "value1".to_string(), Duration::ZERO).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (cache, _) = cache();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..2 {
            let result: Result<String, &str> = cache
                .get_or_try_insert_with("key".to_string(), TTL, CacheMode::Use, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("upstream down")
                })
                .await;
            assert_eq!(result, Err("upstream down"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_fetches_once() {
        let (cache, _) = cache();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>("value".to_string())
        };

        let (first, second) = tokio::join!(
            cache.get_or_try_insert_with("key".to_string(), TTL, CacheMode::Use, fetch),
            cache.get_or_try_insert_with("key".to_string(), TTL, CacheMode::Use, fetch),
        );

        assert_eq!(first, Ok("value".to_string()));
        assert_eq!(second, Ok("value".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_and_bypass_modes() {
        let (cache, _) = cache();
        cache.put("key".to_string(), "stale".to_string(), TTL).await;

        let bypassed: Result<String, String> = cache
            .get_or_try_insert_with("key".to_string(), TTL, CacheMode::Bypass, || async {
                Ok("bypassed".to_string())
            })
            .await;
        assert_eq!(bypassed, Ok("bypassed".to_string()));
        assert_eq!(cache.get(&"key".to_string()).await, Some("stale".to_string()));

        let refreshed: Result<String, String> = cache
            .get_or_try_insert_with("key".to_string(), TTL, CacheMode::Refresh, || async {
                Ok("fresh".to_string())
            })
            .await;
        assert_eq!(refreshed, Ok("fresh".to_string()));
        assert_eq!(cache.get(&"key".to_string()).await, Some("fresh".to_string()));
    }

    #[test]
    fn test_cache_keys_separate_parameters() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let annual = CacheKey::Statements {
            symbol: symbol.clone(),
            granularity: Granularity::Annual,
        };
        let quarterly = CacheKey::Statements {
            symbol,
            granularity: Granularity::Quarterly,
        };

        assert_ne!(annual, quarterly);
        assert_eq!(annual.to_string(), "statements:AAPL:annual");
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
