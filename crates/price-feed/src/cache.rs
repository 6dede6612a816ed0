//! Short-TTL memoization of comparison results
//!
//! Uses DashMap so concurrent pollers only contend per pair. An entry's value
//! and timestamp are replaced together by a single insert; readers see either
//! the old pair or the new one.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use swapc_core::{AggregationError, AggregationResult, PairRequest};

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Cached comparison
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: AggregationResult,
    pub stored_at: Instant,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Where a cached lookup was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from a non-expired entry
    Cached,
    /// Freshly computed and stored
    Computed,
}

/// Result cache keyed by pair
#[derive(Debug)]
pub struct ResultCache<C = SystemClock> {
    entries: DashMap<String, CacheEntry>,
    clock: C,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for the pair, if any
    pub fn get(&self, pair: &PairRequest) -> Option<AggregationResult> {
        let now = self.clock.now();
        self.entries
            .get(&pair.cache_key())
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Return the fresh entry for the pair, or run `compute` and store its
    /// success. A failed computation leaves any existing entry untouched.
    pub async fn get_or_compute<F, Fut>(
        &self,
        pair: &PairRequest,
        compute: F,
    ) -> Result<AggregationResult, AggregationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AggregationResult, AggregationError>>,
    {
        self.get_or_compute_tracked(pair, compute)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`get_or_compute`](Self::get_or_compute), also reporting whether
    /// the value came from the cache
    pub async fn get_or_compute_tracked<F, Fut>(
        &self,
        pair: &PairRequest,
        compute: F,
    ) -> Result<(AggregationResult, Freshness), AggregationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AggregationResult, AggregationError>>,
    {
        let key = pair.cache_key();

        // the map guard is released before awaiting
        if let Some(value) = self.get(pair) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", key);
            return Ok((value, Freshness::Cached));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {}", key);

        let value = compute().await?;

        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value: value.clone(),
                stored_at: self.clock.now(),
            },
        );

        Ok((value, Freshness::Computed))
    }

    /// Expired entry and its age, for callers that choose to serve stale
    /// data when a refresh fails. Fresh entries are not returned.
    pub fn get_stale(&self, pair: &PairRequest) -> Option<(AggregationResult, Duration)> {
        let now = self.clock.now();
        self.entries
            .get(&pair.cache_key())
            .filter(|entry| !entry.is_fresh(now, self.ttl))
            .map(|entry| (entry.value.clone(), entry.age(now)))
    }

    /// Stats
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        CacheStats {
            entry_count: self.entries.len(),
            fresh_count: self
                .entries
                .iter()
                .filter(|e| e.value().is_fresh(now, self.ttl))
                .count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the result cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub fresh_count: usize,
    pub hits: u64,
    pub misses: u64,
}
