use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool as RedisPool;
use derive_more::Display;
use redis::AsyncCommands;

/// Limit applied to one client key: `max_requests` per fixed `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Outcome of a single `increment_and_check` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window resets.
    pub retry_after: Duration,
}

#[derive(Debug, Display)]
pub enum RateLimitError {
    #[display("Rate limit backend unavailable: {_0}")]
    Backend(String),
}

/// Counter with expiry, keyed by client.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn increment_and_check(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateDecision, RateLimitError>;

    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}

/// Fixed window state for one key.
#[derive(Debug, Clone, Copy)]
struct FixedWindow {
    count: u32,
    reset_at: Instant,
}

impl FixedWindow {
    fn start(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_at
    }
}

type Key = String;

/// Process-local limiter. Counts are not shared between instances and are lost on restart.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    map: Arc<DashMap<Key, FixedWindow>>,
    max_keys: usize,
}

impl InMemoryRateLimiter {
    pub fn new(max_keys: usize) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            max_keys,
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.map.len()
    }

    /// Drops every window that has already reset. Returns the number removed.
    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, window| !window.is_expired(now));
        before.saturating_sub(self.map.len())
    }

    /// Evicts the windows closest to resetting until the map is below `max_keys`,
    /// leaving a tenth of the capacity free so the scan is not repeated per new key.
    fn evict_soonest(&self) -> usize {
        let headroom = (self.max_keys / 10).max(1);
        let excess = (self.map.len() + headroom).saturating_sub(self.max_keys);
        if excess == 0 {
            return 0;
        }

        let mut windows: Vec<(Instant, Key)> = self
            .map
            .iter()
            .map(|entry| (entry.value().reset_at, entry.key().clone()))
            .collect();

        let excess = excess.min(windows.len());
        if excess < windows.len() {
            windows.select_nth_unstable_by_key(excess, |(reset_at, _)| *reset_at);
        }

        let mut evicted = 0;
        for (_, key) in windows.into_iter().take(excess) {
            if self.map.remove(&key).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    /// Frees space for a new key once `max_keys` windows are tracked.
    /// Expired windows go first; live ones are evicted only if that is not enough.
    fn make_room_at(&self, now: Instant) {
        let purged = self.purge_expired_at(now);
        tracing::debug!(purged, "Swept expired rate limit windows");

        if self.map.len() >= self.max_keys {
            let evicted = self.evict_soonest();
            tracing::warn!(
                evicted,
                max_keys = self.max_keys,
                "Rate limiter at capacity, evicted live windows"
            );
        }
    }

    fn check_at(&self, key: &str, policy: &RateLimitPolicy, now: Instant) -> RateDecision {
        if self.map.len() >= self.max_keys && !self.map.contains_key(key) {
            self.make_room_at(now);
        }

        let mut entry = self
            .map
            .entry(key.to_string())
            .or_insert_with(|| FixedWindow { count: 0, reset_at: now });

        let window = entry.value_mut();

        if window.count == 0 || window.is_expired(now) {
            *window = FixedWindow::start(now, policy.window);
            return RateDecision {
                allowed: true,
                remaining: policy.max_requests.saturating_sub(1),
                retry_after: policy.window,
            };
        }

        let retry_after = window.reset_at.saturating_duration_since(now);

        if window.count >= policy.max_requests {
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after,
            };
        }

        window.count += 1;
        RateDecision {
            allowed: true,
            remaining: policy.max_requests - window.count,
            retry_after,
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn increment_and_check(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateDecision, RateLimitError> {
        Ok(self.check_at(key, policy, Instant::now()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Limiter backed by a shared Redis counter, for deployments with several instances.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pool: RedisPool,
    prefix: String,
}

impl RedisRateLimiter {
    pub fn new(pool: RedisPool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    pub fn from_url(url: &str, prefix: impl Into<String>) -> Result<Self, RateLimitError> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;
        Ok(Self::new(pool, prefix))
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, urlencoding::encode(key))
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimiter {
    async fn increment_and_check(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateDecision, RateLimitError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let counter_key = self.counter_key(key);
        let window_secs = policy.window.as_secs().max(1);

        let count: u64 = conn
            .incr(&counter_key, 1)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // First hit opens the window.
        if count == 1 {
            let _: bool = conn
                .expire(&counter_key, window_secs as i64)
                .await
                .map_err(|e| RateLimitError::Backend(e.to_string()))?;
        }

        let ttl: i64 = conn
            .ttl(&counter_key)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // A key without expiry would never reset.
        if ttl < 0 {
            let _: bool = conn
                .expire(&counter_key, window_secs as i64)
                .await
                .map_err(|e| RateLimitError::Backend(e.to_string()))?;
        }

        let retry_after = Duration::from_secs(if ttl > 0 { ttl as u64 } else { window_secs });
        let max = u64::from(policy.max_requests);

        Ok(RateDecision {
            allowed: count <= max,
            remaining: max.saturating_sub(count) as u32,
            retry_after,
        })
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
