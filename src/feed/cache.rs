//! Time-bounded cache for scoreboard snapshots.
//!
//! Every feed request goes through a [`FeedCache`] first so repeated lookups
//! for the same week inside the TTL do not hit the upstream API. The cache is
//! the only state shared between requests; each key is written whole, so two
//! requests racing to fill the same key just store the same snapshot twice.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::provider::FeedSnapshot;

/// Cache key for a week request; `None` is the feed's default week.
pub fn cache_key(week: Option<u32>) -> String {
    match week {
        Some(w) => format!("scoreboard:week:{w}"),
        None => "scoreboard:current".to_string(),
    }
}

#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<FeedSnapshot>>;

    async fn put(&self, key: &str, snapshot: Arc<FeedSnapshot>);
}

/// In-memory cache whose entries expire `ttl` after insertion.
#[derive(Clone)]
pub struct TtlCache {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, CachedEntry>>>,
}

struct CachedEntry {
    stored_at: Instant,
    snapshot: Arc<FeedSnapshot>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl FeedCache for TtlCache {
    async fn get(&self, key: &str) -> Option<Arc<FeedSnapshot>> {
        {
            let inner = self.inner.read().await;
            match inner.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    debug!("Feed cache hit: {}", key);
                    return Some(Arc::clone(&entry.snapshot));
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it unless another request already refreshed the key
        let mut inner = self.inner.write().await;
        if inner
            .get(key)
            .is_some_and(|e| e.stored_at.elapsed() >= self.ttl)
        {
            inner.remove(key);
            debug!("Feed cache entry expired: {}", key);
        }
        None
    }

    async fn put(&self, key: &str, snapshot: Arc<FeedSnapshot>) {
        let mut inner = self.inner.write().await;
        inner.insert(
            key.to_string(),
            CachedEntry {
                stored_at: Instant::now(),
                snapshot,
            },
        );
    }
}

/// Cache that stores nothing; every lookup misses.
#[derive(Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl FeedCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<Arc<FeedSnapshot>> {
        None
    }

    async fn put(&self, _key: &str, _snapshot: Arc<FeedSnapshot>) {}
}
