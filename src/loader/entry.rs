// In-memory cache entry.
// A loaded collection together with when and where it was obtained.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Item;

/// Source a cached collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Remote,
    Mirror,
    Bundled,
}

/// One collection held in memory.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub items: Vec<Item>,
    /// When the load finished, whichever source won.
    pub fetched_at: DateTime<Utc>,
    pub origin: Origin,
}

impl CacheEntry {
    pub fn new(items: Vec<Item>, origin: Origin) -> Self {
        Self {
            items,
            fetched_at: Utc::now(),
            origin,
        }
    }

    /// Check if this entry has outlived `ttl`. A zero TTL is always expired.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return true;
        }

        let elapsed = Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed > ttl
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        !self.is_expired(ttl)
    }
}
