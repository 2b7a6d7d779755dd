// Cached value with fetch time.
// Staleness is measured against the refresh interval.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default staleness threshold: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached value and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
        }
    }

    /// Check if this entry is older than the TTL.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed > ttl
    }
}
