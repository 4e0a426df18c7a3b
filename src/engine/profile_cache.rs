//! Time-bounded cache of the resolved profile mapping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::reconciler::ProfileMap;

/// Holds the last resolved mapping together with the instant it stops being fresh.
#[derive(Debug)]
pub struct ProfileCache {
    ttl: Duration,
    value: Option<Arc<ProfileMap>>,
    expiry: Expiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    /// Nothing stored, or invalidated
    Stale,
    At(Instant),
    /// The TTL reaches past what `Instant` can represent
    Never,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            value: None,
            expiry: Expiry::Stale,
        }
    }

    /// The cached mapping if it is still fresh at `now`.
    pub fn fresh(&self, now: Instant) -> Option<Arc<ProfileMap>> {
        let fresh = match self.expiry {
            Expiry::Stale => false,
            Expiry::At(expires_at) => now < expires_at,
            Expiry::Never => true,
        };
        self.value.clone().filter(|_| fresh)
    }

    /// The last stored mapping, fresh or not.
    pub fn last(&self) -> Option<Arc<ProfileMap>> {
        self.value.clone()
    }

    pub fn store(&mut self, value: Arc<ProfileMap>, now: Instant) {
        self.value = Some(value);
        self.expiry = now
            .checked_add(self.ttl)
            .map_or(Expiry::Never, Expiry::At);
    }

    /// Mark the cached mapping stale. The value is kept as a fallback for
    /// passes that cannot read the store.
    pub fn invalidate(&mut self) {
        self.expiry = Expiry::Stale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_until_ttl_elapses() {
        let mut cache = ProfileCache::new(Duration::from_secs(300));
        let start = Instant::now();
        assert!(cache.fresh(start).is_none());

        let value = Arc::new(ProfileMap::new());
        cache.store(value.clone(), start);

        let hit = cache.fresh(start + Duration::from_secs(299)).unwrap();
        assert!(Arc::ptr_eq(&hit, &value));
        assert!(cache.fresh(start + Duration::from_secs(300)).is_none());
    }

    #[test]
    fn test_unbounded_ttl_never_expires() {
        let mut cache = ProfileCache::new(Duration::from_secs(u64::MAX));
        let now = Instant::now();
        let value = Arc::new(ProfileMap::new());

        cache.store(value.clone(), now);

        let hit = cache.fresh(now + Duration::from_secs(86_400 * 365)).unwrap();
        assert!(Arc::ptr_eq(&hit, &value));
        cache.invalidate();
        assert!(cache.fresh(now).is_none());
    }

    #[test]
    fn test_invalidate_keeps_fallback() {
        let mut cache = ProfileCache::new(Duration::from_secs(300));
        let now = Instant::now();
        cache.store(Arc::new(ProfileMap::new()), now);

        cache.invalidate();

        assert!(cache.fresh(now).is_none());
        assert!(cache.last().is_some());
    }
}
