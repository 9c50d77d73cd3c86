//! Time-bounded memo for expensive, pure computations.
//!
//! The pipeline is a function of its source snapshot, so a presentation layer
//! can hold its result for a while instead of re-extracting on every
//! request. The slot is an [`ArcSwapOption`], so readers never block a
//! refresh and always see either the old value or the new one.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwapOption;
use tracing::debug;

struct Entry<T> {
    stored_at: Instant,
    value: Arc<T>,
}

/// A single cached value that expires `ttl` after it was stored.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: ArcSwapOption<Entry<T>>,
}

impl<T> TtlCache<T> {
    /// An empty cache. A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: ArcSwapOption::empty(),
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it is still fresh at `now`.
    pub fn get_at(&self, now: Instant) -> Option<Arc<T>> {
        let guard = self.slot.load();
        match &*guard {
            Some(entry) if now.saturating_duration_since(entry.stored_at) < self.ttl => {
                Some(Arc::clone(&entry.value))
            }
            _ => None,
        }
    }

    /// The cached value if it is still fresh now.
    pub fn get(&self) -> Option<Arc<T>> {
        self.get_at(Instant::now())
    }

    /// Fresh value, recomputing with `refresh` when missing or expired.
    ///
    /// A failed refresh leaves the slot as it was and returns the error.
    pub fn get_or_try_refresh<E>(
        &self,
        refresh: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        self.get_or_try_refresh_at(Instant::now(), refresh)
    }

    /// [`Self::get_or_try_refresh`] with an explicit clock.
    pub fn get_or_try_refresh_at<E>(
        &self,
        now: Instant,
        refresh: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(hit) = self.get_at(now) {
            debug!("cache hit");
            return Ok(hit);
        }
        debug!("cache miss; refreshing");
        let value = Arc::new(refresh()?);
        self.slot.store(Some(Arc::new(Entry {
            stored_at: now,
            value: Arc::clone(&value),
        })));
        Ok(value)
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn hit_until_expiry_then_refresh() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(calls.get())
        };
        let t0 = Instant::now();

        assert_eq!(*cache.get_or_try_refresh_at(t0, compute).unwrap(), 1);
        assert_eq!(*cache.get_or_try_refresh_at(t0 + Duration::from_secs(59), compute).unwrap(), 1);
        assert_eq!(*cache.get_or_try_refresh_at(t0 + Duration::from_secs(60), compute).unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_refresh_keeps_nothing() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        let err = cache.get_or_try_refresh(|| Err("down")).unwrap_err();
        assert_eq!(err, "down");
        assert!(cache.get().is_none());
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.get_or_try_refresh(|| Ok::<_, ()>(1)).unwrap();
        assert!(cache.get().is_none());
    }

    #[test]
    fn invalidate_forces_refresh() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.get_or_try_refresh(|| Ok::<_, ()>(1)).unwrap();
        cache.invalidate();
        assert_eq!(*cache.get_or_try_refresh(|| Ok::<_, ()>(2)).unwrap(), 2);
    }
}
