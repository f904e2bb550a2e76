//! Leak tracking for entry pools
//!
//! [`LeakTrackingPool`] wraps a [`Pool`] and observes every acquire, release
//! and remove. Entries are keyed by identity; how an entry held for too long
//! is recognised as leaked is up to the pluggable [`LeakDetector`].

use crate::entry::Entry;
use crate::errors::{PoolError, PoolResult};
use crate::pool::{EntryPool, Pool};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A resource that was acquired and never returned
#[derive(Debug, Clone)]
pub struct LeakInfo {
    /// Identity of the leaked entry
    pub id: usize,

    /// Human readable description of the resource
    pub description: String,

    /// How long the resource had been held when the leak was detected
    pub held_for: Duration,
}

/// Tracks acquired resources and decides which of them leaked
pub trait LeakDetector: Send + Sync {
    /// Start tracking `id`. Returns `false` if it is already tracked, which
    /// means an earlier acquisition was never returned.
    fn acquired(&self, id: usize, description: String) -> bool;

    /// Stop tracking `id`. Returns `false` if it was not tracked.
    fn released(&self, id: usize) -> bool;

    /// Detection pass. Returns resources newly found leaked; a resource is
    /// reported at most once.
    fn sweep(&self) -> Vec<LeakInfo>;
}

struct TrackedResource {
    acquired_at: Instant,
    description: String,
    reported: bool,
}

/// Considers a resource leaked once it has been held longer than `max_age`
///
/// # Examples
///
/// ```
/// use esox_entrypool::{ExpiryLeakDetector, LeakDetector};
/// use std::time::Duration;
///
/// let detector = ExpiryLeakDetector::new(Duration::ZERO);
/// assert!(detector.acquired(1, "buffer".to_string()));
/// assert!(!detector.acquired(1, "buffer".to_string()));
///
/// assert_eq!(detector.sweep().len(), 1);
/// assert!(detector.sweep().is_empty());
/// ```
pub struct ExpiryLeakDetector {
    tracked: DashMap<usize, TrackedResource>,
    max_age: Duration,
}

impl ExpiryLeakDetector {
    pub fn new(max_age: Duration) -> Self {
        Self {
            tracked: DashMap::new(),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Resources currently held
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}

impl Default for ExpiryLeakDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl LeakDetector for ExpiryLeakDetector {
    fn acquired(&self, id: usize, description: String) -> bool {
        match self.tracked.entry(id) {
            MapEntry::Occupied(_) => false,
            MapEntry::Vacant(slot) => {
                slot.insert(TrackedResource {
                    acquired_at: Instant::now(),
                    description,
                    reported: false,
                });
                true
            }
        }
    }

    fn released(&self, id: usize) -> bool {
        self.tracked.remove(&id).is_some()
    }

    fn sweep(&self) -> Vec<LeakInfo> {
        let mut leaks = Vec::new();
        for mut resource in self.tracked.iter_mut() {
            let held_for = resource.acquired_at.elapsed();
            if resource.reported || held_for < self.max_age {
                continue;
            }
            resource.reported = true;
            leaks.push(LeakInfo {
                id: *resource.key(),
                description: resource.description.clone(),
                held_for,
            });
        }
        leaks
    }
}

/// Pool decorator that counts entries acquired but never returned
///
/// # Examples
///
/// ```
/// use esox_entrypool::{LeakTrackingPool, Pool, PoolConfiguration};
/// use std::time::Duration;
///
/// let pool = Pool::new(PoolConfiguration::new());
/// pool.warmup(2, || vec![0u8; 64]);
///
/// let tracking = LeakTrackingPool::new(pool, Duration::ZERO);
/// let _forgotten = tracking.acquire().unwrap();
///
/// assert_eq!(tracking.check_leaks(), 1);
/// assert_eq!(tracking.leaked_resources(), 1);
/// ```
pub struct LeakTrackingPool<T, D = ExpiryLeakDetector> {
    delegate: Pool<T>,
    detector: D,
    leaked_acquires: AtomicU64,
    leaked_releases: AtomicU64,
    leaked_removes: AtomicU64,
    leaked: AtomicU64,
}

impl<T> LeakTrackingPool<T> {
    /// Track `delegate`, reporting entries held longer than `max_age`
    pub fn new(delegate: Pool<T>, max_age: Duration) -> Self {
        Self::with_detector(delegate, ExpiryLeakDetector::new(max_age))
    }
}

impl<T, D: LeakDetector> LeakTrackingPool<T, D> {
    pub fn with_detector(delegate: Pool<T>, detector: D) -> Self {
        Self {
            delegate,
            detector,
            leaked_acquires: AtomicU64::new(0),
            leaked_releases: AtomicU64::new(0),
            leaked_removes: AtomicU64::new(0),
            leaked: AtomicU64::new(0),
        }
    }

    fn id(entry: &Arc<Entry<T>>) -> usize {
        Arc::as_ptr(entry) as usize
    }

    fn describe(id: usize) -> String {
        format!("{}@{:x}", std::any::type_name::<T>(), id)
    }

    fn track_acquire(&self, entry: &Arc<Entry<T>>) {
        let id = Self::id(entry);
        if !self.detector.acquired(id, Self::describe(id)) {
            self.leaked_acquires.fetch_add(1, Ordering::Relaxed);
            debug!(id, "entry leaked acquire");
        }
    }

    pub fn acquire(&self) -> Option<Arc<Entry<T>>> {
        let entry = self.delegate.acquire()?;
        self.track_acquire(&entry);
        Some(entry)
    }

    /// See [`Pool::acquire_with`]
    pub fn acquire_with<F, E>(&self, creator: F) -> Result<Option<Arc<Entry<T>>>, E>
    where
        F: FnOnce(&Arc<Entry<T>>) -> Result<Option<T>, E>,
        E: From<PoolError>,
    {
        let entry = self.delegate.acquire_with(creator)?;
        if let Some(entry) = &entry {
            self.track_acquire(entry);
        }
        Ok(entry)
    }

    pub fn release(&self, entry: &Arc<Entry<T>>) -> PoolResult<bool> {
        let id = Self::id(entry);
        if !self.detector.released(id) {
            self.leaked_releases.fetch_add(1, Ordering::Relaxed);
            debug!(id, "entry leaked release");
        }
        self.delegate.release(entry)
    }

    pub fn remove(&self, entry: &Arc<Entry<T>>) -> bool {
        let id = Self::id(entry);
        if !self.detector.released(id) {
            self.leaked_removes.fetch_add(1, Ordering::Relaxed);
            debug!(id, "entry leaked remove");
        }
        self.delegate.remove(entry)
    }

    /// Run a detection pass and return how many leaks it found
    pub fn check_leaks(&self) -> usize {
        let leaks = self.detector.sweep();
        for info in &leaks {
            self.leaked.fetch_add(1, Ordering::Relaxed);
            self.leaked(info);
        }
        leaks.len()
    }

    fn leaked(&self, info: &LeakInfo) {
        warn!(
            id = info.id,
            resource = %info.description,
            held_for = ?info.held_for,
            "entry leaked"
        );
    }

    /// Reset the leaked acquire, release and remove counters
    pub fn clear_tracking(&self) {
        self.leaked_acquires.store(0, Ordering::Relaxed);
        self.leaked_releases.store(0, Ordering::Relaxed);
        self.leaked_removes.store(0, Ordering::Relaxed);
    }

    /// Acquisitions of an entry whose previous acquisition was never returned
    pub fn leaked_acquires(&self) -> u64 {
        self.leaked_acquires.load(Ordering::Relaxed)
    }

    /// Releases of an entry that was not acquired through this pool
    pub fn leaked_releases(&self) -> u64 {
        self.leaked_releases.load(Ordering::Relaxed)
    }

    /// Removals of an entry that was not acquired through this pool
    pub fn leaked_removes(&self) -> u64 {
        self.leaked_removes.load(Ordering::Relaxed)
    }

    /// Resources acquired and never returned, as found by [`Self::check_leaks`]
    pub fn leaked_resources(&self) -> u64 {
        self.leaked.load(Ordering::Relaxed)
    }

    /// The wrapped pool
    pub fn delegate(&self) -> &Pool<T> {
        &self.delegate
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

impl<T, D: LeakDetector> EntryPool<T> for LeakTrackingPool<T, D> {
    fn acquire(&self) -> Option<Arc<Entry<T>>> {
        LeakTrackingPool::acquire(self)
    }

    fn release(&self, entry: &Arc<Entry<T>>) -> PoolResult<bool> {
        LeakTrackingPool::release(self, entry)
    }

    fn remove(&self, entry: &Arc<Entry<T>>) -> bool {
        LeakTrackingPool::remove(self, entry)
    }

    fn is_closed(&self) -> bool {
        self.delegate.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfiguration;

    fn tracking(count: usize, max_age: Duration) -> LeakTrackingPool<u32> {
        let pool = Pool::new(PoolConfiguration::new());
        pool.warmup(count, || 0);
        LeakTrackingPool::new(pool, max_age)
    }

    #[test]
    fn test_unreleased_entry_counted_once() {
        let pool = tracking(2, Duration::ZERO);
        let _leaked = pool.acquire().unwrap();

        assert_eq!(pool.check_leaks(), 1);
        assert_eq!(pool.leaked_resources(), 1);

        assert_eq!(pool.check_leaks(), 0);
        assert_eq!(pool.leaked_resources(), 1);
    }

    #[test]
    fn test_released_entry_is_not_leaked() {
        let pool = tracking(1, Duration::ZERO);
        let entry = pool.acquire().unwrap();
        assert!(pool.release(&entry).unwrap());

        assert_eq!(pool.check_leaks(), 0);
        assert_eq!(pool.leaked_releases(), 0);
        assert_eq!(pool.detector().tracked_count(), 0);
    }

    #[test]
    fn test_young_entries_are_not_leaked() {
        let pool = tracking(1, Duration::from_secs(3600));
        let _held = pool.acquire().unwrap();
        assert_eq!(pool.check_leaks(), 0);
    }

    #[test]
    fn test_untracked_release_and_remove() {
        let pool = tracking(2, Duration::ZERO);
        let first = pool.delegate().acquire().unwrap();
        let second = pool.delegate().acquire().unwrap();

        pool.release(&first).unwrap();
        assert!(pool.remove(&second));

        assert_eq!(pool.leaked_releases(), 1);
        assert_eq!(pool.leaked_removes(), 1);

        pool.clear_tracking();
        assert_eq!(pool.leaked_releases(), 0);
        assert_eq!(pool.leaked_removes(), 0);
    }

    #[test]
    fn test_reacquire_without_tracked_release() {
        let pool = tracking(1, Duration::ZERO);
        let entry = pool.acquire().unwrap();
        // Returned behind the tracker's back
        pool.delegate().release(&entry).unwrap();

        let again = pool.acquire().unwrap();
        assert!(Arc::ptr_eq(&entry, &again));
        assert_eq!(pool.leaked_acquires(), 1);
    }

    #[test]
    fn test_lease_goes_through_tracker() {
        let pool = tracking(1, Duration::ZERO);
        {
            let lease = pool.lease().unwrap();
            assert_eq!(*lease, 0);
        }
        assert_eq!(pool.check_leaks(), 0);
        assert_eq!(pool.leaked_releases(), 0);
        assert_eq!(pool.delegate().idle_count(), 1);
    }

    #[test]
    fn test_lease_of_removed_entry_returns_once() {
        let pool = tracking(1, Duration::ZERO);
        {
            let lease = pool.lease().unwrap();
            assert!(pool.delegate().remove(lease.entry()));
        }
        assert_eq!(pool.leaked_releases(), 0);
        assert_eq!(pool.leaked_removes(), 0);
        assert_eq!(pool.detector().tracked_count(), 0);
        assert_eq!(pool.delegate().size(), 0);
    }

    #[test]
    fn test_acquire_with_is_tracked() {
        let pool = LeakTrackingPool::new(Pool::new(PoolConfiguration::new()), Duration::ZERO);
        let entry = pool
            .acquire_with(|_| Ok::<_, PoolError>(Some(5u32)))
            .unwrap()
            .unwrap();
        assert_eq!(pool.detector().tracked_count(), 1);
        assert!(pool.remove(&entry));
        assert_eq!(pool.leaked_removes(), 0);
    }
}
