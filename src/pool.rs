//! Core entry pool implementation

use crate::cache::CallerCache;
use crate::config::PoolConfiguration;
use crate::entry::{Entry, EntryState};
use crate::errors::{PoolError, PoolResult};
use crate::health::HealthStatus;
use crate::metrics::{EntryCounts, MetricsExporter, MetricsTracker, PoolMetrics};
use crate::strategy::StrategyType;

use arc_swap::ArcSwap;
use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, error, trace};

/// The acquire/release/remove contract shared by [`Pool`] and the decorators
/// that wrap it, such as [`LeakTrackingPool`](crate::LeakTrackingPool).
pub trait EntryPool<T> {
    /// Acquire an idle entry, or `None` if none is available right now
    fn acquire(&self) -> Option<Arc<Entry<T>>>;

    /// Return an acquired entry to the pool.
    ///
    /// `Ok(false)` means the entry was already removed or the pool closed; it
    /// will not be handed out again.
    fn release(&self, entry: &Arc<Entry<T>>) -> PoolResult<bool>;

    /// Retire an entry permanently
    fn remove(&self, entry: &Arc<Entry<T>>) -> bool;

    fn is_closed(&self) -> bool;

    /// Acquire an idle entry wrapped in a guard that releases it on drop
    fn lease(&self) -> Option<PooledEntry<'_, T, Self>>
    where
        Self: Sized,
    {
        self.acquire().map(|entry| PooledEntry::new(self, entry))
    }
}

/// An acquired entry that is released back to its pool when dropped
pub struct PooledEntry<'a, T, P: EntryPool<T> = Pool<T>> {
    pool: &'a P,
    entry: Option<Arc<Entry<T>>>,
}

impl<'a, T, P: EntryPool<T>> PooledEntry<'a, T, P> {
    fn new(pool: &'a P, entry: Arc<Entry<T>>) -> Self {
        Self {
            pool,
            entry: Some(entry),
        }
    }

    /// The underlying entry
    pub fn entry(&self) -> &Arc<Entry<T>> {
        self.entry.as_ref().expect("Entry already taken")
    }

    /// Retire the entry instead of releasing it
    pub fn remove(mut self) -> bool {
        match self.entry.take() {
            Some(entry) => self.pool.remove(&entry),
            None => false,
        }
    }

    /// Take the entry out of the guard without releasing it
    pub fn detach(mut self) -> Arc<Entry<T>> {
        self.entry.take().expect("Entry already taken")
    }
}

impl<T, P: EntryPool<T>> Deref for PooledEntry<'_, T, P> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.entry()
            .pooled()
            .expect("Acquired entries always hold a value")
    }
}

impl<T, P: EntryPool<T>> Drop for PooledEntry<'_, T, P> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            // Ok(false): already closed and out of the list, nothing left to do
            if let Err(err) = self.pool.release(&entry) {
                error!(error = %err, "failed to release pooled entry");
            }
        }
    }
}

/// Thread-safe pool of reusable entries
///
/// Acquisition never blocks: [`Pool::acquire`] either claims an idle entry
/// with a single compare-and-set or reports that none is available. The
/// entry list is copy-on-write, so scans and accounting queries read a
/// snapshot without locking; only [`Pool::reserve`], [`Pool::remove`] and
/// [`Pool::close`] serialize on a short structural lock.
///
/// # Examples
///
/// ```
/// use esox_entrypool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(PoolConfiguration::new().with_max_entries(2));
///
/// let entry = pool.reserve().unwrap();
/// entry.enable(String::from("conn-1"), false).unwrap();
///
/// let acquired = pool.acquire().unwrap();
/// assert_eq!(acquired.pooled().unwrap(), "conn-1");
/// assert!(pool.acquire().is_none());
///
/// assert!(pool.release(&acquired).unwrap());
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct Pool<T> {
    entries: ArcSwap<Vec<Arc<Entry<T>>>>,
    lock: Mutex<()>,
    max_entries: usize,
    strategy: StrategyType,
    cache: Option<CallerCache<T>>,
    next_index: Option<CachePadded<AtomicUsize>>,
    closed: AtomicBool,
    dispose_function: Option<fn(&T) -> io::Result<()>>,
    metrics: MetricsTracker,
}

impl<T> Pool<T> {
    /// Create an empty pool
    pub fn new(config: PoolConfiguration<T>) -> Self {
        let next_index = match config.strategy {
            StrategyType::RoundRobin => Some(CachePadded::new(AtomicUsize::new(0))),
            _ => None,
        };

        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            lock: Mutex::new(()),
            max_entries: config.max_entries,
            strategy: config.strategy,
            cache: config.cache.then(CallerCache::new),
            next_index,
            closed: AtomicBool::new(false),
            dispose_function: config.dispose_function,
            metrics: MetricsTracker::new(),
        }
    }

    /// Create a new disabled entry in the pool.
    ///
    /// The returned entry must eventually be enabled with
    /// [`Entry::enable`] or removed with [`Pool::remove`]. Returns `None`
    /// if the pool is closed or already holds `max_entries` entries.
    pub fn reserve(&self) -> Option<Arc<Entry<T>>> {
        let _guard = self.lock.lock();

        if self.is_closed() {
            MetricsTracker::increment(&self.metrics.reserve_rejections);
            return None;
        }

        let entries = self.entries.load_full();
        if self.max_entries > 0 && entries.len() >= self.max_entries {
            MetricsTracker::increment(&self.metrics.reserve_rejections);
            return None;
        }

        let entry = Arc::new(Entry::new());
        let mut next = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().cloned());
        next.push(Arc::clone(&entry));
        self.entries.store(Arc::new(next));

        Some(entry)
    }

    /// Acquire an idle entry.
    ///
    /// Tries the calling thread's cached entry first (when the cache is
    /// enabled), then scans at most `size` entries starting where the
    /// strategy says. `None` means the pool is momentarily exhausted or
    /// closed; it is not an error.
    pub fn acquire(&self) -> Option<Arc<Entry<T>>> {
        if self.is_closed() {
            return None;
        }

        let size = self.entries.load().len();
        if size == 0 {
            MetricsTracker::increment(&self.metrics.acquire_misses);
            return None;
        }

        if let Some(cache) = &self.cache
            && let Some(entry) = cache.get()
            && entry.try_acquire()
        {
            MetricsTracker::increment(&self.metrics.cache_hits);
            MetricsTracker::increment(&self.metrics.total_acquired);
            return Some(entry);
        }

        let start = self.strategy.start_index(size, self.next_index.as_deref());
        let acquired = self.scan(start, size);
        if acquired.is_none() {
            MetricsTracker::increment(&self.metrics.acquire_misses);
        }
        acquired
    }

    /// Probe at most `size` entries from `index`, wrapping around. Each probe
    /// reads the current snapshot, so removals during the scan are seen.
    fn scan(&self, mut index: usize, mut size: usize) -> Option<Arc<Entry<T>>> {
        for _ in 0..size {
            let entries = self.entries.load();
            match entries.get(index) {
                Some(entry) => {
                    if entry.try_acquire() {
                        MetricsTracker::increment(&self.metrics.total_acquired);
                        return Some(Arc::clone(entry));
                    }
                }
                None => {
                    // The pool shrank under us
                    size = entries.len();
                    if size == 0 {
                        trace!("pool emptied during acquire scan");
                        break;
                    }
                }
            }
            index = (index + 1) % size;
        }
        None
    }

    /// Acquire an entry, reserving and creating a new one if none is idle.
    ///
    /// `creator` builds the value for a freshly reserved entry. If it fails
    /// or yields `None`, the reserved entry is removed again before
    /// returning, so no pending entry is left behind.
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_entrypool::{Pool, PoolConfiguration, PoolError};
    ///
    /// let pool = Pool::new(PoolConfiguration::new().with_max_entries(1));
    ///
    /// let entry = pool
    ///     .acquire_with(|_| Ok::<_, PoolError>(Some(vec![0u8; 1024])))
    ///     .unwrap()
    ///     .unwrap();
    /// assert!(entry.is_in_use());
    ///
    /// // Full and nothing idle
    /// let none = pool.acquire_with(|_| Ok::<_, PoolError>(Some(vec![]))).unwrap();
    /// assert!(none.is_none());
    /// ```
    pub fn acquire_with<F, E>(&self, creator: F) -> Result<Option<Arc<Entry<T>>>, E>
    where
        F: FnOnce(&Arc<Entry<T>>) -> Result<Option<T>, E>,
        E: From<PoolError>,
    {
        if let Some(entry) = self.acquire() {
            return Ok(Some(entry));
        }

        let Some(entry) = self.reserve() else {
            return Ok(None);
        };

        let value = match creator(&entry) {
            Ok(Some(value)) => value,
            Ok(None) => {
                self.remove(&entry);
                return Ok(None);
            }
            Err(err) => {
                self.remove(&entry);
                return Err(err);
            }
        };

        if entry.enable(value, true)? {
            MetricsTracker::increment(&self.metrics.total_acquired);
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    /// [`Pool::acquire_with`], wrapped in a guard that releases on drop
    pub fn lease_with<F, E>(&self, creator: F) -> Result<Option<PooledEntry<'_, T>>, E>
    where
        F: FnOnce(&Arc<Entry<T>>) -> Result<Option<T>, E>,
        E: From<PoolError>,
    {
        Ok(self
            .acquire_with(creator)?
            .map(|entry| PooledEntry::new(self, entry)))
    }

    /// Release an acquired entry back to the pool.
    ///
    /// Returns `Ok(true)` if the entry can be acquired again, `Ok(false)` if
    /// the pool is closed or the entry was removed (the caller should then
    /// remove it and dispose of its value). Releasing an entry that is
    /// already idle is a contract violation.
    pub fn release(&self, entry: &Arc<Entry<T>>) -> PoolResult<bool> {
        if self.is_closed() {
            return Ok(false);
        }

        let released = entry.try_release()?;
        if released {
            MetricsTracker::increment(&self.metrics.total_released);
            if let Some(cache) = &self.cache {
                cache.set(entry);
            }
        }
        Ok(released)
    }

    /// Remove an entry from the pool.
    ///
    /// Returns `true` only if this call closed the entry and evicted it from
    /// the pool. The pooled value is not disposed; that is up to the caller.
    pub fn remove(&self, entry: &Arc<Entry<T>>) -> bool {
        if self.is_closed() {
            return false;
        }

        if !entry.try_remove() {
            debug!(state = %entry.state(), "attempt to remove an entry that is already closed");
            return false;
        }

        let removed = {
            let _guard = self.lock.lock();
            let entries = self.entries.load_full();
            match entries.iter().position(|candidate| Arc::ptr_eq(candidate, entry)) {
                Some(position) => {
                    let mut next = (*entries).clone();
                    next.remove(position);
                    self.entries.store(Arc::new(next));
                    true
                }
                None => false,
            }
        };

        if removed {
            MetricsTracker::increment(&self.metrics.total_removed);
        } else {
            debug!("attempt to remove an entry that does not exist in the pool");
        }
        removed
    }

    /// Close the pool and every entry in it.
    ///
    /// All later `reserve`/`acquire`/`release`/`remove` calls fail with
    /// their benign sentinel. Values reclaimed here are passed to the
    /// configured disposer. Closing twice is a no-op.
    pub fn close(&self) {
        let drained = {
            let _guard = self.lock.lock();
            self.closed.store(true, Ordering::Release);
            self.entries.swap(Arc::new(Vec::new()))
        };

        if let Some(cache) = &self.cache {
            cache.clear();
        }

        if drained.is_empty() {
            return;
        }

        let mut reclaimed = 0usize;
        for entry in drained.iter() {
            if !entry.try_remove() {
                debug!("pooled entry already removed");
                continue;
            }
            reclaimed += 1;
            if let Some(dispose) = self.dispose_function
                && let Some(value) = entry.pooled()
                && let Err(err) = dispose(value)
            {
                trace!(error = %err, "ignored error while disposing pooled value");
            }
        }

        debug!(entries = drained.len(), reclaimed, "pool closed");
    }

    /// Fill the pool with up to `count` idle entries built by `factory`.
    ///
    /// Stops early when the pool is full or closed. Returns how many entries
    /// were added.
    pub fn warmup<F>(&self, count: usize, mut factory: F) -> usize
    where
        F: FnMut() -> T,
    {
        let mut added = 0;
        for _ in 0..count {
            let Some(entry) = self.reserve() else {
                break;
            };
            match entry.enable(factory(), false) {
                Ok(true) => added += 1,
                _ => break,
            }
        }
        added
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of entries in the pool
    pub fn size(&self) -> usize {
        self.entries.load().len()
    }

    /// Maximum number of entries, `0` when unbounded
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn strategy(&self) -> StrategyType {
        self.strategy
    }

    /// Entries reserved but not yet enabled.
    ///
    /// Like all the counts below, this is a snapshot: other threads may
    /// change entry states while it is being computed.
    pub fn reserved_count(&self) -> usize {
        self.count_in(EntryState::Pending)
    }

    /// Entries available for acquisition (snapshot)
    pub fn idle_count(&self) -> usize {
        self.count_in(EntryState::Idle)
    }

    /// Entries held by a caller (snapshot)
    pub fn in_use_count(&self) -> usize {
        self.count_in(EntryState::Active)
    }

    /// Entries closed but not yet evicted (snapshot)
    pub fn closed_count(&self) -> usize {
        self.count_in(EntryState::Closed)
    }

    fn count_in(&self, state: EntryState) -> usize {
        self.entries
            .load()
            .iter()
            .filter(|entry| entry.state() == state)
            .count()
    }

    fn entry_counts(&self) -> EntryCounts {
        let mut counts = EntryCounts::default();
        for entry in self.entries.load().iter() {
            match entry.state() {
                EntryState::Pending => counts.reserved += 1,
                EntryState::Idle => counts.idle += 1,
                EntryState::Active => counts.in_use += 1,
                EntryState::Closed => counts.closed += 1,
            }
        }
        counts
    }

    /// Point-in-time copy of the entries in the pool
    pub fn entries(&self) -> Vec<Arc<Entry<T>>> {
        let entries = self.entries.load();
        (**entries).clone()
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let mut metrics = self.metrics.get_metrics(self.entry_counts(), self.max_entries);
        metrics.cached_callers = self.cache.as_ref().map_or(0, CallerCache::len);
        metrics
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    /// Get health status
    pub fn health_status(&self) -> HealthStatus {
        let counts = self.entry_counts();
        HealthStatus::new(counts.idle, counts.in_use, self.max_entries, self.is_closed())
    }
}

impl<T> EntryPool<T> for Pool<T> {
    fn acquire(&self) -> Option<Arc<Entry<T>>> {
        Pool::acquire(self)
    }

    fn release(&self, entry: &Arc<Entry<T>>) -> PoolResult<bool> {
        Pool::release(self, entry)
    }

    fn remove(&self, entry: &Arc<Entry<T>>) -> bool {
        Pool::remove(self, entry)
    }

    fn is_closed(&self) -> bool {
        Pool::is_closed(self)
    }
}

impl<T> fmt::Display for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool[in_use={},size={},max={},closed={}]",
            self.in_use_count(),
            self.size(),
            self.max_entries,
            self.is_closed()
        )
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("size", &self.size())
            .field("max_entries", &self.max_entries)
            .field("strategy", &self.strategy)
            .field("cache", &self.cache.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn filled(strategy: StrategyType, count: usize) -> (Pool<usize>, Vec<Arc<Entry<usize>>>) {
        let pool = Pool::new(PoolConfiguration::new().with_strategy(strategy));
        let mut next = 0;
        pool.warmup(count, || {
            next += 1;
            next - 1
        });
        let entries = pool.entries();
        (pool, entries)
    }

    #[test]
    fn test_reserve_enable_idle_round_trip() {
        let pool = Pool::new(PoolConfiguration::new());
        let entry = pool.reserve().unwrap();
        assert_eq!(pool.reserved_count(), 1);
        assert!(pool.acquire().is_none());

        assert!(entry.enable(42, false).unwrap());
        assert_eq!(pool.idle_count(), 1);

        let acquired = pool.acquire().unwrap();
        assert!(Arc::ptr_eq(&acquired, &entry));
        assert_eq!(acquired.pooled(), Some(&42));
    }

    #[test]
    fn test_reserve_enable_acquired_is_not_handed_out() {
        let pool = Pool::new(PoolConfiguration::new());
        let entry = pool.reserve().unwrap();
        assert!(entry.enable(1, true).unwrap());
        assert_eq!(pool.in_use_count(), 1);
        assert!(pool.acquire().is_none());

        assert!(pool.release(&entry).unwrap());
        assert!(Arc::ptr_eq(&pool.acquire().unwrap(), &entry));
    }

    #[test]
    fn test_capacity_bound() {
        let pool = Pool::<u8>::new(PoolConfiguration::new().with_max_entries(3));
        for _ in 0..3 {
            assert!(pool.reserve().is_some());
        }
        assert!(pool.reserve().is_none());
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.metrics().reserve_rejections, 1);
    }

    #[test]
    fn test_unbounded_pool() {
        let pool = Pool::<u8>::new(PoolConfiguration::new().unbounded());
        for _ in 0..500 {
            assert!(pool.reserve().is_some());
        }
        assert_eq!(pool.size(), 500);
    }

    #[test]
    fn test_double_release_is_reported() {
        let (pool, _) = filled(StrategyType::First, 1);
        let entry = pool.acquire().unwrap();
        assert_eq!(pool.release(&entry), Ok(true));
        assert_eq!(pool.release(&entry), Err(PoolError::EntryAlreadyReleased));
    }

    #[test]
    fn test_first_strategy_always_starts_at_zero() {
        let (pool, entries) = filled(StrategyType::First, 4);
        for _ in 0..4 {
            let entry = pool.acquire().unwrap();
            assert!(Arc::ptr_eq(&entry, &entries[0]));
            pool.release(&entry).unwrap();
        }
    }

    #[test]
    fn test_first_strategy_skips_busy_entries() {
        let (pool, entries) = filled(StrategyType::First, 3);
        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();
        assert!(Arc::ptr_eq(&first, &entries[0]));
        assert!(Arc::ptr_eq(&second, &entries[1]));
    }

    #[test]
    fn test_round_robin_visits_each_index_in_turn() {
        let (pool, entries) = filled(StrategyType::RoundRobin, 4);
        for expected in entries.iter().chain(entries.iter()) {
            let entry = pool.acquire().unwrap();
            assert!(Arc::ptr_eq(&entry, expected));
            pool.release(&entry).unwrap();
        }
    }

    #[test]
    fn test_thread_id_strategy_is_sticky() {
        let (pool, _) = filled(StrategyType::ThreadId, 4);
        let first = pool.acquire().unwrap();
        pool.release(&first).unwrap();
        for _ in 0..4 {
            let entry = pool.acquire().unwrap();
            assert!(Arc::ptr_eq(&entry, &first));
            pool.release(&entry).unwrap();
        }
    }

    #[test]
    fn test_random_strategy_acquires_everything() {
        let (pool, _) = filled(StrategyType::Random, 5);
        let held: Vec<_> = (0..5).map(|_| pool.acquire().unwrap()).collect();
        assert!(pool.acquire().is_none());
        assert_eq!(held.len(), 5);
    }

    #[test]
    fn test_cache_returns_last_released_entry() {
        let pool = Pool::new(
            PoolConfiguration::new()
                .with_strategy(StrategyType::RoundRobin)
                .with_cache(),
        );
        pool.warmup(4, || 0u8);

        let entry = pool.acquire().unwrap();
        pool.release(&entry).unwrap();

        // Without the cache round robin would move on to the next entry
        let again = pool.acquire().unwrap();
        assert!(Arc::ptr_eq(&entry, &again));
        assert_eq!(pool.metrics().cache_hits, 1);
    }

    #[test]
    fn test_cache_poisoned_falls_back_to_scan() {
        let pool = Pool::new(PoolConfiguration::new().with_cache());
        pool.warmup(2, || 0u8);

        let entry = pool.acquire().unwrap();
        pool.release(&entry).unwrap();
        let held = pool.acquire().unwrap();
        assert!(Arc::ptr_eq(&entry, &held));

        let other = pool.acquire().unwrap();
        assert!(!Arc::ptr_eq(&other, &held));
    }

    #[test]
    fn test_acquire_with_creates_when_empty() {
        let pool = Pool::new(PoolConfiguration::new().with_max_entries(2));
        let entry = pool
            .acquire_with(|_| Ok::<_, PoolError>(Some(7)))
            .unwrap()
            .unwrap();
        assert!(entry.is_in_use());
        assert_eq!(pool.size(), 1);

        pool.release(&entry).unwrap();
        let reused = pool
            .acquire_with(|_| -> Result<Option<i32>, PoolError> { panic!("should reuse") })
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&entry, &reused));
    }

    #[derive(Debug, PartialEq)]
    enum CreateError {
        Refused,
        Pool(PoolError),
    }

    impl From<PoolError> for CreateError {
        fn from(err: PoolError) -> Self {
            CreateError::Pool(err)
        }
    }

    #[test]
    fn test_acquire_with_failure_rolls_back() {
        let pool = Pool::<u8>::new(PoolConfiguration::new());
        let result = pool.acquire_with(|_| Err(CreateError::Refused));
        assert_eq!(result.unwrap_err(), CreateError::Refused);
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.reserved_count(), 0);
    }

    #[test]
    fn test_acquire_with_none_rolls_back() {
        let pool = Pool::<u8>::new(PoolConfiguration::new());
        let result = pool.acquire_with(|_| Ok::<_, PoolError>(None)).unwrap();
        assert!(result.is_none());
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_remove_active_entry() {
        let (pool, _) = filled(StrategyType::First, 2);
        let entry = pool.acquire().unwrap();
        assert!(pool.remove(&entry));
        assert!(entry.is_closed());
        assert_eq!(pool.size(), 1);

        // Already removed
        assert!(!pool.remove(&entry));
        assert_eq!(pool.release(&entry), Ok(false));
    }

    #[test]
    fn test_scan_wraps_after_pool_shrinks() {
        let (pool, entries) = filled(StrategyType::First, 6);
        for entry in &entries[2..] {
            assert!(pool.remove(entry));
        }

        // Start index and size taken before the removals
        let acquired = pool.scan(5, 6).unwrap();
        assert!(Arc::ptr_eq(&acquired, &entries[0]));
    }

    #[test]
    fn test_scan_stops_when_pool_empties() {
        let (pool, entries) = filled(StrategyType::RoundRobin, 2);
        for entry in &entries {
            assert!(pool.remove(entry));
        }

        assert!(pool.scan(1, 2).is_none());
        assert_eq!(pool.metrics().total_acquired, 0);
    }

    #[test]
    fn test_remove_foreign_entry() {
        let pool = Pool::<u8>::new(PoolConfiguration::new());
        let stranger = Arc::new(Entry::new());
        assert!(!pool.remove(&stranger));
        assert!(stranger.is_closed());
    }

    #[test]
    fn test_close_drains_all_entries() {
        let (pool, entries) = filled(StrategyType::First, 4);
        let _held = pool.acquire().unwrap();
        let pending = pool.reserve().unwrap();

        pool.close();

        assert!(pool.is_closed());
        assert_eq!(pool.size(), 0);
        assert!(pending.is_closed());
        assert!(entries.iter().all(|entry| entry.is_closed()));
    }

    #[test]
    fn test_closed_pool_operations_are_benign() {
        let (pool, entries) = filled(StrategyType::First, 2);
        let held = pool.acquire().unwrap();
        pool.close();
        pool.close();

        assert!(pool.reserve().is_none());
        assert!(pool.acquire().is_none());
        assert_eq!(pool.release(&held), Ok(false));
        assert!(!pool.remove(&entries[1]));
        assert_eq!(pool.warmup(3, || 0), 0);
    }

    #[test]
    fn test_enable_after_close_is_benign() {
        let pool = Pool::new(PoolConfiguration::new());
        let entry = pool.reserve().unwrap();
        pool.close();
        assert_eq!(entry.enable(1, true), Ok(false));
    }

    static DISPOSED: AtomicUsize = AtomicUsize::new(0);

    #[test]
    fn test_close_disposes_values() {
        let pool = Pool::new(PoolConfiguration::new().with_disposer(|value: &u32| {
            DISPOSED.fetch_add(*value as usize, Ordering::SeqCst);
            Err(io::Error::other("ignored"))
        }));
        pool.warmup(3, || 1u32);
        pool.reserve().unwrap();

        pool.close();
        assert_eq!(DISPOSED.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let (pool, _) = filled(StrategyType::First, 1);
        {
            let lease = pool.lease().unwrap();
            assert_eq!(*lease, 0);
            assert!(pool.lease().is_none());
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_lease_remove() {
        let (pool, _) = filled(StrategyType::First, 1);
        let lease = pool.lease().unwrap();
        assert!(lease.remove());
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_lease_detach_keeps_entry_active() {
        let (pool, _) = filled(StrategyType::First, 1);
        let entry = pool.lease().unwrap().detach();
        assert!(entry.is_in_use());
        assert!(pool.release(&entry).unwrap());
    }

    #[test]
    fn test_lease_with() {
        let pool = Pool::new(PoolConfiguration::new());
        {
            let lease = pool
                .lease_with(|_| Ok::<_, PoolError>(Some("buffer")))
                .unwrap()
                .unwrap();
            assert_eq!(*lease, "buffer");
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_accounting_and_display() {
        let (pool, _) = filled(StrategyType::First, 3);
        let _held = pool.acquire().unwrap();
        pool.reserve().unwrap();

        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.in_use_count(), 1);
        assert_eq!(pool.reserved_count(), 1);
        assert_eq!(pool.closed_count(), 0);
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.max_entries(), 100);
        assert_eq!(pool.to_string(), "Pool[in_use=1,size=4,max=100,closed=false]");
    }

    #[test]
    fn test_metrics_counters() {
        let (pool, _) = filled(StrategyType::First, 1);
        let entry = pool.acquire().unwrap();
        assert!(pool.acquire().is_none());
        pool.release(&entry).unwrap();
        pool.remove(&entry);

        let metrics = pool.metrics();
        assert_eq!(metrics.total_acquired, 1);
        assert_eq!(metrics.acquire_misses, 1);
        assert_eq!(metrics.total_released, 1);
        assert_eq!(metrics.total_removed, 1);
        assert_eq!(metrics.size, 0);
    }
}
