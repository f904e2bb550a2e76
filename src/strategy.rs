//! Acquisition strategies: where a scan over the entries begins

use parking_lot::{Mutex, const_mutex};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_CALLER_ID: AtomicUsize = AtomicUsize::new(0);

/// Ids given back by exited threads, handed out again before fresh ones
static FREE_CALLER_IDS: Mutex<Vec<usize>> = const_mutex(Vec::new());

/// A caller id owned by one live thread, returned to the free list on exit
struct CallerId(usize);

impl CallerId {
    fn claim() -> Self {
        let reused = FREE_CALLER_IDS.lock().pop();
        CallerId(reused.unwrap_or_else(|| NEXT_CALLER_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

impl Drop for CallerId {
    fn drop(&mut self) {
        FREE_CALLER_IDS.lock().push(self.0);
    }
}

thread_local! {
    static CALLER_ID: CallerId = CallerId::claim();
}

/// Small integer identifying the calling thread.
///
/// Unique among live threads; an exited thread's id is reused, so ids stay
/// bounded by the peak number of threads alive at once.
pub(crate) fn caller_id() -> usize {
    // During thread teardown the slot may already be gone
    CALLER_ID.try_with(|id| id.0).unwrap_or(usize::MAX)
}

/// Strategy used to pick the first entry an acquisition looks at
///
/// # Examples
///
/// ```
/// use esox_entrypool::{Pool, PoolConfiguration, StrategyType};
///
/// let config = PoolConfiguration::<Vec<u8>>::new()
///     .with_strategy(StrategyType::RoundRobin)
///     .with_max_entries(4);
///
/// let pool = Pool::new(config);
/// assert_eq!(pool.strategy(), StrategyType::RoundRobin);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyType {
    /// Always start from the first entry. Favours early entries, but
    /// contends on them more.
    #[default]
    First,

    /// Start from a uniformly random entry
    Random,

    /// Start from an entry derived from the calling thread's id. Suited to
    /// pools substantially smaller than the number of threads.
    ThreadId,

    /// Start from a shared counter that advances on every acquisition
    RoundRobin,
}

impl StrategyType {
    /// Index in `[0, size)` at which to begin scanning.
    ///
    /// `next_index` is the shared round-robin counter and is only consulted
    /// by [`StrategyType::RoundRobin`]. `size` must be non-zero.
    pub(crate) fn start_index(self, size: usize, next_index: Option<&AtomicUsize>) -> usize {
        debug_assert!(size > 0);
        match self {
            StrategyType::First => 0,
            StrategyType::Random => rand::rng().random_range(0..size),
            StrategyType::ThreadId => caller_id() % size,
            // Wraps at usize::MAX, so the index never leaves [0, size)
            StrategyType::RoundRobin => match next_index {
                Some(counter) => counter.fetch_add(1, Ordering::Relaxed) % size,
                None => 0,
            },
        }
    }
}
