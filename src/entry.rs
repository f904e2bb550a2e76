//! Pool entries and their lock-free state machine

use crate::errors::{PoolError, PoolResult};

use crossbeam::utils::CachePadded;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI32, Ordering};

const PENDING: i32 = i32::MIN;
const CLOSED: i32 = -1;
const IDLE: i32 = 0;
const ACTIVE: i32 = 1;

/// Lifecycle state of an [`Entry`]
///
/// # Examples
///
/// ```
/// use esox_entrypool::{EntryState, Pool, PoolConfiguration};
///
/// let pool = Pool::new(PoolConfiguration::<u32>::new());
/// let entry = pool.reserve().unwrap();
/// assert_eq!(entry.state(), EntryState::Pending);
///
/// entry.enable(7, false).unwrap();
/// assert_eq!(entry.state(), EntryState::Idle);
/// assert_eq!(entry.state().to_string(), "IDLE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Reserved, no value attached yet
    Pending,

    /// Enabled and available for acquisition
    Idle,

    /// Enabled and held by exactly one caller
    Active,

    /// Removed from the pool; terminal
    Closed,
}

impl EntryState {
    fn from_raw(raw: i32) -> Self {
        match raw {
            PENDING => EntryState::Pending,
            IDLE => EntryState::Idle,
            ACTIVE => EntryState::Active,
            _ => EntryState::Closed,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryState::Pending => "PENDING",
            EntryState::Idle => "IDLE",
            EntryState::Active => "ACTIVE",
            EntryState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// A pool slot holding at most one pooled value, acquirable by at most one
/// caller at a time.
///
/// Every transition is a compare-and-set on a single atomic integer. The
/// pooled value is written once by [`Entry::enable`] before the state leaves
/// `Pending`, so any caller that observes the entry as `Idle` or `Active`
/// also observes the value.
pub struct Entry<T> {
    state: CachePadded<AtomicI32>,
    pooled: OnceLock<T>,
}

impl<T> Entry<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: CachePadded::new(AtomicI32::new(PENDING)),
            pooled: OnceLock::new(),
        }
    }

    /// Enable this previously reserved entry with its pooled value.
    ///
    /// An entry returned by [`Pool::reserve`](crate::Pool::reserve) must be
    /// enabled once and only once (or removed). With `acquire` set the entry
    /// goes straight to `Active` so no other caller can grab it first.
    ///
    /// Returns `Ok(false)` when the entry was closed in the meantime (the
    /// pool was closed or the entry removed); the value is dropped in that
    /// case. Enabling an entry that is already enabled is a contract
    /// violation and yields [`PoolError::EntryAlreadyEnabled`].
    pub fn enable(&self, pooled: T, acquire: bool) -> PoolResult<bool> {
        if !self.is_reserved() {
            return self.enable_failed();
        }

        // A racing enable that lost the set is a double enable as well
        if self.pooled.set(pooled).is_err() {
            return self.enable_failed();
        }

        if self.try_enable(acquire) {
            return Ok(true);
        }

        self.enable_failed()
    }

    fn enable_failed(&self) -> PoolResult<bool> {
        if self.is_closed() {
            Ok(false)
        } else {
            Err(PoolError::EntryAlreadyEnabled)
        }
    }

    fn try_enable(&self, acquire: bool) -> bool {
        let target = if acquire { ACTIVE } else { IDLE };
        self.state
            .compare_exchange(PENDING, target, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Idle -> Active`. Fails on every other state.
    pub(crate) fn try_acquire(&self) -> bool {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current != IDLE {
                return false;
            }
            if self
                .state
                .compare_exchange_weak(current, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// `Active -> Idle`.
    ///
    /// `Ok(false)` means the entry is closed (or was never enabled) and
    /// should be removed instead.
    pub(crate) fn try_release(&self) -> PoolResult<bool> {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current < 0 {
                return Ok(false);
            }
            if current == IDLE {
                return Err(PoolError::EntryAlreadyReleased);
            }
            if self
                .state
                .compare_exchange_weak(current, IDLE, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(true);
            }
        }
    }

    /// Any state `-> Closed`. Returns whether this call performed the
    /// transition, i.e. the entry was not closed already.
    pub(crate) fn try_remove(&self) -> bool {
        self.state.swap(CLOSED, Ordering::AcqRel) != CLOSED
    }

    /// The pooled value, once enabled
    pub fn pooled(&self) -> Option<&T> {
        self.pooled.get()
    }

    /// Point-in-time state of this entry
    pub fn state(&self) -> EntryState {
        EntryState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_reserved(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }

    pub fn is_in_use(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }
}

impl<T: fmt::Debug> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("state", &self.state())
            .field("pooled", &self.pooled.get())
            .finish()
    }
}
