//! Per-caller cache of the most recently released entry
//!
//! A hint only: a stale, missing or poisoned (in use) slot falls back to the
//! strategy scan. Caller ids are recycled when threads exit, so the map holds
//! at most one slot per thread alive at once.

use crate::entry::Entry;
use crate::strategy::caller_id;

use dashmap::DashMap;
use std::sync::{Arc, Weak};

pub(crate) struct CallerCache<T> {
    slots: DashMap<usize, Weak<Entry<T>>>,
}

impl<T> CallerCache<T> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Entry last released by the calling thread, if it is still alive
    pub fn get(&self) -> Option<Arc<Entry<T>>> {
        self.slots.get(&caller_id()).and_then(|slot| slot.upgrade())
    }

    /// Remember `entry` for the calling thread, replacing any previous one
    pub fn set(&self, entry: &Arc<Entry<T>>) {
        self.slots.insert(caller_id(), Arc::downgrade(entry));
    }

    /// Slots held, at most one per live caller id
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache = CallerCache::<u8>::new();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_set_then_get_same_thread() {
        let cache = CallerCache::new();
        let entry = Arc::new(Entry::new());
        entry.enable(3, false).unwrap();

        cache.set(&entry);
        let cached = cache.get().unwrap();
        assert!(Arc::ptr_eq(&cached, &entry));
    }

    #[test]
    fn test_other_thread_does_not_see_slot() {
        let cache = Arc::new(CallerCache::new());
        let entry = Arc::new(Entry::new());
        entry.enable(3, false).unwrap();
        cache.set(&entry);

        let remote = Arc::clone(&cache);
        let seen = std::thread::spawn(move || remote.get().is_some())
            .join()
            .unwrap();
        assert!(!seen);
    }

    #[test]
    fn test_dropped_entry_is_not_returned() {
        let cache = CallerCache::new();
        let entry = Arc::new(Entry::<u8>::new());
        cache.set(&entry);
        drop(entry);
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_clear() {
        let cache = CallerCache::new();
        let entry = Arc::new(Entry::<u8>::new());
        cache.set(&entry);
        cache.clear();
        assert!(cache.get().is_none());
        assert_eq!(cache.len(), 0);
    }
}
