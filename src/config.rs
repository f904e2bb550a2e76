//! Pool configuration options

use crate::strategy::StrategyType;

use std::io;

/// Configuration for entry pool behavior
///
/// # Examples
///
/// ```
/// use esox_entrypool::{PoolConfiguration, StrategyType};
///
/// let config = PoolConfiguration::<i32>::new()
///     .with_max_entries(64)
///     .with_strategy(StrategyType::Random)
///     .with_cache();
///
/// assert_eq!(config.max_entries, 64);
/// assert_eq!(config.strategy, StrategyType::Random);
/// assert!(config.cache);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfiguration<T> {
    /// Maximum number of entries the pool accepts; `0` means unbounded
    pub max_entries: usize,

    /// Where acquisition scans begin
    pub strategy: StrategyType,

    /// Whether each thread remembers the last entry it released
    pub cache: bool,

    /// Called on every value reclaimed by [`Pool::close`](crate::Pool::close).
    /// Errors are ignored.
    pub dispose_function: Option<fn(&T) -> io::Result<()>>,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            max_entries: 100,
            strategy: StrategyType::First,
            cache: false,
            dispose_function: None,
        }
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_entrypool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::<i32>::new()
    ///     .with_max_entries(50);
    ///
    /// assert_eq!(config.max_entries, 50);
    /// ```
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Remove the entry limit
    pub fn unbounded(mut self) -> Self {
        self.max_entries = 0;
        self
    }

    /// Set the acquisition strategy
    pub fn with_strategy(mut self, strategy: StrategyType) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable the per-thread cache of the last released entry
    pub fn with_cache(mut self) -> Self {
        self.cache = true;
        self
    }

    /// Dispose of pooled values when the pool is closed
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_entrypool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::<std::fs::File>::new()
    ///     .with_disposer(|file| file.sync_all());
    ///
    /// assert!(config.dispose_function.is_some());
    /// ```
    pub fn with_disposer(mut self, func: fn(&T) -> io::Result<()>) -> Self {
        self.dispose_function = Some(func);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::<u8>::default();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.strategy, StrategyType::First);
        assert!(!config.cache);
        assert!(config.dispose_function.is_none());
    }

    #[test]
    fn test_unbounded() {
        let config = PoolConfiguration::<u8>::new().with_max_entries(5).unbounded();
        assert_eq!(config.max_entries, 0);
    }
}
