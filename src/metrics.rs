//! Metrics collection and export for entry pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metrics data for a pool
///
/// The entry counts are a point-in-time scan of the pool taken while other
/// threads may be mutating it; they are meant for observability, not for
/// making correctness decisions.
///
/// # Examples
///
/// ```
/// use esox_entrypool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(PoolConfiguration::new());
/// pool.warmup(3, || 0u8);
///
/// let entry = pool.acquire().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.in_use_entries, 1);
/// assert_eq!(metrics.idle_entries, 2);
/// # pool.release(&entry).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMetrics {
    /// Successful acquisitions
    pub total_acquired: usize,

    /// Successful releases
    pub total_released: usize,

    /// Entries removed from the pool
    pub total_removed: usize,

    /// Acquisitions served by the per-thread cache
    pub cache_hits: usize,

    /// Threads holding a slot in the per-thread cache
    pub cached_callers: usize,

    /// Acquisitions that found nothing available
    pub acquire_misses: usize,

    /// Reservations refused because the pool was full or closed
    pub reserve_rejections: usize,

    /// Entries reserved but not yet enabled
    pub reserved_entries: usize,

    /// Entries available for acquisition
    pub idle_entries: usize,

    /// Entries currently held by a caller
    pub in_use_entries: usize,

    /// Entries closed but not yet evicted from the pool
    pub closed_entries: usize,

    /// Entries in the pool
    pub size: usize,

    /// Maximum entries, `0` when unbounded
    pub max_entries: usize,

    /// In-use ratio against `max_entries` (or `size` when unbounded)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_removed".to_string(), self.total_removed.to_string());
        metrics.insert("cache_hits".to_string(), self.cache_hits.to_string());
        metrics.insert("cached_callers".to_string(), self.cached_callers.to_string());
        metrics.insert("acquire_misses".to_string(), self.acquire_misses.to_string());
        metrics.insert("reserve_rejections".to_string(), self.reserve_rejections.to_string());
        metrics.insert("reserved_entries".to_string(), self.reserved_entries.to_string());
        metrics.insert("idle_entries".to_string(), self.idle_entries.to_string());
        metrics.insert("in_use_entries".to_string(), self.in_use_entries.to_string());
        metrics.insert("closed_entries".to_string(), self.closed_entries.to_string());
        metrics.insert("size".to_string(), self.size.to_string());
        metrics.insert("max_entries".to_string(), self.max_entries.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_entrypool::{Pool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = Pool::new(PoolConfiguration::<u8>::new());
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("buffers", Some(&tags));
    /// assert!(output.contains("entrypool_entries_in_use"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let labels = Self::format_labels(pool_name, tags);

        let gauges: [(&str, &str, String); 7] = [
            ("entrypool_entries_idle", "Idle entries", metrics.idle_entries.to_string()),
            ("entrypool_entries_in_use", "In-use entries", metrics.in_use_entries.to_string()),
            ("entrypool_entries_reserved", "Reserved entries", metrics.reserved_entries.to_string()),
            ("entrypool_entries", "Entries in the pool", metrics.size.to_string()),
            ("entrypool_entries_max", "Maximum entries, 0 when unbounded", metrics.max_entries.to_string()),
            ("entrypool_cached_callers", "Threads with a cached entry", metrics.cached_callers.to_string()),
            ("entrypool_utilization", "Pool utilization ratio", format!("{:.2}", metrics.utilization)),
        ];
        let counters: [(&str, &str, usize); 6] = [
            ("entrypool_acquired_total", "Total entries acquired", metrics.total_acquired),
            ("entrypool_released_total", "Total entries released", metrics.total_released),
            ("entrypool_removed_total", "Total entries removed", metrics.total_removed),
            ("entrypool_cache_hits_total", "Acquisitions served by the thread cache", metrics.cache_hits),
            ("entrypool_acquire_misses_total", "Acquisitions that found no idle entry", metrics.acquire_misses),
            ("entrypool_reserve_rejections_total", "Refused reservations", metrics.reserve_rejections),
        ];

        let mut output = String::new();
        for (name, help, value) in gauges {
            Self::push_metric(&mut output, name, help, "gauge", &labels, &value);
        }
        for (name, help, value) in counters {
            Self::push_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }
        output
    }

    fn push_metric(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Point-in-time entry counts, gathered by the pool
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EntryCounts {
    pub reserved: usize,
    pub idle: usize,
    pub in_use: usize,
    pub closed: usize,
}

impl EntryCounts {
    pub fn size(&self) -> usize {
        self.reserved + self.idle + self.in_use + self.closed
    }
}

/// Internal metrics tracker
pub(crate) struct MetricsTracker {
    pub total_acquired: AtomicUsize,
    pub total_released: AtomicUsize,
    pub total_removed: AtomicUsize,
    pub cache_hits: AtomicUsize,
    pub acquire_misses: AtomicUsize,
    pub reserve_rejections: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            total_acquired: AtomicUsize::new(0),
            total_released: AtomicUsize::new(0),
            total_removed: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            acquire_misses: AtomicUsize::new(0),
            reserve_rejections: AtomicUsize::new(0),
        }
    }

    pub fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, counts: EntryCounts, max_entries: usize) -> PoolMetrics {
        let size = counts.size();
        let capacity = if max_entries > 0 { max_entries } else { size };
        let utilization = if capacity > 0 {
            counts.in_use as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_removed: self.total_removed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cached_callers: 0,
            acquire_misses: self.acquire_misses.load(Ordering::Relaxed),
            reserve_rejections: self.reserve_rejections.load(Ordering::Relaxed),
            reserved_entries: counts.reserved,
            idle_entries: counts.idle,
            in_use_entries: counts.in_use,
            closed_entries: counts.closed,
            size,
            max_entries,
            utilization,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}
