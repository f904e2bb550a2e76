//! Health monitoring for entry pools

/// Health status of an entry pool
///
/// # Examples
///
/// ```
/// use esox_entrypool::{Pool, PoolConfiguration};
///
/// let pool = Pool::new(PoolConfiguration::new().with_max_entries(10));
/// pool.warmup(3, || 0u8);
///
/// let health = pool.health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.idle_entries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// In-use ratio against the maximum entries (0.0 when unbounded)
    pub utilization: f64,

    /// Idle entries count
    pub idle_entries: usize,

    /// In-use entries count
    pub in_use_entries: usize,

    /// Maximum entries, `0` when unbounded
    pub max_entries: usize,

    /// Whether the pool has been closed
    pub closed: bool,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a new health status
    pub fn new(idle: usize, in_use: usize, max_entries: usize, closed: bool) -> Self {
        let utilization = if max_entries > 0 {
            in_use as f64 / max_entries as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if closed {
            warnings.push("Pool is closed".to_string());
            is_healthy = false;
        }

        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        // Busy but not necessarily unhealthy: acquire_with can still grow it
        if idle == 0 && in_use > 0 {
            warnings.push("No idle entries".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            idle_entries: idle,
            in_use_entries: in_use,
            max_entries,
            closed,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
