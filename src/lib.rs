//! # EsoxSolutions.EntryPool
//!
//! High-throughput, lock-free pool of reusable entries for Rust.
//!
//! ## Features
//!
//! - Non-blocking acquisition with a single compare-and-set per entry
//! - Copy-on-write entry list: scans never take a lock
//! - Pluggable acquisition strategies (first, random, thread id, round robin)
//! - Optional per-thread cache of the last released entry
//! - Lazy creation of pooled values with automatic rollback on failure
//! - Automatic release of leased entries via RAII (Drop trait)
//! - Leak tracking decorator with a pluggable detector
//! - Metrics, Prometheus export and health monitoring
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_entrypool::{EntryPool, Pool, PoolConfiguration, StrategyType};
//!
//! let pool = Pool::new(
//!     PoolConfiguration::new()
//!         .with_max_entries(8)
//!         .with_strategy(StrategyType::RoundRobin)
//!         .with_cache(),
//! );
//! pool.warmup(4, || Vec::<u8>::with_capacity(4096));
//!
//! {
//!     let buffer = pool.lease().unwrap();
//!     println!("Got buffer with capacity {}", buffer.capacity());
//!     // Entry automatically released when `buffer` goes out of scope
//! }
//!
//! assert_eq!(pool.idle_count(), 4);
//! pool.close();
//! ```

mod cache;
mod config;
mod entry;
mod errors;
mod health;
mod leak;
mod metrics;
mod pool;
mod strategy;

pub use config::PoolConfiguration;
pub use entry::{Entry, EntryState};
pub use errors::{PoolError, PoolResult};
pub use health::HealthStatus;
pub use leak::{ExpiryLeakDetector, LeakDetector, LeakInfo, LeakTrackingPool};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{EntryPool, Pool, PooledEntry};
pub use strategy::StrategyType;
