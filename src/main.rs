// EsoxSolutions.EntryPool
// Lock-free concurrent entry pool
// Version 1.0.0

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_entrypool::{EntryPool, Pool, PoolConfiguration, StrategyType};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== EsoxSolutions.EntryPool v1.0.0 ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let pool = Pool::new(
        PoolConfiguration::new()
            .with_max_entries(3)
            .with_strategy(StrategyType::RoundRobin),
    );
    pool.warmup(3, || 0u64);

    if let Some(entry) = pool.lease() {
        println!("  Got entry holding: {}", *entry);
        println!("  In use: {}", pool.in_use_count());
    }

    println!("  Idle after release: {}", pool.idle_count());
    println!("  {}", pool);

    pool.close();
    println!("  After close: {}", pool);
}
