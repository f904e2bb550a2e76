//! Basic usage examples for Pool

use esox_entrypool::{EntryPool, Pool, PoolConfiguration, PoolError};

fn main() {
    println!("=== EsoxSolutions.EntryPool - Basic Examples ===\n");

    // Example 1: Reserve, enable, acquire, release
    entry_lifecycle();

    // Example 2: Lazily created entries
    lazy_creation();

    // Example 3: Leases
    leases();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn entry_lifecycle() {
    println!("1. Entry Lifecycle:");
    let pool = Pool::new(PoolConfiguration::new().with_max_entries(2));

    let entry = pool.reserve().unwrap();
    println!("   Reserved: {}", entry.state());

    entry.enable(String::from("conn-1"), false).unwrap();
    println!("   Enabled: {}", entry.state());

    let acquired = pool.acquire().unwrap();
    println!("   Acquired {:?}: {}", acquired.pooled(), acquired.state());

    pool.release(&acquired).unwrap();
    println!("   Released: {}", acquired.state());

    // Releasing twice is a bug in the caller
    match pool.release(&acquired) {
        Ok(_) => println!("   Released again?"),
        Err(e) => println!("   Second release: {}", e),
    }

    pool.remove(&acquired);
    println!("   Removed: {}, pool size {}\n", acquired.state(), pool.size());
}

fn lazy_creation() {
    println!("2. Lazy Creation:");
    let pool = Pool::new(PoolConfiguration::new().with_max_entries(2));

    let first = pool
        .acquire_with(|_| {
            println!("   Creating buffer...");
            Ok::<_, PoolError>(Some(vec![0u8; 1024]))
        })
        .unwrap()
        .unwrap();
    let second = pool
        .acquire_with(|_| Ok::<_, PoolError>(Some(vec![0u8; 1024])))
        .unwrap()
        .unwrap();

    // Full, and nothing idle
    let third = pool
        .acquire_with(|_| Ok::<_, PoolError>(Some(vec![0u8; 1024])))
        .unwrap();
    println!("   Third attempt: {:?}", third.map(|_| "entry"));

    pool.release(&first).unwrap();
    pool.release(&second).unwrap();
    println!("   Idle after release: {}\n", pool.idle_count());
}

fn leases() {
    println!("3. Leases:");
    let pool = Pool::new(PoolConfiguration::new());
    pool.warmup(1, || 42);

    let lease = pool.lease();
    assert!(lease.is_some());
    println!("   First lease: Success");

    let second = pool.lease();
    assert!(second.is_none());
    println!("   Second lease: None (pool exhausted)");

    drop(lease); // Released back to the pool

    let third = pool.lease();
    assert!(third.is_some());
    println!("   Third lease: Success\n");
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let pool = Pool::new(PoolConfiguration::new().with_max_entries(5));
    pool.warmup(5, || 0u32);

    {
        let _a = pool.lease().unwrap();
        let _b = pool.lease().unwrap();

        let health = pool.health_status();
        println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
        println!("   Utilization: {:.1}%", health.utilization * 100.0);
        println!("   In use: {}, Idle: {}", health.in_use_entries, health.idle_entries);
    }

    let metrics = pool.export_metrics();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
