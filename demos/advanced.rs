//! Advanced features: strategies, thread cache, leak tracking, disposal

use esox_entrypool::{EntryPool, LeakTrackingPool, Pool, PoolConfiguration, StrategyType};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    id: usize,
    data: String,
}

impl Connection {
    fn new(id: usize) -> Self {
        Self {
            id,
            data: format!("Connection-{}", id),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        println!("   Shutting down {}", self.data);
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== EsoxSolutions.EntryPool - Advanced Features ===\n");

    // Example 1: Strategies
    strategies();

    // Example 2: Thread cache
    thread_cache();

    // Example 3: Leak tracking
    leak_tracking();

    // Example 4: Prometheus metrics
    prometheus_export();

    // Example 5: Disposal on close
    disposal_on_close();
}

fn strategies() {
    println!("1. Strategies:");

    for strategy in [
        StrategyType::First,
        StrategyType::Random,
        StrategyType::ThreadId,
        StrategyType::RoundRobin,
    ] {
        let pool = Pool::new(PoolConfiguration::new().with_strategy(strategy));
        let mut next = 0;
        pool.warmup(4, || {
            next += 1;
            Connection::new(next)
        });

        let visited: Vec<usize> = (0..4)
            .filter_map(|_| pool.lease().map(|conn| conn.id))
            .collect();
        println!("   {:?}: {:?}", strategy, visited);
    }

    println!();
}

fn thread_cache() {
    println!("2. Thread Cache:");

    let pool = Arc::new(Pool::new(
        PoolConfiguration::new()
            .with_strategy(StrategyType::Random)
            .with_cache(),
    ));
    pool.warmup(8, || 0u64);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..1000 {
                    drop(pool.lease());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let metrics = pool.metrics();
    println!(
        "   {} acquisitions, {} served by the cache\n",
        metrics.total_acquired, metrics.cache_hits
    );
}

fn leak_tracking() {
    println!("3. Leak Tracking:");

    let pool = Pool::new(PoolConfiguration::new());
    pool.warmup(3, || Connection::new(0));
    let tracking = LeakTrackingPool::new(pool, Duration::from_millis(20));

    {
        let conn = tracking.lease().unwrap();
        println!("   Leased {}", conn.data);
    }

    let forgotten = tracking.acquire().unwrap();
    thread::sleep(Duration::from_millis(30));

    println!("   Leaks found: {}", tracking.check_leaks());
    println!("   Leaks found on second pass: {}", tracking.check_leaks());
    println!("   Leaked resources: {}", tracking.leaked_resources());

    tracking.release(&forgotten).unwrap();
    println!();
}

fn prometheus_export() {
    println!("4. Prometheus Export:");

    let pool = Pool::new(PoolConfiguration::new().with_max_entries(10));
    pool.warmup(5, || 0u8);

    let _a = pool.lease().unwrap();
    let _b = pool.lease().unwrap();

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "api".to_string());
    tags.insert("region".to_string(), "eu-west".to_string());

    let prometheus = pool.export_metrics_prometheus("connections", Some(&tags));
    println!("{}", prometheus);
}

fn disposal_on_close() {
    println!("5. Disposal on Close:");

    let pool = Pool::new(PoolConfiguration::new().with_disposer(Connection::shutdown));
    let mut next = 0;
    pool.warmup(3, || {
        next += 1;
        Connection::new(next)
    });

    let _in_use = pool.lease().unwrap();
    pool.close();
    println!("   {}", pool);
}
