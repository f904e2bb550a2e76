//! Async usage examples
//!
//! The pool never waits. Tasks that want to wait for an entry retry on
//! their own, here with a short sleep between attempts.

use esox_entrypool::{EntryPool, Pool, PoolConfiguration, PooledEntry, StrategyType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    println!("=== EsoxSolutions.EntryPool - Async Examples ===\n");

    // Example 1: Retry until an entry frees up
    retry_with_backoff().await;

    // Example 2: Give up after a deadline
    retry_with_deadline().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn lease_eventually<T>(pool: &Pool<T>) -> PooledEntry<'_, T> {
    loop {
        if let Some(lease) = pool.lease() {
            return lease;
        }
        sleep(Duration::from_millis(10)).await;
    }
}

async fn retry_with_backoff() {
    println!("1. Retry With Backoff:");
    let pool = Arc::new(Pool::new(PoolConfiguration::new()));
    pool.warmup(1, || 7);

    let held = pool.acquire().unwrap();
    let releaser = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            pool.release(&held).unwrap();
        })
    };

    let lease = lease_eventually(&pool).await;
    println!("   Got entry after retrying: {}", *lease);
    releaser.await.unwrap();
    println!();
}

async fn retry_with_deadline() {
    println!("2. Retry With Deadline:");
    let pool = Pool::new(PoolConfiguration::new());
    pool.warmup(1, || 42);

    let _held = pool.lease().unwrap();

    match timeout(Duration::from_millis(100), lease_eventually(&pool)).await {
        Ok(_) => println!("   Got entry"),
        Err(_) => println!("   Gave up: no entry within 100ms"),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let pool = Arc::new(Pool::new(
        PoolConfiguration::new()
            .with_max_entries(5)
            .with_strategy(StrategyType::Random),
    ));
    pool.warmup(5, || 0u32);

    let mut handles = vec![];

    for i in 0..10 {
        let pool = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            if let Some(entry) = pool.lease() {
                println!("   Task {} got entry holding {}", i, *entry);
                sleep(Duration::from_millis(50)).await;
            } else {
                println!("   Task {} found the pool exhausted", i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final idle: {}", pool.idle_count());
}
