//! Shared request pacing across concurrent workers

use entsoe_flows::downloader::RateLimiter;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_pacer_enforces_minimum_spacing() {
    let limiter = RateLimiter::new(Duration::from_millis(250));
    let t0 = Instant::now();
    for _ in 0..5 {
        limiter.acquire().await;
    }
    // 5 acquisitions, 4 enforced gaps
    assert!(t0.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_budget_is_global_not_per_worker() {
    let limiter = RateLimiter::shared(Duration::from_millis(100));
    let t0 = Instant::now();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.acquire().await;
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }

    // If each worker had its own budget this would complete instantly
    assert!(t0.elapsed() >= Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_idle_limiter_does_not_accumulate_debt() {
    let limiter = RateLimiter::new(Duration::from_millis(100));
    limiter.acquire().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Long idle period: the next slot is "now", not ten seconds of backlog
    let waited = limiter.acquire().await;
    assert_eq!(waited, Duration::ZERO);
}
