use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use zoneguard_core::{ErrorKind, RawFailure};
use zoneguard_logging::{ExecutionPhase, MemorySink};
use zoneguard_resilience::{RateLimitConfig, RetryConfig, RetryExecutor, TokenBucket};

#[tokio::test(start_paused = true)]
async fn test_burst_exhausts_bucket_then_refills() {
    let bucket = TokenBucket::new(5, 5.0).unwrap();

    for _ in 0..5 {
        assert!(bucket.try_acquire());
    }
    assert!(!bucket.try_acquire());

    tokio::time::advance(Duration::from_millis(200)).await;
    assert!(bucket.try_acquire());
    assert!(!bucket.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn test_idle_bucket_stays_capped() {
    let bucket = TokenBucket::new(5, 5.0).unwrap();
    tokio::time::advance(Duration::from_secs(3600)).await;

    assert!(bucket.available() <= 5.0);
    for _ in 0..5 {
        assert!(bucket.try_acquire());
    }
    assert!(!bucket.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn test_throttled_three_times_then_success() {
    let sink = Arc::new(MemorySink::new(32));
    let executor = RetryExecutor::builder()
        .rate_limit(RateLimitConfig {
            capacity: 5,
            initial_rate: 5.0,
            min_rate: 0.5,
            max_rate: 10.0,
            ..RateLimitConfig::default()
        })
        .retry(RetryConfig::default().with_max_attempts(5))
        .sink(sink.clone())
        .build()
        .unwrap();

    let calls = AtomicU32::new(0);
    let result = executor
        .execute("change_resource_record_sets", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(RawFailure::service("Throttling", "Rate exceeded"))
                } else {
                    Ok("C2682N5HXP0BZ4")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "C2682N5HXP0BZ4");
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let snapshot = executor.snapshot();
    assert_eq!(snapshot.decreases, 3);
    assert!((snapshot.current_rate - 5.0 * 0.5 * 0.5 * 0.5).abs() < 1e-9);
    assert_eq!(snapshot.consecutive_successes, 1);

    let phases: Vec<_> = sink.events().iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![
            ExecutionPhase::Retrying,
            ExecutionPhase::Retrying,
            ExecutionPhase::Retrying,
            ExecutionPhase::Succeeded,
        ]
    );
    assert!(sink
        .events()
        .iter()
        .take(3)
        .all(|e| e.error_kind == Some(ErrorKind::Throttle)));
}

#[tokio::test(start_paused = true)]
async fn test_always_throttled_exhausts_attempts() {
    let executor = RetryExecutor::builder()
        .retry(RetryConfig::default().with_max_attempts(3))
        .build()
        .unwrap();

    let calls = AtomicU32::new(0);
    let error = executor
        .execute("list_resource_record_sets", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(RawFailure::service("ThrottlingException", "Rate exceeded")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(error.kind, ErrorKind::Throttle);
    assert_eq!(error.attempts, Some(3));
    assert!(error.to_string().ends_with("(after 3 attempts)"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_the_quota() {
    let executor = Arc::new(
        RetryExecutor::builder()
            .rate_limit(RateLimitConfig {
                capacity: 2,
                initial_rate: 5.0,
                max_rate: 5.0,
                ..RateLimitConfig::default()
            })
            .build()
            .unwrap(),
    );
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let mut handles = Vec::new();
    for i in 0..12u32 {
        let executor = executor.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            executor
                .execute("get_change", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, RawFailure>(i) }
                })
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 12);
    // Two permits up front, the other ten accrue at five per second
    assert!(started.elapsed() >= Duration::from_millis(1990));
}
