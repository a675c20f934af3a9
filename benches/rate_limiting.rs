use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyed_throttle::{
    FixedWindowConfig, FixedWindowLimiter, LeakyBucketConfig, LeakyBucketLimiter,
    SlidingWindowCounterConfig, SlidingWindowCounterLimiter, SystemClock, TokenBucketConfig,
    TokenBucketLimiter,
};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark single-threaded admission throughput per algorithm
fn bench_single_threaded_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded_admit");
    group.throughput(Throughput::Elements(1));
    let clock = Arc::new(SystemClock::new());

    let token_bucket = TokenBucketLimiter::new(
        TokenBucketConfig::new(u64::MAX / 2, 1_000, Duration::from_millis(1)).unwrap(),
        clock.clone(),
    );
    group.bench_function("token_bucket", |b| {
        b.iter(|| token_bucket.admit(black_box("bench-user")))
    });

    let leaky_bucket = LeakyBucketLimiter::new(
        LeakyBucketConfig::new(u64::MAX / 2, 1_000.0, Duration::from_millis(1)).unwrap(),
        clock.clone(),
    );
    group.bench_function("leaky_bucket", |b| {
        b.iter(|| leaky_bucket.admit(black_box("bench-user")))
    });

    let fixed_window = FixedWindowLimiter::new(
        FixedWindowConfig::new(u64::MAX / 2, Duration::from_secs(1)).unwrap(),
        clock.clone(),
    );
    group.bench_function("fixed_window", |b| {
        b.iter(|| fixed_window.admit(black_box("bench-user")))
    });

    let sliding_counter = SlidingWindowCounterLimiter::new(
        SlidingWindowCounterConfig::new(u64::MAX / 2, Duration::from_secs(1)).unwrap(),
        clock.clone(),
    );
    group.bench_function("sliding_window_counter", |b| {
        b.iter(|| sliding_counter.admit(black_box("bench-user")))
    });

    group.finish();
}

/// Benchmark contended admission across threads hitting one key
fn bench_contended_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_admit");

    for threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(1_000 * threads as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let limiter = Arc::new(TokenBucketLimiter::new(
                    TokenBucketConfig::new(u64::MAX / 2, 1_000, Duration::from_millis(1))
                        .unwrap(),
                    Arc::new(SystemClock::new()),
                ));

                b.iter(|| {
                    let handles: Vec<_> = (0..threads)
                        .map(|_| {
                            let limiter = Arc::clone(&limiter);
                            std::thread::spawn(move || {
                                for _ in 0..1_000 {
                                    let _ = limiter.admit("contended");
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark key fan-out: admissions spread over many keys
fn bench_many_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_keys");
    group.throughput(Throughput::Elements(1));

    let limiter = TokenBucketLimiter::new(
        TokenBucketConfig::new(u64::MAX / 2, 1_000, Duration::from_millis(1)).unwrap(),
        Arc::new(SystemClock::new()),
    );
    let keys: Vec<String> = (0..10_000).map(|i| format!("tenant-{}", i)).collect();
    let mut next = 0usize;

    group.bench_function("round_robin_10k_keys", |b| {
        b.iter(|| {
            let key = &keys[next % keys.len()];
            next += 1;
            limiter.admit(black_box(key))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded_admit,
    bench_contended_admit,
    bench_many_keys
);
criterion_main!(benches);
