//! Benchmarks for scheduler throughput.
//!
//! Measures the cost of the core operations end to end:
//! - spawn-to-join of batches of logical threads
//! - yield rotation among equal-priority threads
//! - wait/signal rendezvous round trips

extern crate unicore;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use unicore::Scheduler;

/// Benchmark spawning and joining a batch of trivial threads.
fn bench_spawn_join(c: &mut Criterion) {
    c.bench_function("spawn_join_16", |b| {
        b.iter(|| {
            let sched = Scheduler::new(2, 1).unwrap();
            for i in 0..16u32 {
                sched.spawn(|_, _| (), black_box(i % 6)).unwrap();
            }
            sched.shutdown();
            black_box(sched.finished_count())
        });
    });
}

/// Benchmark quantum-driven rotation among equal-priority threads.
fn bench_yield_rotation(c: &mut Criterion) {
    c.bench_function("yield_rotation_4x32", |b| {
        b.iter(|| {
            let sched = Scheduler::new(1, 1).unwrap();
            for _ in 0..4 {
                sched
                    .spawn(
                        |sched, _| {
                            for _ in 0..32 {
                                sched.yield_now();
                            }
                        },
                        2,
                    )
                    .unwrap();
            }
            sched.shutdown();
            black_box(sched.finished_count())
        });
    });
}

/// Benchmark a wait/signal rendezvous between two threads.
fn bench_wait_signal(c: &mut Criterion) {
    c.bench_function("wait_signal_pair", |b| {
        b.iter(|| {
            let sched = Scheduler::new(2, 1).unwrap();
            sched
                .spawn(|sched, _| sched.wait_for_event(0).unwrap(), 1)
                .unwrap();
            sched
                .spawn(
                    |sched, _| {
                        black_box(sched.signal_event(0).unwrap());
                    },
                    1,
                )
                .unwrap();
            sched.shutdown();
            black_box(sched.finished_count())
        });
    });
}

criterion_group!(
    benches,
    bench_spawn_join,
    bench_yield_rotation,
    bench_wait_signal
);
criterion_main!(benches);
