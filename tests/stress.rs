//! Stress and soak tests.
//!
//! These tests shake the scheduler with larger workloads and with several
//! independent schedulers running in parallel. They assert completeness
//! properties only - exact interleavings are the subject of
//! `tests/scheduling.rs`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use unicore::{Scheduler, SchedulerConfig, ThreadId};

#[test]
fn many_yielding_threads_all_complete() {
    let sched = Scheduler::new(2, 1).unwrap();
    let turns = Arc::new(AtomicUsize::new(0));

    let mut spawned = Vec::new();
    for i in 0..40u32 {
        let turns = Arc::clone(&turns);
        let id = sched
            .spawn(
                move |sched, _| {
                    for _ in 0..8 {
                        turns.fetch_add(1, Ordering::SeqCst);
                        sched.yield_now();
                    }
                },
                i % 6,
            )
            .unwrap();
        spawned.push(id);
    }

    sched.shutdown();
    assert_eq!(turns.load(Ordering::SeqCst), 40 * 8);
    assert_eq!(sched.finished_count(), 40);

    // the completion log covers every spawned id exactly once
    let terminated: HashSet<ThreadId> = sched.terminated().into_iter().collect();
    assert_eq!(terminated.len(), 40);
    assert_eq!(terminated, spawned.into_iter().collect());
}

#[test]
fn deep_spawn_chain_completes() {
    // each thread forks its successor; the chain must drain completely
    let sched = Scheduler::new(2, 1).unwrap();
    let reached = Arc::new(AtomicUsize::new(0));

    fn link(sched: &Scheduler, depth: usize, reached: Arc<AtomicUsize>) {
        reached.fetch_add(1, Ordering::SeqCst);
        if depth == 0 {
            return;
        }
        sched
            .spawn(
                move |sched, _| link(sched, depth - 1, reached),
                (depth % 6) as u32,
            )
            .unwrap();
    }

    let reached_clone = Arc::clone(&reached);
    sched
        .spawn(move |sched, _| link(sched, 30, reached_clone), 3)
        .unwrap();

    sched.shutdown();
    assert_eq!(reached.load(Ordering::SeqCst), 31);
    assert_eq!(sched.spawned_count(), 31);
}

#[test]
fn wait_signal_pairs_drain() {
    // waiters park on per-class events; a rendezvous master releases every
    // class, forked last at the lowest priority so all waiters park first
    let sched = Scheduler::new(4, 4).unwrap();
    let woken = Arc::new(AtomicUsize::new(0));

    let woken_clone = Arc::clone(&woken);
    sched
        .spawn(
            move |sched, _| {
                for i in 0..12u32 {
                    let woken = Arc::clone(&woken_clone);
                    sched
                        .spawn(
                            move |sched, _| {
                                sched.wait_for_event(i % 4).unwrap();
                                woken.fetch_add(1, Ordering::SeqCst);
                            },
                            1 + i % 3,
                        )
                        .unwrap();
                }
                sched
                    .spawn(
                        move |sched, _| {
                            let mut released = 0;
                            for event in 0..4 {
                                released += sched.signal_event(event).unwrap();
                            }
                            assert_eq!(released, 12);
                        },
                        0,
                    )
                    .unwrap();
            },
            5,
        )
        .unwrap();

    sched.shutdown();
    assert_eq!(woken.load(Ordering::SeqCst), 12);
}

#[test]
fn parallel_independent_schedulers() {
    // one scheduler per rayon worker: each rayon thread is the host context of
    // its own scheduler, exercising the no-global-singleton design
    let results: Vec<u64> = (0..8u32)
        .into_par_iter()
        .map(|seed| {
            let config = SchedulerConfig {
                quantum: 1 + seed % 3,
                event_classes: 2,
                max_threads: 64,
            };
            let sched = Scheduler::with_config(config).unwrap();
            let done = Arc::new(AtomicUsize::new(0));
            for i in 0..16u32 {
                let done = Arc::clone(&done);
                sched
                    .spawn(
                        move |sched, _| {
                            sched.yield_now();
                            done.fetch_add(1, Ordering::SeqCst);
                        },
                        (seed + i) % 6,
                    )
                    .unwrap();
            }
            sched.shutdown();
            assert_eq!(done.load(Ordering::SeqCst), 16);
            sched.finished_count()
        })
        .collect();

    assert_eq!(results, vec![16; 8]);
}
