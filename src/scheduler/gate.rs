//! The execution gate: the rendezvous that serializes logical threads.
//!
//! Every carrier OS thread, before running handler code and after every
//! scheduling decision that might have replaced it, blocks here until it is the
//! designated running thread. The wait is a condition-variable loop that
//! re-checks the selection predicate on every wake; any thread whose operation
//! may have changed the selection wakes *all* waiters, because any number of
//! competing carriers may need to re-test. Broadcast-and-recheck, never a
//! targeted wakeup, and never spin-polling.
//!
//! The predicate itself, [`is_selected`], is a pure function over the locked
//! core state, so the decision can be unit-tested without spawning threads.

use std::sync::{Condvar, MutexGuard};

use crate::scheduler::core::CoreState;
use crate::scheduler::thread::ThreadId;

/// True if `id` is the designated running thread in `state`.
///
/// This is the whole of the gate's selection predicate: identity comparison
/// against the core's running designation, evaluated under the core lock.
pub(crate) fn is_selected(state: &CoreState, id: ThreadId) -> bool {
    state.running == Some(id)
}

/// Condition-variable rendezvous paired with the core mutex.
pub(crate) struct ExecutionGate {
    selected: Condvar,
}

impl ExecutionGate {
    pub(crate) fn new() -> Self {
        Self {
            selected: Condvar::new(),
        }
    }

    /// Blocks the caller until [`is_selected`] holds for `id`.
    ///
    /// Takes and returns the core guard: the lock is released while parked and
    /// re-acquired on every wake (monitor discipline), so the predicate is
    /// always evaluated against consistent state.
    pub(crate) fn wait_until_selected<'a>(
        &self,
        guard: MutexGuard<'a, CoreState>,
        id: ThreadId,
    ) -> MutexGuard<'a, CoreState> {
        self.selected
            .wait_while(guard, |state| !is_selected(state, id))
            .expect("Failed to acquire lock")
    }

    /// Wakes every parked carrier so each re-tests the predicate.
    ///
    /// Called after the core lock is released by whoever changed the running
    /// designation.
    pub(crate) fn announce(&self) {
        self.selected.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::scheduler::config::SchedulerConfig;

    fn test_state() -> CoreState {
        CoreState::new(SchedulerConfig::new(2, 4), thread::current().id())
    }

    #[test]
    fn test_predicate_is_identity_comparison() {
        let mut state = test_state();
        assert!(is_selected(&state, ThreadId(0)));
        assert!(!is_selected(&state, ThreadId(1)));

        state.running = Some(ThreadId(1));
        assert!(is_selected(&state, ThreadId(1)));
        assert!(!is_selected(&state, ThreadId(0)));

        state.running = None;
        assert!(!is_selected(&state, ThreadId(0)));
        assert!(!is_selected(&state, ThreadId(1)));
    }

    #[test]
    fn test_selected_thread_passes_without_blocking() {
        let gate = ExecutionGate::new();
        let state = Mutex::new(test_state());
        // host (id 0) is the designated runner from construction
        let guard = state.lock().unwrap();
        let guard = gate.wait_until_selected(guard, ThreadId(0));
        assert_eq!(guard.running, Some(ThreadId(0)));
    }

    #[test]
    fn test_broadcast_releases_newly_selected_waiter() {
        let gate = Arc::new(ExecutionGate::new());
        let state = Arc::new(Mutex::new(test_state()));

        let gate_clone = Arc::clone(&gate);
        let state_clone = Arc::clone(&state);
        let waiter = thread::spawn(move || {
            let guard = state_clone.lock().unwrap();
            let guard = gate_clone.wait_until_selected(guard, ThreadId(7));
            guard.running
        });

        // give the waiter time to park
        thread::sleep(Duration::from_millis(20));

        state.lock().unwrap().running = Some(ThreadId(7));
        gate.announce();

        assert_eq!(waiter.join().unwrap(), Some(ThreadId(7)));
    }

    fn wait_for_len(passed: &Mutex<Vec<ThreadId>>, len: usize) {
        for _ in 0..1000 {
            if passed.lock().unwrap().len() >= len {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("waiters did not pass the gate in time");
    }

    #[test]
    fn test_broadcast_wakes_only_the_selected_one_through() {
        let gate = Arc::new(ExecutionGate::new());
        let state = Arc::new(Mutex::new(test_state()));
        let passed = Arc::new(Mutex::new(Vec::new()));

        let mut waiters = Vec::new();
        for id in [ThreadId(1), ThreadId(2), ThreadId(3)] {
            let gate = Arc::clone(&gate);
            let state = Arc::clone(&state);
            let passed = Arc::clone(&passed);
            waiters.push(thread::spawn(move || {
                let guard = state.lock().unwrap();
                drop(gate.wait_until_selected(guard, id));
                passed.lock().unwrap().push(id);
            }));
        }

        thread::sleep(Duration::from_millis(20));
        assert!(passed.lock().unwrap().is_empty());

        // select 2; the broadcast wakes everyone but only 2 may proceed
        state.lock().unwrap().running = Some(ThreadId(2));
        gate.announce();
        wait_for_len(&passed, 1);
        assert_eq!(passed.lock().unwrap().as_slice(), &[ThreadId(2)]);

        // release the rest, one selection at a time
        state.lock().unwrap().running = Some(ThreadId(1));
        gate.announce();
        wait_for_len(&passed, 2);
        state.lock().unwrap().running = Some(ThreadId(3));
        gate.announce();
        for w in waiters {
            w.join().unwrap();
        }
        assert_eq!(
            passed.lock().unwrap().as_slice(),
            &[ThreadId(2), ThreadId(1), ThreadId(3)]
        );
    }
}
