//! Carrier-thread lifecycle tracking.
//!
//! The registry lives outside the core lock: it carries no scheduling
//! decisions, only the OS-level [`JoinHandle`]s needed by `shutdown` and an
//! append-only log of finished threads. Handles are registered at spawn and
//! drained exactly once at shutdown; the terminated log is appended by each
//! carrier as its handler returns, lock-free, and can be snapshotted at any
//! time for diagnostics.

use std::thread::JoinHandle;

use dashmap::DashMap;

use crate::scheduler::thread::ThreadId;

/// Join handles and completion log for carrier OS threads.
pub(crate) struct Registry {
    /// Carrier handle per logical thread, present from spawn until joined.
    handles: DashMap<ThreadId, JoinHandle<()>>,
    /// Finished logical threads, in completion order.
    terminated: boxcar::Vec<ThreadId>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            handles: DashMap::new(),
            terminated: boxcar::Vec::new(),
        }
    }

    /// Records the carrier handle for a freshly spawned logical thread.
    pub(crate) fn register(&self, id: ThreadId, handle: JoinHandle<()>) {
        self.handles.insert(id, handle);
    }

    /// Appends a finished thread to the completion log.
    pub(crate) fn record_terminated(&self, id: ThreadId) {
        self.terminated.push(id);
    }

    /// Number of threads in the completion log.
    pub(crate) fn terminated_count(&self) -> usize {
        self.terminated.count()
    }

    /// Snapshot of the completion log, in completion order.
    pub(crate) fn terminated_snapshot(&self) -> Vec<ThreadId> {
        self.terminated.iter().map(|(_, id)| *id).collect()
    }

    /// Joins every registered carrier and drains the handle map.
    ///
    /// Must not be called from a carrier: a thread joining its own handle never
    /// returns. A carrier panic is surfaced as a panic here rather than
    /// swallowed.
    pub(crate) fn join_all(&self) {
        let ids: Vec<ThreadId> = self.handles.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, handle)) = self.handles.remove(&id) {
                if let Err(panic) = handle.join() {
                    std::panic::resume_unwind(panic);
                }
            }
        }
    }
}
