//! Logical-thread identity and per-thread scheduling state.
//!
//! A logical thread is a unit of scheduled work, distinct from the OS thread
//! that carries it. The scheduler core owns one [`LogicalThread`] record per
//! logical thread; the carrying OS thread reads its own record but never
//! mutates scheduling fields without holding the core lock.

use std::fmt;

use strum::Display;

/// Identifier of a logical thread.
///
/// Handles are allocated densely starting at `1`; the value `0` is reserved for
/// the host context (the thread that created the scheduler). A `ThreadId` stays
/// valid until the scheduler is shut down, including after the thread finishes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

/// The reserved id of the host context.
pub(crate) const HOST: ThreadId = ThreadId(0);

impl ThreadId {
    /// Creates a thread id from a raw value
    #[must_use]
    pub fn new(value: u64) -> Self {
        ThreadId(value)
    }

    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this is the host context's id
    #[must_use]
    pub fn is_host(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ThreadId {
    fn from(value: u64) -> Self {
        ThreadId(value)
    }
}

impl From<ThreadId> for u64 {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadId({})", self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion state of a logical thread.
///
/// This is deliberately separate from the blocked flag: a thread waiting on an
/// I/O event is still `Running` in the completion sense, it just cannot be
/// selected until signaled.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Spawned but has not yet been selected for its first turn.
    NotStarted,
    /// Has passed the execution gate at least once; its handler is on the carrier's stack.
    Running,
    /// Its handler returned; the record is kept for join until shutdown.
    Finished,
}

/// Per-thread record owned by the scheduler core.
#[derive(Debug)]
pub(crate) struct LogicalThread {
    /// Identity of this logical thread.
    pub(crate) id: ThreadId,
    /// Priority level, `0..=MAX_PRIORITY`. Fixed for the thread's lifetime.
    pub(crate) priority: u32,
    /// Remaining quantum; reset to the configured value on install.
    pub(crate) quantum: u32,
    /// Completion state.
    pub(crate) state: ThreadState,
    /// Waiting on an I/O event.
    pub(crate) blocked: bool,
    /// Identity of the carrying OS thread, registered by the carrier before its
    /// first gate wait. `None` until then (and always `Some` for the host).
    pub(crate) os_id: Option<std::thread::ThreadId>,
}

impl LogicalThread {
    /// Creates a fresh record for a spawned thread.
    pub(crate) fn new(id: ThreadId, priority: u32, quantum: u32) -> Self {
        Self {
            id,
            priority,
            quantum,
            state: ThreadState::NotStarted,
            blocked: false,
            os_id: None,
        }
    }

    /// Creates the host-context record. The host never holds a quantum: its
    /// budget is permanently spent, so any ready thread takes the CPU at every
    /// scheduling event the host performs.
    pub(crate) fn host(os_id: std::thread::ThreadId) -> Self {
        Self {
            id: HOST,
            priority: 0,
            quantum: 0,
            state: ThreadState::Running,
            blocked: false,
            os_id: Some(os_id),
        }
    }

    /// True if this thread may be placed in a ready queue.
    pub(crate) fn is_runnable(&self) -> bool {
        self.state != ThreadState::Finished && !self.blocked
    }
}
