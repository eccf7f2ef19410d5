//! Bounded FIFO containers for runnable and waiting threads.
//!
//! The ready set holds one queue per priority level; the waiting set holds one
//! queue per I/O event class. Both are built on [`BoundedQueue`], a
//! capacity-checked FIFO: an enqueue past capacity is a loud
//! [`Error::CapacityExceeded`](crate::Error::CapacityExceeded), never a silent
//! drop. All three types are plain data - synchronization is the core's job.

use std::collections::VecDeque;

use crate::scheduler::thread::ThreadId;
use crate::{Error, Result};

/// FIFO of thread ids with a fixed capacity.
#[derive(Debug)]
pub(crate) struct BoundedQueue {
    items: VecDeque<ThreadId>,
    capacity: usize,
}

impl BoundedQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when the queue is full; the queue is
    /// unchanged.
    pub(crate) fn push_back(&mut self, id: ThreadId) -> Result<()> {
        if self.items.len() == self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.items.push_back(id);
        Ok(())
    }

    pub(crate) fn pop_front(&mut self) -> Option<ThreadId> {
        self.items.pop_front()
    }

    pub(crate) fn front(&self) -> Option<ThreadId> {
        self.items.front().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn contains(&self, id: ThreadId) -> bool {
        self.items.contains(&id)
    }
}

/// One FIFO per priority level, indexed by priority.
///
/// Invariant: a thread appears in at most one ready queue, and never while it is
/// the designated running thread or blocked on an event.
#[derive(Debug)]
pub(crate) struct ReadyQueueSet {
    levels: Vec<BoundedQueue>,
}

impl ReadyQueueSet {
    /// Creates `levels` empty queues of the given capacity each.
    pub(crate) fn new(levels: usize, capacity: usize) -> Self {
        Self {
            levels: (0..levels).map(|_| BoundedQueue::new(capacity)).collect(),
        }
    }

    /// Appends `id` at the tail of its priority's queue.
    pub(crate) fn enqueue(&mut self, priority: u32, id: ThreadId) -> Result<()> {
        self.levels[priority as usize].push_back(id)
    }

    /// Returns the head of the highest non-empty level, without removing it.
    pub(crate) fn top(&self) -> Option<(u32, ThreadId)> {
        for (priority, queue) in self.levels.iter().enumerate().rev() {
            if let Some(id) = queue.front() {
                return Some((priority as u32, id));
            }
        }
        None
    }

    /// Removes and returns the head of the given level.
    pub(crate) fn pop(&mut self, priority: u32) -> Option<ThreadId> {
        self.levels[priority as usize].pop_front()
    }

    /// Total queued threads across all levels.
    pub(crate) fn len(&self) -> usize {
        self.levels.iter().map(BoundedQueue::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.iter().all(BoundedQueue::is_empty)
    }

    pub(crate) fn contains(&self, id: ThreadId) -> bool {
        self.levels.iter().any(|q| q.contains(id))
    }
}

/// One FIFO per I/O event class, indexed by event id.
///
/// Invariant: a thread in a waiting queue has its blocked flag set and appears
/// in no ready queue.
#[derive(Debug)]
pub(crate) struct WaitingSet {
    events: Vec<BoundedQueue>,
}

impl WaitingSet {
    /// Creates `classes` empty queues of the given capacity each.
    pub(crate) fn new(classes: usize, capacity: usize) -> Self {
        Self {
            events: (0..classes).map(|_| BoundedQueue::new(capacity)).collect(),
        }
    }

    /// Appends `id` at the tail of the event's queue.
    pub(crate) fn enqueue(&mut self, event: u32, id: ThreadId) -> Result<()> {
        self.events[event as usize].push_back(id)
    }

    /// Removes and returns every waiter for `event`, in FIFO order.
    pub(crate) fn drain(&mut self, event: u32) -> Vec<ThreadId> {
        let queue = &mut self.events[event as usize];
        let mut drained = Vec::with_capacity(queue.len());
        while let Some(id) = queue.pop_front() {
            drained.push(id);
        }
        drained
    }

    /// Number of waiters for `event`.
    pub(crate) fn len(&self, event: u32) -> usize {
        self.events[event as usize].len()
    }

    pub(crate) fn contains(&self, id: ThreadId) -> bool {
        self.events.iter().any(|q| q.contains(id))
    }
}
