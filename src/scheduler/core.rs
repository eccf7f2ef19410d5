//! Scheduler core: the monitor that owns every scheduling decision.
//!
//! One mutex guards all scheduler state - queues, thread records, the running
//! designation and the lifecycle counters. Two condition variables pair with
//! it: the execution gate ("am I selected?") and the all-done wait used by
//! [`Scheduler::shutdown`]. Handler code always runs with the lock released;
//! the lock is taken only inside scheduler operations.
//!
//! The decision procedure, [`CoreState::reschedule`], is deliberately a pure
//! function over the locked state: it never blocks, touches no condition
//! variable, and is unit-tested below without spawning a single OS thread.
//! Actual suspension happens afterwards, at the execution gate.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use log::{debug, error, trace};

use crate::scheduler::config::{SchedulerConfig, MAX_PRIORITY};
use crate::scheduler::gate::ExecutionGate;
use crate::scheduler::lifecycle::Registry;
use crate::scheduler::queue::{ReadyQueueSet, WaitingSet};
use crate::scheduler::thread::{LogicalThread, ThreadId, ThreadState, HOST};
use crate::{Error, Result};

/// All mutable scheduler state, guarded by the core mutex.
pub(crate) struct CoreState {
    /// Immutable configuration fixed at construction.
    pub(crate) config: SchedulerConfig,
    /// Per-priority FIFOs of runnable, not-currently-running threads.
    pub(crate) ready: ReadyQueueSet,
    /// Per-event FIFOs of threads blocked pending a signal.
    pub(crate) waiting: WaitingSet,
    /// Every logical thread ever created, including the host record (id 0).
    /// Records are kept until shutdown so handles stay meaningful for join.
    pub(crate) threads: HashMap<ThreadId, LogicalThread>,
    /// OS-thread identity of each carrier, for attributing operation calls.
    pub(crate) by_os: HashMap<thread::ThreadId, ThreadId>,
    /// The designated running thread. `None` only when every candidate is gone
    /// and the host itself is blocked on an event.
    pub(crate) running: Option<ThreadId>,
    /// Total threads spawned over the scheduler's lifetime.
    pub(crate) spawned: u64,
    /// Total threads whose handler has returned.
    pub(crate) finished: u64,
    /// Last allocated logical-thread id.
    pub(crate) next_id: u64,
    /// Set once by `shutdown` after the join-all wait completes.
    pub(crate) shut_down: bool,
}

impl CoreState {
    /// Creates the initial state: empty queues, the host record installed as
    /// the designated runner.
    pub(crate) fn new(config: SchedulerConfig, host_os: thread::ThreadId) -> Self {
        let levels = (MAX_PRIORITY + 1) as usize;
        let mut threads = HashMap::new();
        threads.insert(HOST, LogicalThread::host(host_os));
        let mut by_os = HashMap::new();
        by_os.insert(host_os, HOST);
        Self {
            ready: ReadyQueueSet::new(levels, config.max_threads),
            // +1: the host context may park on an event alongside a full
            // complement of spawned threads
            waiting: WaitingSet::new(config.event_classes as usize, config.max_threads + 1),
            threads,
            by_os,
            running: Some(HOST),
            spawned: 0,
            finished: 0,
            next_id: 0,
            shut_down: false,
            config,
        }
    }

    /// Logical thread carried by the calling OS thread. Calls from threads the
    /// scheduler does not carry are attributed to the host context.
    pub(crate) fn caller(&self) -> ThreadId {
        self.by_os
            .get(&thread::current().id())
            .copied()
            .unwrap_or(HOST)
    }

    /// Live (spawned, not yet finished) thread count.
    pub(crate) fn live(&self) -> usize {
        (self.spawned - self.finished) as usize
    }

    pub(crate) fn allocate_id(&mut self) -> ThreadId {
        self.next_id += 1;
        ThreadId(self.next_id)
    }

    /// Spends one tick of the running thread's quantum. Attributed only to the
    /// designated runner and only at scheduling-event call sites; saturates at
    /// zero.
    pub(crate) fn charge_quantum(&mut self) {
        if let Some(id) = self.running {
            let t = self
                .threads
                .get_mut(&id)
                .expect("running thread has a record");
            t.quantum = t.quantum.saturating_sub(1);
        }
    }

    /// The scheduling decision. Runs under the core lock, never blocks, and is
    /// bounded by the number of priority levels.
    ///
    /// 1. Demote the running thread if its quantum is spent, it finished, or it
    ///    blocked; a demoted thread that is still runnable re-enqueues at the
    ///    tail of its own level (the host is never enqueued - its quantum is
    ///    permanently spent, so it is demotable at every scheduling event).
    /// 2. Scan levels from highest to lowest; the head of the first non-empty
    ///    queue is the only candidate. After a demotion it is installed
    ///    unconditionally; against a running thread with budget left it is
    ///    installed only if strictly higher priority. Ties never preempt.
    /// 3. With no candidate after a demotion, control falls back to the host
    ///    context, or to nobody if the host is itself blocked.
    ///
    /// Installation refreshes the installed thread's quantum.
    pub(crate) fn reschedule(&mut self) {
        let mut cleared = self.running.is_none();

        if let Some(id) = self.running {
            let t = &self.threads[&id];
            if t.quantum == 0 || t.state == ThreadState::Finished || t.blocked {
                let priority = t.priority;
                let runnable = t.is_runnable();
                if runnable && !id.is_host() {
                    // round-robin within the level: demoted threads rejoin at the tail
                    self.ready
                        .enqueue(priority, id)
                        .expect("live-thread admission bounds the ready queues");
                }
                cleared = true;
            }
        }

        if let Some((priority, next)) = self.ready.top() {
            if cleared {
                self.ready.pop(priority);
                self.install(next);
                return;
            }
            let curr = self.running.expect("a thread with budget defends the cpu");
            let curr_priority = self.threads[&curr].priority;
            if priority > curr_priority {
                self.ready.pop(priority);
                self.ready
                    .enqueue(curr_priority, curr)
                    .expect("live-thread admission bounds the ready queues");
                trace!("thread {curr} preempted by higher-priority thread {next}");
                self.install(next);
            }
            return;
        }

        if cleared {
            // idle fallback: the cpu returns to the host unless it too is
            // parked on an event, in which case nothing can run until an
            // external signal arrives (a documented liveness hazard)
            if self.threads[&HOST].blocked {
                self.running = None;
                trace!("no runnable thread and the host is blocked; cpu idle");
            } else {
                self.running = Some(HOST);
            }
        }
    }

    fn install(&mut self, id: ThreadId) {
        let quantum = self.config.quantum;
        let t = self
            .threads
            .get_mut(&id)
            .expect("queued thread has a record");
        t.quantum = quantum;
        let priority = t.priority;
        self.running = Some(id);
        trace!("installed thread {id} at priority {priority}");
    }
}

/// Shared interior of a [`Scheduler`].
struct Core {
    state: Mutex<CoreState>,
    gate: ExecutionGate,
    all_done: Condvar,
    registry: Registry,
}

/// A user-level cooperative priority scheduler.
///
/// A `Scheduler` serializes many logical threads - each carried by a real OS
/// thread - so that at most one executes handler code at any instant, as on a
/// single-processor machine. Which one runs next is decided by strict priority
/// with round-robin rotation inside a level, bounded by a time quantum that is
/// spent at explicit scheduling events (`spawn`, `yield_now`, `wait_for_event`,
/// `signal_event`). This is a cooperative model: a handler that never calls a
/// scheduler operation runs until it returns.
///
/// The handle is cheaply cloneable and internally synchronized; handlers
/// receive a `&Scheduler` so spawned code can call scheduler operations without
/// globals. The thread that creates the scheduler becomes the *host context*:
/// it is never placed in a ready queue, `spawn` never blocks it, and it regains
/// the CPU whenever no spawned thread is runnable. Once any thread has been
/// installed, the host's `yield_now`/`wait_for_event`/`signal_event` calls
/// rendezvous at the execution gate like everyone else's.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// use unicore::Scheduler;
///
/// let sched = Scheduler::new(2, 4)?;
/// let hits = Arc::new(AtomicU32::new(0));
///
/// let hits_clone = Arc::clone(&hits);
/// sched.spawn(
///     move |_sched, priority| {
///         hits_clone.fetch_add(priority, Ordering::SeqCst);
///     },
///     3,
/// )?;
///
/// sched.shutdown();
/// assert_eq!(hits.load(Ordering::SeqCst), 3);
/// # Ok::<(), unicore::Error>(())
/// ```
#[derive(Clone)]
pub struct Scheduler {
    core: Arc<Core>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler with the given time quantum and event-class count
    /// and the default thread bound.
    ///
    /// The calling thread becomes the host context and starts as the designated
    /// runner, so subsequently spawned threads are scheduled relative to it.
    ///
    /// # Arguments
    ///
    /// * `quantum` - Scheduling-event ticks per turn; must be positive.
    /// * `event_classes` - Number of I/O event classes; at most
    ///   [`MAX_EVENT_CLASSES`](crate::MAX_EVENT_CLASSES).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidQuantum`] or [`Error::TooManyEventClasses`] when the
    /// arguments are out of range; no scheduler is created.
    pub fn new(quantum: u32, event_classes: u32) -> Result<Self> {
        Self::with_config(SchedulerConfig::new(quantum, event_classes))
    }

    /// Creates a scheduler from a full configuration.
    ///
    /// # Errors
    ///
    /// Anything [`SchedulerConfig::validate`] reports; no scheduler is created.
    pub fn with_config(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "scheduler created: quantum={}, event_classes={}, max_threads={}",
            config.quantum, config.event_classes, config.max_threads
        );
        Ok(Self {
            core: Arc::new(Core {
                state: Mutex::new(CoreState::new(config, thread::current().id())),
                gate: ExecutionGate::new(),
                all_done: Condvar::new(),
                registry: Registry::new(),
            }),
        })
    }

    /// Spawns a logical thread running `handler` at the given priority.
    ///
    /// The new thread joins the tail of its priority's ready queue and a
    /// carrier OS thread is started for it; the carrier waits at the execution
    /// gate until selected, runs the handler with this scheduler and the
    /// assigned priority, then marks itself finished. Spawning is itself a
    /// scheduling event: the current runner is charged one tick and the
    /// decision procedure runs, so a strictly-higher-priority spawn preempts
    /// immediately. A non-host caller that lost the CPU blocks here until it is
    /// selected again; the host context always returns at once.
    ///
    /// A panic in `handler` is contained: the thread is marked finished and the
    /// panic is reported through `log::error`.
    ///
    /// # Arguments
    ///
    /// * `handler` - The work to run; receives this scheduler and the priority.
    /// * `priority` - Level `0..=MAX_PRIORITY`; higher levels run first.
    ///
    /// # Returns
    ///
    /// The id of the new logical thread.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPriority`] above
    /// [`MAX_PRIORITY`](crate::MAX_PRIORITY), [`Error::CapacityExceeded`] at
    /// the live-thread bound, [`Error::ShutDown`] after shutdown. Nothing is
    /// created on error.
    pub fn spawn<F>(&self, handler: F, priority: u32) -> Result<ThreadId>
    where
        F: FnOnce(&Scheduler, u32) + Send + 'static,
    {
        if priority > MAX_PRIORITY {
            return Err(Error::invalid_priority(priority));
        }

        let (id, me) = {
            let mut state = lock!(self.core.state);
            if state.shut_down {
                return Err(Error::ShutDown);
            }
            if state.live() >= state.config.max_threads {
                return Err(Error::CapacityExceeded {
                    capacity: state.config.max_threads,
                });
            }
            let id = state.allocate_id();
            let quantum = state.config.quantum;
            state
                .threads
                .insert(id, LogicalThread::new(id, priority, quantum));
            state
                .ready
                .enqueue(priority, id)
                .expect("live-thread admission bounds the ready queues");
            state.spawned += 1;
            trace!("spawned thread {id} at priority {priority}");
            (id, state.caller())
        };

        let carrier = self.clone();
        let handle = thread::spawn(move || run_carrier(&carrier, id, priority, handler));
        self.core.registry.register(id, handle);

        // spawning is a scheduling event, charged to whoever holds the cpu
        let preempted = {
            let mut state = lock!(self.core.state);
            state.charge_quantum();
            state.reschedule();
            state.running != Some(me)
        };
        if preempted {
            self.core.gate.announce();
            if !me.is_host() {
                let guard = lock!(self.core.state);
                drop(self.core.gate.wait_until_selected(guard, me));
            }
        }
        Ok(id)
    }

    /// Blocks the calling logical thread until `event` is signaled.
    ///
    /// The caller moves to the tail of the event's waiting queue and gives up
    /// the CPU; it never reappears in a ready queue through this call alone -
    /// only a matching [`signal_event`](Self::signal_event) can move it back.
    /// There is no timeout: with no signaler, the wait is forever (and
    /// `shutdown` will then never complete - a documented liveness hazard of
    /// the model, not an error).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEvent`] outside `0..event_classes`,
    /// [`Error::ShutDown`] after shutdown. No state is mutated on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unicore::Scheduler;
    ///
    /// let sched = Scheduler::new(2, 1)?;
    /// // waiter first: it parks on event 0, which hands the cpu to the signaler
    /// sched.spawn(|s, _| s.wait_for_event(0).unwrap(), 0)?;
    /// sched.spawn(|s, _| { s.signal_event(0).unwrap(); }, 0)?;
    /// sched.shutdown();
    /// # Ok::<(), unicore::Error>(())
    /// ```
    pub fn wait_for_event(&self, event: u32) -> Result<()> {
        let me = {
            let mut state = lock!(self.core.state);
            if state.shut_down {
                return Err(Error::ShutDown);
            }
            if event >= state.config.event_classes {
                return Err(Error::InvalidEvent {
                    requested: event,
                    classes: state.config.event_classes,
                });
            }
            let me = state.caller();
            state
                .waiting
                .enqueue(event, me)
                .expect("live-thread admission bounds the waiting queues");
            state
                .threads
                .get_mut(&me)
                .expect("caller has a record")
                .blocked = true;
            state.charge_quantum();
            state.reschedule();
            trace!("thread {me} waiting on event {event}");
            me
        };

        // the caller no longer holds the cpu; wake the replacement, then park
        self.core.gate.announce();
        let guard = lock!(self.core.state);
        drop(self.core.gate.wait_until_selected(guard, me));
        Ok(())
    }

    /// Releases every thread waiting on `event`.
    ///
    /// All waiters are drained in FIFO order, unblocked, and appended to the
    /// tails of their own priorities' ready queues with their relative order
    /// preserved. Signaling is a scheduling event: the runner is charged one
    /// tick and the decision procedure runs, so releasing a
    /// strictly-higher-priority waiter preempts the caller immediately.
    ///
    /// # Returns
    ///
    /// The number of threads released; `0` when nobody was waiting.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEvent`] outside `0..event_classes`,
    /// [`Error::ShutDown`] after shutdown. No state is mutated on error.
    pub fn signal_event(&self, event: u32) -> Result<usize> {
        let (me, count, preempted) = {
            let mut state = lock!(self.core.state);
            if state.shut_down {
                return Err(Error::ShutDown);
            }
            if event >= state.config.event_classes {
                return Err(Error::InvalidEvent {
                    requested: event,
                    classes: state.config.event_classes,
                });
            }
            let me = state.caller();
            let woken = state.waiting.drain(event);
            let count = woken.len();
            for id in woken {
                let t = state
                    .threads
                    .get_mut(&id)
                    .expect("waiting thread has a record");
                t.blocked = false;
                if id.is_host() {
                    // the host is never queued; it resumes via the idle fallback
                    continue;
                }
                let priority = t.priority;
                state
                    .ready
                    .enqueue(priority, id)
                    .expect("live-thread admission bounds the ready queues");
            }
            if count > 0 {
                trace!("event {event} released {count} threads");
            }
            state.charge_quantum();
            state.reschedule();
            let preempted = state.running != Some(me);
            (me, count, preempted)
        };
        // released waiters may include a parked host that the decision above
        // already re-selected, so a broadcast is owed whenever anyone moved
        if count > 0 || preempted {
            self.core.gate.announce();
        }
        if preempted {
            let guard = lock!(self.core.state);
            drop(self.core.gate.wait_until_selected(guard, me));
        }
        Ok(count)
    }

    /// Voluntarily gives up the remainder of the current quantum.
    ///
    /// Charges one tick and runs the decision procedure; if someone else is
    /// selected, the caller blocks at the execution gate until it is selected
    /// again. With nothing else runnable the call returns immediately. A no-op
    /// after shutdown.
    pub fn yield_now(&self) {
        let (me, preempted) = {
            let mut state = lock!(self.core.state);
            if state.shut_down {
                return;
            }
            let me = state.caller();
            state.charge_quantum();
            state.reschedule();
            (me, state.running != Some(me))
        };
        if preempted {
            self.core.gate.announce();
            let guard = lock!(self.core.state);
            drop(self.core.gate.wait_until_selected(guard, me));
        }
    }

    /// Waits for every spawned thread to finish, then joins all carrier OS
    /// threads and marks the scheduler shut down.
    ///
    /// Returns only when the created count equals the reclaimed count.
    /// Idempotent: a second call returns immediately. Must be called from the
    /// host context (or any thread not carried by this scheduler) - a carrier
    /// joining itself would never return. If some thread waits on an event
    /// nobody signals, this blocks forever; that is the model's documented
    /// liveness hazard, not a defect of `shutdown`.
    pub fn shutdown(&self) {
        {
            let state = lock!(self.core.state);
            if state.shut_down {
                return;
            }
            let mut state = self
                .core
                .all_done
                .wait_while(state, |s| s.finished < s.spawned)
                .expect("Failed to acquire lock");
            state.shut_down = true;
            debug!(
                "all {} spawned threads finished; joining carriers",
                state.spawned
            );
        }
        self.core.registry.join_all();
        debug!("scheduler shut down");
    }

    /// The configuration this scheduler was created with.
    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        lock!(self.core.state).config
    }

    /// Total threads spawned over this scheduler's lifetime.
    #[must_use]
    pub fn spawned_count(&self) -> u64 {
        lock!(self.core.state).spawned
    }

    /// Total threads whose handler has returned.
    #[must_use]
    pub fn finished_count(&self) -> u64 {
        lock!(self.core.state).finished
    }

    /// The currently designated running thread, if any. Diagnostic: the value
    /// may be stale by the time the caller looks at it.
    #[must_use]
    pub fn running_thread(&self) -> Option<ThreadId> {
        lock!(self.core.state).running
    }

    /// Completion state of a logical thread, or `None` for an unknown id.
    /// Diagnostic, like [`running_thread`](Self::running_thread).
    #[must_use]
    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        lock!(self.core.state).threads.get(&id).map(|t| t.state)
    }

    /// Snapshot of finished threads in completion order.
    #[must_use]
    pub fn terminated(&self) -> Vec<ThreadId> {
        self.core.registry.terminated_snapshot()
    }

    /// True once [`shutdown`](Self::shutdown) has completed.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        lock!(self.core.state).shut_down
    }
}

/// Body of every carrier OS thread.
///
/// Register identity, rendezvous for the first turn, run the handler with no
/// lock held, then retire: log completion (before the counter moves, so the log
/// is whole once the counters meet), mark finished, hand the CPU on, and wake
/// both the gate and any shutdown waiter.
fn run_carrier<F>(sched: &Scheduler, id: ThreadId, priority: u32, handler: F)
where
    F: FnOnce(&Scheduler, u32) + Send + 'static,
{
    {
        let mut state = lock!(sched.core.state);
        let os = thread::current().id();
        if let Some(t) = state.threads.get_mut(&id) {
            t.os_id = Some(os);
        }
        state.by_os.insert(os, id);
        let mut state = sched.core.gate.wait_until_selected(state, id);
        if let Some(t) = state.threads.get_mut(&id) {
            t.state = ThreadState::Running;
        }
    }

    if catch_unwind(AssertUnwindSafe(|| handler(sched, priority))).is_err() {
        error!("handler of thread {id} panicked; thread treated as finished");
    }

    sched.core.registry.record_terminated(id);
    {
        let mut state = lock!(sched.core.state);
        if let Some(t) = state.threads.get_mut(&id) {
            t.state = ThreadState::Finished;
        }
        state.finished += 1;
        state.reschedule();
        trace!(
            "thread {id} finished ({}/{} done)",
            state.finished,
            state.spawned
        );
    }
    sched.core.gate.announce();
    sched.core.all_done.notify_all();
}
