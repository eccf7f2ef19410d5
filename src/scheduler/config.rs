//! Scheduler configuration.
//!
//! This module provides the knobs fixed at scheduler construction: the time
//! quantum spent at scheduling events, the number of I/O event classes, and the
//! live-thread bound that sizes every ready and waiting queue. The configuration
//! is validated once, when the scheduler is created, and never changes afterwards.

use crate::Result;

/// Highest supported priority level. Priorities run from `0` (lowest) to this value.
pub const MAX_PRIORITY: u32 = 5;

/// Maximum number of I/O event classes a scheduler can be configured with.
pub const MAX_EVENT_CLASSES: u32 = 256;

/// Default live-thread bound, which also sizes each ready and waiting queue.
pub const DEFAULT_MAX_THREADS: usize = 100;

/// Default time quantum, in scheduling-event ticks.
pub const DEFAULT_QUANTUM: u32 = 4;

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// The scheduler validates this once at construction:
/// - `quantum` must be positive
/// - `event_classes` must not exceed [`MAX_EVENT_CLASSES`]
/// - `max_threads` must be positive
///
/// `max_threads` bounds *live* (not yet finished) logical threads, and doubles as
/// the capacity of every per-priority ready queue and per-event waiting queue, so
/// an admitted thread can always be enqueued. A spawn past the bound fails with
/// [`Error::CapacityExceeded`](crate::Error::CapacityExceeded) rather than being
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of scheduling-event ticks a thread may hold the CPU before
    /// mandatory reconsideration. Must be greater than zero.
    pub quantum: u32,

    /// Number of I/O event classes usable with `wait_for_event`/`signal_event`.
    /// Valid identifiers are `0..event_classes`. At most [`MAX_EVENT_CLASSES`].
    pub event_classes: u32,

    /// Bound on live logical threads, and the capacity of each internal queue.
    /// Must be greater than zero.
    pub max_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            event_classes: MAX_EVENT_CLASSES,
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with the given quantum and event-class count and
    /// the default thread bound.
    ///
    /// Validation happens when the configuration is handed to
    /// [`Scheduler::with_config`](crate::Scheduler::with_config).
    #[must_use]
    pub fn new(quantum: u32, event_classes: u32) -> Self {
        Self {
            quantum,
            event_classes,
            max_threads: DEFAULT_MAX_THREADS,
        }
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuantum`](crate::Error::InvalidQuantum) for a zero
    /// quantum, [`Error::TooManyEventClasses`](crate::Error::TooManyEventClasses)
    /// for an event-class count over [`MAX_EVENT_CLASSES`], and
    /// [`Error::InvalidCapacity`](crate::Error::InvalidCapacity) for a zero
    /// thread bound.
    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(crate::Error::InvalidQuantum);
        }
        if self.event_classes > MAX_EVENT_CLASSES {
            return Err(crate::Error::too_many_event_classes(self.event_classes));
        }
        if self.max_threads == 0 {
            return Err(crate::Error::InvalidCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quantum, DEFAULT_QUANTUM);
        assert_eq!(config.event_classes, MAX_EVENT_CLASSES);
        assert_eq!(config.max_threads, DEFAULT_MAX_THREADS);
    }

    #[test]
    fn test_new_uses_default_thread_bound() {
        let config = SchedulerConfig::new(2, 3);
        assert_eq!(config.quantum, 2);
        assert_eq!(config.event_classes, 3);
        assert_eq!(config.max_threads, DEFAULT_MAX_THREADS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_quantum_rejected() {
        let config = SchedulerConfig::new(0, 3);
        assert_eq!(config.validate(), Err(Error::InvalidQuantum));
    }

    #[test]
    fn test_event_classes_over_maximum_rejected() {
        let config = SchedulerConfig::new(2, MAX_EVENT_CLASSES + 1);
        assert_eq!(
            config.validate(),
            Err(Error::TooManyEventClasses {
                requested: MAX_EVENT_CLASSES + 1,
                max: MAX_EVENT_CLASSES
            })
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SchedulerConfig {
            max_threads: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidCapacity));
    }

    #[test]
    fn test_zero_event_classes_allowed() {
        // A scheduler without I/O events is legal; wait/signal simply have no
        // valid identifiers.
        let config = SchedulerConfig::new(1, 0);
        assert!(config.validate().is_ok());
    }
}
