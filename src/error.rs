use thiserror::Error;

use crate::scheduler::config::{MAX_EVENT_CLASSES, MAX_PRIORITY};

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while constructing a
/// scheduler or invoking its operations. Each variant provides specific context about
/// the failure mode to enable appropriate error handling. All failures are reported
/// synchronously as return values; no operation panics across the concurrency boundary.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::InvalidQuantum`] - Time quantum of zero
/// - [`Error::TooManyEventClasses`] - Event-class count over the supported maximum
/// - [`Error::InvalidCapacity`] - Thread capacity of zero
///
/// ## Invalid-Argument Errors
/// - [`Error::InvalidPriority`] - Priority above the highest supported level
/// - [`Error::InvalidEvent`] - Event identifier outside the configured range
///
/// ## Capacity Errors
/// - [`Error::CapacityExceeded`] - Live-thread bound reached; nothing was created
///
/// ## Lifecycle Errors
/// - [`Error::ShutDown`] - Operation invoked after the scheduler was shut down
///
/// # Examples
///
/// ```rust
/// use unicore::{Error, Scheduler};
///
/// match Scheduler::new(0, 4) {
///     Ok(_) => println!("scheduler is live"),
///     Err(Error::InvalidQuantum) => eprintln!("quantum must be positive"),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Configuration Errors
    /// The configured time quantum was zero.
    ///
    /// A quantum of zero would demote every thread at its first scheduling event,
    /// leaving nothing to distinguish a turn from no turn at all. The scheduler
    /// is not created and no state is mutated.
    #[error("Time quantum must be greater than zero")]
    InvalidQuantum,

    /// The requested number of I/O event classes exceeds the supported maximum.
    ///
    /// Event identifiers are dense indices into per-event waiting queues, so the
    /// class count is bounded by [`MAX_EVENT_CLASSES`].
    #[error("Requested {requested} event classes, maximum is {max}")]
    TooManyEventClasses {
        /// The event-class count that was requested
        requested: u32,
        /// The supported maximum, [`MAX_EVENT_CLASSES`]
        max: u32,
    },

    /// The configured live-thread capacity was zero.
    ///
    /// The capacity sizes every ready and waiting queue; a bound of zero would
    /// make every spawn fail.
    #[error("Thread capacity must be greater than zero")]
    InvalidCapacity,

    // Invalid-Argument Errors
    /// The requested priority is above the highest supported level.
    ///
    /// Priorities are dense indices into the per-level ready queues and run from
    /// `0` (lowest) to [`MAX_PRIORITY`] (highest). No thread is created.
    #[error("Requested priority {requested}, maximum is {max}")]
    InvalidPriority {
        /// The priority that was requested
        requested: u32,
        /// The supported maximum, [`MAX_PRIORITY`]
        max: u32,
    },

    /// The event identifier is outside the configured range.
    ///
    /// Valid identifiers are `0..event_classes` as configured at construction.
    /// No scheduler state is mutated.
    #[error("Event {requested} is out of range, {classes} classes configured")]
    InvalidEvent {
        /// The event identifier that was passed
        requested: u32,
        /// The number of event classes the scheduler was configured with
        classes: u32,
    },

    // Capacity Errors
    /// The live-thread bound was reached and the enqueue was refused.
    ///
    /// The original design this crate derives from silently discarded enqueues
    /// past capacity; this implementation fails loudly instead. The spawn that
    /// hit the bound created nothing and the scheduler remains consistent.
    #[error("Thread capacity of {capacity} exceeded")]
    CapacityExceeded {
        /// The configured live-thread bound
        capacity: usize,
    },

    // Lifecycle Errors
    /// The scheduler has been shut down.
    ///
    /// After [`shutdown`](crate::Scheduler::shutdown) completes, `spawn`,
    /// `wait_for_event` and `signal_event` refuse to run rather than schedule
    /// work that could never be joined.
    #[error("The scheduler has been shut down")]
    ShutDown,
}

impl Error {
    /// Builds a [`Error::TooManyEventClasses`] for the given request.
    pub(crate) fn too_many_event_classes(requested: u32) -> Self {
        Error::TooManyEventClasses {
            requested,
            max: MAX_EVENT_CLASSES,
        }
    }

    /// Builds a [`Error::InvalidPriority`] for the given request.
    pub(crate) fn invalid_priority(requested: u32) -> Self {
        Error::InvalidPriority {
            requested,
            max: MAX_PRIORITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::InvalidQuantum),
            "Time quantum must be greater than zero"
        );
        assert_eq!(
            format!("{}", Error::too_many_event_classes(512)),
            "Requested 512 event classes, maximum is 256"
        );
        assert_eq!(
            format!("{}", Error::invalid_priority(9)),
            "Requested priority 9, maximum is 5"
        );
        assert_eq!(
            format!(
                "{}",
                Error::InvalidEvent {
                    requested: 7,
                    classes: 4
                }
            ),
            "Event 7 is out of range, 4 classes configured"
        );
        assert_eq!(
            format!("{}", Error::CapacityExceeded { capacity: 100 }),
            "Thread capacity of 100 exceeded"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::invalid_priority(9), Error::invalid_priority(9));
        assert_ne!(Error::InvalidQuantum, Error::ShutDown);
    }
}
