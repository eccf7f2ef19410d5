//! # unicore Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the unicore library. Import this module to get quick access to the
//! essential types for scheduling work.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all unicore operations
pub use crate::Error;

/// The result type used throughout unicore
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The scheduler handle; create one, spawn work, shut it down
pub use crate::Scheduler;

/// Construction-time configuration for a scheduler
pub use crate::SchedulerConfig;

// ================================================================================================
// Thread Identity
// ================================================================================================

/// Handle of a logical thread, returned by `spawn`
pub use crate::ThreadId;

/// Completion state of a logical thread
pub use crate::ThreadState;

// ================================================================================================
// Limits
// ================================================================================================

/// Highest supported priority level
pub use crate::MAX_PRIORITY;

/// Maximum number of I/O event classes
pub use crate::MAX_EVENT_CLASSES;
