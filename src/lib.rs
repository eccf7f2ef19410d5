// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # unicore
//!
//! [![Crates.io](https://img.shields.io/crates/v/unicore.svg)](https://crates.io/crates/unicore)
//! [![Documentation](https://docs.rs/unicore/badge.svg)](https://docs.rs/unicore)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/unicore/blob/main/LICENSE-APACHE)
//!
//! A user-level cooperative priority scheduler. `unicore` lets a host process
//! spawn many logical "green threads" - each a priority-tagged unit of work
//! carried by a real OS thread - while guaranteeing that exactly one of them
//! executes at any instant, as on a single-processor machine. The scheduler
//! decides, using strict priority and a time-quantum budget, which logical
//! thread runs next.
//!
//! ## Features
//!
//! - **At-most-one-running** - carrier OS threads rendezvous at an execution
//!   gate; only the designated thread proceeds
//! - **Strict priority preemption** - a strictly-higher-priority arrival takes
//!   the CPU at the next scheduling event; ties never preempt
//! - **Round-robin within a level** - demoted threads rejoin at the tail of
//!   their own priority's FIFO
//! - **Quantum budget** - spent one tick per scheduling event
//!   (`spawn`, `yield_now`, `wait_for_event`, `signal_event`), never on a timer
//! - **Event rendezvous** - threads park on numbered I/O events until a signal
//!   releases every waiter at once, FIFO order preserved
//! - **Loud capacity errors** - a full scheduler refuses a spawn instead of
//!   silently dropping it
//!
//! ## Quick Start
//!
//! Add `unicore` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! unicore = "0.2"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use unicore::prelude::*;
//!
//! let sched = Scheduler::new(2, 4)?;
//! sched.spawn(|_sched, priority| println!("running at priority {priority}"), 3)?;
//! sched.shutdown();
//! # Ok::<(), unicore::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use unicore::Scheduler;
//!
//! let sched = Scheduler::new(2, 4)?;
//! let order = Arc::new(Mutex::new(Vec::new()));
//!
//! // a parent thread forks two children; the higher-priority child runs first
//! let log = Arc::clone(&order);
//! sched.spawn(
//!     move |sched, _| {
//!         let low = Arc::clone(&log);
//!         let high = Arc::clone(&log);
//!         sched.spawn(move |_, _| low.lock().unwrap().push("low"), 1).unwrap();
//!         sched.spawn(move |_, _| high.lock().unwrap().push("high"), 3).unwrap();
//!     },
//!     1,
//! )?;
//!
//! sched.shutdown();
//! assert_eq!(order.lock().unwrap().as_slice(), &["high", "low"]);
//! # Ok::<(), unicore::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `unicore` is organized into a small set of modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`scheduler`] - The scheduler core, configuration and thread identity
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! The [`Scheduler`] is the main entry point. The thread that creates it
//! becomes the *host context*: it is never placed in a ready queue, `spawn`
//! never blocks it, and it regains the CPU whenever no spawned thread is
//! runnable. Spawned handlers receive a `&Scheduler`, so scheduled code calls
//! scheduler operations without globals.
//!
//! ## Scheduling Model
//!
//! This is a cooperative model on a conceptually single-core machine. The
//! quantum is a count of *scheduling events*, not wall-clock time: a handler
//! that performs no scheduler calls runs until it returns, and quantum ticks
//! are charged only at `spawn`, `yield_now`, `wait_for_event` and
//! `signal_event`. Within one priority level threads run in strict FIFO order
//! relative to when they became ready; across levels, a strictly higher
//! priority always wins at the next decision point. There are no timeouts and
//! no cancellation: a thread waiting on an event that nobody signals waits
//! forever, and `shutdown` then never completes - a documented liveness hazard
//! of the model rather than an error the library can detect.
//!
//! Real parallelism is deliberately out of scope: the point of the gate is to
//! make concurrently created OS threads *behave* like a single-core cooperative
//! scheduler.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error
//! information:
//!
//! ```rust
//! use unicore::{Error, Scheduler};
//!
//! match Scheduler::new(0, 4) {
//!     Ok(_) => println!("scheduler is live"),
//!     Err(Error::InvalidQuantum) => println!("quantum must be positive"),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs scheduling decisions through the [`log`] facade at `trace`
//! and `debug` levels and never installs a logger; wire up any `log`-compatible
//! backend in the host to observe installs, preemptions, waits and signals.

#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use unicore::prelude::*;
///
/// let sched = Scheduler::new(1, 0)?;
/// sched.shutdown();
/// # Ok::<(), unicore::Error>(())
/// ```
pub mod prelude;

/// The scheduler core: configuration, thread identity, queues, the execution
/// gate and the decision procedure.
///
/// # Key Types
///
/// - [`Scheduler`](scheduler::Scheduler) - the owned, cloneable scheduler handle
/// - [`SchedulerConfig`](scheduler::config::SchedulerConfig) - construction-time knobs
/// - [`ThreadId`](scheduler::thread::ThreadId) - logical-thread handle
/// - [`ThreadState`](scheduler::thread::ThreadState) - completion state
pub mod scheduler;

/// The result type used throughout unicore.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use scheduler::config::{
    SchedulerConfig, DEFAULT_MAX_THREADS, DEFAULT_QUANTUM, MAX_EVENT_CLASSES, MAX_PRIORITY,
};
pub use scheduler::thread::{ThreadId, ThreadState};
pub use scheduler::Scheduler;
