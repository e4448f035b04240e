//! Completion-tracking primitives for asynchronous setup and teardown.
//!
//! A [`Future`] is a single-assignment cell representing one unit of work
//! that finishes exactly once, possibly with an error. A [`FutureSet`] joins
//! many of them: it completes when the last child completes and aggregates
//! every failure. Completion is triggered externally (an I/O callback, a
//! timer); the primitives themselves never defer, queue, or retry, and all
//! callbacks run synchronously on the completing caller's stack.
//!
//! Typical use in the console agent: issue N management requests, hand each
//! request [`Future::as_callback`] as its completion callback, join the
//! futures with [`FutureSet::all`], and re-query once the set completes.

pub mod future;
pub mod outcome;
pub mod set;

pub use future::{CompletionError, Future, Pending};
pub use outcome::Outcome;
pub use set::FutureSet;
