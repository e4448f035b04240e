//! The single-assignment completion cell.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::outcome::Outcome;
use crate::set::FutureSet;

/// Errors from the completion protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// `complete` was called a second time. The first outcome is retained.
    #[error("future already completed")]
    AlreadyCompleted,
}

/// Derives the error outcome from the context passed to `complete`.
/// Returning None means success.
pub type Handler<C> = Box<dyn FnOnce(&C) -> Option<String> + Send>;

/// A completion watcher. Runs exactly once, synchronously, at completion.
pub type Watcher = Box<dyn FnOnce(&Outcome) + Send>;

/// Anything that completes exactly once and can be joined into a
/// [`FutureSet`]: a [`Future`], or another set.
pub trait Pending: Send + Sync {
    fn is_complete(&self) -> bool;

    /// None until completion.
    fn outcome(&self) -> Option<Outcome>;

    /// Register `watcher` to run once at completion; runs immediately and
    /// synchronously if already complete.
    fn subscribe(&self, watcher: Watcher);
}

struct Inner<C> {
    handler: Option<Handler<C>>,
    outcome: Option<Outcome>,
    watchers: Vec<Watcher>,
}

/// One unit of work that will finish exactly once, possibly with an error.
///
/// `Future` is a cheap-clone handle to a shared cell; clone it freely to
/// hand the completion trigger and the subscription side to different
/// owners. The transition is pending → completed, one-way and terminal: no
/// retry, no cancellation, no timeout.
pub struct Future<C = ()> {
    inner: Arc<Mutex<Inner<C>>>,
}

impl<C> Clone for Future<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Default for Future<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Future<C> {
    /// A future with no handler: completion is unconditional success.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                handler: None,
                outcome: None,
                watchers: Vec::new(),
            })),
        }
    }

    /// A future whose outcome is derived from the completion context, e.g.
    /// inspecting a management response's status code.
    pub fn with_handler(handler: impl FnOnce(&C) -> Option<String> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                handler: Some(Box::new(handler)),
                outcome: None,
                watchers: Vec::new(),
            })),
        }
    }

    /// Transition to completed. Runs the handler (if any) against `context`
    /// to derive the outcome, then runs every registered watcher on this
    /// call stack. Completing twice is a programmer error; the second call
    /// reports [`CompletionError::AlreadyCompleted`] and changes nothing.
    pub fn complete(&self, context: C) -> Result<(), CompletionError> {
        let (outcome, watchers) = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                return Err(CompletionError::AlreadyCompleted);
            }
            let error = inner.handler.take().and_then(|handler| handler(&context));
            let outcome = Outcome::from_error(error);
            inner.outcome = Some(outcome.clone());
            // Watchers run outside the lock: a watcher may re-enter (a set
            // re-evaluating its children queries this future's state).
            (outcome, std::mem::take(&mut inner.watchers))
        };
        for watcher in watchers {
            watcher(&outcome);
        }
        Ok(())
    }

    /// The completion trigger as a plain callback, for code that expects
    /// one ("call this when done"). Double completion through this path
    /// cannot be reported to the caller, so it is logged instead.
    pub fn as_callback(&self) -> impl FnOnce(C) {
        let cell = self.clone();
        move |context| {
            if cell.complete(context).is_err() {
                warn!("completion callback invoked on an already-completed future");
            }
        }
    }

    /// Register `watcher` to run exactly once with this future's outcome.
    /// Runs immediately and synchronously if already complete, so the call
    /// order of `then` and `complete` never races.
    pub fn then(&self, watcher: impl FnOnce(&Outcome) + Send + 'static) {
        let mut inner = self.inner.lock();
        if let Some(outcome) = inner.outcome.clone() {
            drop(inner);
            watcher(&outcome);
        } else {
            inner.watchers.push(Box::new(watcher));
        }
    }

    pub fn is_complete(&self) -> bool {
        self.inner.lock().outcome.is_some()
    }

    /// The outcome, or None while still pending.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.lock().outcome.clone()
    }

    /// Start a combinator chain: a set containing exactly `[self, other]`.
    pub fn and(&self, other: impl Pending + 'static) -> FutureSet
    where
        C: Send + 'static,
    {
        FutureSet::new().and(self.clone()).and(other)
    }
}

impl<C: Send + 'static> Pending for Future<C> {
    fn is_complete(&self) -> bool {
        Future::is_complete(self)
    }

    fn outcome(&self) -> Option<Outcome> {
        Future::outcome(self)
    }

    fn subscribe(&self, watcher: Watcher) {
        self.then(watcher);
    }
}
