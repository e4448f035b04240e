//! Joining many completions into one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::future::{Pending, Watcher};
use crate::outcome::Outcome;

struct SetInner {
    children: Vec<Arc<dyn Pending>>,
    watchers: Vec<Watcher>,
}

/// An ordered collection of pending work, itself usable wherever a
/// [`Future`](crate::Future) is expected.
///
/// A set's completion is a pure function of its children: complete iff every
/// child is complete (vacuously true when empty). It never completes "on its
/// own" — each child's completion re-evaluates the set, and watchers fire
/// when the last outstanding child calls back. Which child finishes last is
/// caller-determined; no ordering is imposed between independent children.
pub struct FutureSet {
    inner: Arc<Mutex<SetInner>>,
}

impl Clone for FutureSet {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for FutureSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FutureSet {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SetInner {
                children: Vec::new(),
                watchers: Vec::new(),
            })),
        }
    }

    /// Join a whole batch: the set of every element of `children`.
    /// The equivalent of folding a list of futures pairwise with
    /// [`and`](Self::and).
    pub fn all(children: impl IntoIterator<Item = impl Pending + 'static>) -> Self {
        children.into_iter().fold(Self::new(), Self::and)
    }

    /// Append `child` and subscribe the set's re-evaluation hook to it.
    /// Chainable. An already-completed child re-evaluates immediately.
    pub fn and(self, child: impl Pending + 'static) -> Self {
        let child: Arc<dyn Pending> = Arc::new(child);
        // Push before subscribing: if the child is already complete, the
        // hook fires on this stack and must see the full child list.
        self.inner.lock().children.push(Arc::clone(&child));
        let set = self.clone();
        child.subscribe(Box::new(move |_| set.reevaluate()));
        self
    }

    /// True iff every child is complete.
    pub fn is_complete(&self) -> bool {
        self.inner
            .lock()
            .children
            .iter()
            .all(|child| child.is_complete())
    }

    /// Aggregate outcome: None while any child is pending, otherwise the
    /// merge of every child's outcome in child order.
    pub fn outcome(&self) -> Option<Outcome> {
        aggregate(&self.inner.lock().children)
    }

    /// Register `watcher` to run exactly once with the aggregate outcome,
    /// when the last outstanding child completes. Runs immediately and
    /// synchronously if the set is already complete.
    pub fn then(&self, watcher: impl FnOnce(&Outcome) + Send + 'static) {
        let mut inner = self.inner.lock();
        match aggregate(&inner.children) {
            Some(outcome) => {
                drop(inner);
                watcher(&outcome);
            }
            None => inner.watchers.push(Box::new(watcher)),
        }
    }

    /// Re-evaluation hook, invoked whenever any child completes. It cannot
    /// force completion — it only detects it, draining the watcher list the
    /// first time every child has completed.
    fn reevaluate(&self) {
        let (outcome, watchers) = {
            let mut inner = self.inner.lock();
            if inner.watchers.is_empty() {
                return;
            }
            match aggregate(&inner.children) {
                Some(outcome) => (outcome, std::mem::take(&mut inner.watchers)),
                None => return,
            }
        };
        for watcher in watchers {
            watcher(&outcome);
        }
    }
}

impl Pending for FutureSet {
    fn is_complete(&self) -> bool {
        FutureSet::is_complete(self)
    }

    fn outcome(&self) -> Option<Outcome> {
        FutureSet::outcome(self)
    }

    fn subscribe(&self, watcher: Watcher) {
        self.then(watcher);
    }
}

fn aggregate(children: &[Arc<dyn Pending>]) -> Option<Outcome> {
    let mut outcomes = Vec::with_capacity(children.len());
    for child in children {
        outcomes.push(child.outcome()?);
    }
    Some(Outcome::merge(outcomes))
}
