//! Keyed store of entity snapshots with change-detecting event delivery.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::policy::ComparisonPolicy;
use crate::record::Record;

type Subscriber = Box<dyn Fn(&Record) + Send>;

/// Key → last-known snapshot, with `updated`/`deleted` fan-out.
///
/// All operations are synchronous; subscribers run on the caller's stack, in
/// registration order. A subscriber registered after an event fired never
/// sees that event. The registry is caller-owned — construct one per feed,
/// no ambient state.
pub struct Registry {
    entries: HashMap<String, Record>,
    policy: ComparisonPolicy,
    updated: Vec<Subscriber>,
    deleted: Vec<Subscriber>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_policy(ComparisonPolicy::default())
    }

    pub fn with_policy(policy: ComparisonPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Subscribe to `updated` events. Payload is the stored record.
    pub fn on_updated(&mut self, subscriber: impl Fn(&Record) + Send + 'static) {
        self.updated.push(Box::new(subscriber));
    }

    /// Subscribe to `deleted` events. Payload is the last-known record.
    pub fn on_deleted(&mut self, subscriber: impl Fn(&Record) + Send + 'static) {
        self.deleted.push(Box::new(subscriber));
    }

    /// Insert or replace the snapshot for `key`.
    ///
    /// New keys always store and emit `updated`. Known keys store and emit
    /// only when a comparable field differs under the registry's policy; a
    /// suppressed update leaves the previous snapshot in place, so volatile
    /// drift alone changes nothing. Returns whether an event fired.
    pub fn update(&mut self, key: impl Into<String>, record: Record) -> bool {
        let key = key.into();
        if let Some(current) = self.entries.get(&key) {
            if !self.policy.changed(current, &record) {
                trace!(%key, "snapshot unchanged, suppressing update");
                return false;
            }
            debug!(%key, "entity changed");
        } else {
            debug!(%key, "entity added");
        }
        self.entries.insert(key.clone(), record);
        if let Some(stored) = self.entries.get(&key) {
            for subscriber in &self.updated {
                subscriber(stored);
            }
        }
        true
    }

    /// Like [`update`](Self::update), but a no-op for unknown keys: no
    /// insertion, no event. For callers that only react to entities they
    /// already know about.
    pub fn update_if_exists(&mut self, key: &str, record: Record) -> bool {
        if self.entries.contains_key(key) {
            self.update(key, record)
        } else {
            trace!(%key, "unknown entity, ignoring update");
            false
        }
    }

    /// Remove the snapshot for `key`, emitting `deleted` with its last-known
    /// record. Returns the record, or None if the key was unknown.
    pub fn remove(&mut self, key: &str) -> Option<Record> {
        let record = self.entries.remove(key)?;
        debug!(%key, "entity deleted");
        for subscriber in &self.deleted {
            subscriber(&record);
        }
        Some(record)
    }

    /// Visit every currently stored record once, in unspecified order.
    pub fn for_each(&self, mut f: impl FnMut(&Record)) {
        for record in self.entries.values() {
            f(record);
        }
    }

    /// Wholesale seed/replace of the registry's contents, without events.
    /// A bulk-load backdoor for initial population, not part of the
    /// steady-state update protocol.
    pub fn set(&mut self, entries: impl IntoIterator<Item = (String, Record)>) {
        self.entries = entries.into_iter().collect();
    }

    /// Reconcile against a full snapshot of the world: `update` every entry,
    /// then `remove` (with `deleted` events) every stored key absent from
    /// the snapshot. This is the poll-tick / watch-event entry point.
    pub fn reconcile(&mut self, snapshot: impl IntoIterator<Item = (String, Record)>) {
        let mut seen = HashSet::new();
        for (key, record) in snapshot {
            seen.insert(key.clone());
            self.update(key, record);
        }
        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            self.remove(&key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
