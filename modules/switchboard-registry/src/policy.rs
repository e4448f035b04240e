//! The comparison policy: which fields count when deciding whether a new
//! snapshot represents a real change.

use std::collections::BTreeSet;

use crate::record::Record;

/// Field-exclusion rules for snapshot comparison.
///
/// Two exclusions apply: named volatile fields (values expected to drift
/// between snapshots of the same logical entity, e.g. a creation timestamp
/// subject to clock or formatting drift), and handle-typed fields, which are
/// excluded unconditionally by type.
#[derive(Debug, Clone)]
pub struct ComparisonPolicy {
    volatile: BTreeSet<String>,
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self::new(["creationTimestamp"])
    }
}

impl ComparisonPolicy {
    pub fn new<S: Into<String>>(volatile: impl IntoIterator<Item = S>) -> Self {
        Self {
            volatile: volatile.into_iter().map(Into::into).collect(),
        }
    }

    /// Add another volatile field name.
    pub fn ignore(mut self, field: impl Into<String>) -> Self {
        self.volatile.insert(field.into());
        self
    }

    pub fn is_volatile(&self, field: &str) -> bool {
        self.volatile.contains(field)
    }

    /// True if any comparable field differs between the two snapshots.
    /// A field missing on one side is not equal to present-with-value.
    pub fn changed(&self, current: &Record, incoming: &Record) -> bool {
        let names: BTreeSet<&str> = current
            .field_names()
            .chain(incoming.field_names())
            .collect();
        for name in names {
            if self.is_volatile(name) {
                continue;
            }
            let before = current.get(name);
            let after = incoming.get(name);
            // A handle on either side means capability churn, not state.
            if before.is_some_and(|v| v.is_handle()) || after.is_some_and(|v| v.is_handle()) {
                continue;
            }
            if before.and_then(|v| v.as_data()) != after.and_then(|v| v.as_data()) {
                return true;
            }
        }
        false
    }
}
