//! Change-tracking registry for console entity snapshots.
//!
//! Callers feed full snapshots of keyed entities (connections, addresses,
//! endpoints) from a poll or watch source; the registry stores the latest
//! snapshot per key and notifies subscribers only when something meaningful
//! changed. Known-volatile fields (e.g. a creation timestamp that drifts
//! between snapshots) and attached capabilities (e.g. a close function) are
//! excluded from the comparison.
//!
//! Delivery is synchronous and in-call-stack. The registry never initiates
//! polling or watching itself.

pub mod policy;
pub mod record;
pub mod registry;

pub use policy::ComparisonPolicy;
pub use record::{FieldValue, Handle, Record};
pub use registry::Registry;
