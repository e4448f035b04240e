//! Entity snapshots. Field values are opaque JSON data, plus attached
//! capabilities that travel with a snapshot but are not part of its state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A side-channel capability attached to a snapshot (e.g. the close function
/// on a connection record).
///
/// Two snapshots of the same entity routinely carry distinct handle
/// instances, so handles never participate in change comparison.
#[derive(Clone)]
pub struct Handle(Arc<dyn Fn() + Send + Sync>);

impl Handle {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the capability.
    pub fn call(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handle(..)")
    }
}

/// One field of an entity record.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Comparable state: string, number, ordered sequence, nested mapping.
    Data(Value),
    /// Attached capability. Carried, never compared, never serialized.
    Handle(Handle),
}

impl FieldValue {
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Handle(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Data(_) => None,
            Self::Handle(handle) => Some(handle),
        }
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<Handle> for FieldValue {
    fn from(handle: Handle) -> Self {
        Self::Handle(handle)
    }
}

/// The latest known snapshot of one tracked entity.
///
/// A record is an ordered field-name → value mapping. It carries no key of
/// its own; keys are assigned by whoever feeds the [`Registry`].
///
/// [`Registry`]: crate::registry::Registry
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object. Anything other than an object
    /// yields an empty record (malformed input is a caller contract
    /// violation, not an error path).
    pub fn from_json(value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(name, value)| (name, FieldValue::Data(value)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { fields }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields
            .insert(name.into(), FieldValue::Data(value.into()));
    }

    pub fn insert_handle(&mut self, name: impl Into<String>, handle: Handle) {
        self.fields.insert(name.into(), FieldValue::Handle(handle));
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_handle(mut self, name: impl Into<String>, handle: Handle) -> Self {
        self.insert_handle(name, handle);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Data value of a field, or None if absent or a handle.
    pub fn data(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(FieldValue::as_data)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON form of the record: data fields only. This is what gets
    /// published to console clients; capabilities stay in-process.
    pub fn to_json(&self) -> Value {
        let map = self
            .fields
            .iter()
            .filter_map(|(name, value)| {
                value.as_data().map(|data| (name.clone(), data.clone()))
            })
            .collect();
        Value::Object(map)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data: Vec<_> = self
            .fields
            .iter()
            .filter_map(|(name, value)| value.as_data().map(|data| (name, data)))
            .collect();
        let mut map = serializer.serialize_map(Some(data.len()))?;
        for (name, value) in data {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
