//! Raw configuration documents
//!
//! [`RawDocument`] is the unvalidated, order-preserving key/value tree produced
//! by parsing a file. It only becomes business data after passing through a
//! [`Schema`](crate::Schema).

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// Name of the mandatory top-level version field
pub const VERSION_KEY: &str = "version";

/// Unvalidated configuration document
///
/// The root is always a mapping. Nested addressing uses dot notation
/// (`deployment.logging_level`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Map<String, Value>);

impl RawDocument {
    /// Create empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create from a mapping
    #[inline]
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Create from an arbitrary value
    ///
    /// # Errors
    /// Returns error if the value is not a mapping
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DocumentError::NotAMapping {
                found: kind_of(&other),
            }),
        }
    }

    /// Create from a typed struct
    ///
    /// # Errors
    /// Returns error if serialization fails or does not produce a mapping
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Convert to a typed struct
    ///
    /// # Errors
    /// Returns error if the document does not match the type
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        Ok(serde_json::from_value(self.to_value())?)
    }

    /// Clone into a JSON value
    #[inline]
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Consume into a JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Underlying mapping
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutable underlying mapping
    #[inline]
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Current `version` field
    ///
    /// Only string values count. An unquoted YAML `version: 1.10` has
    /// already lost its trailing zero, so it reads as no version at all.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        match self.0.get(VERSION_KEY)? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Stamp the `version` field
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.0
            .insert(VERSION_KEY.to_string(), Value::String(version.into()));
    }

    /// Builder-style version stamp
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.set_version(version);
        self
    }

    /// Top-level value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert top-level value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove top-level value, keeping the order of remaining keys
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Check top-level key
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if document has no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get value at dotted path
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Set value at dotted path, creating intermediate mappings
    ///
    /// Non-mapping intermediates are replaced by mappings.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert((*last).to_string(), value);
    }

    /// Set value at dotted path only if nothing is there yet
    ///
    /// Returns `true` if the value was written.
    pub fn set_path_if_absent(&mut self, path: &str, value: Value) -> bool {
        if self.get_path(path).is_some() {
            return false;
        }
        self.set_path(path, value);
        true
    }

    /// Remove value at dotted path
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.0;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.shift_remove(*last)
    }

    /// Move value from one dotted path to another
    ///
    /// Overwrites the destination. Returns `true` if a value was moved.
    pub fn rename_path(&mut self, from: &str, to: &str) -> bool {
        match self.remove_path(from) {
            Some(value) => {
                self.set_path(to, value);
                true
            }
            None => false,
        }
    }

    /// Iterate over top-level entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for RawDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RawDocument {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<RawDocument> for Value {
    fn from(document: RawDocument) -> Self {
        document.into_value()
    }
}

/// Deep-merge `overlay` onto `base`
///
/// Mappings present on both sides merge recursively; any other overlay value
/// (scalar or sequence) replaces the base value outright. Keys only in `base`
/// are preserved.
#[must_use]
pub fn deep_merge(base: &RawDocument, overlay: &RawDocument) -> RawDocument {
    let mut merged = base.0.clone();
    merge_maps(&mut merged, &overlay.0);
    RawDocument(merged)
}

fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, source_val) in source {
        match (target.get_mut(key), source_val) {
            (Some(Value::Object(target_map)), Value::Object(source_map)) => {
                merge_maps(target_map, source_map);
            }
            _ => {
                target.insert(key.clone(), source_val.clone());
            }
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
