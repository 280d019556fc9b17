//! Record type: an opaque, path-addressed attribute set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute holding the unique URL-path-like identifier of a record
pub const PATH_ATTR: &str = "path";

/// Attribute holding a record's raw textual content, when it has any
pub const FILE_ATTR: &str = "file";

/// One stored "component" or data entry.
///
/// A record is nothing but a mapping from string keys to arbitrary JSON
/// values. The store only interprets the `path` attribute; everything else
/// belongs to the client that submitted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attrs: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with its `path` attribute already set
    pub fn with_path(path: &str) -> Self {
        let mut record = Self::new();
        record.set(PATH_ATTR, Value::String(path.to_string()));
        record
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.attrs.insert(key.into(), value);
    }

    /// The unique path identifier, when present and a string
    pub fn path(&self) -> Option<&str> {
        self.attrs.get(PATH_ATTR).and_then(Value::as_str)
    }

    /// The raw textual content, when present and a string
    pub fn file(&self) -> Option<&str> {
        self.attrs.get(FILE_ATTR).and_then(Value::as_str)
    }

    /// Overwrite-insert every key from `data` into this record.
    ///
    /// Keys not present in `data` are preserved (merge-overwrite semantics).
    pub fn merge(&mut self, data: &Map<String, Value>) {
        for (key, value) in data {
            self.attrs.insert(key.clone(), value.clone());
        }
    }

    pub const fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }
}
