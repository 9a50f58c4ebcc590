use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::error::{KiwiError, KiwiResult};

/// Ordered column → value pairs for INSERT and UPDATE.
///
/// Insertion order is kept and decides column order in the statement.
/// Duplicate columns are allowed here and rejected at compile time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Build from a JSON object, e.g. `{"login": "bob", "last_activity": ["CURRENT_TIMESTAMP"]}`.
    pub fn from_json(json: &serde_json::Value) -> KiwiResult<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| KiwiError::invalid(format!("fields must be an object, got {}", json)))?;
        object
            .iter()
            .map(|(column, value)| Ok((column.clone(), Value::from_json(value)?)))
            .collect::<KiwiResult<Vec<_>>>()
            .map(|entries| Self { entries })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
