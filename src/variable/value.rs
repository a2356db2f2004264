/// Typed variable values
///
/// Values are stored as JSON-compatible trees. A composite value is an ordered
/// set of named fields (a user-type instance) and supports a non-destructive merge.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single variable value
///
/// Serialized untagged so JSON snapshots read naturally:
/// `null`, `true`, `42`, `4.2`, `"text"`, `[...]`, `{...}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    List(Vec<VariableValue>),
    Composite(CompositeValue),
}

impl VariableValue {
    pub fn is_null(&self) -> bool {
        matches!(self, VariableValue::Null)
    }

    /// Null, or an empty string, list or composite
    pub fn is_empty(&self) -> bool {
        match self {
            VariableValue::Null => true,
            VariableValue::String(value) => value.is_empty(),
            VariableValue::List(items) => items.is_empty(),
            VariableValue::Composite(fields) => fields.is_empty(),
            VariableValue::Bool(_) | VariableValue::Long(_) | VariableValue::Double(_) => false,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, VariableValue::Composite(_))
    }

    pub fn as_composite(&self) -> Option<&CompositeValue> {
        match self {
            VariableValue::Composite(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeValue> {
        match self {
            VariableValue::Composite(fields) => Some(fields),
            _ => None,
        }
    }

    /// Integer view used for process id references
    ///
    /// Accepts longs, integral doubles and numeric strings.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            VariableValue::Long(value) => Some(*value),
            VariableValue::Double(value) if value.fract() == 0.0 => Some(*value as i64),
            VariableValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Element of a list value
    pub fn component(&self, index: usize) -> Option<&VariableValue> {
        match self {
            VariableValue::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Named field of a composite value
    pub fn field(&self, name: &str) -> Option<&VariableValue> {
        self.as_composite().and_then(|fields| fields.get(name))
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::String(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::String(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Long(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        VariableValue::Double(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<CompositeValue> for VariableValue {
    fn from(value: CompositeValue) -> Self {
        VariableValue::Composite(value)
    }
}

impl From<serde_json::Value> for VariableValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => VariableValue::Null,
            serde_json::Value::Bool(flag) => VariableValue::Bool(flag),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(long) => VariableValue::Long(long),
                None => VariableValue::Double(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(text) => VariableValue::String(text),
            serde_json::Value::Array(items) => {
                VariableValue::List(items.into_iter().map(VariableValue::from).collect())
            }
            serde_json::Value::Object(fields) => VariableValue::Composite(CompositeValue(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, VariableValue::from(value)))
                    .collect(),
            )),
        }
    }
}

/// Ordered field map of a user-type value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeValue(IndexMap<String, VariableValue>);

impl CompositeValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<VariableValue>) -> Option<VariableValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.0.iter()
    }

    /// Merge `other` into this value
    ///
    /// Fields absent here are copied from `other`. A field that is composite on
    /// both sides is merged recursively. Any other field already present is
    /// replaced only when `overwrite` is set. Nothing is ever removed.
    pub fn merge(&mut self, other: &CompositeValue, overwrite: bool) {
        for (name, incoming) in other.iter() {
            match self.0.get_mut(name) {
                None => {
                    self.0.insert(name.clone(), incoming.clone());
                }
                Some(VariableValue::Composite(existing)) if incoming.is_composite() => {
                    if let VariableValue::Composite(incoming) = incoming {
                        existing.merge(incoming, overwrite);
                    }
                }
                Some(existing) if overwrite => {
                    *existing = incoming.clone();
                }
                Some(_) => {}
            }
        }
    }
}

impl<K: Into<String>, V: Into<VariableValue>> FromIterator<(K, V)> for CompositeValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CompositeValue(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
