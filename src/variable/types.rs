/// Variable records exchanged with the variable store

use crate::process::{ProcessId, VariableDefinition};
use crate::variable::value::VariableValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (name, value, definition) triple returned to callers
///
/// `definition` is None only for the minimal results produced from raw
/// legacy records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVariable {
    pub name: String,
    #[serde(default)]
    pub value: VariableValue,
    #[serde(default)]
    pub definition: Option<VariableDefinition>,
}

impl ResolvedVariable {
    pub fn new(definition: VariableDefinition, value: VariableValue) -> Self {
        Self {
            name: definition.name.clone(),
            value,
            definition: Some(definition),
        }
    }

    /// Minimal result without a declared definition (legacy path)
    pub fn untyped(name: impl Into<String>, value: VariableValue) -> Self {
        Self {
            name: name.into(),
            value,
            definition: None,
        }
    }

    pub fn default_value(&self) -> Option<&VariableValue> {
        self.definition.as_ref().and_then(|definition| definition.default_value.as_ref())
    }

    /// Whether the current value equals the declared default
    pub fn has_default_value(&self) -> bool {
        self.default_value() == Some(&self.value)
    }
}

/// Raw, untyped variable record as kept by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVariable {
    pub process_id: ProcessId,
    pub name: String,
    #[serde(default)]
    pub value: VariableValue,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
