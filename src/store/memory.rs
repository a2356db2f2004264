/// In-memory storage backend
///
/// Keeps process instances, subprocess links, typed variable values and raw
/// legacy records in plain maps. Snapshots are stored as JSON so fixtures and
/// embedders can load a whole process tree in one call.

use crate::process::{ProcessDefinition, ProcessId, ProcessInstance, SubprocessLink};
use crate::resolver::qualifier::{split_qualified_name, COMPONENT_QUALIFIER_END, COMPONENT_QUALIFIER_START, FIELD_DELIMITER};
use crate::store::{ProcessRepository, SubprocessLinkRepository, VariableStore};
use crate::variable::{RawVariable, ResolvedVariable, VariableValue};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JSON snapshot layout
///
/// `variables` is keyed by process id, then by variable name.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    processes: Vec<ProcessInstance>,
    #[serde(default)]
    links: Vec<SubprocessLink>,
    #[serde(default)]
    variables: HashMap<ProcessId, HashMap<String, VariableValue>>,
    #[serde(default)]
    raw_variables: Vec<RawVariable>,
}

/// Map-backed process store
#[derive(Debug, Default, Clone)]
pub struct MemoryProcessStore {
    processes: HashMap<ProcessId, ProcessInstance>,
    /// Key: child process id
    links: HashMap<ProcessId, SubprocessLink>,
    variables: HashMap<ProcessId, HashMap<String, VariableValue>>,
    raw_variables: HashMap<ProcessId, HashMap<String, RawVariable>>,
}

impl MemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a store from an already parsed JSON snapshot
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_value(value)?;
        Ok(Self::from_snapshot(snapshot))
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for process in snapshot.processes {
            store.insert_process(process);
        }
        for link in snapshot.links {
            store.insert_link(link);
        }
        for (process_id, values) in snapshot.variables {
            for (name, value) in values {
                store.set_variable(process_id, name, value);
            }
        }
        for raw in snapshot.raw_variables {
            store.insert_raw(raw);
        }
        tracing::debug!(
            "📥 Loaded snapshot with {} processes and {} subprocess links",
            store.processes.len(),
            store.links.len()
        );
        store
    }

    pub fn insert_process(&mut self, process: ProcessInstance) {
        self.processes.insert(process.id, process);
    }

    pub fn insert_link(&mut self, link: SubprocessLink) {
        self.links.insert(link.child_process_id, link);
    }

    pub fn set_variable(&mut self, process_id: ProcessId, name: impl Into<String>, value: impl Into<VariableValue>) {
        self.variables
            .entry(process_id)
            .or_default()
            .insert(name.into(), value.into());
    }

    pub fn insert_raw(&mut self, raw: RawVariable) {
        self.raw_variables
            .entry(raw.process_id)
            .or_default()
            .insert(raw.name.clone(), raw);
    }

    /// Stored value by exact name, else by walking the stored root along the qualified path
    fn lookup_value(&self, process_id: ProcessId, name: &str) -> Option<VariableValue> {
        let values = self.variables.get(&process_id)?;
        if let Some(value) = values.get(name) {
            return Some(value.clone());
        }
        let qualified = split_qualified_name(name, |candidate| values.contains_key(candidate));
        if qualified.remainder.is_empty() {
            return None;
        }
        let root = values.get(qualified.base)?;
        walk_path(root, qualified.remainder).cloned()
    }
}

/// Follow `.field` and `[index]` segments from `value`
fn walk_path<'v>(value: &'v VariableValue, path: &str) -> Option<&'v VariableValue> {
    let mut current = value;
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(FIELD_DELIMITER) {
            let end = after
                .find([FIELD_DELIMITER, COMPONENT_QUALIFIER_START])
                .unwrap_or(after.len());
            current = current.field(&after[..end])?;
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix(COMPONENT_QUALIFIER_START) {
            let end = after.find(COMPONENT_QUALIFIER_END)?;
            let key = &after[..end];
            current = match key.parse::<usize>() {
                Ok(index) if !current.is_composite() => current.component(index)?,
                _ => current.field(key)?,
            };
            rest = &after[end + COMPONENT_QUALIFIER_END.len_utf8()..];
        } else {
            return None;
        }
    }
    Some(current)
}

impl VariableStore for MemoryProcessStore {
    fn get_variable(
        &self,
        definition: &ProcessDefinition,
        process: &ProcessInstance,
        name: &str,
    ) -> Result<Option<ResolvedVariable>> {
        let Some(variable_definition) = definition.find_variable(name) else {
            return Ok(None);
        };
        let value = self.lookup_value(process.id, name).unwrap_or_default();
        Ok(Some(ResolvedVariable::new(variable_definition, value)))
    }

    fn get_raw(&self, process: &ProcessInstance, name: &str) -> Result<Option<RawVariable>> {
        Ok(self
            .raw_variables
            .get(&process.id)
            .and_then(|records| records.get(name))
            .cloned())
    }
}

impl ProcessRepository for MemoryProcessStore {
    fn get_by_id_or_fail(&self, id: ProcessId) -> Result<ProcessInstance> {
        self.processes
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Process not found: {}", id))
    }
}

impl SubprocessLinkRepository for MemoryProcessStore {
    fn find_by_child_process_id(&self, id: ProcessId) -> Result<Option<SubprocessLink>> {
        Ok(self.links.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::VariableDefinition;
    use serde_json::json;

    fn store() -> MemoryProcessStore {
        MemoryProcessStore::from_value(json!({
            "processes": [{ "id": 1, "definition_id": "order" }],
            "variables": {
                "1": {
                    "total": [10, 20, 42],
                    "customer": { "name": "Ada", "tags": ["vip"] },
                    "items[1]": "explicit"
                }
            },
            "raw_variables": [{ "process_id": 1, "name": "legacy", "value": "5" }]
        }))
        .unwrap()
    }

    fn definition() -> ProcessDefinition {
        ProcessDefinition::new("order")
            .with_variable(VariableDefinition::new("total", "list"))
            .with_variable(VariableDefinition::new("customer", "usertype:Customer"))
            .with_variable(VariableDefinition::new("items", "list"))
            .with_variable(VariableDefinition::new("note", "string").with_default("none"))
    }

    fn value(name: &str) -> Option<VariableValue> {
        let store = store();
        let process = store.get_by_id_or_fail(1).unwrap();
        store
            .get_variable(&definition(), &process, name)
            .unwrap()
            .map(|variable| variable.value)
    }

    #[test]
    fn reads_exact_and_qualified_values() {
        assert_eq!(value("total[2]"), Some(VariableValue::Long(42)));
        assert_eq!(value("customer.name"), Some(VariableValue::from("Ada")));
        assert_eq!(value("customer.tags[0]"), Some(VariableValue::from("vip")));
        assert_eq!(value("items[1]"), Some(VariableValue::from("explicit")));
    }

    #[test]
    fn declared_but_unset_variables_are_null() {
        assert_eq!(value("note"), Some(VariableValue::Null));
        assert_eq!(value("total[9]"), Some(VariableValue::Null));
        assert_eq!(value("undeclared"), None);
    }

    #[test]
    fn raw_records_and_missing_entities() {
        let store = store();
        let process = store.get_by_id_or_fail(1).unwrap();

        let raw = store.get_raw(&process, "legacy").unwrap().unwrap();
        assert_eq!(raw.value, VariableValue::from("5"));
        assert!(store.get_raw(&process, "other").unwrap().is_none());
        assert!(store.get_by_id_or_fail(99).is_err());
        assert!(store.find_by_child_process_id(1).unwrap().is_none());
    }
}
