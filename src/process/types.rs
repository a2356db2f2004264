/// Core process type definitions
///
/// Instances, definitions and subprocess links as seen by the resolver. These
/// types are serialized/deserialized from JSON snapshots; the engine never
/// mutates them.

use crate::resolver::qualifier::split_qualified_name;
use crate::variable::VariableValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable numeric process identity, used as the session cache key
pub type ProcessId = i64;

pub type TokenId = i64;

/// A running process instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInstance {
    pub id: ProcessId,
    /// Id of the process definition this instance runs (e.g., "order-handling")
    pub definition_id: String,
    /// Token in the parent process that spawned this instance, if any
    #[serde(default)]
    pub parent_token: Option<TokenId>,
}

impl ProcessInstance {
    pub fn new(id: ProcessId, definition_id: impl Into<String>) -> Self {
        Self {
            id,
            definition_id: definition_id.into(),
            parent_token: None,
        }
    }
}

/// Execution pointer inside a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub process_id: ProcessId,
    /// Node the token sits on
    pub node_id: String,
}

/// Declared process variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    /// Declared type information (e.g., "string", "long", "usertype:Address", "list")
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub default_value: Option<VariableValue>,
}

fn default_format() -> String {
    "string".to_string()
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<VariableValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Correspondence between a child-process variable and a parent-process variable
///
/// Declared on a subprocess node. `readable` mappings take part in one-way
/// reads, `syncable` mappings in two-way synchronization (and therefore reads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMapping {
    /// Name valid inside the child process
    pub name: String,
    /// Name valid inside the parent process
    pub mapped_name: String,
    #[serde(default)]
    pub readable: bool,
    #[serde(default)]
    pub syncable: bool,
}

/// Settings of a (multi-)subprocess node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubprocessNode {
    /// Definition id of the spawned process
    pub subprocess_name: String,
    #[serde(default)]
    pub variable_mappings: Vec<VariableMapping>,
    /// Node explicitly configured to run its children in base-process-id mode
    #[serde(default)]
    pub base_process_id_mode: bool,
}

/// Behaviour of a node
///
/// Only subprocess nodes matter to variable resolution; every other kind is
/// carried for completeness of the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    End,
    Task,
    /// Spawns one child process
    Subprocess(SubprocessNode),
    /// Spawns one child process per element, each with its own position index
    MultiSubprocess(SubprocessNode),
}

/// A single node of a process definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    /// Subprocess settings for both single and multi-instance subprocess nodes
    pub fn subprocess(&self) -> Option<&SubprocessNode> {
        match &self.kind {
            NodeKind::Subprocess(settings) | NodeKind::MultiSubprocess(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn is_multi_subprocess(&self) -> bool {
        matches!(self.kind, NodeKind::MultiSubprocess(_))
    }
}

/// Static metadata for a process type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    /// Unique definition identifier (e.g., "order-handling")
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl ProcessDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            variables: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: VariableDefinition) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Declared variable with exactly this name
    pub fn get_variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    /// Declared variable, or a derived definition for a qualified name
    ///
    /// `total[2]` or `order.address.street` resolve to a definition named after
    /// the full qualified name, typed after the longest declared prefix and
    /// without a default value.
    pub fn find_variable(&self, name: &str) -> Option<VariableDefinition> {
        if let Some(variable) = self.get_variable(name) {
            return Some(variable.clone());
        }
        let qualified = split_qualified_name(name, |candidate| self.get_variable(candidate).is_some());
        if qualified.remainder.is_empty() {
            return None;
        }
        self.get_variable(qualified.base).map(|root| VariableDefinition {
            name: name.to_string(),
            format: root.format.clone(),
            default_value: None,
        })
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }
}

/// Structural record tying a child process to the parent token that spawned it
///
/// Created once when the subprocess starts and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprocessLink {
    pub id: i64,
    pub parent_process_id: ProcessId,
    /// Token of the parent sitting on the owning subprocess node
    pub parent_token: Token,
    pub child_process_id: ProcessId,
    /// Position of the child within a multi-instance expansion
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SubprocessLink {
    /// Id of the subprocess node in the parent's definition
    pub fn node_id(&self) -> &str {
        &self.parent_token.node_id
    }
}
