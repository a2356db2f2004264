/// Collaborator contracts consumed by the resolver
///
/// Durable storage lives outside this crate. The resolver only reads through
/// these narrow traits:
/// - VariableStore: typed lookups and raw legacy records
/// - ProcessDefinitionRegistry: definition of a running process
/// - ProcessRepository: process instances by id
/// - SubprocessLinkRepository: the link of a child process to its parent token
///
/// `MemoryProcessStore` implements the storage traits in memory.

use crate::config::ResolverConfig;
use crate::process::{Node, ProcessDefinition, ProcessId, ProcessInstance, SubprocessLink};
use crate::variable::{RawVariable, ResolvedVariable};
use anyhow::Result;
use std::sync::Arc;

// In-memory storage backend
pub mod memory;

pub use memory::MemoryProcessStore;

/// Typed variable lookups
pub trait VariableStore {
    /// Load a declared variable of `process`; None when `name` is not declared
    fn get_variable(
        &self,
        definition: &ProcessDefinition,
        process: &ProcessInstance,
        name: &str,
    ) -> Result<Option<ResolvedVariable>>;

    /// Raw record bypassing definitions (legacy compatibility mode)
    fn get_raw(&self, process: &ProcessInstance, name: &str) -> Result<Option<RawVariable>>;
}

pub trait ProcessDefinitionRegistry {
    fn get_definition(&self, process: &ProcessInstance) -> Result<Arc<ProcessDefinition>>;

    fn get_node_or_fail<'d>(&self, definition: &'d ProcessDefinition, node_id: &str) -> Result<&'d Node> {
        definition.get_node(node_id).ok_or_else(|| {
            anyhow::anyhow!("Node not found: {} in definition {}", node_id, definition.id)
        })
    }
}

pub trait ProcessRepository {
    fn get_by_id_or_fail(&self, id: ProcessId) -> Result<ProcessInstance>;
}

pub trait SubprocessLinkRepository {
    /// None for top-level processes
    fn find_by_child_process_id(&self, id: ProcessId) -> Result<Option<SubprocessLink>>;
}

/// Everything a resolution session reads from
///
/// Passed explicitly to the resolver and its link cache; cheap to copy.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub variables: &'a dyn VariableStore,
    pub definitions: &'a dyn ProcessDefinitionRegistry,
    pub processes: &'a dyn ProcessRepository,
    pub links: &'a dyn SubprocessLinkRepository,
    pub config: &'a ResolverConfig,
}

impl<'a> Collaborators<'a> {
    /// Bundle a single store that serves variables, processes and links
    pub fn new<S>(
        store: &'a S,
        definitions: &'a dyn ProcessDefinitionRegistry,
        config: &'a ResolverConfig,
    ) -> Self
    where
        S: VariableStore + ProcessRepository + SubprocessLinkRepository + 'a,
    {
        Self {
            variables: store,
            definitions,
            processes: store,
            links: store,
            config,
        }
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
