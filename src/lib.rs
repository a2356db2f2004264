/// Procvar: process variable resolution engine
///
/// This library resolves the effective value of a process variable by walking
/// base-process references and parent/child subprocess links instead of reading
/// only the local variable store.

// Core configuration flags read at resolution time
pub mod config;

// Error taxonomy for resolution
pub mod error;

// Tracing subscriber setup
pub mod logging;

// Process layer - instances, definitions, nodes and subprocess links
pub mod process;

// Variable values, composite merge and resolved/raw variable records
pub mod variable;

// Collaborator contracts (variable store, repositories) and an in-memory backend
pub mod store;

// Resolution engine - name qualifier, session link cache and resolver
pub mod resolver;

// Re-export commonly used types for external consumers
pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use process::{DefinitionRegistry, ProcessDefinition, ProcessInstance, SubprocessLink};
pub use resolver::{SubprocessLinkCache, VariableResolver};
pub use store::{Collaborators, MemoryProcessStore};
pub use variable::{CompositeValue, ResolvedVariable, VariableValue};
