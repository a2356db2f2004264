/// Process Layer
///
/// Read-only view of the execution subsystem consumed by the resolver:
/// - Type definitions (ProcessInstance, ProcessDefinition, Node, SubprocessLink)
/// - Lock-free hot-reload registry of process definitions using ArcSwap

// Core process type definitions
pub mod types;

// Hot-reload definition registry
pub mod registry;

// Re-export commonly used types
pub use registry::DefinitionRegistry;
pub use types::{
    Node, NodeKind, ProcessDefinition, ProcessId, ProcessInstance, SubprocessLink, SubprocessNode,
    Token, TokenId, VariableDefinition, VariableMapping,
};
