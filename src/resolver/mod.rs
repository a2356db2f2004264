/// Resolution Engine
///
/// This module resolves process variables across process boundaries.
/// It handles:
/// - Splitting qualified names (`order[2].amount`) against mapping tables
/// - Session-scoped caching of subprocess links and base-process references
/// - Delegated lookups in base and parent processes with composite merging

// Structural variable-name splitting
pub mod qualifier;

// Per-session subprocess link cache
pub mod cache;

// Variable resolver orchestrating local and delegated lookups
pub mod variable_resolver;

// Re-export main types
pub use cache::{SubprocessLinkCache, SubprocessLinkInfo};
pub use qualifier::{qualify, split_qualified_name, QualifiedName};
pub use variable_resolver::VariableResolver;
