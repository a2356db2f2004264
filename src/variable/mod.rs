/// Variable Layer
///
/// Value model shared by the store collaborators and the resolver:
/// - Typed values with composite (user-type) merge
/// - Resolved variables (name, value, definition) handed back to callers
/// - Raw untyped records read in legacy compatibility mode

// Typed values and composite merge
pub mod value;

// Resolved and raw variable records
pub mod types;

// Re-export commonly used types
pub use types::{RawVariable, ResolvedVariable};
pub use value::{CompositeValue, VariableValue};
