/// Error types for variable resolution
///
/// Only a self-referencing base process is raised by the engine itself. Missing
/// variables, mappings or links are not errors and surface as `None`.

use crate::process::ProcessId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The base-process-id variable of a process points back at the process itself
    #[error("{variable_name} reference should not point to current process id {process_id}")]
    SelfReferencingBaseProcess {
        process_id: ProcessId,
        variable_name: String,
    },

    /// Failure raised by the variable store, a repository or the definition registry
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl ResolveError {
    /// True for fatal configuration errors (as opposed to collaborator failures)
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ResolveError::SelfReferencingBaseProcess { .. })
    }
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
