/// Configuration management for variable resolution
///
/// Holds the process-wide flags consulted by the resolver. They are read at
/// resolution time and never mutated by the engine.

use serde::{Deserialize, Serialize};

/// Default bound on chained base-process / parent-process delegations
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 32;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Name of the variable holding a process's base process id (None = feature disabled)
    pub base_process_id_variable_name: Option<String>,
    /// Whether names without a read mapping are passed unmodified to the base process
    pub read_unmapped_variables: bool,
    /// Legacy mode: undeclared variables are read from raw, untyped records
    pub legacy_compatibility_mode: bool,
    /// Upper bound on delegation hops for one lookup
    pub max_delegation_depth: usize,
}

impl ResolverConfig {
    /// Configuration with every optional behaviour switched off
    pub fn disabled() -> Self {
        Self {
            base_process_id_variable_name: None,
            read_unmapped_variables: false,
            legacy_compatibility_mode: false,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }

    pub fn with_base_process_id_variable(mut self, name: impl Into<String>) -> Self {
        self.base_process_id_variable_name = Some(name.into());
        self
    }

    pub fn with_read_unmapped_variables(mut self, enabled: bool) -> Self {
        self.read_unmapped_variables = enabled;
        self
    }

    pub fn with_legacy_compatibility_mode(mut self, enabled: bool) -> Self {
        self.legacy_compatibility_mode = enabled;
        self
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }
}

impl Default for ResolverConfig {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            base_process_id_variable_name: std::env::var("PROCVAR_BASE_PROCESS_ID_VARIABLE")
                .ok()
                .filter(|name| !name.trim().is_empty()),
            read_unmapped_variables: env_flag("PROCVAR_BASE_PROCESS_READ_ALL_VARIABLES"),
            legacy_compatibility_mode: env_flag("PROCVAR_LEGACY_COMPATIBILITY_MODE"),
            max_delegation_depth: std::env::var("PROCVAR_MAX_DELEGATION_DEPTH")
                .ok()
                .and_then(|depth| depth.parse().ok())
                .unwrap_or(DEFAULT_MAX_DELEGATION_DEPTH),
        }
    }
}

/// Boolean env flag: "1", "true", "yes", "on" (any case) enable it
fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
