/// Variable resolver
///
/// Resolves one named variable for one (definition, process) pair. The local
/// store is read first; empty, default-valued and composite values are then
/// completed from the base process or the parent process, following the chain
/// of delegations transitively.

use crate::error::Result;
use crate::process::{ProcessDefinition, ProcessId, ProcessInstance};
use crate::resolver::cache::SubprocessLinkCache;
use crate::store::Collaborators;
use crate::variable::{ResolvedVariable, VariableValue};
use std::{collections::HashSet, sync::Arc};

/// Resolution session for a single process
///
/// Owns the session's link cache. Not meant to be shared between concurrent
/// callers; create one per logical resolution session.
#[derive(Debug)]
pub struct VariableResolver<'a> {
    env: Collaborators<'a>,
    definition: Arc<ProcessDefinition>,
    process: ProcessInstance,
    links: SubprocessLinkCache<'a>,
}

impl<'a> VariableResolver<'a> {
    pub fn new(env: Collaborators<'a>, definition: Arc<ProcessDefinition>, process: ProcessInstance) -> Self {
        Self {
            env,
            definition,
            process,
            links: SubprocessLinkCache::new(env),
        }
    }

    /// Create a resolver, loading the process definition through the registry
    pub fn for_process(env: Collaborators<'a>, process: ProcessInstance) -> Result<Self> {
        let definition = env.definitions.get_definition(&process)?;
        Ok(Self::new(env, definition, process))
    }

    pub fn process(&self) -> &ProcessInstance {
        &self.process
    }

    pub fn definition(&self) -> &Arc<ProcessDefinition> {
        &self.definition
    }

    /// Session cache shared by every lookup of this resolver
    pub fn link_cache(&mut self) -> &mut SubprocessLinkCache<'a> {
        &mut self.links
    }

    /// Resolve `name`
    ///
    /// Returns None when the variable is neither declared locally nor (in
    /// legacy mode) present as a raw record. A declared variable is always
    /// returned, possibly with a null value. A self-referencing base process
    /// fails every lookup, whatever the name.
    pub fn get(&mut self, name: &str) -> Result<Option<ResolvedVariable>> {
        self.links.base_process_id(&self.definition, &self.process)?;

        let local = self
            .env
            .variables
            .get_variable(&self.definition, &self.process, name)?;

        if let Some(variable) = local {
            if !needs_upstream(&variable) {
                return Ok(Some(variable));
            }
            let definition = Arc::clone(&self.definition);
            let process = self.process.clone();
            return self
                .resolve_upstream(definition, process, name.to_string(), variable)
                .map(Some);
        }

        if self.env.config.legacy_compatibility_mode {
            if let Some(raw) = self.env.variables.get_raw(&self.process, name)? {
                tracing::debug!(
                    "📜 Using raw record for undeclared variable '{}' in process {}",
                    name,
                    self.process.id
                );
                return Ok(Some(ResolvedVariable::untyped(name, raw.value)));
            }
        }

        tracing::debug!(
            "No variable defined by '{}' in process {}, returning null",
            name,
            self.process.id
        );
        Ok(None)
    }

    /// Resolve `name` to its value only; absent variables yield `Null`
    pub fn get_value(&mut self, name: &str) -> Result<VariableValue> {
        Ok(self.get(name)?.map(|variable| variable.value).unwrap_or_default())
    }

    /// Walk base/parent processes until `variable` holds a meaningful value
    ///
    /// Every hop moves the (definition, process, name) context one process up.
    /// The walk ends when there is no delegation target, no mapped name, a
    /// process would be visited twice, or the configured depth is reached.
    fn resolve_upstream(
        &mut self,
        mut definition: Arc<ProcessDefinition>,
        mut process: ProcessInstance,
        mut name: String,
        mut variable: ResolvedVariable,
    ) -> Result<ResolvedVariable> {
        let mut visited: HashSet<ProcessId> = HashSet::from([process.id]);

        loop {
            let Some(target_id) = self.links.delegation_target(&definition, &process)? else {
                return Ok(variable);
            };
            let Some(mapped_name) = self.links.base_process_read_variable_name(&process, &name)? else {
                tracing::debug!(
                    "No read mapping for '{}' from process {} to {}",
                    name,
                    process.id,
                    target_id
                );
                return Ok(variable);
            };
            if !visited.insert(target_id) {
                tracing::warn!(
                    "⚠️ Delegation cycle detected: process {} already visited while resolving '{}'",
                    target_id,
                    variable.name
                );
                return Ok(variable);
            }
            if visited.len() > self.env.config.max_delegation_depth + 1 {
                tracing::warn!(
                    "⚠️ Delegation depth {} exceeded while resolving '{}' in process {}",
                    self.env.config.max_delegation_depth,
                    variable.name,
                    self.process.id
                );
                return Ok(variable);
            }

            tracing::debug!("Loading variable '{}' from process '{}'", mapped_name, target_id);
            let base_process = self.env.processes.get_by_id_or_fail(target_id)?;
            let base_definition = self.env.definitions.get_definition(&base_process)?;
            let base_variable = self
                .env
                .variables
                .get_variable(&base_definition, &base_process, &mapped_name)?;

            if let Some(base) = base_variable {
                if let (VariableValue::Composite(local), VariableValue::Composite(upstream)) =
                    (&mut variable.value, &base.value)
                {
                    local.merge(upstream, false);
                    return Ok(variable);
                }

                let base_default = base.default_value().cloned();
                if !base.value.is_empty() || variable.value.is_null() {
                    variable.value = base.value;
                }
                if !variable.value.is_empty() && base_default.as_ref() != Some(&variable.value) {
                    return Ok(variable);
                }
            }

            definition = base_definition;
            process = base_process;
            name = mapped_name;
        }
    }
}

/// Local values that are empty, default-valued or composite are completed upstream
fn needs_upstream(variable: &ResolvedVariable) -> bool {
    variable.value.is_empty() || variable.has_default_value() || variable.value.is_composite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::VariableDefinition;
    use crate::variable::CompositeValue;

    #[test]
    fn meaningful_scalars_take_the_fast_path() {
        let definition = VariableDefinition::new("total", "long").with_default(0_i64);

        assert!(!needs_upstream(&ResolvedVariable::new(definition.clone(), 5_i64.into())));
        assert!(needs_upstream(&ResolvedVariable::new(definition.clone(), 0_i64.into())));
        assert!(needs_upstream(&ResolvedVariable::new(definition.clone(), VariableValue::Null)));
        assert!(needs_upstream(&ResolvedVariable::new(definition, "".into())));
    }

    #[test]
    fn composites_always_look_upstream() {
        let definition = VariableDefinition::new("customer", "usertype:Customer");
        let value: CompositeValue = [("name", "Ada")].into_iter().collect();

        assert!(needs_upstream(&ResolvedVariable::new(definition, value.into())));
    }
}
