/// Session cache of subprocess links and base-process references
///
/// Answers, per process instance, whether and how resolution may continue in a
/// base or parent process. Every answer is computed at most once per session
/// and never refreshed; the cache lives exactly as long as its resolver.

use crate::error::{ResolveError, Result};
use crate::process::{
    ProcessDefinition, ProcessId, ProcessInstance, SubprocessLink, Token, VariableDefinition,
};
use crate::resolver::qualifier::{component_qualifier, qualify};
use crate::store::Collaborators;
use std::{collections::HashMap, sync::Arc};

/// Cached linkage of a child process to the subprocess node that spawned it
#[derive(Debug, Clone)]
pub struct SubprocessLinkInfo {
    link: SubprocessLink,
    parent_definition: Arc<ProcessDefinition>,
    multi_instance: bool,
    base_process_id_mode: bool,
    /// Child name → parent name, for readable or syncable mappings
    read_names: HashMap<String, String>,
    /// Child name → parent name, for syncable mappings only
    sync_names: HashMap<String, String>,
}

impl SubprocessLinkInfo {
    pub fn link(&self) -> &SubprocessLink {
        &self.link
    }

    pub fn parent_definition(&self) -> &Arc<ProcessDefinition> {
        &self.parent_definition
    }

    pub fn is_multi_instance(&self) -> bool {
        self.multi_instance
    }

    pub fn read_names(&self) -> &HashMap<String, String> {
        &self.read_names
    }

    pub fn sync_names(&self) -> &HashMap<String, String> {
        &self.sync_names
    }

    /// Map `name` through `table` and build the parent-side name
    ///
    /// `amount` mapped to `amounts` becomes `amounts[k]` for the k-th child of a
    /// multi-instance subprocess; nested remainders are re-appended after that.
    fn parent_variable_name(&self, name: &str, table: &HashMap<String, String>) -> Option<String> {
        let qualified = qualify(name, table);
        let mapped = qualified.mapped(table)?;

        let mut parent_name = mapped.to_string();
        if self.multi_instance {
            match self.link.index {
                Some(index) => parent_name.push_str(&component_qualifier(index)),
                None => tracing::warn!(
                    "⚠️ Multi-instance subprocess {} has no position index, reading '{}' unqualified",
                    self.link.child_process_id,
                    mapped
                ),
            }
        }
        parent_name.push_str(qualified.remainder);
        Some(parent_name)
    }
}

/// Per-session memoization keyed by process id
pub struct SubprocessLinkCache<'a> {
    env: Collaborators<'a>,
    base_process_ids: HashMap<ProcessId, Option<ProcessId>>,
    links: HashMap<ProcessId, Option<SubprocessLinkInfo>>,
}

impl<'a> SubprocessLinkCache<'a> {
    pub fn new(env: Collaborators<'a>) -> Self {
        Self {
            env,
            base_process_ids: HashMap::new(),
            links: HashMap::new(),
        }
    }

    /// Base process referenced by the configured base-process-id variable
    ///
    /// None when the feature is disabled, the definition does not declare the
    /// variable, or its value is unset. A reference to the process itself is a
    /// fatal configuration error.
    pub fn base_process_id(
        &mut self,
        definition: &ProcessDefinition,
        process: &ProcessInstance,
    ) -> Result<Option<ProcessId>> {
        if let Some(cached) = self.base_process_ids.get(&process.id) {
            return Ok(*cached);
        }
        let base_process_id = self.load_base_process_id(definition, process)?;
        self.base_process_ids.insert(process.id, base_process_id);
        Ok(base_process_id)
    }

    fn load_base_process_id(
        &self,
        definition: &ProcessDefinition,
        process: &ProcessInstance,
    ) -> Result<Option<ProcessId>> {
        let Some(variable_name) = self.env.config.base_process_id_variable_name.as_deref() else {
            return Ok(None);
        };
        if definition.get_variable(variable_name).is_none() {
            return Ok(None);
        }

        let value = self
            .env
            .variables
            .get_variable(definition, process, variable_name)?
            .map(|variable| variable.value)
            .unwrap_or_default();
        let base_process_id = value.as_long();
        if base_process_id.is_none() && !value.is_empty() {
            tracing::warn!(
                "⚠️ Ignoring non-numeric {} = {:?} in process {}",
                variable_name,
                value,
                process.id
            );
        }

        if base_process_id == Some(process.id) {
            tracing::error!(
                "❌ {} of process {} points to the process itself",
                variable_name,
                process.id
            );
            return Err(ResolveError::SelfReferencingBaseProcess {
                process_id: process.id,
                variable_name: variable_name.to_string(),
            });
        }
        Ok(base_process_id)
    }

    /// Subprocess linkage of `process`; None for top-level processes
    pub fn link_info(&mut self, process: &ProcessInstance) -> Result<Option<&SubprocessLinkInfo>> {
        if !self.links.contains_key(&process.id) {
            let info = self.load_link_info(process)?;
            self.links.insert(process.id, info);
        }
        Ok(self.links.get(&process.id).and_then(Option::as_ref))
    }

    fn load_link_info(&self, process: &ProcessInstance) -> Result<Option<SubprocessLinkInfo>> {
        let Some(link) = self.env.links.find_by_child_process_id(process.id)? else {
            tracing::debug!("Caching no subprocess link for process {}", process.id);
            return Ok(None);
        };

        let parent = self.env.processes.get_by_id_or_fail(link.parent_process_id)?;
        let parent_definition = self.env.definitions.get_definition(&parent)?;
        let node = self
            .env
            .definitions
            .get_node_or_fail(&parent_definition, link.node_id())?;

        let multi_instance = node.is_multi_subprocess();
        let mut base_process_id_mode = false;
        let mut read_names = HashMap::new();
        let mut sync_names = HashMap::new();
        if let Some(settings) = node.subprocess() {
            base_process_id_mode = settings.base_process_id_mode;
            for mapping in &settings.variable_mappings {
                if mapping.readable || mapping.syncable {
                    read_names.insert(mapping.name.clone(), mapping.mapped_name.clone());
                }
                if mapping.syncable {
                    sync_names.insert(mapping.name.clone(), mapping.mapped_name.clone());
                }
            }
            tracing::debug!(
                "Caching for {} [baseProcessId mode = {}]: read names = {:?}, sync names = {:?}",
                process.id,
                base_process_id_mode,
                read_names,
                sync_names
            );
        }

        tracing::debug!(
            "🔗 Caching subprocess link {} for process {} (parent {}, node '{}')",
            link.id,
            process.id,
            link.parent_process_id,
            link.node_id()
        );
        Ok(Some(SubprocessLinkInfo {
            link,
            parent_definition,
            multi_instance,
            base_process_id_mode,
            read_names,
            sync_names,
        }))
    }

    /// Name to read in the base process for `name` in `process`
    ///
    /// Mapped names are translated (and index-qualified for multi-instance
    /// children). Unmapped names pass through unchanged only when the config
    /// allows it; otherwise None stops delegation.
    pub fn base_process_read_variable_name(
        &mut self,
        process: &ProcessInstance,
        name: &str,
    ) -> Result<Option<String>> {
        let pass_through = self.env.config.read_unmapped_variables;
        let mapped = self
            .link_info(process)?
            .and_then(|info| info.parent_variable_name(name, &info.read_names));

        Ok(match mapped {
            Some(parent_name) => Some(parent_name),
            None if pass_through => Some(name.to_string()),
            None => None,
        })
    }

    /// Whether the spawning subprocess node was configured for base-process-id mode
    pub fn is_in_base_process_id_mode(&mut self, process: &ProcessInstance) -> Result<bool> {
        Ok(self
            .link_info(process)?
            .is_some_and(|info| info.base_process_id_mode))
    }

    /// Definition, in the parent's process definition, of the variable that
    /// `variable_definition` synchronizes with
    pub fn parent_process_sync_variable_definition(
        &mut self,
        process: &ProcessInstance,
        variable_definition: &VariableDefinition,
    ) -> Result<Option<VariableDefinition>> {
        let Some(info) = self.link_info(process)? else {
            return Ok(None);
        };
        Ok(info
            .parent_variable_name(&variable_definition.name, &info.sync_names)
            .and_then(|parent_name| info.parent_definition.find_variable(&parent_name)))
    }

    /// Token of the parent process sitting on the spawning subprocess node
    pub fn parent_process_token(&mut self, process: &ProcessInstance) -> Result<Option<Token>> {
        Ok(self
            .link_info(process)?
            .map(|info| info.link.parent_token.clone()))
    }

    /// Process that delegated lookups for `process` continue in
    ///
    /// The configured base process wins; otherwise the parent of the
    /// subprocess link; otherwise there is nowhere to go.
    pub fn delegation_target(
        &mut self,
        definition: &ProcessDefinition,
        process: &ProcessInstance,
    ) -> Result<Option<ProcessId>> {
        if let Some(base_process_id) = self.base_process_id(definition, process)? {
            return Ok(Some(base_process_id));
        }
        Ok(self
            .link_info(process)?
            .map(|info| info.link.parent_process_id))
    }
}

impl std::fmt::Debug for SubprocessLinkCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessLinkCache")
            .field("base_process_ids", &self.base_process_ids)
            .field("links", &self.links.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::process::{DefinitionRegistry, Node, NodeKind, SubprocessNode, VariableMapping};
    use crate::store::{MemoryProcessStore, ProcessRepository, SubprocessLinkRepository};
    use std::cell::Cell;

    struct CountingLinks<'s> {
        inner: &'s MemoryProcessStore,
        calls: Cell<usize>,
    }

    impl SubprocessLinkRepository for CountingLinks<'_> {
        fn find_by_child_process_id(&self, id: ProcessId) -> anyhow::Result<Option<SubprocessLink>> {
            self.calls.set(self.calls.get() + 1);
            self.inner.find_by_child_process_id(id)
        }
    }

    fn mapping(name: &str, mapped_name: &str, readable: bool, syncable: bool) -> VariableMapping {
        VariableMapping {
            name: name.to_string(),
            mapped_name: mapped_name.to_string(),
            readable,
            syncable,
        }
    }

    fn registry(multi_instance: bool, base_process_id_mode: bool) -> DefinitionRegistry {
        let settings = SubprocessNode {
            subprocess_name: "item".to_string(),
            variable_mappings: vec![
                mapping("amount", "amounts", true, false),
                mapping("total", "totals", false, true),
                mapping("hidden", "secret", false, false),
            ],
            base_process_id_mode,
        };
        let kind = if multi_instance {
            NodeKind::MultiSubprocess(settings)
        } else {
            NodeKind::Subprocess(settings)
        };
        DefinitionRegistry::from_definitions([
            ProcessDefinition::new("order")
                .with_variable(VariableDefinition::new("amounts", "list"))
                .with_variable(VariableDefinition::new("totals", "list"))
                .with_node(Node {
                    id: "spawn".to_string(),
                    name: "Spawn items".to_string(),
                    kind,
                }),
            ProcessDefinition::new("item")
                .with_variable(VariableDefinition::new("baseProcessId", "long"))
                .with_variable(VariableDefinition::new("total", "long")),
        ])
    }

    fn store() -> MemoryProcessStore {
        MemoryProcessStore::from_value(serde_json::json!({
            "processes": [
                { "id": 1, "definition_id": "order" },
                { "id": 2, "definition_id": "item", "parent_token": 10 }
            ],
            "links": [{
                "id": 100,
                "parent_process_id": 1,
                "parent_token": { "id": 10, "process_id": 1, "node_id": "spawn" },
                "child_process_id": 2,
                "index": 3
            }]
        }))
        .unwrap()
    }

    #[test]
    fn read_names_are_index_qualified_for_multi_instance_children() {
        let store = store();
        let definitions = registry(true, false);
        let config = ResolverConfig::disabled();
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        let child = store.get_by_id_or_fail(2).unwrap();

        assert_eq!(
            cache.base_process_read_variable_name(&child, "amount").unwrap().as_deref(),
            Some("amounts[3]")
        );
        assert_eq!(
            cache.base_process_read_variable_name(&child, "amount.sub").unwrap().as_deref(),
            Some("amounts[3].sub")
        );
        assert_eq!(
            cache.base_process_read_variable_name(&child, "total").unwrap().as_deref(),
            Some("totals[3]")
        );
        assert_eq!(cache.base_process_read_variable_name(&child, "hidden").unwrap(), None);
    }

    #[test]
    fn single_subprocess_names_are_not_qualified() {
        let store = store();
        let definitions = registry(false, true);
        let config = ResolverConfig::disabled();
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        let child = store.get_by_id_or_fail(2).unwrap();

        assert_eq!(
            cache.base_process_read_variable_name(&child, "amount[1]").unwrap().as_deref(),
            Some("amounts[1]")
        );
        assert!(cache.is_in_base_process_id_mode(&child).unwrap());
        assert!(!cache.link_info(&child).unwrap().unwrap().is_multi_instance());
    }

    #[test]
    fn unmapped_names_follow_pass_through_flag() {
        let store = store();
        let definitions = registry(true, false);
        let parent = store.get_by_id_or_fail(1).unwrap();

        let config = ResolverConfig::disabled();
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        assert_eq!(cache.base_process_read_variable_name(&parent, "note").unwrap(), None);

        let config = ResolverConfig::disabled().with_read_unmapped_variables(true);
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        assert_eq!(
            cache.base_process_read_variable_name(&parent, "note").unwrap().as_deref(),
            Some("note")
        );
    }

    #[test]
    fn sync_definition_comes_from_parent_definition() {
        let store = store();
        let definitions = registry(true, false);
        let config = ResolverConfig::disabled();
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        let child = store.get_by_id_or_fail(2).unwrap();

        let synced = cache
            .parent_process_sync_variable_definition(&child, &VariableDefinition::new("total", "long"))
            .unwrap()
            .unwrap();
        assert_eq!(synced.name, "totals[3]");
        assert_eq!(synced.format, "list");

        let read_only = cache
            .parent_process_sync_variable_definition(&child, &VariableDefinition::new("amount", "long"))
            .unwrap();
        assert!(read_only.is_none());
        assert!(!cache.is_in_base_process_id_mode(&child).unwrap());
        assert_eq!(cache.parent_process_token(&child).unwrap().unwrap().node_id, "spawn");
    }

    #[test]
    fn link_lookups_are_memoized_including_absence() {
        let store = store();
        let definitions = registry(true, false);
        let config = ResolverConfig::disabled();
        let links = CountingLinks {
            inner: &store,
            calls: Cell::new(0),
        };
        let env = Collaborators {
            variables: &store,
            definitions: &definitions,
            processes: &store,
            links: &links,
            config: &config,
        };
        let mut cache = SubprocessLinkCache::new(env);
        let parent = store.get_by_id_or_fail(1).unwrap();
        let child = store.get_by_id_or_fail(2).unwrap();

        for _ in 0..3 {
            cache.base_process_read_variable_name(&child, "amount").unwrap();
            cache.is_in_base_process_id_mode(&child).unwrap();
            cache.parent_process_token(&parent).unwrap();
        }
        assert_eq!(links.calls.get(), 2);
    }

    #[test]
    fn self_referencing_base_process_is_fatal() {
        let mut store = store();
        store.set_variable(2, "baseProcessId", 2_i64);
        let definitions = registry(true, false);
        let config = ResolverConfig::disabled().with_base_process_id_variable("baseProcessId");
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        let child = store.get_by_id_or_fail(2).unwrap();
        let definition = definitions.get("item").unwrap();

        let error = cache.base_process_id(&definition, &child).unwrap_err();
        assert!(error.is_configuration_error());
        assert!(error.to_string().contains("baseProcessId"));
    }

    #[test]
    fn delegation_prefers_base_process_over_parent() {
        let mut store = store();
        let definitions = registry(true, false);
        let config = ResolverConfig::disabled().with_base_process_id_variable("baseProcessId");
        let definition = definitions.get("item").unwrap();
        let child = store.get_by_id_or_fail(2).unwrap();

        {
            let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
            assert_eq!(cache.base_process_id(&definition, &child).unwrap(), None);
            assert_eq!(cache.delegation_target(&definition, &child).unwrap(), Some(1));
        }

        store.insert_process(crate::process::ProcessInstance::new(5, "order"));
        store.set_variable(2, "baseProcessId", "5");
        let mut cache = SubprocessLinkCache::new(Collaborators::new(&store, &definitions, &config));
        assert_eq!(cache.delegation_target(&definition, &child).unwrap(), Some(5));
    }
}
