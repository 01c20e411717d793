mod builder;
pub use builder::Builder;

mod settings;
pub use settings::Settings;

mod symbols;
pub use symbols::Symbols;

use crate::{
    builder::{pending, Pending},
    xml::{Variables, XNode},
    Statement,
};
use indexmap::{IndexMap, IndexSet};
use sqlmap_core::{
    mapping::{BoundSql, CacheConfig, KeyGenerator, ParameterMap, ResultMap},
    ty::TypeName,
    types::TypeSystem,
    Error, Result, Value,
};
use sqlmap_sql::{Env, ExpressionEvaluator};
use std::{collections::HashMap, sync::Arc};

/// The symbol table every mapping resource is compiled into.
///
/// Resources are added one at a time with [`load`](Self::load). References
/// that cannot be resolved yet are parked and retried after every load;
/// [`finish`](Self::finish) runs the last retry and turns anything still
/// missing into an error. After that the configuration is read only and can
/// be shared between threads.
#[derive(Debug)]
pub struct Configuration {
    pub(crate) settings: Settings,
    pub(crate) types: TypeSystem,
    pub(crate) variables: IndexMap<String, String>,
    pub(crate) evaluator: Arc<dyn ExpressionEvaluator>,

    pub(crate) statements: Symbols<Arc<Statement>>,
    pub(crate) result_maps: Symbols<Arc<ResultMap>>,
    pub(crate) parameter_maps: Symbols<Arc<ParameterMap>>,

    /// Caches declared by a namespace, keyed by the namespace.
    pub(crate) caches: Symbols<Arc<CacheConfig>>,

    pub(crate) fragments: Symbols<XNode>,
    pub(crate) key_generators: Symbols<KeyGenerator>,

    /// Namespace to the namespace whose cache it shares.
    cache_refs: IndexMap<String, String>,

    /// Namespaces whose cache-ref target has not been loaded yet.
    unresolved_cache_refs: IndexSet<String>,

    /// Cache used by the statements of each namespace, declared or shared.
    namespace_caches: HashMap<String, Arc<CacheConfig>>,

    loaded_resources: IndexSet<String>,
    pub(crate) pending: Pending,
    finished: bool,
}

/// State to restore when a resource fails halfway through loading.
///
/// Symbol tables and pending queues only grow while a resource loads, so
/// their lengths are enough to undo it.
struct Checkpoint {
    statements: usize,
    result_maps: usize,
    parameter_maps: usize,
    caches: usize,
    fragments: usize,
    key_generators: usize,
    cache_refs: IndexMap<String, String>,
    unresolved_cache_refs: IndexSet<String>,
    namespace_caches: HashMap<String, Arc<CacheConfig>>,
    pending: pending::Checkpoint,
}

impl Configuration {
    pub fn builder() -> Builder {
        Builder::default()
    }

    fn new(
        settings: Settings,
        variables: IndexMap<String, String>,
        types: TypeSystem,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> Configuration {
        Configuration {
            settings,
            types,
            variables,
            evaluator,
            statements: Symbols::new("mapped statements"),
            result_maps: Symbols::new("result maps"),
            parameter_maps: Symbols::new("parameter maps"),
            caches: Symbols::new("caches"),
            fragments: Symbols::new("sql fragments"),
            key_generators: Symbols::new("key generators"),
            cache_refs: IndexMap::new(),
            unresolved_cache_refs: IndexSet::new(),
            namespace_caches: HashMap::new(),
            loaded_resources: IndexSet::new(),
            pending: Pending::default(),
            finished: false,
        }
    }

    /// Compiles one mapping document into the symbol table.
    ///
    /// `resource` names the document in errors and guards against loading it
    /// twice; a repeated load registers nothing but still retries pending
    /// work. A resource that fails to compile leaves nothing behind, so a
    /// corrected version can be loaded under the same name.
    pub fn load(&mut self, resource: &str, text: &str) -> Result<()> {
        if self.finished {
            return Err(Error::invalid_mapping(format!(
                "cannot load '{resource}' after the configuration has been finished"
            )));
        }

        if self.loaded_resources.contains(resource) {
            tracing::debug!(resource, "resource already loaded");
        } else {
            let root = XNode::parse(
                text,
                &Variables {
                    values: &self.variables,
                    default_value: self.settings.default_value(),
                },
            )?;

            let checkpoint = self.checkpoint();
            if let Err(err) = crate::builder::load_mapper(self, resource, &root) {
                tracing::debug!(resource, %err, "discarding partially loaded resource");
                self.rollback(checkpoint);
                return Err(err);
            }
            self.loaded_resources.insert(resource.to_string());

            tracing::debug!(
                resource,
                statements = self.statements.len(),
                result_maps = self.result_maps.len(),
                pending = self.pending.len(),
                "loaded mapping resource"
            );
        }

        pending::retry(self, false)
    }

    /// Runs the final retry pass and validates cross references.
    ///
    /// Fails with an unresolved reference error naming the first item that
    /// still cannot be built.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        pending::retry(self, true)?;
        self.validate_references()?;
        self.finished = true;

        tracing::info!(
            resources = self.loaded_resources.len(),
            statements = self.statements.len(),
            result_maps = self.result_maps.len(),
            parameter_maps = self.parameter_maps.len(),
            caches = self.caches.len(),
            fragments = self.fragments.len(),
            "configuration finished"
        );
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_resource_loaded(&self, resource: &str) -> bool {
        self.loaded_resources.contains(resource)
    }

    /// Number of items still waiting for a reference.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    /// Collaborators used to compile and bind SQL.
    pub fn env(&self) -> Env<'_> {
        Env {
            types: &self.types,
            evaluator: &*self.evaluator,
            database_id: self.settings.database_id.as_deref(),
            placeholder: self.settings.placeholder,
            shrink_whitespace: self.settings.shrink_whitespaces_in_sql,
        }
    }

    /// Looks up a statement by full id or unambiguous short name.
    pub fn statement(&self, id: &str) -> Result<&Arc<Statement>> {
        self.statements.lookup(id)
    }

    pub fn statements(&self) -> &Symbols<Arc<Statement>> {
        &self.statements
    }

    pub fn result_map(&self, id: &str) -> Result<&Arc<ResultMap>> {
        self.result_maps.lookup(id)
    }

    pub fn result_maps(&self) -> &Symbols<Arc<ResultMap>> {
        &self.result_maps
    }

    pub fn parameter_map(&self, id: &str) -> Result<&Arc<ParameterMap>> {
        self.parameter_maps.lookup(id)
    }

    pub fn parameter_maps(&self) -> &Symbols<Arc<ParameterMap>> {
        &self.parameter_maps
    }

    pub fn sql_fragment(&self, id: &str) -> Result<&XNode> {
        self.fragments.lookup(id)
    }

    pub fn key_generator(&self, id: &str) -> Result<&KeyGenerator> {
        self.key_generators.lookup(id)
    }

    /// Caches declared by namespaces, keyed by namespace.
    pub fn caches(&self) -> &Symbols<Arc<CacheConfig>> {
        &self.caches
    }

    /// The cache used by statements of `namespace`: its own, or the one it
    /// references.
    pub fn cache(&self, namespace: &str) -> Option<&Arc<CacheConfig>> {
        self.namespace_caches.get(namespace)
    }

    /// The namespace whose cache `namespace` references.
    pub fn cache_ref(&self, namespace: &str) -> Option<&str> {
        self.cache_refs.get(namespace).map(String::as_str)
    }

    /// Binds a parameter object to a statement.
    pub fn bound_sql(&self, statement: &str, parameter: &Value) -> Result<BoundSql> {
        self.statement(statement)?.bound_sql(self, parameter)
    }

    /// The property of `ty` a result column maps onto when none is declared.
    pub fn property_for_column(&self, ty: &TypeName, column: &str) -> Result<Option<String>> {
        let meta = self.types.registry.meta_class(ty)?;
        Ok(meta.find_property(column, self.settings.map_underscore_to_camel_case))
    }

    pub(crate) fn add_statement(&mut self, statement: Statement) -> Result<()> {
        let id = statement.id.clone();
        self.statements.insert(id, Arc::new(statement))
    }

    pub(crate) fn add_parameter_map(&mut self, parameter_map: ParameterMap) -> Result<()> {
        let id = parameter_map.id.clone();
        self.parameter_maps.insert(id, Arc::new(parameter_map))
    }

    pub(crate) fn add_result_map(&mut self, result_map: ResultMap) -> Result<()> {
        let result_map = Arc::new(result_map);
        self.result_maps
            .insert(result_map.id.clone(), result_map.clone())?;

        // A discriminated map nests when any map it can select does.
        if !result_map.has_nested_result_maps() {
            if let Some(discriminator) = &result_map.discriminator {
                let nests = discriminator
                    .discriminator_map
                    .values()
                    .filter_map(|id| self.result_maps.get(id))
                    .any(|target| target.has_nested_result_maps());
                if nests {
                    result_map.force_nested_result_maps();
                }
            }
        }

        if result_map.has_nested_result_maps() {
            for (_, other) in self.result_maps.iter() {
                let selects_new_map = other.discriminator.as_ref().is_some_and(|discriminator| {
                    discriminator
                        .discriminator_map
                        .values()
                        .any(|id| *id == result_map.id)
                });
                if selects_new_map && !other.has_nested_result_maps() {
                    other.force_nested_result_maps();
                }
            }
        }

        Ok(())
    }

    pub(crate) fn add_cache(&mut self, cache: CacheConfig) -> Result<()> {
        let cache = Arc::new(cache);
        let namespace = cache.id.clone();
        self.caches.insert(namespace.clone(), cache.clone())?;
        self.namespace_caches.insert(namespace, cache);
        Ok(())
    }

    pub(crate) fn add_cache_ref(&mut self, namespace: &str, referenced: &str) {
        self.cache_refs
            .insert(namespace.to_string(), referenced.to_string());
        self.unresolved_cache_refs.insert(namespace.to_string());
    }

    /// Points `namespace` at the cache of `referenced` once that one exists.
    /// A cache declared by the namespace itself takes precedence.
    pub(crate) fn resolve_cache_ref(&mut self, namespace: &str, referenced: &str) -> Result<()> {
        let Some(cache) = self.caches.get_exact(referenced).cloned() else {
            return Err(Error::incomplete_element(format!(
                "no cache for namespace '{referenced}' could be found"
            )));
        };

        if self.caches.get_exact(namespace).is_none() {
            self.namespace_caches.insert(namespace.to_string(), cache);
        }
        self.unresolved_cache_refs.shift_remove(namespace);
        Ok(())
    }

    /// The cache statements of `namespace` should use. Fails as incomplete
    /// while the namespace's cache-ref is unresolved.
    pub(crate) fn statement_cache(&self, namespace: &str) -> Result<Option<Arc<CacheConfig>>> {
        if self.unresolved_cache_refs.contains(namespace) {
            return Err(Error::incomplete_element(format!(
                "cache-ref of namespace '{namespace}' is not resolved yet"
            )));
        }
        Ok(self.namespace_caches.get(namespace).cloned())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            statements: self.statements.len(),
            result_maps: self.result_maps.len(),
            parameter_maps: self.parameter_maps.len(),
            caches: self.caches.len(),
            fragments: self.fragments.len(),
            key_generators: self.key_generators.len(),
            cache_refs: self.cache_refs.clone(),
            unresolved_cache_refs: self.unresolved_cache_refs.clone(),
            namespace_caches: self.namespace_caches.clone(),
            pending: self.pending.checkpoint(),
        }
    }

    /// Undoes every registration made since `checkpoint` was taken.
    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.statements.truncate(checkpoint.statements);
        self.result_maps.truncate(checkpoint.result_maps);
        self.parameter_maps.truncate(checkpoint.parameter_maps);
        self.caches.truncate(checkpoint.caches);
        self.fragments.truncate(checkpoint.fragments);
        self.key_generators.truncate(checkpoint.key_generators);
        self.cache_refs = checkpoint.cache_refs;
        self.unresolved_cache_refs = checkpoint.unresolved_cache_refs;
        self.namespace_caches = checkpoint.namespace_caches;
        self.pending.rollback(checkpoint.pending);
    }

    fn validate_references(&self) -> Result<()> {
        for (id, result_map) in self.result_maps.iter() {
            let discriminator = result_map
                .discriminator
                .as_ref()
                .map(|discriminator| &discriminator.result_mapping);

            for mapping in result_map.mappings.iter().chain(discriminator) {
                if let Some(nested) = &mapping.nested_result_map_id {
                    if !self.result_maps.contains(nested) {
                        return Err(Error::unresolved_reference(format!(
                            "result map '{id}' references missing nested result map '{nested}'"
                        )));
                    }
                }
                if let Some(query) = &mapping.nested_query_id {
                    if !self.statements.contains(query) {
                        return Err(Error::unresolved_reference(format!(
                            "result map '{id}' references missing nested query '{query}'"
                        )));
                    }
                }
            }

            if let Some(discriminator) = &result_map.discriminator {
                for (value, target) in &discriminator.discriminator_map {
                    if !self.result_maps.contains(target) {
                        return Err(Error::unresolved_reference(format!(
                            "discriminator case '{value}' of result map '{id}' references missing result map '{target}'"
                        )));
                    }
                }
            }
        }

        for (id, parameter_map) in self.parameter_maps.iter() {
            for mapping in &parameter_map.mappings {
                if let Some(target) = &mapping.result_map_id {
                    if !self.result_maps.contains(target) {
                        return Err(Error::unresolved_reference(format!(
                            "parameter '{}' of parameter map '{id}' references missing result map '{target}'",
                            mapping.property
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
