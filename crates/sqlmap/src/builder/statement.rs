use super::{defer_missing, include, pending::StatementJob, script, Assistant};
use crate::{
    xml::{XContent, XNode},
    Configuration, Statement,
};
use sqlmap_core::{
    mapping::{
        CacheConfig, CommandKind, KeyGenerator, ParameterMap, ResultMap, ResultSetType,
        StatementType,
    },
    ty::TypeName,
    Error, Result,
};
use sqlmap_sql::SqlSource;
use std::sync::Arc;

const SELECT_KEY_SUFFIX: &str = "!selectKey";

/// Compiles one statement element and registers it.
///
/// Every reference the statement makes is resolved before anything is
/// registered, so a deferred attempt leaves no trace behind.
pub(crate) fn build(config: &mut Configuration, job: &StatementJob) -> Result<()> {
    let node = &job.node;
    let assistant = &job.assistant;
    let id = assistant.apply(node.required("id")?, false)?;

    let required_database_id = job.required_database_id.as_deref();
    if !database_id_matches(config, &id, node.attr("databaseId"), required_database_id) {
        tracing::trace!(%id, "skipping statement declared for another database");
        return Ok(());
    }

    let kind: CommandKind = node.name().parse()?;
    let cache = config.statement_cache(assistant.namespace())?;

    let node = include::expand(config, assistant, node)?;

    let mut select_key = None;
    for candidate in node.elements_named("selectKey") {
        if select_key_matches(config, candidate, select_key) {
            select_key = Some(candidate);
        }
    }

    let select_key = select_key
        .map(|key_node| {
            StatementCompiler {
                config: &*config,
                assistant,
                id: format!("{id}{SELECT_KEY_SUFFIX}"),
                kind: CommandKind::Select,
                cache: None,
            }
            .select_key(key_node, &node)
        })
        .transpose()?;

    let statement = StatementCompiler {
        config: &*config,
        assistant,
        id: id.clone(),
        kind,
        cache,
    }
    .statement(&without_select_keys(&node), required_database_id)?;

    let key_generator = match select_key {
        Some((key_statement, execute_before)) => {
            let key_id = key_statement.id.clone();
            config.add_statement(key_statement)?;
            let generator = KeyGenerator::SelectKey {
                statement_id: key_id.clone(),
                execute_before,
            };
            config.key_generators.insert(key_id, generator.clone())?;
            generator
        }
        None => {
            let use_generated_keys = node
                .bool_attr("useGeneratedKeys")?
                .unwrap_or(config.settings.use_generated_keys && kind.is_insert());
            if use_generated_keys {
                KeyGenerator::Generated
            } else {
                KeyGenerator::None
            }
        }
    };

    tracing::trace!(%id, %kind, dynamic = statement.is_dynamic(), "registering statement");
    config.add_statement(Statement {
        key_generator,
        ..statement
    })
}

/// Whether the element belongs in this pass.
///
/// The pass for the configured database takes elements declaring it; the
/// second pass takes elements declaring none, unless a statement for the
/// database already claimed the id.
fn database_id_matches(
    config: &Configuration,
    id: &str,
    database_id: Option<&str>,
    required_database_id: Option<&str>,
) -> bool {
    match required_database_id {
        Some(required) => database_id == Some(required),
        None => {
            database_id.is_none()
                && !config
                    .statements
                    .get_exact(id)
                    .is_some_and(|previous| previous.database_id.is_some())
                && !config.pending.has_database_statement(id)
        }
    }
}

/// The key for the configured database wins over one declaring no database.
fn select_key_matches(config: &Configuration, candidate: &XNode, current: Option<&XNode>) -> bool {
    let configured = config.settings.database_id.as_deref();

    match candidate.attr("databaseId") {
        Some(database_id) => {
            Some(database_id) == configured
                && !current.is_some_and(|current| current.attr("databaseId").is_some())
        }
        None => current.is_none(),
    }
}

fn without_select_keys(node: &XNode) -> XNode {
    let children = node
        .children()
        .iter()
        .filter(|child| !matches!(child, XContent::Element(element) if element.name() == "selectKey"))
        .cloned()
        .collect();
    node.with_children(children)
}

fn comma_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

struct StatementCompiler<'a> {
    config: &'a Configuration,
    assistant: &'a Assistant,
    id: String,
    kind: CommandKind,
    cache: Option<Arc<CacheConfig>>,
}

impl StatementCompiler<'_> {
    fn statement(&self, node: &XNode, database_id: Option<&str>) -> Result<Statement> {
        let settings = &self.config.settings;
        let is_select = self.kind.is_select();

        let parameter_type = self.config.types.resolve_optional(node.attr("parameterType"))?;
        let result_type = self.config.types.resolve_optional(node.attr("resultType"))?;

        let parameter_map = self.parameter_map(node.attr("parameterMap"), parameter_type.as_ref())?;
        let result_maps = self.result_maps(node.attr("resultMap"), result_type)?;
        let sql_source = self.sql_source(node, parameter_type.as_ref())?;

        Ok(Statement {
            id: self.id.clone(),
            resource: self.assistant.resource().to_string(),
            kind: self.kind,
            statement_type: node
                .parse_attr::<StatementType>("statementType")?
                .unwrap_or_default(),
            result_set_type: node
                .parse_attr::<ResultSetType>("resultSetType")?
                .unwrap_or_default(),
            sql_source,
            parameter_type,
            parameter_map,
            result_maps,
            fetch_size: node.parse_attr("fetchSize")?.or(settings.default_fetch_size),
            timeout: node.parse_attr("timeout")?.or(settings.default_statement_timeout),
            flush_cache_required: node.bool_attr("flushCache")?.unwrap_or(!is_select),
            use_cache: node.bool_attr("useCache")?.unwrap_or(is_select),
            result_ordered: node.bool_attr("resultOrdered")?.unwrap_or(false),
            cache: self.cache.clone(),
            key_generator: KeyGenerator::None,
            key_properties: comma_list(node.attr("keyProperty")),
            key_columns: comma_list(node.attr("keyColumn")),
            database_id: database_id.map(str::to_string),
            result_sets: comma_list(node.attr("resultSets")),
        })
    }

    /// Compiles a `<selectKey>` into the statement that fetches the key.
    /// Also returns whether it runs before the parent statement.
    fn select_key(&self, node: &XNode, parent: &XNode) -> Result<(Statement, bool)> {
        let parameter_type = self.config.types.resolve_optional(parent.attr("parameterType"))?;
        let result_type = self.config.types.resolve_optional(node.attr("resultType"))?;

        let result_maps = self.result_maps(None, result_type)?;
        let sql_source = self.sql_source(node, parameter_type.as_ref())?;

        let execute_before = match node.attr("order") {
            None | Some("AFTER") => false,
            Some("BEFORE") => true,
            Some(order) => {
                return Err(Error::invalid_mapping(format!(
                    "invalid selectKey order '{order}' in '{}', expected BEFORE or AFTER",
                    self.id
                )))
            }
        };

        let statement = Statement {
            id: self.id.clone(),
            resource: self.assistant.resource().to_string(),
            kind: CommandKind::Select,
            statement_type: node
                .parse_attr::<StatementType>("statementType")?
                .unwrap_or_default(),
            result_set_type: ResultSetType::Default,
            sql_source,
            parameter_type,
            parameter_map: None,
            result_maps,
            fetch_size: None,
            timeout: None,
            flush_cache_required: false,
            use_cache: false,
            result_ordered: false,
            cache: None,
            key_generator: KeyGenerator::None,
            key_properties: comma_list(node.attr("keyProperty")),
            key_columns: comma_list(node.attr("keyColumn")),
            database_id: node.attr("databaseId").map(str::to_string),
            result_sets: vec![],
        };

        Ok((statement, execute_before))
    }

    fn sql_source(&self, node: &XNode, parameter_type: Option<&TypeName>) -> Result<SqlSource> {
        let root = script::compile(node)?;

        match node.attr("lang") {
            None | Some("xml") => {}
            Some("raw") if root.is_dynamic() => {
                return Err(Error::invalid_mapping(format!(
                    "dynamic SQL is not allowed in raw statement '{}'",
                    self.id
                )))
            }
            Some("raw") => {}
            Some(lang) => {
                return Err(Error::invalid_mapping(format!(
                    "unknown language driver '{lang}' in statement '{}'",
                    self.id
                )))
            }
        }

        SqlSource::new(&self.config.env(), root, parameter_type)
    }

    fn parameter_map(
        &self,
        parameter_map: Option<&str>,
        parameter_type: Option<&TypeName>,
    ) -> Result<Option<Arc<ParameterMap>>> {
        if let Some(parameter_map) = parameter_map {
            let id = self.assistant.apply(parameter_map, true)?;
            let found = self.config.parameter_maps.lookup(&id).map_err(|err| {
                defer_missing(err, || format!("could not find parameter map '{id}'"))
            })?;
            return Ok(Some(found.clone()));
        }

        Ok(parameter_type.map(|ty| {
            Arc::new(ParameterMap {
                id: format!("{}-Inline", self.id),
                ty: ty.clone(),
                mappings: vec![],
            })
        }))
    }

    fn result_maps(
        &self,
        result_map: Option<&str>,
        result_type: Option<TypeName>,
    ) -> Result<Vec<Arc<ResultMap>>> {
        if let Some(result_map) = result_map {
            return result_map
                .split(',')
                .map(str::trim)
                .map(|name| {
                    let id = self.assistant.apply(name, true)?;
                    let found = self.config.result_maps.lookup(&id).map_err(|err| {
                        defer_missing(err, || format!("could not find result map '{id}'"))
                    })?;
                    Ok(found.clone())
                })
                .collect();
        }

        let Some(result_type) = result_type else {
            return Ok(vec![]);
        };

        let inline = ResultMap::builder(format!("{}-Inline", self.id), result_type, vec![])
            .build(&self.config.types.registry)?;
        Ok(vec![Arc::new(inline)])
    }
}
