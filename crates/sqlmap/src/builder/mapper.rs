use super::{
    pending::{self, CacheRefJob, ResultMapJob, StatementJob},
    Assistant,
};
use crate::{xml::XNode, Configuration};
use indexmap::{IndexMap, IndexSet};
use sqlmap_core::{
    mapping::{
        CacheConfig, Discriminator, ParameterMap, ParameterMapping, ParameterMode, ResultFlag,
        ResultMapping,
    },
    ty::TypeName,
    types::{JdbcType, TypeSystem},
    Error, Result,
};

const STATEMENT_ELEMENTS: [&str; 4] = ["select", "insert", "update", "delete"];

/// Registers everything one `<mapper>` document declares.
pub(crate) fn load_mapper(config: &mut Configuration, resource: &str, root: &XNode) -> Result<()> {
    if root.name() != "mapper" {
        return Err(Error::invalid_mapping(format!(
            "'{resource}' must have a <mapper> root element, found <{}>",
            root.name()
        )));
    }

    let namespace = match root.attr("namespace") {
        Some(namespace) if !namespace.trim().is_empty() => namespace.trim(),
        _ => {
            return Err(Error::invalid_mapping(format!(
                "the mapper in '{resource}' must declare a namespace"
            )))
        }
    };

    tracing::debug!(resource, namespace, "loading mapper");

    MapperBuilder {
        config,
        assistant: Assistant::new(namespace, resource),
    }
    .build(root)
}

struct MapperBuilder<'a> {
    config: &'a mut Configuration,
    assistant: Assistant,
}

impl MapperBuilder<'_> {
    fn build(&mut self, root: &XNode) -> Result<()> {
        for node in root.elements() {
            match node.name() {
                "cache-ref" | "cache" | "parameterMap" | "resultMap" | "sql" => {}
                name if STATEMENT_ELEMENTS.contains(&name) => {}
                name => {
                    return Err(Error::invalid_mapping(format!(
                        "unknown element <{name}> in mapper '{}'",
                        self.assistant.namespace()
                    )))
                }
            }
        }

        if let Some(node) = root.element("cache-ref") {
            self.cache_ref(node)?;
        }

        if let Some(node) = root.element("cache") {
            self.cache(node)?;
        }

        for node in root.elements_named("parameterMap") {
            self.parameter_map(node)?;
        }

        for node in root.elements_named("resultMap") {
            self.result_map(node, &[], None)?;
        }

        let database_id = self.config.settings.database_id.clone();

        let fragments: Vec<_> = root.elements_named("sql").collect();
        if let Some(database_id) = &database_id {
            self.sql_fragments(&fragments, Some(database_id.as_str()))?;
        }
        self.sql_fragments(&fragments, None)?;

        let statements: Vec<_> = root
            .elements()
            .filter(|node| STATEMENT_ELEMENTS.contains(&node.name()))
            .collect();
        if let Some(database_id) = &database_id {
            self.statements(&statements, Some(database_id.as_str()))?;
        }
        self.statements(&statements, None)
    }

    fn types(&self) -> &TypeSystem {
        &self.config.types
    }

    fn cache_ref(&mut self, node: &XNode) -> Result<()> {
        let referenced = node.required("namespace")?;
        let namespace = self.assistant.namespace();

        self.config.add_cache_ref(namespace, referenced);
        pending::attempt(
            self.config,
            CacheRefJob {
                namespace: namespace.to_string(),
                referenced: referenced.to_string(),
                resource: self.assistant.resource().to_string(),
            },
        )
    }

    fn cache(&mut self, node: &XNode) -> Result<()> {
        let mut cache = CacheConfig::new(self.assistant.namespace());

        if let Some(implementation) = node.attr("type") {
            cache.implementation = implementation.to_string();
        }
        if let Some(eviction) = node.attr("eviction") {
            cache.eviction = eviction.to_string();
        }
        cache.flush_interval = node.parse_attr("flushInterval")?;
        cache.size = node.parse_attr("size")?;
        cache.read_write = !node.bool_attr("readOnly")?.unwrap_or(false);
        cache.blocking = node.bool_attr("blocking")?.unwrap_or(false);
        cache.properties = node.children_as_properties()?;

        self.config.add_cache(cache)
    }

    fn parameter_map(&mut self, node: &XNode) -> Result<()> {
        let id = self.assistant.apply(node.required("id")?, false)?;
        let ty = self.types().resolve_alias(node.required("type")?)?;

        let mut mappings = vec![];
        for parameter in node.elements_named("parameter") {
            let property = parameter.required("property")?;
            let jdbc_type = parameter.parse_attr::<JdbcType>("jdbcType")?;

            let java_type = match self.types().resolve_optional(parameter.attr("javaType"))? {
                Some(java_type) => java_type,
                None if jdbc_type == Some(JdbcType::Cursor) => TypeName::cursor(),
                None if self.types().registry.is_assignable_from(&TypeName::map(), &ty) => {
                    TypeName::object()
                }
                None => self.types().registry.meta_class(&ty)?.getter_type(property)?,
            };

            let result_map_id = parameter
                .attr("resultMap")
                .map(|id| self.assistant.apply(id, true))
                .transpose()?;

            let converter = parameter
                .attr("typeHandler")
                .map(|name| self.types().resolve_converter(name))
                .transpose()?;

            let mapping = ParameterMapping::builder(property, java_type)
                .mode(parameter.parse_attr::<ParameterMode>("mode")?.unwrap_or_default())
                .jdbc_type(jdbc_type)
                .numeric_scale(parameter.parse_attr("numericScale")?)
                .converter(converter)
                .result_map_id(result_map_id)
                .build(&self.types().converters)?;

            mappings.push(mapping);
        }

        self.config.add_parameter_map(ParameterMap { id, ty, mappings })
    }

    /// Compiles a `<resultMap>`, or an association, collection or case
    /// declaring its mappings inline, and returns its id.
    ///
    /// `additional` mappings come first; a discriminator case inherits the
    /// mappings of the map enclosing it this way. The id is returned even
    /// when registration has to wait for a parent map.
    fn result_map(
        &mut self,
        node: &XNode,
        additional: &[ResultMapping],
        enclosing: Option<&TypeName>,
    ) -> Result<String> {
        let id = match node.attr("id") {
            Some(id) => self.assistant.apply(id, false)?,
            None => self.assistant.apply(node.value_based_identifier(), false)?,
        };

        let declared_type = ["type", "ofType", "resultType", "javaType"]
            .into_iter()
            .find_map(|name| node.attr(name));
        let ty = match declared_type {
            Some(name) => self.types().resolve_alias(name)?,
            None => self
                .inherit_enclosing_type(node, enclosing)
                .unwrap_or_else(TypeName::object),
        };

        let mut mappings = additional.to_vec();
        let mut discriminator = None;

        for child in node.elements() {
            match child.name() {
                "constructor" => {
                    for arg in child.elements() {
                        let mut flags = vec![ResultFlag::Constructor];
                        if arg.name() == "idArg" {
                            flags.push(ResultFlag::Id);
                        }
                        mappings.push(self.result_mapping(arg, &ty, flags)?);
                    }
                }
                "discriminator" => {
                    discriminator = Some(self.discriminator(child, &ty, &mappings)?);
                }
                "id" => mappings.push(self.result_mapping(child, &ty, vec![ResultFlag::Id])?),
                "result" | "association" | "collection" => {
                    mappings.push(self.result_mapping(child, &ty, vec![])?);
                }
                name => {
                    return Err(Error::invalid_mapping(format!(
                        "unknown element <{name}> in result map '{id}'"
                    )))
                }
            }
        }

        let extends = node
            .attr("extends")
            .map(|parent| self.assistant.apply(parent, true))
            .transpose()?;

        let job = ResultMapJob {
            id: id.clone(),
            resource: self.assistant.resource().to_string(),
            ty,
            extends,
            mappings,
            discriminator,
            auto_mapping: node.bool_attr("autoMapping")?,
        };

        pending::attempt(self.config, job)?;
        Ok(id)
    }

    /// Type of an inline map that declares none: the property's type for an
    /// association, the enclosing map's type for a discriminator case.
    fn inherit_enclosing_type(&self, node: &XNode, enclosing: Option<&TypeName>) -> Option<TypeName> {
        let enclosing = enclosing?;

        match node.name() {
            "association" if node.attr("resultMap").is_none() => {
                let property = node.attr("property")?;
                self.types()
                    .registry
                    .meta_class(enclosing)
                    .and_then(|meta| meta.setter_type(property))
                    .ok()
            }
            "case" => Some(enclosing.clone()),
            _ => None,
        }
    }

    fn result_mapping(
        &mut self,
        node: &XNode,
        enclosing: &TypeName,
        flags: Vec<ResultFlag>,
    ) -> Result<ResultMapping> {
        let property = if flags.contains(&ResultFlag::Constructor) {
            node.attr("name")
        } else {
            node.attr("property")
        };
        let column = node.attr("column");

        let java_type = match self.types().resolve_optional(node.attr("javaType"))? {
            Some(java_type) => java_type,
            None => property
                .and_then(|property| {
                    self.types()
                        .registry
                        .meta_class(enclosing)
                        .and_then(|meta| meta.setter_type(property))
                        .ok()
                })
                .unwrap_or_else(TypeName::object),
        };

        let nested_result_map_id = match node.attr("resultMap") {
            Some(id) => Some(self.assistant.apply(id, true)?),
            None => self.nested_result_map(node, &[], enclosing)?,
        };

        let nested_query_id = node
            .attr("select")
            .map(|id| self.assistant.apply(id, true))
            .transpose()?;

        let converter = node
            .attr("typeHandler")
            .map(|name| self.types().resolve_converter(name))
            .transpose()?;

        let lazy = match node.attr("fetchType") {
            Some(fetch_type) => fetch_type == "lazy",
            None => self.config.settings.lazy_loading_enabled,
        };

        ResultMapping::builder(property.map(str::to_string), column.map(str::to_string), java_type)
            .jdbc_type(node.parse_attr::<JdbcType>("jdbcType")?)
            .converter(converter)
            .nested_result_map_id(nested_result_map_id)
            .nested_query_id(nested_query_id)
            .not_null_columns(column_names(node.attr("notNullColumn")))
            .column_prefix(node.attr("columnPrefix").map(str::to_string))
            .flags(flags)
            .composites(self.composites(column)?)
            .result_set(node.attr("resultSet").map(str::to_string))
            .foreign_column(node.attr("foreignColumn").map(str::to_string))
            .lazy(lazy)
            .build(&self.types().converters)
    }

    /// Compiles the inline map of an association, collection or case that
    /// neither runs a nested query nor reads another result set.
    fn nested_result_map(
        &mut self,
        node: &XNode,
        mappings: &[ResultMapping],
        enclosing: &TypeName,
    ) -> Result<Option<String>> {
        if !matches!(node.name(), "association" | "collection" | "case")
            || node.attr("select").is_some()
            || node.attr("resultSet").is_some()
        {
            return Ok(None);
        }

        if node.name() == "collection" && node.attr("javaType").is_none() {
            if let Some(property) = node.attr("property") {
                let settable = self
                    .types()
                    .registry
                    .meta_class(enclosing)
                    .map(|meta| meta.has_setter(property))
                    .unwrap_or(true);
                if !settable {
                    return Err(Error::invalid_mapping(format!(
                        "ambiguous collection type for property '{property}'; specify 'javaType' or 'resultMap'"
                    )));
                }
            }
        }

        self.result_map(node, mappings, Some(enclosing)).map(Some)
    }

    fn discriminator(
        &mut self,
        node: &XNode,
        enclosing: &TypeName,
        mappings: &[ResultMapping],
    ) -> Result<Discriminator> {
        let java_type = self
            .types()
            .resolve_optional(node.attr("javaType"))?
            .unwrap_or_else(TypeName::object);

        let converter = node
            .attr("typeHandler")
            .map(|name| self.types().resolve_converter(name))
            .transpose()?;

        let result_mapping =
            ResultMapping::builder(None, node.attr("column").map(str::to_string), java_type)
                .jdbc_type(node.parse_attr::<JdbcType>("jdbcType")?)
                .converter(converter)
                .build(&self.types().converters)?;

        let mut discriminator_map = IndexMap::new();
        for case in node.elements() {
            let value = case.required("value")?;
            let target = match case.attr("resultMap") {
                Some(id) => id.to_string(),
                None => self
                    .nested_result_map(case, mappings, enclosing)?
                    .ok_or_else(|| {
                        Error::invalid_mapping(format!(
                            "discriminator case '{value}' must name a result map or declare mappings"
                        ))
                    })?,
            };
            discriminator_map.insert(value.to_string(), self.assistant.apply(&target, true)?);
        }

        Ok(Discriminator {
            result_mapping,
            discriminator_map,
        })
    }

    /// Splits a `{property=column, ...}` column into one mapping per pair.
    fn composites(&self, column: Option<&str>) -> Result<Vec<ResultMapping>> {
        let Some(column) = column.filter(|column| column.contains(['=', ','])) else {
            return Ok(vec![]);
        };

        let tokens: Vec<&str> = column
            .split(['{', '}', '=', ',', ' '])
            .filter(|token| !token.is_empty())
            .collect();

        tokens
            .chunks(2)
            .map(|pair| match pair {
                [property, column] => ResultMapping::builder(
                    Some(property.to_string()),
                    Some(column.to_string()),
                    TypeName::object(),
                )
                .build(&self.types().converters),
                _ => Err(Error::invalid_mapping(format!(
                    "composite column '{column}' must be written as {{property=column, ...}}"
                ))),
            })
            .collect()
    }

    fn sql_fragments(&mut self, nodes: &[&XNode], required_database_id: Option<&str>) -> Result<()> {
        for node in nodes {
            let id = self.assistant.apply(node.required("id")?, false)?;
            let database_id = node.attr("databaseId");

            let matches = match required_database_id {
                Some(required) => database_id == Some(required),
                // Skip when a fragment for the configured database exists.
                None => {
                    database_id.is_none()
                        && !matches!(
                            self.config.fragments.get_exact(&id),
                            Some(previous) if previous.attr("databaseId").is_some()
                        )
                }
            };

            if matches {
                self.config.fragments.insert(id, (*node).clone())?;
            }
        }
        Ok(())
    }

    fn statements(&mut self, nodes: &[&XNode], required_database_id: Option<&str>) -> Result<()> {
        for node in nodes {
            pending::attempt(
                self.config,
                StatementJob {
                    assistant: self.assistant.clone(),
                    node: (*node).clone(),
                    required_database_id: required_database_id.map(str::to_string),
                },
            )?;
        }
        Ok(())
    }
}

/// `a,b` or `{a,b}` into a set of column names.
fn column_names(columns: Option<&str>) -> IndexSet<String> {
    let Some(columns) = columns else {
        return IndexSet::new();
    };

    if columns.contains(',') {
        columns
            .split(['{', '}', ',', ' '])
            .filter(|column| !column.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        IndexSet::from([columns.to_string()])
    }
}
