use crate::{DynamicContext, Env, ParameterExpression, Placeholder, SqlNode};
use indexmap::IndexMap;
use sqlmap_core::{
    mapping::{BoundSql, ParameterMapping, ParameterMode},
    parsing::TokenScanner,
    reflect::PropertyTokenizer,
    ty::TypeName,
    types::JdbcType,
    value::MetaValue,
    Error, Result, Value,
};

/// A statement's SQL, ready to be bound to a parameter object.
#[derive(Debug, Clone)]
pub enum SqlSource {
    /// No dynamic nodes: placeholders were compiled once, at load time.
    Static(StaticSqlSource),

    /// Re-evaluated on every invocation.
    Dynamic(SqlNode),
}

/// SQL with bind markers and the parameter mappings that feed them.
#[derive(Debug, Clone)]
pub struct StaticSqlSource {
    sql: String,
    parameter_mappings: Vec<ParameterMapping>,
}

impl SqlSource {
    /// Compiles `root`. A tree without dynamic nodes is rendered and its
    /// placeholders compiled right away against `parameter_type`.
    pub fn new(env: &Env<'_>, root: SqlNode, parameter_type: Option<&TypeName>) -> Result<SqlSource> {
        if root.is_dynamic() {
            return Ok(SqlSource::Dynamic(root));
        }

        let parameter = Value::Null;
        let mut cx = DynamicContext::new(*env, &parameter);
        root.apply(&mut cx)?;

        let parameter_type = parameter_type.cloned().unwrap_or_else(TypeName::object);
        let source = SqlSourceBuilder::new(env).parse(cx.sql(), &parameter_type, &IndexMap::new())?;
        Ok(SqlSource::Static(source))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, SqlSource::Dynamic(_))
    }

    pub fn bound_sql(&self, env: &Env<'_>, parameter: &Value) -> Result<BoundSql> {
        match self {
            SqlSource::Static(source) => Ok(source.bound_sql(parameter.clone())),
            SqlSource::Dynamic(root) => {
                let mut cx = DynamicContext::new(*env, parameter);
                root.apply(&mut cx)?;
                let (sql, bindings) = cx.into_parts();

                let parameter_type = match parameter {
                    Value::Null => TypeName::object(),
                    other => other.type_name(),
                };

                let source = SqlSourceBuilder::new(env).parse(&sql, &parameter_type, &bindings)?;
                let mut bound = source.bound_sql(parameter.clone());
                for (name, value) in bindings {
                    bound.set_additional_parameter(name, value);
                }

                tracing::trace!(
                    sql = bound.sql(),
                    parameters = bound.parameter_mappings().len(),
                    "bound dynamic sql"
                );
                Ok(bound)
            }
        }
    }
}

impl StaticSqlSource {
    pub fn new(sql: String, parameter_mappings: Vec<ParameterMapping>) -> StaticSqlSource {
        StaticSqlSource {
            sql,
            parameter_mappings,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_mappings(&self) -> &[ParameterMapping] {
        &self.parameter_mappings
    }

    pub fn bound_sql(&self, parameter: Value) -> BoundSql {
        BoundSql::new(self.sql.clone(), self.parameter_mappings.clone(), parameter)
    }
}

/// Replaces every `#{...}` with a bind marker and builds the matching
/// parameter mapping.
#[derive(Debug)]
pub struct SqlSourceBuilder<'a, 'b> {
    env: &'a Env<'b>,
}

impl<'a, 'b> SqlSourceBuilder<'a, 'b> {
    pub fn new(env: &'a Env<'b>) -> SqlSourceBuilder<'a, 'b> {
        SqlSourceBuilder { env }
    }

    /// `additional` holds values bound during evaluation. A placeholder whose
    /// root names one of them takes that value's runtime type.
    pub fn parse(
        &self,
        sql: &str,
        parameter_type: &TypeName,
        additional: &IndexMap<String, Value>,
    ) -> Result<StaticSqlSource> {
        let additional = Value::Map(additional.clone());
        let mut mappings = vec![];

        let sql = TokenScanner::parameters().parse(sql, |content| {
            let mapping = self.parameter_mapping(content, parameter_type, &additional)?;
            mappings.push(mapping);
            Ok(Placeholder(mappings.len()).render(self.env.placeholder))
        })?;

        let sql = if self.env.shrink_whitespace {
            shrink_whitespace(&sql)
        } else {
            sql
        };

        Ok(StaticSqlSource::new(sql, mappings))
    }

    fn parameter_mapping(
        &self,
        content: &str,
        parameter_type: &TypeName,
        additional: &Value,
    ) -> Result<ParameterMapping> {
        let types = self.env.types;
        let attrs = ParameterExpression::parse(content)?;

        if attrs.expression().is_some() {
            return Err(Error::unsupported_feature(
                "expression based parameters are not supported yet",
            ));
        }

        let property = attrs.property();
        if let Some(property) = property {
            PropertyTokenizer::parse(property)?;
        }
        let meta_additional = MetaValue::new(&types.registry, additional);

        let property_type = match property {
            Some(property) if meta_additional.has_getter(property) => {
                meta_additional.getter_type(property)?
            }
            _ if types.converters.has_converter(parameter_type) => parameter_type.clone(),
            _ if attrs.get("jdbcType") == Some(JdbcType::Cursor.as_str()) => TypeName::cursor(),
            None => TypeName::object(),
            Some(_) if types.registry.is_assignable_from(&TypeName::map(), parameter_type) => {
                TypeName::object()
            }
            Some(property) => match types.registry.meta_class(parameter_type) {
                Ok(meta) if meta.has_getter(property) => meta.getter_type(property)?,
                _ => TypeName::object(),
            },
        };

        let java_type = match attrs.get("javaType") {
            Some(name) => types.resolve_alias(name)?,
            None => property_type,
        };

        let mut builder = ParameterMapping::builder(property.unwrap_or_default(), java_type);

        if let Some(jdbc_type) = attrs.get("jdbcType") {
            builder = builder.jdbc_type(Some(jdbc_type.parse()?));
        }
        if let Some(mode) = attrs.get("mode") {
            builder = builder.mode(mode.parse::<ParameterMode>()?);
        }
        if let Some(scale) = attrs.get("numericScale") {
            builder = builder.numeric_scale(Some(scale.parse()?));
        }
        if let Some(result_map) = attrs.get("resultMap") {
            builder = builder.result_map_id(Some(result_map.to_string()));
        }
        if let Some(name) = attrs.get("jdbcTypeName") {
            builder = builder.jdbc_type_name(Some(name.to_string()));
        }
        if let Some(name) = attrs.get("typeHandler") {
            builder = builder.converter(Some(types.resolve_converter(name)?));
        }

        builder.build(&types.converters)
    }
}

/// Collapses every run of whitespace into a single space.
pub(crate) fn shrink_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
