use crate::Configuration;
use sqlmap_core::{
    mapping::{
        BoundSql, CacheConfig, CommandKind, KeyGenerator, ParameterMap, ResultMap, ResultSetType,
        StatementType,
    },
    ty::TypeName,
    Result, Value,
};
use sqlmap_sql::SqlSource;
use std::sync::Arc;

/// A compiled `<select>`, `<insert>`, `<update>` or `<delete>`.
#[derive(Debug)]
pub struct Statement {
    /// Fully qualified id, `namespace.id`.
    pub id: String,

    /// The resource that declared the statement.
    pub resource: String,

    pub kind: CommandKind,
    pub statement_type: StatementType,
    pub result_set_type: ResultSetType,
    pub sql_source: SqlSource,
    pub parameter_type: Option<TypeName>,

    /// Declared with `parameterMap`, or the inline map built from
    /// `parameterType`.
    pub parameter_map: Option<Arc<ParameterMap>>,

    pub result_maps: Vec<Arc<ResultMap>>,
    pub fetch_size: Option<u32>,
    pub timeout: Option<u32>,
    pub flush_cache_required: bool,
    pub use_cache: bool,
    pub result_ordered: bool,
    pub cache: Option<Arc<CacheConfig>>,
    pub key_generator: KeyGenerator,
    pub key_properties: Vec<String>,
    pub key_columns: Vec<String>,
    pub database_id: Option<String>,
    pub result_sets: Vec<String>,
}

impl Statement {
    pub fn is_dynamic(&self) -> bool {
        self.sql_source.is_dynamic()
    }

    /// True when any of the result maps nests another result map.
    pub fn has_nested_result_maps(&self) -> bool {
        self.result_maps
            .iter()
            .any(|result_map| result_map.has_nested_result_maps())
    }

    /// Renders the SQL for one invocation.
    ///
    /// When the SQL has no `#{}` placeholders of its own, the declared
    /// parameter map supplies the parameter list.
    pub fn bound_sql(&self, config: &Configuration, parameter: &Value) -> Result<BoundSql> {
        let bound = self.sql_source.bound_sql(&config.env(), parameter)?;

        match &self.parameter_map {
            Some(parameter_map)
                if bound.parameter_mappings().is_empty() && !parameter_map.mappings.is_empty() =>
            {
                Ok(bound.with_parameter_mappings(parameter_map.mappings.clone()))
            }
            _ => Ok(bound),
        }
    }
}
