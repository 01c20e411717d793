use crate::{
    ty::TypeName,
    types::{Converter, ConverterRegistry, JdbcType},
    Error, Result,
};
use indexmap::IndexSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFlag {
    /// Column identifies the row.
    Id,

    /// Value is passed to the constructor instead of a setter.
    Constructor,
}

/// Maps one column (or a group of columns) to one property.
#[derive(Debug, Clone)]
pub struct ResultMapping {
    pub property: Option<String>,
    pub column: Option<String>,
    pub java_type: TypeName,
    pub jdbc_type: Option<JdbcType>,
    pub converter: Option<Arc<dyn Converter>>,
    pub nested_result_map_id: Option<String>,
    pub nested_query_id: Option<String>,
    pub not_null_columns: IndexSet<String>,
    pub column_prefix: Option<String>,
    pub flags: Vec<ResultFlag>,

    /// Sub-mappings for a `{prop=col,...}` column, passed to a nested query.
    pub composites: Vec<ResultMapping>,

    pub result_set: Option<String>,
    pub foreign_column: Option<String>,
    pub lazy: bool,
}

#[derive(Debug)]
pub struct ResultMappingBuilder {
    mapping: ResultMapping,
}

impl ResultMapping {
    pub fn builder(
        property: Option<String>,
        column: Option<String>,
        java_type: TypeName,
    ) -> ResultMappingBuilder {
        ResultMappingBuilder {
            mapping: ResultMapping {
                property,
                column,
                java_type,
                jdbc_type: None,
                converter: None,
                nested_result_map_id: None,
                nested_query_id: None,
                not_null_columns: IndexSet::new(),
                column_prefix: None,
                flags: vec![],
                composites: vec![],
                result_set: None,
                foreign_column: None,
                lazy: false,
            },
        }
    }

    pub fn is_id(&self) -> bool {
        self.flags.contains(&ResultFlag::Id)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(&ResultFlag::Constructor)
    }

    pub fn is_composite(&self) -> bool {
        !self.composites.is_empty()
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    fn describe(&self) -> &str {
        self.property
            .as_deref()
            .or(self.column.as_deref())
            .unwrap_or("<unnamed>")
    }
}

impl ResultMappingBuilder {
    pub fn jdbc_type(mut self, jdbc_type: Option<JdbcType>) -> Self {
        self.mapping.jdbc_type = jdbc_type;
        self
    }

    pub fn converter(mut self, converter: Option<Arc<dyn Converter>>) -> Self {
        self.mapping.converter = converter;
        self
    }

    pub fn nested_result_map_id(mut self, id: Option<String>) -> Self {
        self.mapping.nested_result_map_id = id;
        self
    }

    pub fn nested_query_id(mut self, id: Option<String>) -> Self {
        self.mapping.nested_query_id = id;
        self
    }

    pub fn not_null_columns(mut self, columns: IndexSet<String>) -> Self {
        self.mapping.not_null_columns = columns;
        self
    }

    pub fn column_prefix(mut self, prefix: Option<String>) -> Self {
        self.mapping.column_prefix = prefix;
        self
    }

    pub fn flags(mut self, flags: Vec<ResultFlag>) -> Self {
        self.mapping.flags = flags;
        self
    }

    pub fn composites(mut self, composites: Vec<ResultMapping>) -> Self {
        self.mapping.composites = composites;
        self
    }

    pub fn result_set(mut self, result_set: Option<String>) -> Self {
        self.mapping.result_set = result_set;
        self
    }

    pub fn foreign_column(mut self, column: Option<String>) -> Self {
        self.mapping.foreign_column = column;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.mapping.lazy = lazy;
        self
    }

    pub fn build(mut self, converters: &ConverterRegistry) -> Result<ResultMapping> {
        let mapping = &mut self.mapping;

        if mapping.converter.is_none() {
            mapping.converter = converters
                .lookup(&mapping.java_type, mapping.jdbc_type)
                .cloned();
        }

        if mapping.nested_query_id.is_some() && mapping.nested_result_map_id.is_some() {
            return Err(Error::invalid_mapping(format!(
                "cannot define both a nested query and a nested result map in property '{}'",
                mapping.describe()
            )));
        }

        if mapping.nested_query_id.is_none()
            && mapping.nested_result_map_id.is_none()
            && mapping.converter.is_none()
        {
            return Err(Error::invalid_mapping(format!(
                "no converter found for property '{}' of type '{}'",
                mapping.describe(),
                mapping.java_type
            )));
        }

        if mapping.nested_result_map_id.is_none()
            && mapping.column.is_none()
            && mapping.composites.is_empty()
        {
            return Err(Error::invalid_mapping(format!(
                "mapping is missing column attribute for property '{}'",
                mapping.describe()
            )));
        }

        if mapping.result_set.is_some() {
            let columns = mapping.column.as_deref().map_or(0, |c| c.split(',').count());
            let foreign = mapping
                .foreign_column
                .as_deref()
                .map_or(0, |c| c.split(',').count());
            if columns != foreign {
                return Err(Error::invalid_mapping(format!(
                    "there should be the same number of columns and foreign columns in property '{}'",
                    mapping.describe()
                )));
            }
        }

        Ok(self.mapping)
    }
}
