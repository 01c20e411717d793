use crate::{
    ty::TypeName,
    types::{Converter, ConverterRegistry, JdbcType},
    Error, Result,
};
use std::{str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
}

impl FromStr for ParameterMode {
    type Err = Error;

    fn from_str(src: &str) -> Result<ParameterMode> {
        match src {
            "IN" => Ok(ParameterMode::In),
            "OUT" => Ok(ParameterMode::Out),
            "INOUT" => Ok(ParameterMode::InOut),
            _ => Err(Error::invalid_mapping(format!(
                "error resolving parameter mode '{src}'"
            ))),
        }
    }
}

/// One bind parameter: which property feeds it and how it is converted.
#[derive(Debug, Clone)]
pub struct ParameterMapping {
    pub property: String,
    pub mode: ParameterMode,
    pub java_type: TypeName,
    pub jdbc_type: Option<JdbcType>,
    pub numeric_scale: Option<i32>,

    /// `None` only for cursor parameters, which are read through a result map.
    pub converter: Option<Arc<dyn Converter>>,

    pub result_map_id: Option<String>,
    pub jdbc_type_name: Option<String>,
}

#[derive(Debug)]
pub struct ParameterMappingBuilder {
    mapping: ParameterMapping,
}

impl ParameterMapping {
    pub fn builder(property: impl Into<String>, java_type: TypeName) -> ParameterMappingBuilder {
        ParameterMappingBuilder {
            mapping: ParameterMapping {
                property: property.into(),
                mode: ParameterMode::In,
                java_type,
                jdbc_type: None,
                numeric_scale: None,
                converter: None,
                result_map_id: None,
                jdbc_type_name: None,
            },
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self.mode, ParameterMode::Out | ParameterMode::InOut)
    }
}

impl ParameterMappingBuilder {
    pub fn mode(mut self, mode: ParameterMode) -> Self {
        self.mapping.mode = mode;
        self
    }

    pub fn jdbc_type(mut self, jdbc_type: Option<JdbcType>) -> Self {
        self.mapping.jdbc_type = jdbc_type;
        self
    }

    pub fn numeric_scale(mut self, scale: Option<i32>) -> Self {
        self.mapping.numeric_scale = scale;
        self
    }

    pub fn converter(mut self, converter: Option<Arc<dyn Converter>>) -> Self {
        self.mapping.converter = converter;
        self
    }

    pub fn result_map_id(mut self, id: Option<String>) -> Self {
        self.mapping.result_map_id = id;
        self
    }

    pub fn jdbc_type_name(mut self, name: Option<String>) -> Self {
        self.mapping.jdbc_type_name = name;
        self
    }

    pub fn build(mut self, converters: &ConverterRegistry) -> Result<ParameterMapping> {
        let mapping = &mut self.mapping;

        if mapping.java_type == TypeName::cursor() {
            if mapping.result_map_id.is_none() {
                return Err(Error::invalid_mapping(format!(
                    "missing result map in property '{}'; parameters of type cursor require a result map",
                    mapping.property
                )));
            }
            return Ok(self.mapping);
        }

        if mapping.converter.is_none() {
            mapping.converter = converters
                .lookup(&mapping.java_type, mapping.jdbc_type)
                .cloned();
        }

        if mapping.converter.is_none() {
            return Err(Error::invalid_mapping(format!(
                "no converter for parameter property '{}'; none registered for type '{}' and storage type '{}'",
                mapping.property,
                mapping.java_type,
                mapping
                    .jdbc_type
                    .map(JdbcType::as_str)
                    .unwrap_or("unspecified")
            )));
        }

        Ok(self.mapping)
    }
}

/// A named, reusable list of parameter mappings.
#[derive(Debug, Clone)]
pub struct ParameterMap {
    pub id: String,
    pub ty: TypeName,
    pub mappings: Vec<ParameterMapping>,
}
