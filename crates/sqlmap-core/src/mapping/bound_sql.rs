use super::{ParameterMapping, ParameterMode};
use crate::{
    reflect::PropertyTokenizer,
    types::TypeSystem,
    value::MetaValue,
    Result, Value,
};

/// Final SQL for one invocation, with its ordered parameter descriptors.
#[derive(Debug, Clone)]
pub struct BoundSql {
    sql: String,
    parameter_mappings: Vec<ParameterMapping>,
    parameter_object: Value,

    /// Values bound while evaluating the dynamic SQL (`<bind>`, iteration
    /// items). They shadow properties of the parameter object.
    additional_parameters: Value,
}

impl BoundSql {
    pub fn new(sql: String, parameter_mappings: Vec<ParameterMapping>, parameter_object: Value) -> BoundSql {
        BoundSql {
            sql,
            parameter_mappings,
            parameter_object,
            additional_parameters: Value::map(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_mappings(&self) -> &[ParameterMapping] {
        &self.parameter_mappings
    }

    pub fn parameter_object(&self) -> &Value {
        &self.parameter_object
    }

    /// Replaces the parameter mappings, keeping SQL and bindings.
    pub fn with_parameter_mappings(mut self, parameter_mappings: Vec<ParameterMapping>) -> BoundSql {
        self.parameter_mappings = parameter_mappings;
        self
    }

    /// Bindings recorded during evaluation, as a map value.
    pub fn additional_parameters(&self) -> &Value {
        &self.additional_parameters
    }

    pub fn set_additional_parameter(&mut self, name: impl Into<String>, value: Value) {
        if let Value::Map(entries) = &mut self.additional_parameters {
            entries.insert(name.into(), value);
        }
    }

    /// Whether the first segment of `path` was bound during evaluation.
    pub fn has_additional_parameter(&self, path: &str) -> bool {
        let prop = PropertyTokenizer::new(path);
        self.additional_parameters
            .as_map()
            .is_some_and(|entries| entries.contains_key(prop.name()))
    }

    pub fn additional_parameter(&self, types: &TypeSystem, path: &str) -> Result<Value> {
        MetaValue::new(&types.registry, &self.additional_parameters).get(path)
    }

    /// Resolves every input parameter to the value that should be bound,
    /// in placeholder order, applying each mapping's converter.
    pub fn parameter_values(&self, types: &TypeSystem) -> Result<Vec<Value>> {
        let scalar = !self.parameter_object.is_null()
            && types
                .converters
                .has_converter(&self.parameter_object.type_name())
            && !self.parameter_object.type_name().is_object();

        let mut values = Vec::with_capacity(self.parameter_mappings.len());

        for mapping in &self.parameter_mappings {
            if mapping.mode == ParameterMode::Out {
                continue;
            }

            let value = if self.has_additional_parameter(&mapping.property) {
                self.additional_parameter(types, &mapping.property)?
            } else if self.parameter_object.is_null() {
                Value::Null
            } else if scalar {
                self.parameter_object.clone()
            } else {
                MetaValue::new(&types.registry, &self.parameter_object).get(&mapping.property)?
            };

            let value = match &mapping.converter {
                Some(converter) => converter.to_storage(&value, mapping.jdbc_type)?,
                None => value,
            };

            values.push(value);
        }

        Ok(values)
    }
}
