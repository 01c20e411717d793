use super::JdbcType;
use crate::{
    ty::{builtin, TypeName},
    Error, Result, Value,
};
use indexmap::IndexMap;
use std::{fmt, sync::Arc};

/// Converts values between their in-program and storage representations.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Name used to reference the converter from `typeHandler` attributes.
    fn name(&self) -> &str;

    /// Prepares a parameter value for binding.
    fn to_storage(&self, value: &Value, jdbc_type: Option<JdbcType>) -> Result<Value>;

    /// Turns a column value back into a program value.
    fn from_storage(&self, value: Value) -> Result<Value>;
}

/// Passes values through unchanged, checking the shape when `expected` is set.
#[derive(Debug)]
pub struct IdentityConverter {
    name: String,
    expected: Option<TypeName>,
}

impl IdentityConverter {
    pub fn new(name: &str) -> IdentityConverter {
        IdentityConverter {
            name: name.to_string(),
            expected: None,
        }
    }

    pub fn expecting(ty: &str) -> IdentityConverter {
        IdentityConverter {
            name: ty.to_string(),
            expected: Some(TypeName::new(ty)),
        }
    }

    fn check(&self, value: &Value) -> Result<()> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };

        let actual = value.type_name();
        let widened = matches!(
            (expected.as_str(), actual.as_str()),
            (builtin::I64, builtin::I32) | (builtin::F64, builtin::I32 | builtin::I64)
        );

        if value.is_null() || actual == *expected || widened {
            Ok(())
        } else {
            Err(Error::invalid_mapping(format!(
                "converter '{}' cannot bind a {} value",
                self.name, actual
            )))
        }
    }
}

impl Converter for IdentityConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_storage(&self, value: &Value, _jdbc_type: Option<JdbcType>) -> Result<Value> {
        self.check(value)?;
        Ok(value.clone())
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        Ok(value)
    }
}

/// Converters indexed by program type and storage type, plus by name.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    by_type: IndexMap<TypeName, IndexMap<Option<JdbcType>, Arc<dyn Converter>>>,
    by_name: IndexMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> ConverterRegistry {
        use builtin::*;

        let mut registry = ConverterRegistry {
            by_type: IndexMap::new(),
            by_name: IndexMap::new(),
        };

        for ty in [
            STRING, CHAR, BOOL, I8, I16, I32, I64, F32, F64, DECIMAL, NUMBER, DATE, TIME,
            TIMESTAMP, BYTES,
        ] {
            registry.register(ty, None, Arc::new(IdentityConverter::expecting(ty)));
        }

        // Resolved against the runtime value when bound.
        registry.register(OBJECT, None, Arc::new(IdentityConverter::new("unknown")));

        registry
    }

    /// Registers `converter` for values of `ty`, optionally only for one
    /// storage type. The converter also becomes available by name.
    pub fn register(
        &mut self,
        ty: impl Into<TypeName>,
        jdbc_type: Option<JdbcType>,
        converter: Arc<dyn Converter>,
    ) {
        self.by_name
            .insert(converter.name().to_string(), converter.clone());
        self.by_type
            .entry(ty.into())
            .or_default()
            .insert(jdbc_type, converter);
    }

    /// Registers a converter that is only referenced by name.
    pub fn register_named(&mut self, converter: Arc<dyn Converter>) {
        self.by_name
            .insert(converter.name().to_string(), converter);
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<dyn Converter>> {
        self.by_name.get(name)
    }

    /// Looks up the converter for `ty`, preferring one registered for the
    /// exact storage type, then the type's default, then the only converter
    /// registered for the type if there is exactly one.
    pub fn lookup(&self, ty: &TypeName, jdbc_type: Option<JdbcType>) -> Option<&Arc<dyn Converter>> {
        let by_jdbc = self.by_type.get(ty)?;

        if let Some(converter) = by_jdbc.get(&jdbc_type) {
            return Some(converter);
        }
        if let Some(converter) = by_jdbc.get(&None) {
            return Some(converter);
        }

        let mut iter = by_jdbc.values();
        let first = iter.next()?;
        iter.all(|other| Arc::ptr_eq(first, other)).then_some(first)
    }

    pub fn has_converter(&self, ty: &TypeName) -> bool {
        self.lookup(ty, None).is_some()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
