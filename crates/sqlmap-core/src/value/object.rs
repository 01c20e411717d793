use super::Value;
use crate::ty::TypeName;
use indexmap::IndexMap;
use std::fmt;

/// An instance of a registered type.
///
/// Holds one slot per property. Accessors declared on the type read and
/// write these slots unless they carry their own body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueObject {
    ty: TypeName,
    fields: IndexMap<String, Value>,
}

impl ValueObject {
    pub fn new(ty: impl Into<TypeName>) -> ValueObject {
        ValueObject {
            ty: ty.into(),
            fields: IndexMap::new(),
        }
    }

    /// Sets a slot and returns `self`, for building instances inline.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> ValueObject {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn ty(&self) -> &TypeName {
        &self.ty
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for ValueObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.ty)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}
