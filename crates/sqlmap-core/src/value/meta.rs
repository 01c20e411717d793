use super::Value;
use crate::{
    reflect::{PropertyTokenizer, TypeRegistry},
    ty::TypeName,
    Error, Result,
};

/// Reads property paths from a runtime value.
///
/// Maps are navigated by key, instances of registered types through their
/// reflector, lists by index. A null anywhere along the path makes the whole
/// path null.
#[derive(Debug, Clone, Copy)]
pub struct MetaValue<'a> {
    registry: &'a TypeRegistry,
    value: &'a Value,
}

impl<'a> MetaValue<'a> {
    pub fn new(registry: &'a TypeRegistry, value: &'a Value) -> MetaValue<'a> {
        MetaValue { registry, value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn get(&self, path: &str) -> Result<Value> {
        let prop = PropertyTokenizer::parse(path)?;
        let current = self.segment(&prop)?;

        match prop.children() {
            Some(children) if !current.is_null() => {
                MetaValue::new(self.registry, &current).get(children)
            }
            _ => Ok(current),
        }
    }

    /// Whether `path` can be read. Map keys must exist; object properties
    /// must have a getter.
    pub fn has_getter(&self, path: &str) -> bool {
        let prop = PropertyTokenizer::new(path);

        match self.value {
            Value::Map(entries) => match prop.children() {
                Some(children) => match entries.get(prop.indexed_name()) {
                    Some(child) if !child.is_null() => {
                        MetaValue::new(self.registry, child).has_getter(children)
                    }
                    Some(_) => true,
                    None => self.segment(&prop).is_ok_and(|child| {
                        !child.is_null() && MetaValue::new(self.registry, &child).has_getter(children)
                    }),
                },
                None => entries.contains_key(prop.name()),
            },
            Value::Object(object) => {
                let Ok(meta) = self.registry.meta_class(object.ty()) else {
                    return object.field(prop.name()).is_some();
                };
                if !meta.reflector().has_getter(prop.name()) {
                    return false;
                }
                match prop.children() {
                    Some(children) => match self.segment(&prop) {
                        Ok(child) if child.is_null() => meta.has_getter(path),
                        Ok(child) => MetaValue::new(self.registry, &child).has_getter(children),
                        Err(_) => false,
                    },
                    None => true,
                }
            }
            _ => false,
        }
    }

    /// The type of the value at `path`.
    ///
    /// For maps this is the runtime type of the stored value; for objects the
    /// declared getter type.
    pub fn getter_type(&self, path: &str) -> Result<TypeName> {
        let prop = PropertyTokenizer::new(path);

        match self.value {
            Value::Object(object) if self.registry.contains(object.ty()) => {
                let child = self.segment(&prop)?;
                match prop.children() {
                    Some(children) if !child.is_null() => {
                        MetaValue::new(self.registry, &child).getter_type(children)
                    }
                    _ => self.registry.meta_class(object.ty())?.getter_type(path),
                }
            }
            _ => {
                let child = self.segment(&prop)?;
                match prop.children() {
                    Some(children) if !child.is_null() => {
                        MetaValue::new(self.registry, &child).getter_type(children)
                    }
                    Some(_) => Ok(TypeName::object()),
                    None => Ok(child.type_name()),
                }
            }
        }
    }

    /// Resolves one segment, including its index if present.
    fn segment(&self, prop: &PropertyTokenizer<'_>) -> Result<Value> {
        let base = match self.value {
            Value::Null => return Ok(Value::Null),
            Value::Map(entries) => entries.get(prop.name()).cloned().unwrap_or_default(),
            Value::Object(object) => match self.registry.reflector(object.ty()) {
                Ok(reflector) => reflector.get_invoker(prop.name())?.get(self.value)?,
                Err(_) => object.field(prop.name()).cloned().unwrap_or_default(),
            },
            other => {
                return Err(Error::reflection(format!(
                    "there is no getter for property named '{}' in '{}'",
                    prop.name(),
                    other.type_name()
                )))
            }
        };

        match prop.index() {
            Some(index) => collection_value(prop.name(), &base, index),
            None => Ok(base),
        }
    }
}

fn collection_value(name: &str, collection: &Value, index: &str) -> Result<Value> {
    match collection {
        Value::Map(entries) => Ok(entries.get(index).cloned().unwrap_or_default()),
        Value::List(items) => {
            let i: usize = index.trim().parse().map_err(|_| {
                Error::reflection(format!("invalid list index '{index}' for property '{name}'"))
            })?;
            Ok(items.get(i).cloned().unwrap_or_default())
        }
        Value::Null => Ok(Value::Null),
        other => Err(Error::reflection(format!(
            "the '{name}' property of {} is not a list or map",
            other.type_name()
        ))),
    }
}
