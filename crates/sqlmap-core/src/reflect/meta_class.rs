use super::{PropertyTokenizer, Reflector, TypeRegistry};
use crate::{
    ty::{TypeName, TypeRef},
    Result,
};
use std::sync::Arc;

/// Resolves dotted and indexed property paths against a type.
///
/// `orders[0].total` on `Customer` goes through the `orders` getter, takes
/// the collection's element type because of the index, then asks that type
/// for `total`.
#[derive(Debug, Clone)]
pub struct MetaClass<'a> {
    registry: &'a TypeRegistry,
    reflector: Arc<Reflector>,
}

impl<'a> MetaClass<'a> {
    pub fn for_type(registry: &'a TypeRegistry, ty: &TypeName) -> Result<MetaClass<'a>> {
        Ok(MetaClass {
            registry,
            reflector: registry.reflector(ty)?,
        })
    }

    pub fn ty(&self) -> &TypeName {
        self.reflector.ty()
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    /// A meta class for the getter type of a single, unindexed property.
    pub fn meta_class_for_property(&self, name: &str) -> Result<MetaClass<'a>> {
        let ty = self.reflector.getter_type(name)?;
        MetaClass::for_type(self.registry, &ty)
    }

    fn meta_class_for_segment(&self, prop: &PropertyTokenizer<'_>) -> Result<MetaClass<'a>> {
        let ty = self.segment_getter_type(prop)?;
        MetaClass::for_type(self.registry, &ty)
    }

    /// Canonicalizes `name` against the declared property names, ignoring
    /// case. With `use_camel_case_mapping`, underscores are dropped first so
    /// `first_name` finds `firstName`.
    pub fn find_property(&self, name: &str, use_camel_case_mapping: bool) -> Option<String> {
        let name = if use_camel_case_mapping {
            name.replace('_', "")
        } else {
            name.to_string()
        };

        let mut builder = String::new();
        self.build_property(&name, &mut builder);
        if builder.is_empty() {
            None
        } else {
            Some(builder)
        }
    }

    fn build_property(&self, name: &str, builder: &mut String) {
        let prop = PropertyTokenizer::new(name);

        match prop.children() {
            Some(children) => {
                let Some(property) = self.reflector.find_property_name(prop.name()) else {
                    return;
                };
                builder.push_str(property);
                builder.push('.');
                if let Ok(meta) = self.meta_class_for_property(property) {
                    meta.build_property(children, builder);
                }
            }
            None => {
                if let Some(property) = self.reflector.find_property_name(name) {
                    builder.push_str(property);
                }
            }
        }
    }

    pub fn getter_names(&self) -> &[String] {
        self.reflector.readable_property_names()
    }

    pub fn setter_names(&self) -> &[String] {
        self.reflector.writable_property_names()
    }

    pub fn setter_type(&self, name: &str) -> Result<TypeName> {
        let prop = PropertyTokenizer::new(name);
        match prop.children() {
            Some(children) => self
                .meta_class_for_property(prop.name())?
                .setter_type(children),
            None => self.reflector.setter_type(prop.name()),
        }
    }

    pub fn getter_type(&self, name: &str) -> Result<TypeName> {
        let prop = PropertyTokenizer::new(name);
        match prop.children() {
            Some(children) => self.meta_class_for_segment(&prop)?.getter_type(children),
            None => self.segment_getter_type(&prop),
        }
    }

    /// The type of one path segment. An indexed segment on a collection
    /// property yields the element type from the getter's generic signature.
    fn segment_getter_type(&self, prop: &PropertyTokenizer<'_>) -> Result<TypeName> {
        let ty = self.reflector.getter_type(prop.name())?;

        if prop.index().is_some() && self.registry.is_collection(&ty) {
            let generic = self.reflector.generic_getter_type(prop.name())?;
            if let [element] = generic.args() {
                match element {
                    TypeRef::Class(name) | TypeRef::Parameterized { raw: name, .. } => {
                        return Ok(name.clone())
                    }
                    _ => {}
                }
            }
        }

        Ok(ty)
    }

    pub fn has_setter(&self, name: &str) -> bool {
        let prop = PropertyTokenizer::new(name);
        match prop.children() {
            Some(children) => {
                self.reflector.has_setter(prop.name())
                    && self
                        .meta_class_for_property(prop.name())
                        .is_ok_and(|meta| meta.has_setter(children))
            }
            None => self.reflector.has_setter(prop.name()),
        }
    }

    pub fn has_getter(&self, name: &str) -> bool {
        let prop = PropertyTokenizer::new(name);
        match prop.children() {
            Some(children) => {
                self.reflector.has_getter(prop.name())
                    && self
                        .meta_class_for_segment(&prop)
                        .is_ok_and(|meta| meta.has_getter(children))
            }
            None => self.reflector.has_getter(prop.name()),
        }
    }

    pub fn has_default_constructor(&self) -> bool {
        self.reflector.has_default_constructor()
    }
}
