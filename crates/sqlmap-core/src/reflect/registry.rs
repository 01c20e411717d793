use super::{ClassDef, MetaClass, Reflector, ReflectorFactory};
use crate::{
    ty::{builtin, TypeName, TypeRef},
    Error, Result,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Every type the mapper can introspect, plus the per-type reflector cache.
///
/// Populated during the single-threaded load phase; afterwards only the
/// reflector cache changes, and it does so through interior locking.
#[derive(Debug)]
pub struct TypeRegistry {
    classes: IndexMap<TypeName, Arc<ClassDef>>,
    reflectors: ReflectorFactory,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        let mut registry = TypeRegistry {
            classes: IndexMap::new(),
            reflectors: ReflectorFactory::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        use builtin::*;

        let mut insert = |class: ClassDef| {
            self.classes.insert(class.name.clone(), Arc::new(class));
        };

        insert(ClassDef::new(OBJECT));
        insert(ClassDef::new(NUMBER).extends(OBJECT));

        for name in [I8, I16, I32, I64, F32, F64, DECIMAL] {
            insert(ClassDef::new(name).extends(NUMBER));
        }

        for name in [STRING, CHAR, BOOL, DATE, TIME, TIMESTAMP, BYTES, CURSOR] {
            insert(ClassDef::new(name).extends(OBJECT));
        }

        insert(ClassDef::interface(COLLECTION).type_param("E", []));
        for name in [LIST, SET] {
            insert(
                ClassDef::interface(name)
                    .type_param("E", [])
                    .implements(TypeRef::parameterized(COLLECTION, [TypeRef::var("E")])),
            );
        }
        insert(
            ClassDef::interface(MAP)
                .type_param("K", [])
                .type_param("V", []),
        );
    }

    /// Registers a type. Redeclaring a known name is an error.
    pub fn register(&mut self, class: ClassDef) -> Result<()> {
        if self.classes.contains_key(&class.name) {
            return Err(Error::redefinition("types", class.name.as_str()));
        }

        tracing::trace!(ty = %class.name, "registering type");
        self.classes.insert(class.name.clone(), Arc::new(class));
        Ok(())
    }

    pub fn get(&self, name: &TypeName) -> Option<&Arc<ClassDef>> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.classes.contains_key(name)
    }

    pub(crate) fn expect(&self, name: &TypeName) -> Result<&Arc<ClassDef>> {
        self.classes
            .get(name)
            .ok_or_else(|| Error::reflection(format!("type '{name}' is not registered")))
    }

    /// Returns `true` if a value of type `source` can be used where `target`
    /// is expected, following declared superclasses and interfaces.
    pub fn is_assignable_from(&self, target: &TypeName, source: &TypeName) -> bool {
        if target == source || target.is_object() {
            return true;
        }

        let mut stack = vec![source.clone()];
        let mut seen = vec![];

        while let Some(current) = stack.pop() {
            if &current == target {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            if let Some(class) = self.classes.get(&current) {
                stack.extend(class.supertypes().map(TypeRef::raw));
            }
            seen.push(current);
        }

        false
    }

    pub fn is_collection(&self, ty: &TypeName) -> bool {
        self.is_assignable_from(&TypeName::new(builtin::COLLECTION), ty)
    }

    pub fn set_reflector_cache_enabled(&mut self, enabled: bool) {
        self.reflectors.set_cache_enabled(enabled);
    }

    pub fn reflectors(&self) -> &ReflectorFactory {
        &self.reflectors
    }

    /// Returns the accessor descriptor for `ty`, building it on first use.
    pub fn reflector(&self, ty: &TypeName) -> Result<Arc<Reflector>> {
        self.reflectors.find_for_type(self, ty)
    }

    pub fn meta_class(&self, ty: &TypeName) -> Result<MetaClass<'_>> {
        MetaClass::for_type(self, ty)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
