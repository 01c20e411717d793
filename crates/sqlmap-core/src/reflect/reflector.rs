use super::{
    class::{ClassDef, ClassKind, MethodBody, MethodDef},
    property, resolver, TypeRegistry,
};
use crate::{
    ty::{TypeName, TypeRef},
    Error, Result, Value,
};
use indexmap::{map::Entry, IndexMap};
use std::{collections::HashMap, sync::Arc};

/// Cached accessor bindings for one type.
///
/// Built from the type's methods (including everything inherited from its
/// superclasses and interfaces) and then its fields. Naming conflicts
/// between overloaded or covariant accessors are settled at build time; a
/// conflict with no winner leaves an [`Invoker::Ambiguous`] in place that
/// fails when it is used.
#[derive(Debug)]
pub struct Reflector {
    ty: TypeName,
    readable: Vec<String>,
    writable: Vec<String>,
    get_methods: IndexMap<String, Invoker>,
    set_methods: IndexMap<String, Invoker>,
    get_types: IndexMap<String, TypeRef>,
    set_types: IndexMap<String, TypeRef>,
    default_constructor: bool,
    case_insensitive: HashMap<String, String>,
}

/// Reads or writes one property of an instance.
#[derive(Debug, Clone)]
pub enum Invoker {
    /// An accessor method. Without a body it uses the slot named `property`.
    Method {
        method: String,
        property: String,
        body: Option<MethodBody>,
    },
    GetField(String),
    SetField(String),
    Ambiguous(Arc<str>),
}

/// A method together with the type that declared it.
struct DeclaredMethod {
    declaring: TypeName,
    method: MethodDef,
}

impl Reflector {
    pub fn build(registry: &TypeRegistry, ty: &TypeName) -> Result<Reflector> {
        let class = registry.expect(ty)?;
        let src = TypeRef::Class(ty.clone());

        let mut reflector = Reflector {
            ty: ty.clone(),
            readable: vec![],
            writable: vec![],
            get_methods: IndexMap::new(),
            set_methods: IndexMap::new(),
            get_types: IndexMap::new(),
            set_types: IndexMap::new(),
            default_constructor: class.kind == super::ClassKind::Class
                && class.default_constructor().is_some(),
            case_insensitive: HashMap::new(),
        };

        let methods = collect_methods(registry, class);
        reflector.add_get_methods(registry, &src, &methods)?;
        reflector.add_set_methods(registry, &src, &methods)?;
        reflector.add_fields(registry, &src, class);

        reflector.readable = reflector.get_methods.keys().cloned().collect();
        reflector.writable = reflector.set_methods.keys().cloned().collect();

        for name in reflector.readable.iter().chain(reflector.writable.iter()) {
            reflector
                .case_insensitive
                .insert(name.to_uppercase(), name.clone());
        }

        tracing::trace!(
            ty = %reflector.ty,
            readable = reflector.readable.len(),
            writable = reflector.writable.len(),
            "built reflector"
        );

        Ok(reflector)
    }

    fn add_get_methods(
        &mut self,
        registry: &TypeRegistry,
        src: &TypeRef,
        methods: &[DeclaredMethod],
    ) -> Result<()> {
        let mut conflicting: IndexMap<String, Vec<&DeclaredMethod>> = IndexMap::new();

        for declared in methods {
            let method = &declared.method;
            if method.params.is_empty() && method.ret.is_some() && property::is_getter(&method.name)
            {
                let name = property::method_to_property(&method.name)?;
                conflicting.entry(name).or_default().push(declared);
            }
        }

        for (name, candidates) in conflicting {
            let mut winner: Option<&DeclaredMethod> = None;
            let mut ambiguous = false;

            for candidate in candidates {
                let Some(current) = winner else {
                    winner = Some(candidate);
                    continue;
                };

                let winner_ty = return_type(registry, src, current).raw();
                let candidate_ty = return_type(registry, src, candidate).raw();

                if candidate_ty == winner_ty {
                    if !candidate_ty.is_bool() {
                        ambiguous = true;
                        break;
                    } else if candidate.method.name.starts_with("is") {
                        winner = Some(candidate);
                    }
                } else if registry.is_assignable_from(&candidate_ty, &winner_ty) {
                    // The current winner is already the more specific type
                } else if registry.is_assignable_from(&winner_ty, &candidate_ty) {
                    winner = Some(candidate);
                } else {
                    ambiguous = true;
                    break;
                }
            }

            if let Some(winner) = winner {
                self.add_get_method(registry, src, name, winner, ambiguous);
            }
        }

        Ok(())
    }

    fn add_get_method(
        &mut self,
        registry: &TypeRegistry,
        src: &TypeRef,
        name: String,
        declared: &DeclaredMethod,
        ambiguous: bool,
    ) {
        if !property::is_valid_property_name(&name) {
            return;
        }

        let invoker = if ambiguous {
            Invoker::Ambiguous(
                format!(
                    "illegal overloaded getter method with ambiguous type for property '{}' in '{}'",
                    name, self.ty
                )
                .into(),
            )
        } else {
            Invoker::Method {
                method: declared.method.name.clone(),
                property: name.clone(),
                body: declared.method.body.clone(),
            }
        };

        self.get_types
            .insert(name.clone(), return_type(registry, src, declared));
        self.get_methods.insert(name, invoker);
    }

    fn add_set_methods(
        &mut self,
        registry: &TypeRegistry,
        src: &TypeRef,
        methods: &[DeclaredMethod],
    ) -> Result<()> {
        let mut conflicting: IndexMap<String, Vec<&DeclaredMethod>> = IndexMap::new();

        for declared in methods {
            let method = &declared.method;
            if method.params.len() == 1 && property::is_setter(&method.name) {
                let name = property::method_to_property(&method.name)?;
                conflicting.entry(name).or_default().push(declared);
            }
        }

        for (name, setters) in conflicting {
            let getter_ty = self.get_types.get(&name).map(TypeRef::raw);
            let getter_ambiguous = matches!(self.get_methods.get(&name), Some(Invoker::Ambiguous(_)));
            let mut setter_ambiguous = false;
            let mut matched: Option<&DeclaredMethod> = None;

            for setter in setters {
                let param_ty = param_type(registry, src, setter).raw();
                if !getter_ambiguous && getter_ty.as_ref() == Some(&param_ty) {
                    matched = Some(setter);
                    break;
                }
                if !setter_ambiguous {
                    matched = self.pick_better_setter(registry, src, matched, setter, &name);
                    setter_ambiguous = matched.is_none();
                }
            }

            if let Some(setter) = matched {
                self.add_set_method(registry, src, name, setter);
            }
        }

        Ok(())
    }

    fn pick_better_setter<'m>(
        &mut self,
        registry: &TypeRegistry,
        src: &TypeRef,
        current: Option<&'m DeclaredMethod>,
        candidate: &'m DeclaredMethod,
        name: &str,
    ) -> Option<&'m DeclaredMethod> {
        let Some(current) = current else {
            return Some(candidate);
        };

        let current_ty = param_type(registry, src, current);
        let candidate_ty = param_type(registry, src, candidate);

        if registry.is_assignable_from(&current_ty.raw(), &candidate_ty.raw()) {
            return Some(candidate);
        }
        if registry.is_assignable_from(&candidate_ty.raw(), &current_ty.raw()) {
            return Some(current);
        }

        let message = format!(
            "ambiguous setters defined for property '{}' in '{}' with types '{}' and '{}'",
            name,
            self.ty,
            current_ty.raw(),
            candidate_ty.raw()
        );
        self.set_methods
            .insert(name.to_string(), Invoker::Ambiguous(message.into()));
        self.set_types.insert(name.to_string(), current_ty);
        None
    }

    fn add_set_method(
        &mut self,
        registry: &TypeRegistry,
        src: &TypeRef,
        name: String,
        declared: &DeclaredMethod,
    ) {
        if !property::is_valid_property_name(&name) {
            return;
        }

        self.set_types
            .insert(name.clone(), param_type(registry, src, declared));
        self.set_methods.insert(
            name.clone(),
            Invoker::Method {
                method: declared.method.name.clone(),
                property: name,
                body: declared.method.body.clone(),
            },
        );
    }

    /// Fields fill in whatever the methods left unclaimed, walking up the
    /// superclass chain.
    fn add_fields(&mut self, registry: &TypeRegistry, src: &TypeRef, class: &Arc<ClassDef>) {
        let mut current = Some(class.clone());
        let mut visited = vec![];

        while let Some(class) = current {
            if visited.contains(&class.name) {
                break;
            }

            for field in &class.fields {
                if !property::is_valid_property_name(&field.name) {
                    continue;
                }

                let ty = resolver::resolve_type(registry, &field.ty, src, &class.name);

                if !self.set_methods.contains_key(&field.name) && !(field.is_static && field.is_final)
                {
                    self.set_types.insert(field.name.clone(), ty.clone());
                    self.set_methods
                        .insert(field.name.clone(), Invoker::SetField(field.name.clone()));
                }

                if !self.get_methods.contains_key(&field.name) {
                    self.get_types.insert(field.name.clone(), ty);
                    self.get_methods
                        .insert(field.name.clone(), Invoker::GetField(field.name.clone()));
                }
            }

            visited.push(class.name.clone());
            current = class
                .superclass
                .as_ref()
                .and_then(|superclass| registry.get(&superclass.raw()))
                .cloned();
        }
    }

    pub fn ty(&self) -> &TypeName {
        &self.ty
    }

    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor
    }

    pub fn readable_property_names(&self) -> &[String] {
        &self.readable
    }

    pub fn writable_property_names(&self) -> &[String] {
        &self.writable
    }

    pub fn has_getter(&self, name: &str) -> bool {
        self.get_methods.contains_key(name)
    }

    pub fn has_setter(&self, name: &str) -> bool {
        self.set_methods.contains_key(name)
    }

    pub fn get_invoker(&self, name: &str) -> Result<&Invoker> {
        self.get_methods
            .get(name)
            .ok_or_else(|| self.no_getter(name))
    }

    pub fn set_invoker(&self, name: &str) -> Result<&Invoker> {
        self.set_methods
            .get(name)
            .ok_or_else(|| self.no_setter(name))
    }

    /// The raw type a getter returns.
    pub fn getter_type(&self, name: &str) -> Result<TypeName> {
        self.generic_getter_type(name).map(TypeRef::raw)
    }

    /// The getter's return type with generics resolved against this type.
    pub fn generic_getter_type(&self, name: &str) -> Result<&TypeRef> {
        self.get_types.get(name).ok_or_else(|| self.no_getter(name))
    }

    pub fn setter_type(&self, name: &str) -> Result<TypeName> {
        self.set_types
            .get(name)
            .map(TypeRef::raw)
            .ok_or_else(|| self.no_setter(name))
    }

    /// Case-insensitive lookup of a declared property name.
    pub fn find_property_name(&self, name: &str) -> Option<&str> {
        self.case_insensitive
            .get(&name.to_uppercase())
            .map(String::as_str)
    }

    fn no_getter(&self, name: &str) -> Error {
        Error::reflection(format!(
            "there is no getter for property named '{}' in '{}'",
            name, self.ty
        ))
    }

    fn no_setter(&self, name: &str) -> Error {
        Error::reflection(format!(
            "there is no setter for property named '{}' in '{}'",
            name, self.ty
        ))
    }
}

impl Invoker {
    pub fn get(&self, target: &Value) -> Result<Value> {
        match self {
            Invoker::Method {
                body: Some(MethodBody::Get(get)),
                ..
            } => get(target),
            Invoker::Method { property, .. } | Invoker::GetField(property) => {
                read_slot(target, property)
            }
            Invoker::SetField(name) => Err(Error::reflection(format!(
                "field '{name}' is not readable through a setter binding"
            ))),
            Invoker::Ambiguous(message) => Err(Error::ambiguity(&**message)),
        }
    }

    pub fn set(&self, target: &mut Value, value: Value) -> Result<()> {
        match self {
            Invoker::Method {
                body: Some(MethodBody::Set(set)),
                ..
            } => set(target, value),
            Invoker::Method { property, .. } | Invoker::SetField(property) => {
                let Value::Object(object) = target else {
                    return Err(Error::reflection(format!(
                        "cannot set property '{property}' on a {} value",
                        target.type_name()
                    )));
                };
                object.set_field(property, value);
                Ok(())
            }
            Invoker::GetField(name) => Err(Error::reflection(format!(
                "field '{name}' is not writable through a getter binding"
            ))),
            Invoker::Ambiguous(message) => Err(Error::ambiguity(&**message)),
        }
    }
}

fn read_slot(target: &Value, property: &str) -> Result<Value> {
    match target {
        Value::Object(object) => Ok(object.field(property).cloned().unwrap_or_default()),
        other => Err(Error::reflection(format!(
            "cannot read property '{property}' from a {} value",
            other.type_name()
        ))),
    }
}

fn return_type(registry: &TypeRegistry, src: &TypeRef, declared: &DeclaredMethod) -> TypeRef {
    match &declared.method.ret {
        Some(ret) => resolver::resolve_type(registry, ret, src, &declared.declaring),
        None => TypeRef::Class(TypeName::object()),
    }
}

fn param_type(registry: &TypeRegistry, src: &TypeRef, declared: &DeclaredMethod) -> TypeRef {
    match declared.method.params.first() {
        Some(param) => resolver::resolve_type(registry, param, src, &declared.declaring),
        None => TypeRef::Class(TypeName::object()),
    }
}

/// Every method visible on `class`, one per signature. Walks the class, its
/// interfaces, then its superclass; the first declaration seen for a
/// signature wins, so overrides in subtypes shadow their parents, except
/// that an implemented body replaces a bodiless interface declaration.
fn collect_methods(registry: &TypeRegistry, class: &Arc<ClassDef>) -> Vec<DeclaredMethod> {
    let mut unique: IndexMap<String, DeclaredMethod> = IndexMap::new();
    let mut visited: Vec<TypeName> = vec![];
    let mut current = Some(class.clone());

    let add_declared = |class: &ClassDef, unique: &mut IndexMap<String, DeclaredMethod>| {
        for method in &class.methods {
            let declared = DeclaredMethod {
                declaring: class.name.clone(),
                method: method.clone(),
            };

            match unique.entry(method.signature()) {
                Entry::Vacant(entry) => {
                    entry.insert(declared);
                }
                // An interface only declares the accessor. A class further up
                // that implements it with a body supplies the behavior.
                Entry::Occupied(mut entry) => {
                    let abstract_slot = entry.get().method.body.is_none()
                        && registry
                            .get(&entry.get().declaring)
                            .is_some_and(|owner| owner.kind == ClassKind::Interface);
                    if abstract_slot && method.body.is_some() {
                        entry.insert(declared);
                    }
                }
            }
        }
    };

    while let Some(class) = current {
        if visited.contains(&class.name) {
            break;
        }
        visited.push(class.name.clone());
        add_declared(class.as_ref(), &mut unique);

        let mut interfaces: Vec<TypeName> = class.interfaces.iter().map(TypeRef::raw).collect();
        let mut i = 0;
        while i < interfaces.len() {
            if let Some(interface) = registry.get(&interfaces[i]) {
                add_declared(interface.as_ref(), &mut unique);
                for parent in &interface.interfaces {
                    let parent = parent.raw();
                    if !interfaces.contains(&parent) {
                        interfaces.push(parent);
                    }
                }
            }
            i += 1;
        }

        current = class
            .superclass
            .as_ref()
            .and_then(|superclass| registry.get(&superclass.raw()))
            .cloned();
    }

    unique.into_values().collect()
}
