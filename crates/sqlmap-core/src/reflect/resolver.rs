//! Resolution of generic member types against a concrete source type.
//!
//! A getter declared as `T getValue()` on `Box<T>` resolves to `string` when
//! introspected through `StringBox extends Box<string>`. Resolution walks up
//! the supertype chain from the source type until it reaches the declaring
//! type, substituting type arguments positionally.

use super::TypeRegistry;
use crate::ty::{TypeName, TypeRef};

/// Resolves a member type declared on `declaring` as seen from `src`.
pub(crate) fn resolve_type(
    registry: &TypeRegistry,
    ty: &TypeRef,
    src: &TypeRef,
    declaring: &TypeName,
) -> TypeRef {
    match ty {
        TypeRef::Class(_) => ty.clone(),
        TypeRef::Var(var) => resolve_type_var(registry, var, src, declaring),
        TypeRef::Parameterized { raw, args } => TypeRef::Parameterized {
            raw: raw.clone(),
            args: args
                .iter()
                .map(|arg| resolve_type(registry, arg, src, declaring))
                .collect(),
        },
        TypeRef::Array(component) => {
            TypeRef::Array(Box::new(resolve_type(registry, component, src, declaring)))
        }
    }
}

fn resolve_type_var(
    registry: &TypeRegistry,
    var: &str,
    src: &TypeRef,
    declaring: &TypeName,
) -> TypeRef {
    let clazz = match src {
        TypeRef::Class(name) | TypeRef::Parameterized { raw: name, .. } => name,
        _ => return TypeRef::Class(TypeName::object()),
    };

    if clazz == declaring {
        return registry
            .get(declaring)
            .and_then(|class| class.type_param_named(var))
            .and_then(|param| param.bounds.first().cloned())
            .unwrap_or_else(|| TypeRef::Class(TypeName::object()));
    }

    let Some(class) = registry.get(clazz) else {
        return TypeRef::Class(TypeName::object());
    };

    for supertype in class.supertypes() {
        if let Some(resolved) = scan_super_type(registry, var, src, declaring, clazz, supertype) {
            return resolved;
        }
    }

    TypeRef::Class(TypeName::object())
}

fn scan_super_type(
    registry: &TypeRegistry,
    var: &str,
    src: &TypeRef,
    declaring: &TypeName,
    clazz: &TypeName,
    supertype: &TypeRef,
) -> Option<TypeRef> {
    match supertype {
        TypeRef::Parameterized { raw: parent, args } if parent == declaring => {
            let declared = registry.get(declaring)?;
            let position = declared
                .type_params
                .iter()
                .position(|param| &*param.name == var)?;

            match args.get(position)? {
                // The parent's argument is one of our own variables; pick the
                // matching argument out of the source type.
                TypeRef::Var(own) => {
                    let own_position = registry
                        .get(clazz)?
                        .type_params
                        .iter()
                        .position(|param| param.name == *own)?;
                    src.args().get(own_position).cloned()
                }
                resolved => Some(resolved.clone()),
            }
        }
        TypeRef::Parameterized { raw: parent, .. } | TypeRef::Class(parent) => {
            if registry.is_assignable_from(declaring, parent) {
                Some(resolve_type_var(registry, var, supertype, declaring))
            } else {
                None
            }
        }
        _ => None,
    }
}
