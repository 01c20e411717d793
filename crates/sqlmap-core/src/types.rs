mod alias;
pub use alias::AliasRegistry;

mod converter;
pub use converter::{Converter, ConverterRegistry, IdentityConverter};

mod jdbc;
pub use jdbc::JdbcType;

use crate::{reflect::TypeRegistry, ty::TypeName, Error, Result};
use std::sync::Arc;

/// Everything needed to resolve and introspect types: the type registry with
/// its reflector cache, type aliases, and value converters.
#[derive(Debug, Default)]
pub struct TypeSystem {
    pub registry: TypeRegistry,
    pub aliases: AliasRegistry,
    pub converters: ConverterRegistry,
}

impl TypeSystem {
    pub fn new() -> TypeSystem {
        TypeSystem::default()
    }

    /// Resolves an alias or type name to a registered type.
    pub fn resolve_alias(&self, name: &str) -> Result<TypeName> {
        self.aliases.resolve(&self.registry, name)
    }

    /// Resolves an optional alias; `None` stays `None`.
    pub fn resolve_optional(&self, name: Option<&str>) -> Result<Option<TypeName>> {
        name.map(|name| self.resolve_alias(name)).transpose()
    }

    /// Resolves a `typeHandler` reference by converter name.
    pub fn resolve_converter(&self, name: &str) -> Result<Arc<dyn Converter>> {
        self.converters.by_name(name).cloned().ok_or_else(|| {
            Error::invalid_mapping(format!("could not resolve converter '{name}'"))
        })
    }
}
