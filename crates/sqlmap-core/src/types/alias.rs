use crate::{
    reflect::TypeRegistry,
    ty::{builtin, TypeName},
    Error, Result,
};
use indexmap::IndexMap;

/// Short names for types, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    aliases: IndexMap<String, TypeName>,
}

impl AliasRegistry {
    pub fn new() -> AliasRegistry {
        use builtin::*;

        let mut aliases = AliasRegistry {
            aliases: IndexMap::new(),
        };

        for (alias, ty) in [
            ("string", STRING),
            ("char", CHAR),
            ("character", CHAR),
            ("byte", I8),
            ("short", I16),
            ("int", I32),
            ("integer", I32),
            ("long", I64),
            ("float", F32),
            ("double", F64),
            ("boolean", BOOL),
            ("bool", BOOL),
            ("number", NUMBER),
            ("decimal", DECIMAL),
            ("bigdecimal", DECIMAL),
            ("date", DATE),
            ("time", TIME),
            ("timestamp", TIMESTAMP),
            ("bytes", BYTES),
            ("byte[]", BYTES),
            ("object", OBJECT),
            ("map", MAP),
            ("hashmap", MAP),
            ("list", LIST),
            ("arraylist", LIST),
            ("set", SET),
            ("hashset", SET),
            ("collection", COLLECTION),
            ("cursor", CURSOR),
            ("resultset", CURSOR),
        ] {
            aliases.aliases.insert(alias.to_string(), TypeName::new(ty));
        }

        aliases
    }

    /// Registers `alias` for `ty`. Re-registering the same pair is a no-op;
    /// pointing an existing alias at a different type is an error.
    pub fn register(&mut self, alias: &str, ty: impl Into<TypeName>) -> Result<()> {
        let key = alias.to_lowercase();
        let ty = ty.into();

        match self.aliases.get(&key) {
            Some(existing) if *existing != ty => Err(Error::invalid_mapping(format!(
                "the alias '{alias}' is already mapped to the value '{existing}'"
            ))),
            _ => {
                self.aliases.insert(key, ty);
                Ok(())
            }
        }
    }

    pub fn get(&self, alias: &str) -> Option<&TypeName> {
        self.aliases.get(&alias.to_lowercase())
    }

    /// Resolves an alias, falling back to a registered type of that exact name.
    pub fn resolve(&self, registry: &TypeRegistry, name: &str) -> Result<TypeName> {
        if let Some(ty) = self.get(name) {
            return Ok(ty.clone());
        }

        let ty = TypeName::new(name);
        if registry.contains(&ty) {
            return Ok(ty);
        }

        Err(Error::invalid_mapping(format!(
            "could not resolve type alias '{name}'"
        )))
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}
