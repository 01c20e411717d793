use std::{fmt, sync::Arc};

/// Names of the types every registry knows about.
pub mod builtin {
    pub const OBJECT: &str = "object";
    pub const NUMBER: &str = "number";
    pub const STRING: &str = "string";
    pub const CHAR: &str = "char";
    pub const BOOL: &str = "bool";
    pub const I8: &str = "i8";
    pub const I16: &str = "i16";
    pub const I32: &str = "i32";
    pub const I64: &str = "i64";
    pub const F32: &str = "f32";
    pub const F64: &str = "f64";
    pub const DECIMAL: &str = "decimal";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const TIMESTAMP: &str = "timestamp";
    pub const BYTES: &str = "bytes";
    pub const CURSOR: &str = "cursor";
    pub const COLLECTION: &str = "collection";
    pub const LIST: &str = "list";
    pub const SET: &str = "set";
    pub const MAP: &str = "map";
}

/// The name of a concrete (raw) type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> TypeName {
        TypeName(name.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn object() -> TypeName {
        TypeName::new(builtin::OBJECT)
    }

    pub fn string() -> TypeName {
        TypeName::new(builtin::STRING)
    }

    pub fn map() -> TypeName {
        TypeName::new(builtin::MAP)
    }

    pub fn list() -> TypeName {
        TypeName::new(builtin::LIST)
    }

    pub fn cursor() -> TypeName {
        TypeName::new(builtin::CURSOR)
    }

    pub fn is_object(&self) -> bool {
        &*self.0 == builtin::OBJECT
    }

    pub fn is_bool(&self) -> bool {
        &*self.0 == builtin::BOOL
    }

    pub fn is_map(&self) -> bool {
        &*self.0 == builtin::MAP
    }

    /// The name of an array whose components are `self`.
    pub fn array_of(&self) -> TypeName {
        TypeName::new(format!("{}[]", self.0))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(src: &str) -> TypeName {
        TypeName::new(src)
    }
}

impl From<&TypeName> for TypeName {
    fn from(src: &TypeName) -> TypeName {
        src.clone()
    }
}

/// A possibly generic type expression, as written on a method, field or
/// supertype declaration.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A raw type.
    Class(TypeName),

    /// A generic type applied to arguments, e.g. `list<string>`.
    Parameterized { raw: TypeName, args: Vec<TypeRef> },

    /// A type variable declared by the enclosing type.
    Var(Box<str>),

    /// An array whose component is a generic type.
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn class(name: impl Into<TypeName>) -> TypeRef {
        TypeRef::Class(name.into())
    }

    pub fn parameterized(
        raw: impl Into<TypeName>,
        args: impl IntoIterator<Item = TypeRef>,
    ) -> TypeRef {
        TypeRef::Parameterized {
            raw: raw.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn var(name: &str) -> TypeRef {
        TypeRef::Var(name.into())
    }

    pub fn array(component: TypeRef) -> TypeRef {
        TypeRef::Array(Box::new(component))
    }

    /// Erases the type expression to a raw type.
    ///
    /// Type variables that survived resolution erase to `object`.
    pub fn raw(&self) -> TypeName {
        match self {
            TypeRef::Class(name) => name.clone(),
            TypeRef::Parameterized { raw, .. } => raw.clone(),
            TypeRef::Var(_) => TypeName::object(),
            TypeRef::Array(component) => component.raw().array_of(),
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Parameterized { args, .. } => args,
            _ => &[],
        }
    }
}

impl From<TypeName> for TypeRef {
    fn from(src: TypeName) -> TypeRef {
        TypeRef::Class(src)
    }
}

impl From<&str> for TypeRef {
    fn from(src: &str) -> TypeRef {
        TypeRef::Class(src.into())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Class(name) => fmt::Display::fmt(name, f),
            TypeRef::Parameterized { raw, args } => {
                write!(f, "{raw}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeRef::Var(name) => f.write_str(name),
            TypeRef::Array(component) => write!(f, "{component}[]"),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
