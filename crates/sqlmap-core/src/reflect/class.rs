use crate::{
    ty::{TypeName, TypeRef},
    Result, Value,
};
use std::{fmt, sync::Arc};

/// Reads a property from an instance.
pub type GetFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Writes a property on an instance.
pub type SetFn = Arc<dyn Fn(&mut Value, Value) -> Result<()> + Send + Sync>;

/// Declaration of a type the mapper can introspect.
///
/// This is the explicit stand-in for runtime reflection: callers describe
/// each type once (its generic parameters, supertypes, methods, fields and
/// constructors) and register it with a [`TypeRegistry`](super::TypeRegistry).
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: TypeName,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParam>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
    pub constructors: Vec<ConstructorDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: Box<str>,

    /// Declared upper bounds; the first one is used when the variable cannot
    /// be resolved any further.
    pub bounds: Vec<TypeRef>,
}

#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<TypeRef>,

    /// `None` for methods returning nothing.
    pub ret: Option<TypeRef>,

    pub body: Option<MethodBody>,
}

/// Custom behavior for an accessor. Without one, accessors read and write
/// the instance slot named after the property.
#[derive(Clone)]
pub enum MethodBody {
    Get(GetFn),
    Set(SetFn),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDef {
    pub params: Vec<ParamDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeName,
}

impl ClassDef {
    pub fn new(name: impl Into<TypeName>) -> ClassDef {
        ClassDef {
            name: name.into(),
            kind: ClassKind::Class,
            type_params: vec![],
            superclass: None,
            interfaces: vec![],
            methods: vec![],
            fields: vec![],
            constructors: vec![],
        }
    }

    pub fn interface(name: impl Into<TypeName>) -> ClassDef {
        ClassDef {
            kind: ClassKind::Interface,
            ..ClassDef::new(name)
        }
    }

    pub fn type_param(mut self, name: &str, bounds: impl IntoIterator<Item = TypeRef>) -> Self {
        self.type_params.push(TypeParam {
            name: name.into(),
            bounds: bounds.into_iter().collect(),
        });
        self
    }

    pub fn extends(mut self, superclass: impl Into<TypeRef>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Declares a zero-argument method returning `ret`, e.g. `getName`.
    pub fn getter(self, name: &str, ret: impl Into<TypeRef>) -> Self {
        self.method(MethodDef::new(name, [], Some(ret.into())))
    }

    /// Declares a one-argument method returning nothing, e.g. `setName`.
    pub fn setter(self, name: &str, param: impl Into<TypeRef>) -> Self {
        self.method(MethodDef::new(name, [param.into()], None))
    }

    pub fn field(mut self, name: &str, ty: impl Into<TypeRef>) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty: ty.into(),
            is_static: false,
            is_final: false,
        });
        self
    }

    pub fn static_final_field(mut self, name: &str, ty: impl Into<TypeRef>) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty: ty.into(),
            is_static: true,
            is_final: true,
        });
        self
    }

    /// Declares a constructor taking `(name, type)` parameters in order.
    pub fn constructor(mut self, params: &[(&str, &str)]) -> Self {
        self.constructors.push(ConstructorDef {
            params: params
                .iter()
                .map(|(name, ty)| ParamDef {
                    name: name.to_string(),
                    ty: TypeName::new(ty),
                })
                .collect(),
        });
        self
    }

    pub fn type_param_named(&self, name: &str) -> Option<&TypeParam> {
        self.type_params.iter().find(|param| &*param.name == name)
    }

    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    /// A type declaring no constructor at all gets an implicit no-argument one.
    pub fn default_constructor(&self) -> Option<&ConstructorDef> {
        static IMPLICIT: ConstructorDef = ConstructorDef { params: Vec::new() };

        if self.constructors.is_empty() {
            return Some(&IMPLICIT);
        }
        self.constructors.iter().find(|ctor| ctor.params.is_empty())
    }
}

impl MethodDef {
    pub fn new(
        name: &str,
        params: impl IntoIterator<Item = TypeRef>,
        ret: Option<TypeRef>,
    ) -> MethodDef {
        MethodDef {
            name: name.to_string(),
            params: params.into_iter().collect(),
            ret,
            body: None,
        }
    }

    pub fn with_body(mut self, body: MethodBody) -> MethodDef {
        self.body = Some(body);
        self
    }

    /// Identity used to collapse overridden methods: `ret#name:p1,p2`.
    pub(crate) fn signature(&self) -> String {
        let mut sig = match &self.ret {
            Some(ret) => ret.raw().to_string(),
            None => "void".to_string(),
        };
        sig.push('#');
        sig.push_str(&self.name);
        for (i, param) in self.params.iter().enumerate() {
            sig.push(if i == 0 { ':' } else { ',' });
            sig.push_str(param.raw().as_str());
        }
        sig
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("body", &self.body.is_some())
            .finish()
    }
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Get(_) => f.write_str("MethodBody::Get"),
            MethodBody::Set(_) => f.write_str("MethodBody::Set"),
        }
    }
}
