mod class;
pub use class::{
    ClassDef, ClassKind, ConstructorDef, FieldDef, GetFn, MethodBody, MethodDef, ParamDef, SetFn,
    TypeParam,
};

mod factory;
pub use factory::ReflectorFactory;

mod meta_class;
pub use meta_class::MetaClass;

pub mod property;
pub use property::PropertyTokenizer;

mod reflector;
pub use reflector::{Invoker, Reflector};

mod registry;
pub use registry::TypeRegistry;

mod resolver;
