use sqlmap_core::{
    reflect::{ClassDef, TypeRegistry},
    ty::{TypeName, TypeRef},
};

fn ty(name: &str) -> TypeName {
    TypeName::new(name)
}

/// `Box<T>` with a `T getValue()` accessor, a `list<T> getItems()` accessor
/// and a `setValue(T)` mutator.
fn generic_box() -> ClassDef {
    ClassDef::new("Box")
        .type_param("T", [])
        .getter("getValue", TypeRef::var("T"))
        .setter("setValue", TypeRef::var("T"))
        .getter(
            "getItems",
            TypeRef::parameterized("list", [TypeRef::var("T")]),
        )
}

#[test]
fn type_argument_flows_from_direct_supertype() {
    let mut registry = TypeRegistry::new();
    registry.register(generic_box()).unwrap();
    registry
        .register(
            ClassDef::new("StringBox")
                .extends(TypeRef::parameterized("Box", [TypeRef::class("string")])),
        )
        .unwrap();

    let reflector = registry.reflector(&ty("StringBox")).unwrap();
    assert_eq!(reflector.getter_type("value").unwrap(), ty("string"));
    assert_eq!(reflector.setter_type("value").unwrap(), ty("string"));
    assert_eq!(
        reflector.generic_getter_type("items").unwrap().to_string(),
        "list<string>"
    );
}

#[test]
fn type_argument_flows_through_intermediate_variable() {
    let mut registry = TypeRegistry::new();
    registry.register(generic_box()).unwrap();
    registry
        .register(
            ClassDef::new("MiddleBox")
                .type_param("U", [])
                .extends(TypeRef::parameterized("Box", [TypeRef::var("U")])),
        )
        .unwrap();
    registry
        .register(
            ClassDef::new("LongBox")
                .extends(TypeRef::parameterized("MiddleBox", [TypeRef::class("i64")])),
        )
        .unwrap();

    let reflector = registry.reflector(&ty("LongBox")).unwrap();
    assert_eq!(reflector.getter_type("value").unwrap(), ty("i64"));
}

#[test]
fn type_argument_flows_from_interface() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            ClassDef::interface("Identified")
                .type_param("ID", [])
                .getter("getId", TypeRef::var("ID")),
        )
        .unwrap();
    registry
        .register(
            ClassDef::new("Order")
                .implements(TypeRef::parameterized("Identified", [TypeRef::class("i64")])),
        )
        .unwrap();

    let reflector = registry.reflector(&ty("Order")).unwrap();
    assert_eq!(reflector.getter_type("id").unwrap(), ty("i64"));
}

#[test]
fn unresolved_variable_erases_to_bound() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            ClassDef::new("Measured")
                .type_param("N", [TypeRef::class("number")])
                .getter("getAmount", TypeRef::var("N"))
                .type_param("X", [])
                .getter("getExtra", TypeRef::var("X")),
        )
        .unwrap();

    let reflector = registry.reflector(&ty("Measured")).unwrap();
    assert_eq!(reflector.getter_type("amount").unwrap(), ty("number"));
    assert_eq!(reflector.getter_type("extra").unwrap(), ty("object"));
}

#[test]
fn raw_supertype_erases_to_object() {
    let mut registry = TypeRegistry::new();
    registry.register(generic_box()).unwrap();
    registry
        .register(ClassDef::new("RawBox").extends("Box"))
        .unwrap();

    let reflector = registry.reflector(&ty("RawBox")).unwrap();
    assert_eq!(reflector.getter_type("value").unwrap(), ty("object"));
}

#[test]
fn generic_arrays_keep_their_component() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            ClassDef::new("Grid")
                .type_param("C", [])
                .getter("getCells", TypeRef::array(TypeRef::var("C"))),
        )
        .unwrap();
    registry
        .register(
            ClassDef::new("TextGrid")
                .extends(TypeRef::parameterized("Grid", [TypeRef::class("string")])),
        )
        .unwrap();

    let reflector = registry.reflector(&ty("TextGrid")).unwrap();
    assert_eq!(reflector.getter_type("cells").unwrap(), ty("string[]"));
}
