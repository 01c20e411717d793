use pretty_assertions::assert_eq;
use sqlmap_core::{
    mapping::{ResultFlag, ResultMap, ResultMapping},
    reflect::{ClassDef, TypeRegistry},
    ty::TypeName,
    types::ConverterRegistry,
};

fn ty(name: &str) -> TypeName {
    TypeName::new(name)
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            ClassDef::new("Author")
                .constructor(&[("id", "i32")])
                .constructor(&[("id", "i32"), ("name", "string")])
                .getter("getBio", "string")
                .setter("setBio", "string"),
        )
        .unwrap();
    registry
}

fn arg(property: &str, column: &str, java_type: &str) -> ResultMapping {
    ResultMapping::builder(
        Some(property.to_string()),
        Some(column.to_string()),
        ty(java_type),
    )
    .flags(vec![ResultFlag::Constructor])
    .build(&ConverterRegistry::new())
    .unwrap()
}

fn property(property: &str, column: &str, java_type: &str) -> ResultMapping {
    ResultMapping::builder(
        Some(property.to_string()),
        Some(column.to_string()),
        ty(java_type),
    )
    .build(&ConverterRegistry::new())
    .unwrap()
}

fn arg_names(map: &ResultMap) -> Vec<&str> {
    map.constructor_mappings
        .iter()
        .filter_map(|mapping| mapping.property())
        .collect()
}

#[test]
fn constructor_args_are_reordered_to_declaration() {
    let map = ResultMap::builder(
        "ns.author",
        ty("Author"),
        vec![
            arg("name", "author_name", "string"),
            arg("id", "author_id", "i32"),
            property("bio", "author_bio", "string"),
        ],
    )
    .build(&registry())
    .unwrap();

    assert_eq!(arg_names(&map), ["id", "name"]);
    assert_eq!(map.property_mappings.len(), 1);
    assert!(map.mapped_columns.contains("AUTHOR_NAME"));
    assert!(map.mapped_properties.contains("bio"));
}

#[test]
fn single_argument_constructor() {
    let map = ResultMap::builder("ns.author", ty("Author"), vec![arg("id", "id", "i32")])
        .build(&registry())
        .unwrap();

    assert_eq!(arg_names(&map), ["id"]);
}

#[test]
fn mismatched_argument_types_fail() {
    let err = ResultMap::builder(
        "ns.author",
        ty("Author"),
        vec![arg("id", "id", "i64"), arg("name", "name", "string")],
    )
    .build(&registry())
    .unwrap_err();

    assert!(err.is_ambiguity());
    assert!(err
        .to_string()
        .contains("failed to find a constructor in 'Author' with arg names"));
}

#[test]
fn unknown_argument_names_fail() {
    let err = ResultMap::builder(
        "ns.author",
        ty("Author"),
        vec![arg("id", "id", "i32"), arg("nickname", "nick", "string")],
    )
    .build(&registry())
    .unwrap_err();

    assert!(err.to_string().contains("error in result map 'ns.author'"));
}

#[test]
fn id_mappings_default_to_all_mappings() {
    let map = ResultMap::builder(
        "ns.plain",
        ty("map"),
        vec![property("a", "a", "string"), property("b", "b", "i32")],
    )
    .build(&registry())
    .unwrap();
    assert_eq!(map.id_mappings.len(), 2);

    let id = ResultMapping::builder(Some("a".into()), Some("a".into()), ty("string"))
        .flags(vec![ResultFlag::Id])
        .build(&ConverterRegistry::new())
        .unwrap();
    let map = ResultMap::builder("ns.keyed", ty("map"), vec![id, property("b", "b", "i32")])
        .build(&registry())
        .unwrap();
    assert_eq!(map.id_mappings.len(), 1);
}

#[test]
fn nested_result_maps_are_detected_and_forcible() {
    let nested = ResultMapping::builder(Some("author".into()), None, ty("Author"))
        .nested_result_map_id(Some("ns.author".into()))
        .build(&ConverterRegistry::new())
        .unwrap();

    let map = ResultMap::builder("ns.post", ty("map"), vec![nested])
        .build(&registry())
        .unwrap();
    assert!(map.has_nested_result_maps());

    let flat = ResultMap::builder("ns.flat", ty("map"), vec![property("a", "a", "string")])
        .build(&registry())
        .unwrap();
    assert!(!flat.has_nested_result_maps());
    flat.force_nested_result_maps();
    assert!(flat.has_nested_result_maps());
}

#[test]
fn mapping_validation() {
    let converters = ConverterRegistry::new();

    let both = ResultMapping::builder(Some("x".into()), Some("x".into()), ty("Author"))
        .nested_query_id(Some("ns.q".into()))
        .nested_result_map_id(Some("ns.m".into()))
        .build(&converters)
        .unwrap_err();
    assert!(both.is_invalid_mapping());

    let no_converter = ResultMapping::builder(Some("x".into()), Some("x".into()), ty("Author"))
        .build(&converters)
        .unwrap_err();
    assert!(no_converter
        .to_string()
        .contains("no converter found for property 'x' of type 'Author'"));

    let no_column = ResultMapping::builder(Some("x".into()), None, ty("string"))
        .build(&converters)
        .unwrap_err();
    assert!(no_column.to_string().contains("missing column attribute"));
}
