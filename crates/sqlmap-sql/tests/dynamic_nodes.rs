use serde_json::json;
use sqlmap_core::{types::TypeSystem, Value};
use sqlmap_sql::{
    node::{ForEach, Trim},
    DefaultEvaluator, DynamicContext, Env, PlaceholderStyle, SqlNode,
};
use std_util::prelude::*;

struct Fixture {
    types: TypeSystem,
    evaluator: DefaultEvaluator,
}

impl Fixture {
    fn new() -> Fixture {
        Fixture {
            types: TypeSystem::new(),
            evaluator: DefaultEvaluator::new(),
        }
    }

    fn env(&self) -> Env<'_> {
        Env {
            types: &self.types,
            evaluator: &self.evaluator,
            database_id: Some("pg"),
            placeholder: PlaceholderStyle::Question,
            shrink_whitespace: false,
        }
    }

    fn render(&self, node: &SqlNode, parameter: serde_json::Value) -> String {
        let parameter = Value::from(parameter);
        let mut cx = DynamicContext::new(self.env(), &parameter);
        node.apply(&mut cx).unwrap();
        squash(cx.sql())
    }
}

fn text(sql: &str) -> SqlNode {
    SqlNode::text(sql)
}

#[test]
fn where_trim_strips_leading_and() {
    let fixture = Fixture::new();
    let node = SqlNode::Trim(Trim::where_(text("AND x=1")));
    assert_eq!(fixture.render(&node, json!({})), "WHERE x=1");
}

#[test]
fn where_trim_renders_nothing_for_empty_contents() {
    let fixture = Fixture::new();
    let node = SqlNode::Mixed(vec![
        text("select * from t"),
        SqlNode::Trim(Trim::where_(SqlNode::if_("x != null", text("AND x = #{x}")))),
    ]);
    assert_eq!(fixture.render(&node, json!({})), "select * from t");
    assert_eq!(
        fixture.render(&node, json!({ "x": 1 })),
        "select * from t WHERE x = #{x}"
    );
}

#[test]
fn custom_trim_with_overrides() {
    let fixture = Fixture::new();
    let node = SqlNode::Trim(
        Trim::new(text("and a = 1 "))
            .prefix(Some("WHERE".into()))
            .prefix_overrides(Some("AND |OR ")),
    );
    assert_eq!(fixture.render(&node, json!({})), "WHERE a = 1");
}

#[test]
fn set_trim_drops_trailing_comma() {
    let fixture = Fixture::new();
    let node = SqlNode::Mixed(vec![
        text("update person"),
        SqlNode::Trim(Trim::set(SqlNode::Mixed(vec![
            SqlNode::if_("name != null", text("name = #{name},")),
            SqlNode::if_("age != null", text("age = #{age},")),
        ]))),
        text("where id = #{id}"),
    ]);

    assert_eq!(
        fixture.render(&node, json!({ "id": 1, "name": "ann" })),
        "update person SET name = #{name} where id = #{id}"
    );
}

#[test]
fn choose_takes_first_matching_branch() {
    let fixture = Fixture::new();
    let node = SqlNode::Choose {
        whens: vec![
            ("title != null".into(), text("title = #{title}")),
            ("author != null and author.name != null".into(), text("author = #{author.name}")),
        ],
        otherwise: Some(Box::new(text("featured = 1"))),
    };

    assert_eq!(
        fixture.render(&node, json!({ "title": "x", "author": { "name": "y" } })),
        "title = #{title}"
    );
    assert_eq!(
        fixture.render(&node, json!({ "author": { "name": "y" } })),
        "author = #{author.name}"
    );
    assert_eq!(fixture.render(&node, json!({})), "featured = 1");
}

#[test]
fn foreach_rewrites_item_placeholders() {
    let fixture = Fixture::new();
    let mut foreach = ForEach::new("ids", text("#{id}"));
    foreach.item = Some("id".into());
    foreach.index = Some("i".into());
    foreach.open = Some("(".into());
    foreach.close = Some(")".into());
    foreach.separator = Some(",".into());

    let node = SqlNode::Mixed(vec![text("id in"), SqlNode::ForEach(foreach)]);
    let parameter = Value::from(json!({ "ids": [3, 4, 5] }));
    let mut cx = DynamicContext::new(fixture.env(), &parameter);
    node.apply(&mut cx).unwrap();

    let (sql, bindings) = cx.into_parts();
    assert_eq!(
        squash(&sql),
        "id in ( #{__frch_id_0} , #{__frch_id_1} , #{__frch_id_2} )"
    );
    assert_eq!(bindings["__frch_id_1"], Value::I32(4));
    assert_eq!(bindings["__frch_i_2"], Value::I32(2));

    // Item and index do not leak out of the loop
    assert!(!bindings.contains_key("id"));
    assert!(!bindings.contains_key("i"));
}

#[test]
fn foreach_over_map_binds_keys_as_index() {
    let fixture = Fixture::new();
    let mut foreach = ForEach::new("filters", text("${key} = #{value}"));
    foreach.item = Some("value".into());
    foreach.index = Some("key".into());
    foreach.separator = Some("AND".into());

    let node = SqlNode::ForEach(foreach);
    assert_eq!(
        fixture.render(&node, json!({ "filters": { "a": 1, "b": 2 } })),
        "a = #{__frch_value_0} AND b = #{__frch_value_1}"
    );
}

#[test]
fn foreach_over_empty_collection_renders_nothing() {
    let fixture = Fixture::new();
    let mut foreach = ForEach::new("ids", text("#{id}"));
    foreach.item = Some("id".into());
    foreach.open = Some("(".into());
    foreach.close = Some(")".into());

    assert_eq!(fixture.render(&SqlNode::ForEach(foreach), json!({ "ids": [] })), "");
}

#[test]
fn foreach_over_null_fails_unless_nullable() {
    let fixture = Fixture::new();
    let mut foreach = ForEach::new("ids", text("#{id}"));
    foreach.item = Some("id".into());

    let parameter = Value::from(json!({}));
    let mut cx = DynamicContext::new(fixture.env(), &parameter);
    let err = SqlNode::ForEach(foreach.clone()).apply(&mut cx).unwrap_err();
    assert!(err.is_expression_evaluation_failed());
    assert!(err.to_string().contains("the expression 'ids' evaluated to a null value"));

    foreach.nullable = true;
    assert_eq!(fixture.render(&SqlNode::ForEach(foreach), json!({})), "");
}

#[test]
fn skipped_repetitions_do_not_emit_separators() {
    let fixture = Fixture::new();
    let mut foreach = ForEach::new(
        "names",
        SqlNode::if_("name != 'skip'", text("#{name}")),
    );
    foreach.item = Some("name".into());
    foreach.separator = Some(",".into());

    assert_eq!(
        fixture.render(&SqlNode::ForEach(foreach), json!({ "names": ["skip", "a", "skip", "b"] })),
        "#{__frch_name_1} , #{__frch_name_3}"
    );
}

#[test]
fn bind_makes_values_visible_to_later_nodes() {
    let fixture = Fixture::new();
    let node = SqlNode::Mixed(vec![
        SqlNode::bind("pattern", "'%' + name + '%'"),
        text("name like #{pattern}"),
        SqlNode::if_("pattern == '%ann%'", text("/* matched */")),
    ]);

    let parameter = Value::from(json!({ "name": "ann" }));
    let mut cx = DynamicContext::new(fixture.env(), &parameter);
    node.apply(&mut cx).unwrap();

    assert_eq!(cx.bindings()["pattern"], Value::from("%ann%"));
    assert_eq!(squash(cx.sql()), "name like #{pattern} /* matched */");
}

#[test]
fn text_substitutes_variables_from_bindings() {
    let fixture = Fixture::new();
    let node = text("select * from ${table} order by ${sort.column} ${missing}");
    assert_eq!(
        fixture.render(&node, json!({ "table": "users", "sort": { "column": "name" } })),
        "select * from users order by name"
    );
}

#[test]
fn scalar_parameter_is_visible_as_value_and_any_name() {
    let fixture = Fixture::new();
    let node = SqlNode::Mixed(vec![
        text("select ${value}"),
        SqlNode::if_("whatever == 42", text("where 1 = 1")),
    ]);
    assert_eq!(fixture.render(&node, json!(42)), "select 42 where 1 = 1");
}

#[test]
fn reserved_bindings() {
    let fixture = Fixture::new();
    let node = SqlNode::Mixed(vec![
        SqlNode::if_("_databaseId == 'pg'", text("limit 1")),
        SqlNode::if_("_parameter.size() == 1", text("/* one */")),
    ]);
    assert_eq!(fixture.render(&node, json!({ "a": 1 })), "limit 1 /* one */");
}

#[test]
fn dynamic_detection() {
    assert!(!SqlNode::Mixed(vec![text("select 1"), text("from t")]).is_dynamic());
    assert!(text("select ${col}").is_dynamic());
    assert!(!text("select \\${col}").is_dynamic());
    assert!(SqlNode::Mixed(vec![text("a"), SqlNode::if_("x", text("b"))]).is_dynamic());
}

#[test]
fn guard_errors_surface() {
    let fixture = Fixture::new();
    let parameter = Value::from(json!({ "a": "x" }));
    let mut cx = DynamicContext::new(fixture.env(), &parameter);
    let node = SqlNode::if_("a > 1", text("never"));
    assert_err!(node.apply(&mut cx));
}
