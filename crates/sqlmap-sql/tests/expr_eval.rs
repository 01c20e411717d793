use serde_json::json;
use sqlmap_core::{
    reflect::{ClassDef, TypeRegistry},
    value::ValueObject,
    Result, Value,
};
use sqlmap_sql::{DefaultEvaluator, ExpressionEvaluator, Scope};
use std::collections::HashMap;

struct Vars {
    registry: TypeRegistry,
    values: HashMap<String, Value>,
}

impl Vars {
    fn new(values: serde_json::Value) -> Vars {
        let mut registry = TypeRegistry::new();
        registry
            .register(
                ClassDef::new("User")
                    .getter("getName", "string")
                    .getter("getAge", "i32"),
            )
            .unwrap();

        let values = match Value::from(values) {
            Value::Map(entries) => entries.into_iter().collect(),
            _ => HashMap::new(),
        };

        Vars { registry, values }
    }

    fn with(mut self, name: &str, value: impl Into<Value>) -> Vars {
        self.values.insert(name.to_string(), value.into());
        self
    }
}

impl Scope for Vars {
    fn lookup(&self, name: &str) -> Result<Value> {
        Ok(self.values.get(name).cloned().unwrap_or_default())
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

fn eval(expression: &str, vars: &Vars) -> Value {
    DefaultEvaluator::new().evaluate(expression, vars).unwrap()
}

fn test(expression: &str, vars: &Vars) -> bool {
    DefaultEvaluator::new()
        .evaluate_boolean(expression, vars)
        .unwrap()
}

#[test]
fn null_checks() {
    let vars = Vars::new(json!({ "a": 1, "b": null }));
    assert!(test("a != null", &vars));
    assert!(!test("b != null", &vars));
    assert!(test("b == null", &vars));
    assert!(test("missing == null", &vars));
}

#[test]
fn word_operators_match_symbols() {
    let vars = Vars::new(json!({ "age": 30, "name": "ann" }));
    assert!(test("age gte 18 and name neq 'bob'", &vars));
    assert!(test("age >= 18 && name != 'bob'", &vars));
    assert!(test("age lt 18 or name eq 'ann'", &vars));
    assert!(test("not (age lt 18)", &vars));
    assert!(test("!(age < 18)", &vars));
}

#[test]
fn numbers_compare_across_widths() {
    let vars = Vars::new(json!({ "small": 5, "big": 5_000_000_000i64, "ratio": 0.5 }));
    assert!(test("small == 5", &vars));
    assert!(test("big > small", &vars));
    assert!(test("ratio < 1", &vars));
    assert!(test("small == '5'", &vars));
}

#[test]
fn arithmetic() {
    let vars = Vars::new(json!({ "a": 7, "b": 2 }));
    assert_eq!(eval("a + b * 3", &vars), Value::I32(13));
    assert_eq!(eval("(a + b) * 3", &vars), Value::I32(27));
    assert_eq!(eval("a % b", &vars), Value::I32(1));
    assert_eq!(eval("a / 2.0", &vars), Value::F64(3.5));
    assert_eq!(eval("-a", &vars), Value::I64(-7));
    assert_eq!(eval("'n' + a", &vars), Value::from("n7"));

    let vars = Vars::new(json!({ "x": i64::MIN }));
    let err = DefaultEvaluator::new().evaluate("-x > 0", &vars).unwrap_err();
    assert!(err.is_expression_evaluation_failed());
}

#[test]
fn division_by_zero_fails() {
    let vars = Vars::new(json!({ "a": 7 }));
    let err = DefaultEvaluator::new().evaluate("a / 0", &vars).unwrap_err();
    assert!(err.is_expression_evaluation_failed());
}

#[test]
fn truthiness() {
    let vars = Vars::new(json!({ "zero": 0, "one": 1, "empty": "", "flag": false, "list": [] }));
    assert!(!test("zero", &vars));
    assert!(test("one", &vars));
    assert!(test("empty", &vars));
    assert!(!test("flag", &vars));
    assert!(test("list", &vars));
    assert!(!test("nothing", &vars));
}

#[test]
fn methods() {
    let vars = Vars::new(json!({
        "ids": [1, 2, 3],
        "name": "  Ann ",
        "tags": { "x": 1 },
        "blank": ""
    }));

    assert_eq!(eval("ids.size()", &vars), Value::I32(3));
    assert!(test("ids.contains(2)", &vars));
    assert!(!test("ids.isEmpty()", &vars));
    assert_eq!(eval("name.trim()", &vars), Value::from("Ann"));
    assert_eq!(eval("name.trim().toUpperCase()", &vars), Value::from("ANN"));
    assert_eq!(eval("name.trim().toLowerCase().length()", &vars), Value::I32(3));
    assert!(test("name.contains('nn')", &vars));
    assert!(test("tags.containsKey('x')", &vars));
    assert!(test("blank.isEmpty()", &vars));

    let err = DefaultEvaluator::new()
        .evaluate("ids.explode()", &vars)
        .unwrap_err();
    assert!(err.to_string().contains("unknown method 'explode' on list"));
}

#[test]
fn paths_with_indexes() {
    let vars = Vars::new(json!({
        "orders": [{ "total": 10 }, { "total": 20 }],
        "lookup": { "k": "v" },
        "i": 1
    }));

    assert_eq!(eval("orders[1].total", &vars), Value::I32(20));
    assert_eq!(eval("orders[i].total", &vars), Value::I32(20));
    assert_eq!(eval("lookup['k']", &vars), Value::from("v"));
    assert_eq!(eval("orders[5]", &vars), Value::Null);
    assert_eq!(eval("missing.deeper.still", &vars), Value::Null);
}

#[test]
fn object_properties_go_through_reflector() {
    let user = ValueObject::new("User").with("name", "ann").with("age", 30);
    let vars = Vars::new(json!({})).with("user", user);

    assert_eq!(eval("user.name", &vars), Value::from("ann"));
    assert!(test("user.age > 18", &vars));

    let err = DefaultEvaluator::new()
        .evaluate("user.email", &vars)
        .unwrap_err();
    assert!(err.is_expression_evaluation_failed());
    assert!(err
        .to_string()
        .contains("there is no getter for property named 'email' in 'User'"));
}

#[test]
fn iterables() {
    let vars = Vars::new(json!({ "list": ["a", "b"], "map": { "k": 1 }, "n": 3 }));
    let evaluator = DefaultEvaluator::new();

    assert_eq!(
        evaluator.evaluate_iterable("list", &vars).unwrap(),
        [
            (Value::I32(0), Value::from("a")),
            (Value::I32(1), Value::from("b")),
        ]
    );
    assert_eq!(
        evaluator.evaluate_iterable("map", &vars).unwrap(),
        [(Value::from("k"), Value::I32(1))]
    );

    let err = evaluator.evaluate_iterable("n", &vars).unwrap_err();
    assert!(err.to_string().contains("was not iterable"));
}

#[test]
fn parsed_expressions_are_cached() {
    let vars = Vars::new(json!({ "a": 1 }));
    let evaluator = DefaultEvaluator::new();

    evaluator.evaluate("a == 1", &vars).unwrap();
    evaluator.evaluate("a == 1", &vars).unwrap();
    evaluator.evaluate("a != 1", &vars).unwrap();
    assert_eq!(evaluator.cached_len(), 2);
}

#[test]
fn syntax_errors_are_parse_errors() {
    let vars = Vars::new(json!({}));
    let evaluator = DefaultEvaluator::new();

    assert!(evaluator.evaluate("a ==", &vars).unwrap_err().is_parse());
    assert!(evaluator.evaluate("a # b", &vars).unwrap_err().is_parse());
    assert_eq!(evaluator.cached_len(), 0);
}
