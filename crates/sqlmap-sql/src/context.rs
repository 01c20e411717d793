use crate::{expr::Scope, ExpressionEvaluator, PlaceholderStyle};
use indexmap::IndexMap;
use sqlmap_core::{reflect::TypeRegistry, types::TypeSystem, value::MetaValue, Result, Value};
use std::mem;

/// Binding under which the parameter object is always visible.
pub const PARAMETER_OBJECT_KEY: &str = "_parameter";

/// Binding holding the configured database id, or null.
pub const DATABASE_ID_KEY: &str = "_databaseId";

/// Collaborators shared by every evaluation of every statement.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    pub types: &'a TypeSystem,
    pub evaluator: &'a dyn ExpressionEvaluator,
    pub database_id: Option<&'a str>,
    pub placeholder: PlaceholderStyle,

    /// Collapse runs of whitespace in the final SQL to single spaces.
    pub shrink_whitespace: bool,
}

/// Per-invocation state of a dynamic SQL evaluation: the bindings visible to
/// expressions and the SQL text produced so far.
#[derive(Debug)]
pub struct DynamicContext<'a> {
    env: Env<'a>,
    parameter: &'a Value,

    /// Scalar parameters answer every name that is not a binding.
    fallback_to_parameter: bool,

    bindings: IndexMap<String, Value>,
    buffer: Buffer,
    unique: usize,
}

#[derive(Debug, Default)]
struct Buffer {
    sql: String,

    /// Fragments are separated by a single space.
    joined: bool,

    started: bool,
}

impl<'a> DynamicContext<'a> {
    pub fn new(env: Env<'a>, parameter: &'a Value) -> DynamicContext<'a> {
        let fallback_to_parameter = match parameter {
            Value::Null | Value::Map(_) | Value::Object(_) => false,
            other => env.types.converters.has_converter(&other.type_name()),
        };

        let mut bindings = IndexMap::new();
        bindings.insert(PARAMETER_OBJECT_KEY.to_string(), parameter.clone());
        bindings.insert(
            DATABASE_ID_KEY.to_string(),
            env.database_id.map(Value::from).unwrap_or_default(),
        );

        DynamicContext {
            env,
            parameter,
            fallback_to_parameter,
            bindings,
            buffer: Buffer {
                joined: true,
                ..Buffer::default()
            },
            unique: 0,
        }
    }

    pub fn env(&self) -> &Env<'a> {
        &self.env
    }

    pub fn parameter(&self) -> &'a Value {
        self.parameter
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn unbind(&mut self, name: &str) {
        self.bindings.shift_remove(name);
    }

    pub fn bindings(&self) -> &IndexMap<String, Value> {
        &self.bindings
    }

    pub fn append_sql(&mut self, sql: &str) {
        let buffer = &mut self.buffer;
        if buffer.joined && buffer.started {
            buffer.sql.push(' ');
        }
        buffer.sql.push_str(sql);
        buffer.started = true;
    }

    /// The SQL produced so far, trimmed.
    pub fn sql(&self) -> &str {
        self.buffer.sql.trim()
    }

    /// A number not handed out before in this evaluation.
    pub fn next_unique(&mut self) -> usize {
        let unique = self.unique;
        self.unique += 1;
        unique
    }

    /// Runs `f` against an empty buffer and returns what it wrote instead of
    /// appending it. Bindings made by `f` stay visible afterwards.
    pub fn capture<T>(
        &mut self,
        joined: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<(T, String)> {
        let saved = mem::replace(
            &mut self.buffer,
            Buffer {
                joined,
                ..Buffer::default()
            },
        );
        let ret = f(self);
        let captured = mem::replace(&mut self.buffer, saved);
        Ok((ret?, captured.sql))
    }

    pub fn evaluate(&self, expression: &str) -> Result<Value> {
        self.env.evaluator.evaluate(expression, self)
    }

    pub fn evaluate_boolean(&self, expression: &str) -> Result<bool> {
        self.env.evaluator.evaluate_boolean(expression, self)
    }

    pub fn evaluate_iterable(&self, expression: &str) -> Result<Vec<(Value, Value)>> {
        self.env.evaluator.evaluate_iterable(expression, self)
    }

    /// Consumes the context, returning the SQL and the final bindings.
    pub fn into_parts(self) -> (String, IndexMap<String, Value>) {
        let sql = self.buffer.sql.trim().to_string();
        (sql, self.bindings)
    }
}

impl Scope for DynamicContext<'_> {
    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }

        match self.parameter {
            Value::Null => Ok(Value::Null),
            Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or_default()),
            parameter => {
                let meta = MetaValue::new(&self.env.types.registry, parameter);
                if self.fallback_to_parameter && !meta.has_getter(name) {
                    Ok(parameter.clone())
                } else {
                    meta.get(name)
                }
            }
        }
    }

    fn registry(&self) -> &TypeRegistry {
        &self.env.types.registry
    }
}
