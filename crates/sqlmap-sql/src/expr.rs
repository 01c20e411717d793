//! Guard and binding expressions used by `<if test>`, `<when test>`,
//! `<bind value>` and `<foreach collection>`.

mod eval;
mod lexer;
mod parser;

use parser::Expr;
use parking_lot::RwLock;
use sqlmap_core::{reflect::TypeRegistry, Error, Result, Value};
use std::{collections::HashMap, fmt, sync::Arc};

/// Names visible to an expression.
pub trait Scope {
    /// Resolves a root name such as `user` in `user.name != null`.
    fn lookup(&self, name: &str) -> Result<Value>;

    /// Types used to navigate into object values.
    fn registry(&self) -> &TypeRegistry;
}

/// Evaluates expressions against a [`Scope`].
pub trait ExpressionEvaluator: Send + Sync + fmt::Debug {
    fn evaluate(&self, expression: &str, scope: &dyn Scope) -> Result<Value>;

    fn evaluate_boolean(&self, expression: &str, scope: &dyn Scope) -> Result<bool> {
        Ok(is_truthy(&self.evaluate(expression, scope)?))
    }

    /// Evaluates an iteration source into `(index, item)` pairs.
    ///
    /// Lists yield their positions as indexes, maps their keys.
    fn evaluate_iterable(&self, expression: &str, scope: &dyn Scope) -> Result<Vec<(Value, Value)>> {
        match self.evaluate(expression, scope)? {
            Value::Null => Err(Error::expression_evaluation_failed(format!(
                "the expression '{expression}' evaluated to a null value"
            ))),
            Value::List(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (index_value(i), item))
                .collect()),
            Value::Map(entries) => Ok(entries
                .into_iter()
                .map(|(key, value)| (Value::String(key), value))
                .collect()),
            other => Err(Error::expression_evaluation_failed(format!(
                "error evaluating expression '{expression}': return value ({other}) was not iterable"
            ))),
        }
    }
}

/// Booleans are themselves, numbers are true when non-zero, everything else
/// is true when non-null.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(v) => *v,
        Value::I32(v) => *v != 0,
        Value::I64(v) => *v != 0,
        Value::F64(v) => *v != 0.0,
        Value::Null => false,
        _ => true,
    }
}

fn index_value(i: usize) -> Value {
    match i32::try_from(i) {
        Ok(v) => Value::I32(v),
        Err(_) => Value::I64(i as i64),
    }
}

/// The built-in evaluator. Parsed expressions are cached by source text.
#[derive(Debug, Default)]
pub struct DefaultEvaluator {
    cache: RwLock<HashMap<String, Arc<Expr>>>,
}

impl DefaultEvaluator {
    pub fn new() -> DefaultEvaluator {
        DefaultEvaluator::default()
    }

    fn parsed(&self, expression: &str) -> Result<Arc<Expr>> {
        if let Some(expr) = self.cache.read().get(expression) {
            return Ok(expr.clone());
        }

        let expr = Arc::new(parser::parse(expression)?);
        Ok(self
            .cache
            .write()
            .entry(expression.to_string())
            .or_insert(expr)
            .clone())
    }

    /// Number of distinct expressions parsed so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl ExpressionEvaluator for DefaultEvaluator {
    fn evaluate(&self, expression: &str, scope: &dyn Scope) -> Result<Value> {
        let expr = self.parsed(expression)?;
        eval::eval(&expr, scope).map_err(|err| {
            if err.is_expression_evaluation_failed() {
                err
            } else {
                Error::expression_evaluation_failed(format!(
                    "error evaluating expression '{expression}': {err}"
                ))
            }
        })
    }
}
