//! The dynamic SQL template tree.

mod foreach;
pub use foreach::ForEach;

mod trim;
pub use trim::Trim;

use crate::DynamicContext;
use sqlmap_core::{parsing::TokenScanner, Result, Value};

/// One node of a compiled SQL template.
///
/// Evaluation appends text to the context and reports whether the node
/// rendered anything.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlNode {
    /// Text with no `${}`; copied as is.
    StaticText(String),

    /// Text containing `${}` spans, substituted from the bindings on every
    /// evaluation.
    Text(String),

    If {
        test: String,
        contents: Box<SqlNode>,
    },

    /// The first `when` whose test holds, else `otherwise`.
    Choose {
        whens: Vec<(String, SqlNode)>,
        otherwise: Option<Box<SqlNode>>,
    },

    ForEach(ForEach),

    Trim(Trim),

    /// Evaluates `value` and binds the result to `name`.
    Bind {
        name: String,
        value: String,
    },

    /// Children evaluated in order.
    Mixed(Vec<SqlNode>),
}

impl SqlNode {
    /// Builds a text node, static unless `text` contains a `${}` span.
    pub fn text(text: impl Into<String>) -> SqlNode {
        let text = text.into();
        if TokenScanner::variables().has_token(&text) {
            SqlNode::Text(text)
        } else {
            SqlNode::StaticText(text)
        }
    }

    pub fn if_(test: impl Into<String>, contents: SqlNode) -> SqlNode {
        SqlNode::If {
            test: test.into(),
            contents: Box::new(contents),
        }
    }

    pub fn bind(name: impl Into<String>, value: impl Into<String>) -> SqlNode {
        SqlNode::Bind {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether the node must be evaluated per invocation. Only static text
    /// (alone or in sequence) can be compiled once.
    pub fn is_dynamic(&self) -> bool {
        match self {
            SqlNode::StaticText(_) => false,
            SqlNode::Mixed(children) => children.iter().any(SqlNode::is_dynamic),
            _ => true,
        }
    }

    pub fn apply(&self, cx: &mut DynamicContext<'_>) -> Result<bool> {
        match self {
            SqlNode::StaticText(text) => {
                cx.append_sql(text);
                Ok(true)
            }
            SqlNode::Text(text) => {
                apply_text(text, cx)?;
                Ok(true)
            }
            SqlNode::If { test, contents } => {
                if cx.evaluate_boolean(test)? {
                    contents.apply(cx)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            SqlNode::Choose { whens, otherwise } => {
                for (test, contents) in whens {
                    if cx.evaluate_boolean(test)? {
                        contents.apply(cx)?;
                        return Ok(true);
                    }
                }
                match otherwise {
                    Some(contents) => {
                        contents.apply(cx)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            SqlNode::ForEach(foreach) => foreach.apply(cx),
            SqlNode::Trim(trim) => trim.apply(cx),
            SqlNode::Bind { name, value } => {
                let value = cx.evaluate(value)?;
                cx.bind(name.clone(), value);
                Ok(true)
            }
            SqlNode::Mixed(children) => {
                for child in children {
                    child.apply(cx)?;
                }
                Ok(true)
            }
        }
    }
}

/// Substitutes every `${expr}` with the evaluated expression. A scalar
/// parameter is additionally reachable as `value`.
fn apply_text(text: &str, cx: &mut DynamicContext<'_>) -> Result<()> {
    let parameter = cx.parameter();
    match parameter {
        Value::Null => cx.bind("value", Value::Null),
        Value::Map(_) | Value::Object(_) | Value::List(_) => {}
        scalar => cx.bind("value", scalar.clone()),
    }

    let sql = TokenScanner::variables().parse(text, |content| Ok(cx.evaluate(content)?.to_text()))?;
    cx.append_sql(&sql);
    Ok(())
}
