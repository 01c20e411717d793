use super::{
    is_truthy,
    parser::{BinaryOp, Expr, UnaryOp},
    Scope,
};
use sqlmap_core::{value::MetaValue, Error, Result, Value};
use std::cmp::Ordering;

pub(super) fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => scope.lookup(name),
        Expr::Member { target, name } => {
            let target = eval(target, scope)?;
            member(scope, &target, name)
        }
        Expr::Index { target, index } => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            element(&target, &index)
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = eval(target, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>>>()?;
            call(&target, method, &args)
        }
        Expr::Unary { op, operand } => {
            let operand = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!is_truthy(&operand))),
                UnaryOp::Neg => match operand {
                    Value::I32(v) => Ok(Value::I64(-(v as i64))),
                    Value::I64(v) => v.checked_neg().map(Value::I64).ok_or_else(|| {
                        Error::expression_evaluation_failed(format!("cannot negate {v}"))
                    }),
                    Value::F64(v) => Ok(Value::F64(-v)),
                    other => Err(Error::expression_evaluation_failed(format!(
                        "cannot negate {other}"
                    ))),
                },
            }
        }
        Expr::Binary { op, lhs, rhs } => match op {
            // Short-circuit before evaluating the right-hand side
            BinaryOp::And => {
                if !is_truthy(&eval(lhs, scope)?) {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(is_truthy(&eval(rhs, scope)?)))
            }
            BinaryOp::Or => {
                if is_truthy(&eval(lhs, scope)?) {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(is_truthy(&eval(rhs, scope)?)))
            }
            op => {
                let lhs = eval(lhs, scope)?;
                let rhs = eval(rhs, scope)?;
                binary(*op, &lhs, &rhs)
            }
        },
    }
}

fn member(scope: &dyn Scope, target: &Value, name: &str) -> Result<Value> {
    match target {
        Value::Null => Ok(Value::Null),
        Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or_default()),
        _ => MetaValue::new(scope.registry(), target).get(name),
    }
}

fn element(target: &Value, index: &Value) -> Result<Value> {
    match (target, index) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::List(items), index) => {
            let i = index
                .as_i64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| {
                    Error::expression_evaluation_failed(format!("invalid list index {index}"))
                })?;
            Ok(items.get(i).cloned().unwrap_or_default())
        }
        (Value::Map(entries), key) => Ok(entries.get(&key.to_text()).cloned().unwrap_or_default()),
        (other, _) => Err(Error::expression_evaluation_failed(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn call(target: &Value, method: &str, args: &[Value]) -> Result<Value> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(Error::expression_evaluation_failed(format!(
                "method '{method}' takes {expected} argument(s), got {}",
                args.len()
            )))
        }
    };

    match (method, target) {
        ("size" | "length", Value::List(items)) => {
            arity(0)?;
            Ok(len_value(items.len()))
        }
        ("size", Value::Map(entries)) => {
            arity(0)?;
            Ok(len_value(entries.len()))
        }
        ("size" | "length", Value::String(s)) => {
            arity(0)?;
            Ok(len_value(s.chars().count()))
        }
        ("isEmpty", Value::List(items)) => {
            arity(0)?;
            Ok(Value::Bool(items.is_empty()))
        }
        ("isEmpty", Value::Map(entries)) => {
            arity(0)?;
            Ok(Value::Bool(entries.is_empty()))
        }
        ("isEmpty", Value::String(s)) => {
            arity(0)?;
            Ok(Value::Bool(s.is_empty()))
        }
        ("trim", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.trim().to_string()))
        }
        ("toUpperCase", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        ("toLowerCase", Value::String(s)) => {
            arity(0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        ("toString", value) => {
            arity(0)?;
            Ok(Value::String(value.to_string()))
        }
        ("contains", Value::List(items)) => {
            arity(1)?;
            Ok(Value::Bool(items.iter().any(|item| equals(item, &args[0]))))
        }
        ("contains", Value::String(s)) => {
            arity(1)?;
            Ok(Value::Bool(s.contains(args[0].to_text().as_str())))
        }
        ("containsKey", Value::Map(entries)) => {
            arity(1)?;
            Ok(Value::Bool(entries.contains_key(&args[0].to_text())))
        }
        ("equals", value) => {
            arity(1)?;
            Ok(Value::Bool(equals(value, &args[0])))
        }
        (_, Value::Null) => Err(Error::expression_evaluation_failed(format!(
            "method '{method}' called on a null value"
        ))),
        (_, other) => Err(Error::expression_evaluation_failed(format!(
            "unknown method '{method}' on {}",
            other.type_name()
        ))),
    }
}

fn len_value(len: usize) -> Value {
    match i32::try_from(len) {
        Ok(v) => Value::I32(v),
        Err(_) => Value::I64(len as i64),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(lhs, rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(lhs, rhs).ok_or_else(|| {
                Error::expression_evaluation_failed(format!("cannot compare {lhs} with {rhs}"))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) => {
            Ok(Value::String(format!("{lhs}{rhs}")))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, lhs, rhs)
        }
        BinaryOp::And => Ok(Value::Bool(is_truthy(lhs) && is_truthy(rhs))),
        BinaryOp::Or => Ok(Value::Bool(is_truthy(lhs) || is_truthy(rhs))),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    let overflow = || {
        Error::expression_evaluation_failed(format!("arithmetic overflow in {lhs} {op:?} {rhs}"))
    };

    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                return Err(Error::expression_evaluation_failed("division by zero"))
            }
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        }
        .ok_or_else(overflow)?;

        return Ok(match i32::try_from(result) {
            Ok(v) if matches!((lhs, rhs), (Value::I32(_), Value::I32(_))) => Value::I32(v),
            _ => Value::I64(result),
        });
    }

    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(Error::expression_evaluation_failed(format!(
            "operands {lhs} and {rhs} are not numeric"
        )));
    };

    Ok(Value::F64(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}

/// Numbers compare by value across widths, strings that look like numbers
/// compare equal to those numbers.
fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => match (numeric(lhs), numeric(rhs)) {
            (Some(a), Some(b)) if lhs.is_number() || rhs.is_number() => a == b,
            _ => lhs == rhs,
        },
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => numeric(lhs)?.partial_cmp(&numeric(rhs)?),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(_) => None,
        other => other.as_f64(),
    }
}
