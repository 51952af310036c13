//! Tree-walking evaluator

use std::cmp::Ordering;

use regex::Regex;

use super::error::EvalError;
use super::parser::{BinaryOp, Expr, Pattern, UnaryOp};
use super::value::{Environment, Value};

/// Evaluate `expr` against `env`
///
/// `and` and `or` short-circuit; both operands must be booleans when they
/// are evaluated.
///
/// # Errors
///
/// Returns `EvalError` for unknown variables, operand type mismatches,
/// arithmetic overflow and invalid runtime regexes.
pub fn evaluate(expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Unary { op, operand } => unary(*op, evaluate(operand, env)?),
        Expr::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            left,
            right,
        } => logical(*op, left, right, env),
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            binary(*op, left, right)
        }
        Expr::Match {
            negated,
            subject,
            pattern,
        } => {
            let subject = evaluate(subject, env)?;
            let matched = match pattern {
                Pattern::Compiled(regex) => matches(&subject, regex)?,
                Pattern::Dynamic(expr) => {
                    let regex = compile(evaluate(expr, env)?)?;
                    matches(&subject, &regex)?
                }
            };
            Ok(Value::Bool(matched != *negated))
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, env)?;
            let index = evaluate(index, env)?;
            subscript(target, index)
        }
    }
}

fn expect_bool(op: &'static str, value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or(EvalError::ExpectedBool {
        op,
        got: value.type_name(),
    })
}

fn logical(op: BinaryOp, left: &Expr, right: &Expr, env: &Environment) -> Result<Value, EvalError> {
    let left = expect_bool(op.symbol(), &evaluate(left, env)?)?;
    match (op, left) {
        (BinaryOp::And, false) => Ok(Value::Bool(false)),
        (BinaryOp::Or, true) => Ok(Value::Bool(true)),
        _ => Ok(Value::Bool(expect_bool(op.symbol(), &evaluate(right, env)?)?)),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!expect_bool("not", &value)?)),
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("-")),
        (UnaryOp::Neg, other) => Err(EvalError::InvalidOperand {
            op: "-",
            got: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let mismatch = |left: &Value, right: &Value| EvalError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };

    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => return Err(mismatch(&left, &right)),
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::In => match (&left, &right) {
            (needle, Value::Array(items)) => Ok(Value::Bool(items.contains(needle))),
            (Value::Str(needle), Value::Str(haystack)) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
            _ => Err(mismatch(&left, &right)),
        },
        BinaryOp::Add => match (left, right) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow("+")),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(b);
                Ok(Value::Array(a))
            }
            (left, right) => Err(mismatch(&left, &right)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (Value::Int(a), Value::Int(b)) = (&left, &right) else {
                return Err(mismatch(&left, &right));
            };
            let result = match op {
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                _ if *b == 0 => return Err(EvalError::DivisionByZero),
                _ => a.checked_div(*b),
            };
            result.map(Value::Int).ok_or(EvalError::Overflow(op.symbol()))
        }
        BinaryOp::And | BinaryOp::Or => {
            let l = expect_bool(op.symbol(), &left)?;
            let r = expect_bool(op.symbol(), &right)?;
            Ok(Value::Bool(if op == BinaryOp::And { l && r } else { l || r }))
        }
    }
}

fn compile(pattern: Value) -> Result<Regex, EvalError> {
    match pattern {
        Value::Str(source) => Regex::new(&source).map_err(|e| EvalError::Regex {
            pattern: source.clone(),
            message: e.to_string(),
        }),
        other => Err(EvalError::InvalidOperand {
            op: "~",
            got: other.type_name(),
        }),
    }
}

/// A string matches if the regex finds it; an array matches if any of its
/// strings does
fn matches(subject: &Value, regex: &Regex) -> Result<bool, EvalError> {
    match subject {
        Value::Str(s) => Ok(regex.is_match(s)),
        Value::Array(items) => {
            for item in items {
                if matches(item, regex)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(EvalError::InvalidOperand {
            op: "~",
            got: other.type_name(),
        }),
    }
}

fn subscript(target: Value, index: Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::Array(items), Value::Int(i)) => {
            let len = items.len();
            usize::try_from(i)
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .ok_or(EvalError::IndexOutOfRange { index: i, len })
        }
        (target, index) => Err(EvalError::TypeMismatch {
            op: "[]",
            left: target.type_name(),
            right: index.type_name(),
        }),
    }
}
