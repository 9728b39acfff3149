//! Pure tree-walking evaluator for parsed trigger conditions.
//!
//! Evaluation resolves identifiers only from the `EvaluationContext` roots
//! and from `count(...)` loop bindings — anything else is an error, never a
//! silent default. The context is read-only; the walk performs no host
//! calls and is bounded by the size of the data being inspected.

use serde_json::Value;

use warden_contracts::EvaluationContext;

use crate::ast::{path_display, CmpOp, Expr, Literal, Segment};
use crate::error::EvalError;

/// Evaluate a parsed condition against one invocation's context.
///
/// The condition as a whole must yield a boolean; any other final value is
/// an `EvalError::NotBoolean`.
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> Result<bool, EvalError> {
    let mut scope = Scope {
        ctx,
        bindings: Vec::new(),
    };
    expect_bool(eval(expr, &mut scope)?)
}

/// Identifier resolution state for one evaluation.
///
/// Loop bindings are pushed for the duration of a `count` predicate and
/// popped on the way out; they shadow nothing (the parser rejects reserved
/// names as loop variables) and are invisible outside the predicate.
struct Scope<'c> {
    ctx: &'c EvaluationContext,
    bindings: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        // Innermost binding first, then the context roots.
        if let Some((_, value)) = self.bindings.iter().rev().find(|(n, _)| n == name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.ctx.root(name) {
            return Ok(value.clone());
        }
        if name == "tool_input" {
            return Err(EvalError::InputUnavailable);
        }
        Err(EvalError::UnknownIdentifier {
            name: name.to_string(),
        })
    }
}

fn eval(expr: &Expr, scope: &mut Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(literal) => Ok(literal_value(literal)),

        Expr::Path { root, segments } => eval_path(root, segments, scope),

        Expr::Len(inner) => {
            let value = eval(inner, scope)?;
            let len = match &value {
                Value::Array(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Object(map) => map.len(),
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "array, string, or object",
                        found: type_name(other),
                    })
                }
            };
            Ok(Value::from(len as u64))
        }

        Expr::Count { seq, var, pred } => {
            let value = eval(seq, scope)?;
            let items = match value {
                Value::Array(items) => items,
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "array",
                        found: type_name(&other),
                    })
                }
            };

            let mut matched: u64 = 0;
            for item in items {
                scope.bindings.push((var.clone(), item));
                let result = eval(pred, scope).and_then(expect_bool);
                scope.bindings.pop();
                if result? {
                    matched += 1;
                }
            }
            Ok(Value::from(matched))
        }

        Expr::Not(inner) => {
            let value = expect_bool(eval(inner, scope)?)?;
            Ok(Value::Bool(!value))
        }

        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval(lhs, scope)?;
            let rhs = eval(rhs, scope)?;
            compare(*op, &lhs, &rhs).map(Value::Bool)
        }

        Expr::All(parts) => {
            for part in parts {
                if !expect_bool(eval(part, scope)?)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }

        Expr::Any(parts) => {
            for part in parts {
                if expect_bool(eval(part, scope)?)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
    }
}

/// Walk a path's segments from its resolved root, reporting the exact
/// prefix that failed.
fn eval_path(root: &str, segments: &[Segment], scope: &Scope<'_>) -> Result<Value, EvalError> {
    let mut current = scope.resolve(root)?;

    for (depth, segment) in segments.iter().enumerate() {
        current = match segment {
            Segment::Key(key) => match &current {
                Value::Object(map) => match map.get(key) {
                    Some(value) => value.clone(),
                    None => {
                        return Err(EvalError::MissingField {
                            path: path_display(root, &segments[..=depth]),
                        })
                    }
                },
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "object",
                        found: type_name(other),
                    })
                }
            },
            Segment::Index(index) => match &current {
                Value::Array(items) => match items.get(*index) {
                    Some(value) => value.clone(),
                    None => {
                        return Err(EvalError::IndexOutOfBounds {
                            path: path_display(root, &segments[..depth]),
                            index: *index,
                            len: items.len(),
                        })
                    }
                },
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "array",
                        found: type_name(other),
                    })
                }
            },
        };
    }

    Ok(current)
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(values_equal(lhs, rhs)),
        CmpOp::Ne => Ok(!values_equal(lhs, rhs)),

        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let (a, b) = match (as_number(lhs), as_number(rhs)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    let offender = if as_number(lhs).is_none() { lhs } else { rhs };
                    return Err(EvalError::TypeMismatch {
                        expected: "number",
                        found: type_name(offender),
                    });
                }
            };
            // IEEE semantics: comparisons involving NaN are false.
            Ok(match op {
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                _ => unreachable!("non-ordering op handled above"),
            })
        }

        CmpOp::In => match rhs {
            Value::Array(items) => Ok(items.iter().any(|item| values_equal(lhs, item))),
            Value::String(haystack) => match lhs {
                Value::String(needle) => Ok(haystack.contains(needle.as_str())),
                other => Err(EvalError::TypeMismatch {
                    expected: "string",
                    found: type_name(other),
                }),
            },
            Value::Object(map) => match lhs {
                Value::String(key) => Ok(map.contains_key(key)),
                other => Err(EvalError::TypeMismatch {
                    expected: "string",
                    found: type_name(other),
                }),
            },
            other => Err(EvalError::TypeMismatch {
                expected: "array, string, or object",
                found: type_name(other),
            }),
        },
    }
}

/// Equality with numeric coercion: `4` and `4.0` are equal.  Everything
/// else falls back to structural JSON equality.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (as_number(lhs), as_number(rhs)) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn expect_bool(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotBoolean {
            found: type_name(&other),
        }),
    }
}

/// JSON type name for error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => {
            // A non-finite float cannot appear here: the lexer only accepts
            // digit sequences.
            serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
        }
        Literal::Str(s) => Value::String(s.clone()),
    }
}
