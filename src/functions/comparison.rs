use std::cmp::Ordering;

use super::utils::{apply, arity, arity_and_types};
use crate::{
    ast::kinds,
    error::EvalError,
    evaluator::{ExpressionEvaluator, ReturnType},
    expression::Expression,
    value::Value,
};

/// Equality used by `==`, `contains` and `indexOf`.
///
/// Numbers compare by value across integer and float; arrays and objects
/// compare structurally with the same rule applied to their members.
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (x, y) if x.is_number() && y.is_number() => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| loose_equals(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| loose_equals(value, other)))
        }
        (x, y) => x == y,
    }
}

/// Order two numbers or two strings. Anything else, `null` included, is not
/// comparable.
pub fn compare_values(expr: &Expression, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    let ordering = match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (x, y) if x.is_number() && y.is_number() => {
            x.as_f64().zip(y.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))
        }
        _ => None,
    };
    ordering.ok_or_else(|| EvalError::NotComparable {
        expression: expr.to_string(),
        left: a.type_name(),
        right: b.type_name(),
    })
}

fn relational(kind: &'static str, test: fn(Ordering) -> bool) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        kind,
        ReturnType::BOOLEAN,
        move |expr, memory, options| {
            let left = expr.children()[0].try_evaluate_with(memory, options)?;
            let right = expr.children()[1].try_evaluate_with(memory, options)?;
            Ok(Value::Boolean(test(compare_values(expr, &left, &right)?)))
        },
        arity_and_types(2, 2, ReturnType::NUMBER | ReturnType::STRING),
    )
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new(
            kinds::EQUAL,
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(loose_equals(&args[0], &args[1])))),
            arity(2, 2),
        ),
        ExpressionEvaluator::new(
            kinds::NOT_EQUAL,
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(!loose_equals(&args[0], &args[1])))),
            arity(2, 2),
        ),
        relational(kinds::LESS_THAN, Ordering::is_lt),
        relational(kinds::LESS_THAN_OR_EQUAL, Ordering::is_le),
        relational(kinds::GREATER_THAN, Ordering::is_gt),
        relational(kinds::GREATER_THAN_OR_EQUAL, Ordering::is_ge),
    ]
}
