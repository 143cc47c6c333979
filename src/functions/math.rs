//! Arithmetic.
//!
//! Integer operands stay integers; overflow promotes the result to a float.
//! Any float operand makes the result a float, computed through `Decimal`
//! when both sides convert exactly so that `0.1 + 0.2 == 0.3`. Integer
//! division truncates and integer division by zero is an error; float
//! division follows IEEE 754.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use super::utils::{
    apply, apply_sequence, apply_verified, arity_and_types, int_arg, num_arg, order, verify_number,
};
use crate::{
    ast::kinds,
    error::EvalError,
    evaluator::{EvalResult, ExpressionEvaluator, ReturnType},
    expression::Expression,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

fn not_a_number(expr: &Expression, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expression: expr.to_string(),
        expected: "a number".to_string(),
        found: value.type_name(),
    }
}

fn arithmetic(expr: &Expression, op: Op, left: &Value, right: &Value) -> EvalResult {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        return integer_op(expr, op, *a, *b);
    }
    let a = left.as_f64().ok_or_else(|| not_a_number(expr, left))?;
    let b = right.as_f64().ok_or_else(|| not_a_number(expr, right))?;
    Ok(float_op(op, a, b))
}

fn integer_op(expr: &Expression, op: Op, a: i64, b: i64) -> EvalResult {
    let checked = match op {
        Op::Divide | Op::Modulo if b == 0 => {
            return Err(EvalError::DivisionByZero {
                expression: expr.to_string(),
            });
        }
        Op::Add => a.checked_add(b),
        Op::Subtract => a.checked_sub(b),
        Op::Multiply => a.checked_mul(b),
        Op::Divide => a.checked_div(b),
        Op::Modulo => a.checked_rem(b),
    };
    Ok(checked
        .map(Value::Integer)
        .unwrap_or_else(|| float_op(op, a as f64, b as f64)))
}

fn float_op(op: Op, a: f64, b: f64) -> Value {
    let plain = match op {
        Op::Add => a + b,
        Op::Subtract => a - b,
        Op::Multiply => a * b,
        Op::Divide => a / b,
        Op::Modulo => a % b,
    };
    Value::Float(decimal_op(op, a, b, plain).unwrap_or(plain))
}

/// The decimal result, when both operands convert exactly and the result
/// keeps every nonzero digit the float result has.
fn decimal_op(op: Op, a: f64, b: f64, plain: f64) -> Option<f64> {
    if matches!(op, Op::Divide | Op::Modulo) && b == 0.0 {
        return None;
    }
    let da = exact_decimal(a)?;
    let db = exact_decimal(b)?;
    let result = match op {
        Op::Add => da.checked_add(db),
        Op::Subtract => da.checked_sub(db),
        Op::Multiply => da.checked_mul(db),
        Op::Divide => da.checked_div(db),
        Op::Modulo => da.checked_rem(db),
    }?
    .to_f64()?;
    (result != 0.0 || plain == 0.0).then_some(result)
}

/// `n` as a `Decimal` holding the same shortest decimal text.
fn exact_decimal(n: f64) -> Option<Decimal> {
    let decimal = Decimal::from_f64(n)?;
    (decimal.to_f64() == Some(n)).then_some(decimal)
}

/// `+` concatenates when either side is a string, reading `null` as `""`.
fn add(expr: &Expression, left: &Value, right: &Value) -> EvalResult {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        return Ok(Value::String(format!("{}{}", left.to_text(), right.to_text())));
    }
    arithmetic(expr, Op::Add, left, right)
}

/// Numbers from the arguments, expanding array arguments one level.
fn numbers(function: &str, args: &[Value]) -> Result<Vec<Value>, EvalError> {
    let mut out = Vec::new();
    for arg in args {
        let items = match arg {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for item in items {
            if !item.is_number() {
                return Err(EvalError::function(
                    function,
                    format!("{} is not a number", item),
                ));
            }
            out.push(item.clone());
        }
    }
    if out.is_empty() {
        return Err(EvalError::function(function, "requires at least one number"));
    }
    Ok(out)
}

fn extreme(function: &'static str, want_max: bool) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| {
        let values = numbers(function, args)?;
        let all_integers = values.iter().all(|v| matches!(v, Value::Integer(_)));
        let mut best = values[0].clone();
        for value in &values[1..] {
            let (a, b) = (value.as_f64().unwrap_or(f64::NAN), best.as_f64().unwrap_or(f64::NAN));
            if (want_max && a > b) || (!want_max && a < b) {
                best = value.clone();
            }
        }
        Ok(if all_integers {
            best
        } else {
            Value::Float(best.as_f64().unwrap_or(f64::NAN))
        })
    }
}

fn sum(args: &[Value]) -> EvalResult {
    let values = match args.first() {
        Some(Value::Array(items)) if items.is_empty() => return Ok(Value::Integer(0)),
        _ => numbers("sum", args)?,
    };
    let mut total = Value::Integer(0);
    for value in &values {
        total = match (&total, value) {
            (Value::Integer(a), Value::Integer(b)) => a
                .checked_add(*b)
                .map(Value::Integer)
                .unwrap_or_else(|| Value::Float(*a as f64 + *b as f64)),
            _ => float_op(
                Op::Add,
                total.as_f64().unwrap_or_default(),
                value.as_f64().unwrap_or_default(),
            ),
        };
    }
    Ok(total)
}

fn average(args: &[Value]) -> EvalResult {
    let values = numbers("average", args)?;
    let total: f64 = values.iter().filter_map(Value::as_f64).sum();
    Ok(Value::Float(total / values.len() as f64))
}

/// Largest item count `range` produces.
const MAX_RANGE_COUNT: i64 = 1_000_000;

/// `range(start, count)`: `count` consecutive 32-bit integers from `start`.
fn range(args: &[Value]) -> EvalResult {
    let start = int_arg("range", args, 0)?;
    let count = int_arg("range", args, 1)?;
    if !(1..=MAX_RANGE_COUNT).contains(&count) {
        return Err(EvalError::function(
            "range",
            format!("count must be between 1 and {}, found {}", MAX_RANGE_COUNT, count),
        ));
    }
    let end = i32::try_from(start)
        .ok()
        .and_then(|start| start.checked_add(count as i32 - 1))
        .ok_or_else(|| {
            EvalError::function(
                "range",
                format!("{} items from {} exceeds the 32-bit integer range", count, start),
            )
        })?;
    Ok(Value::Array((start..=i64::from(end)).map(Value::Integer).collect()))
}

fn abs(args: &[Value]) -> EvalResult {
    Ok(match &args[0] {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or(Value::Float((*n as f64).abs())),
        other => Value::Float(num_arg("abs", std::slice::from_ref(other), 0)?.abs()),
    })
}

fn rounding(function: &'static str, f: fn(f64) -> f64) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        _ => Ok(Value::Float(f(num_arg(function, args, 0)?))),
    }
}

fn round(args: &[Value]) -> EvalResult {
    let digits = match args.get(1) {
        Some(_) => int_arg("round", args, 1)?,
        None => 0,
    };
    if !(0..=15).contains(&digits) {
        return Err(EvalError::function("round", "precision must be between 0 and 15"));
    }
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        _ => {
            let value = num_arg("round", args, 0)?;
            let rounded = Decimal::from_f64(value)
                .map(|d| d.round_dp_with_strategy(digits as u32, rust_decimal::RoundingStrategy::MidpointAwayFromZero))
                .and_then(|d| d.to_f64())
                .unwrap_or_else(|| {
                    let factor = 10f64.powi(digits as i32);
                    (value * factor).round() / factor
                });
            Ok(Value::Float(rounded))
        }
    }
}

fn sqrt(args: &[Value]) -> EvalResult {
    let value = num_arg("sqrt", args, 0)?;
    if value < 0.0 {
        return Err(EvalError::function("sqrt", format!("{} is negative", value)));
    }
    Ok(Value::Float(value.sqrt()))
}

const NUMBER: ReturnType = ReturnType::NUMBER;

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    let numeric = |kind: &'static str, op: Op| {
        ExpressionEvaluator::new(
            kind,
            NUMBER,
            apply_sequence(move |expr, a, b| arithmetic(expr, op, a, b), Some(verify_number)),
            arity_and_types(2, usize::MAX, NUMBER),
        )
    };

    vec![
        ExpressionEvaluator::new(
            kinds::ADD,
            NUMBER | ReturnType::STRING,
            apply_sequence(add, None),
            arity_and_types(2, usize::MAX, NUMBER | ReturnType::STRING),
        ),
        numeric(kinds::SUBTRACT, Op::Subtract),
        numeric(kinds::MULTIPLY, Op::Multiply),
        numeric(kinds::DIVIDE, Op::Divide),
        numeric(kinds::MOD, Op::Modulo),
        ExpressionEvaluator::new(
            kinds::POWER,
            NUMBER,
            apply_verified(
                |args| {
                    let base = num_arg("^", args, 0)?;
                    let exponent = num_arg("^", args, 1)?;
                    Ok(Value::Float(base.powf(exponent)))
                },
                verify_number,
            ),
            arity_and_types(2, 2, NUMBER),
        ),
        ExpressionEvaluator::new(
            "max",
            NUMBER,
            apply(extreme("max", true)),
            arity_and_types(1, usize::MAX, NUMBER | ReturnType::ARRAY),
        ),
        ExpressionEvaluator::new(
            "min",
            NUMBER,
            apply(extreme("min", false)),
            arity_and_types(1, usize::MAX, NUMBER | ReturnType::ARRAY),
        ),
        ExpressionEvaluator::new("sum", NUMBER, apply(sum), order(&[ReturnType::ARRAY], &[])),
        ExpressionEvaluator::new("average", NUMBER, apply(average), order(&[ReturnType::ARRAY], &[])),
        ExpressionEvaluator::new(
            "range",
            ReturnType::ARRAY,
            apply(range),
            order(&[NUMBER, NUMBER], &[]),
        ),
        ExpressionEvaluator::new("abs", NUMBER, apply_verified(abs, verify_number), order(&[NUMBER], &[])),
        ExpressionEvaluator::new(
            "floor",
            NUMBER,
            apply_verified(rounding("floor", f64::floor), verify_number),
            order(&[NUMBER], &[]),
        ),
        ExpressionEvaluator::new(
            "ceiling",
            NUMBER,
            apply_verified(rounding("ceiling", f64::ceil), verify_number),
            order(&[NUMBER], &[]),
        ),
        ExpressionEvaluator::new(
            "round",
            NUMBER,
            apply_verified(round, verify_number),
            order(&[NUMBER], &[NUMBER]),
        ),
        ExpressionEvaluator::new("sqrt", NUMBER, apply_verified(sqrt, verify_number), order(&[NUMBER], &[])),
    ]
}
