//! Explicit conversions and type tests.
//!
//! These are the only places a float is truncated to an integer; arithmetic
//! never narrows implicitly.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::utils::{apply, arity, int_arg, num_arg, order, str_arg};
use crate::{
    error::EvalError,
    evaluator::{EvalResult, ExpressionEvaluator, ReturnType},
    value::Value,
};

fn to_int(args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Ok(Value::Integer(f.trunc() as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| EvalError::function("int", format!("'{}' is not an integer", s))),
        other => Err(EvalError::function(
            "int",
            format!("cannot convert {} to an integer", other.type_name()),
        )),
    }
}

fn to_float(args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::Integer(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::function("float", format!("'{}' is not a number", s))),
        other => Err(EvalError::function(
            "float",
            format!("cannot convert {} to a float", other.type_name()),
        )),
    }
}

/// `formatNumber(number, precision)`: fixed decimals with `,` grouping.
fn format_number(args: &[Value]) -> EvalResult {
    let n = num_arg("formatNumber", args, 0)?;
    let precision = int_arg("formatNumber", args, 1)?;
    if !(0..=15).contains(&precision) {
        return Err(EvalError::function("formatNumber", "precision must be between 0 and 15"));
    }
    let fixed = format!("{:.*}", precision as usize, n.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    if n < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        grouped.insert(0, '-');
    }
    Ok(Value::from(grouped))
}

fn base64_encode(args: &[Value]) -> EvalResult {
    let bytes = match &args[0] {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_i64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| EvalError::function("base64", "array items must be bytes"))?,
        other => {
            return Err(EvalError::function(
                "base64",
                format!("cannot encode {}", other.type_name()),
            ));
        }
    };
    Ok(Value::from(STANDARD.encode(bytes)))
}

fn base64_to_string(args: &[Value]) -> EvalResult {
    let encoded = str_arg("base64ToString", args, 0)?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| EvalError::function("base64ToString", e.to_string()))?;
    String::from_utf8(bytes)
        .map(Value::from)
        .map_err(|e| EvalError::function("base64ToString", e.to_string()))
}

fn type_test(kind: &'static str, test: fn(&Value) -> bool) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        kind,
        ReturnType::BOOLEAN,
        apply(move |args| Ok(Value::Boolean(test(&args[0])))),
        arity(1, 1),
    )
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new("int", ReturnType::NUMBER, apply(to_int), arity(1, 1)),
        ExpressionEvaluator::new("float", ReturnType::NUMBER, apply(to_float), arity(1, 1)),
        ExpressionEvaluator::new(
            "string",
            ReturnType::STRING,
            apply(|args| Ok(Value::from(args[0].to_string()))),
            arity(1, 1),
        ),
        ExpressionEvaluator::new(
            "bool",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(args[0].is_truthy()))),
            arity(1, 1),
        ),
        ExpressionEvaluator::new(
            "formatNumber",
            ReturnType::STRING,
            apply(format_number),
            order(&[ReturnType::NUMBER, ReturnType::NUMBER], &[]),
        ),
        ExpressionEvaluator::new("base64", ReturnType::STRING, apply(base64_encode), arity(1, 1)),
        ExpressionEvaluator::new(
            "base64ToString",
            ReturnType::STRING,
            apply(base64_to_string),
            order(&[ReturnType::STRING], &[]),
        ),
        type_test("isInteger", |v| matches!(v, Value::Integer(_))),
        type_test("isFloat", |v| matches!(v, Value::Float(_))),
        type_test("isString", |v| matches!(v, Value::String(_))),
        type_test("isBoolean", |v| matches!(v, Value::Boolean(_))),
        type_test("isArray", |v| matches!(v, Value::Array(_))),
        type_test("isObject", |v| matches!(v, Value::Object(_))),
    ]
}
