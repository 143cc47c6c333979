//! Building blocks for evaluators: construction-time validators, argument
//! verifiers and adapters that evaluate children before calling a function.

use crate::{
    error::{EvalError, ExpressionError},
    evaluator::{EvalResult, Options, ReturnType},
    expression::Expression,
    memory::Memory,
    value::Value,
};

/// Check one evaluated argument against the child expression that produced it.
pub type Verify = fn(&Value, &Expression) -> Result<(), EvalError>;

// ========================================
// Validators
// ========================================

pub fn validate_arity(expr: &Expression, min: usize, max: usize) -> Result<(), ExpressionError> {
    let actual = expr.children().len();
    if actual < min || actual > max {
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("between {} and {}", min, max)
        };
        return Err(ExpressionError::Arity {
            expression: expr.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_type(expr: &Expression, child: &Expression, expected: ReturnType) -> Result<(), ExpressionError> {
    if expected.accepts(child.return_type()) {
        Ok(())
    } else {
        Err(ExpressionError::Type {
            expression: expr.to_string(),
            child: child.to_string(),
            expected: expected.describe(),
        })
    }
}

/// Every child must be compatible with `expected`.
pub fn validate_types(expr: &Expression, expected: ReturnType) -> Result<(), ExpressionError> {
    for child in expr.children() {
        check_type(expr, child, expected)?;
    }
    Ok(())
}

/// Children must match `required` positionally, followed by up to
/// `optional.len()` further children matching `optional`.
pub fn validate_order(
    expr: &Expression,
    required: &[ReturnType],
    optional: &[ReturnType],
) -> Result<(), ExpressionError> {
    validate_arity(expr, required.len(), required.len() + optional.len())?;
    let expected = required.iter().chain(optional);
    for (child, expected) in expr.children().iter().zip(expected) {
        check_type(expr, child, *expected)?;
    }
    Ok(())
}

/// `name(collection, iterator, body)`: the iterator must be a bare identifier.
pub fn validate_lambda(expr: &Expression) -> Result<(), ExpressionError> {
    validate_arity(expr, 3, 3)?;
    let iterator = &expr.children()[1];
    if iterator.children().len() != 1 || iterator.property_name().is_none() {
        return Err(ExpressionError::Invalid {
            expression: expr.to_string(),
            message: format!("second argument {} must be an iterator name", iterator),
        });
    }
    Ok(())
}

pub fn arity(
    min: usize,
    max: usize,
) -> impl Fn(&Expression) -> Result<(), ExpressionError> + Send + Sync + 'static {
    move |expr| validate_arity(expr, min, max)
}

pub fn arity_and_types(
    min: usize,
    max: usize,
    expected: ReturnType,
) -> impl Fn(&Expression) -> Result<(), ExpressionError> + Send + Sync + 'static {
    move |expr| {
        validate_arity(expr, min, max)?;
        validate_types(expr, expected)
    }
}

pub fn order(
    required: &'static [ReturnType],
    optional: &'static [ReturnType],
) -> impl Fn(&Expression) -> Result<(), ExpressionError> + Send + Sync + 'static {
    move |expr| validate_order(expr, required, optional)
}

// ========================================
// Verifiers
// ========================================

fn mismatch(value: &Value, child: &Expression, expected: &str) -> EvalError {
    EvalError::TypeMismatch {
        expression: child.to_string(),
        expected: expected.to_string(),
        found: value.type_name(),
    }
}

pub fn verify_number(value: &Value, child: &Expression) -> Result<(), EvalError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(mismatch(value, child, "a number"))
    }
}

pub fn verify_integer(value: &Value, child: &Expression) -> Result<(), EvalError> {
    if value.as_i64().is_some() {
        Ok(())
    } else {
        Err(mismatch(value, child, "an integer"))
    }
}

pub fn verify_string(value: &Value, child: &Expression) -> Result<(), EvalError> {
    match value {
        Value::String(_) => Ok(()),
        _ => Err(mismatch(value, child, "a string")),
    }
}

pub fn verify_string_or_null(value: &Value, child: &Expression) -> Result<(), EvalError> {
    match value {
        Value::String(_) | Value::Null => Ok(()),
        _ => Err(mismatch(value, child, "a string or null")),
    }
}

pub fn verify_number_or_string(value: &Value, child: &Expression) -> Result<(), EvalError> {
    match value {
        Value::String(_) | Value::Integer(_) | Value::Float(_) => Ok(()),
        _ => Err(mismatch(value, child, "a number or a string")),
    }
}

pub fn verify_list(value: &Value, child: &Expression) -> Result<(), EvalError> {
    match value {
        Value::Array(_) => Ok(()),
        _ => Err(mismatch(value, child, "an array")),
    }
}

pub fn verify_container(value: &Value, child: &Expression) -> Result<(), EvalError> {
    match value {
        Value::String(_) | Value::Array(_) | Value::Object(_) => Ok(()),
        _ => Err(mismatch(value, child, "a string, an array or an object")),
    }
}

pub fn verify_not_null(value: &Value, child: &Expression) -> Result<(), EvalError> {
    if value.is_null() {
        Err(mismatch(value, child, "a non-null value"))
    } else {
        Ok(())
    }
}

// ========================================
// Evaluation adapters
// ========================================

/// Evaluate children left to right, stopping at the first error.
pub fn evaluate_children(
    expr: &Expression,
    memory: &mut dyn Memory,
    options: &Options,
    verify: Option<Verify>,
) -> Result<Vec<Value>, EvalError> {
    let mut args = Vec::with_capacity(expr.children().len());
    for child in expr.children() {
        let value = child.try_evaluate_with(memory, options)?;
        if let Some(verify) = verify {
            verify(&value, child)?;
        }
        args.push(value);
    }
    Ok(args)
}

/// Adapt a function over evaluated arguments into an evaluation callback.
pub fn apply<F>(f: F) -> impl Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static
where
    F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
{
    move |expr, memory, options| f(&evaluate_children(expr, memory, options, None)?)
}

/// Like [`apply`], checking every argument with `verify` first.
pub fn apply_verified<F>(
    f: F,
    verify: Verify,
) -> impl Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static
where
    F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
{
    move |expr, memory, options| f(&evaluate_children(expr, memory, options, Some(verify))?)
}

/// Fold a binary operation over two or more arguments, left to right.
pub fn apply_sequence<F>(
    f: F,
    verify: Option<Verify>,
) -> impl Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static
where
    F: Fn(&Expression, &Value, &Value) -> EvalResult + Send + Sync + 'static,
{
    move |expr, memory, options| {
        let mut args = evaluate_children(expr, memory, options, verify)?.into_iter();
        let mut acc = args.next().unwrap_or_default();
        for next in args {
            acc = f(expr, &acc, &next)?;
        }
        Ok(acc)
    }
}

// ========================================
// Argument access
// ========================================

fn bad_argument(function: &str, index: usize, expected: &str, found: Option<&Value>) -> EvalError {
    EvalError::function(
        function,
        format!(
            "argument {} must be {}, found {}",
            index + 1,
            expected,
            found.map_or("nothing", Value::type_name)
        ),
    )
}

pub fn str_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        other => Err(bad_argument(function, index, "a string", other)),
    }
}

/// A string argument where `null` reads as `""`.
pub fn text_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Ok(""),
        other => Err(bad_argument(function, index, "a string", other)),
    }
}

pub fn int_arg(function: &str, args: &[Value], index: usize) -> Result<i64, EvalError> {
    let value = args.get(index);
    value
        .and_then(Value::as_i64)
        .ok_or_else(|| bad_argument(function, index, "an integer", value))
}

pub fn num_arg(function: &str, args: &[Value], index: usize) -> Result<f64, EvalError> {
    let value = args.get(index);
    value
        .and_then(Value::as_f64)
        .ok_or_else(|| bad_argument(function, index, "a number", value))
}

pub fn array_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a Vec<Value>, EvalError> {
    let value = args.get(index);
    value
        .and_then(Value::as_array)
        .ok_or_else(|| bad_argument(function, index, "an array", value))
}

/// Optional trailing string argument.
pub fn opt_str_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<Option<&'a str>, EvalError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => str_arg(function, args, index).map(Some),
    }
}
