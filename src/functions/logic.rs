//! Boolean operators and lazy control flow.
//!
//! `&&`, `||`, `!` and `if` read an operand that fails to evaluate as
//! `false` rather than propagating the error.

use super::utils::{arity, validate_arity};
use crate::{
    ast::kinds,
    error::ExpressionError,
    evaluator::{ExpressionEvaluator, Options, ReturnType},
    expression::Expression,
    memory::Memory,
    value::Value,
};

fn truthy(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> bool {
    expr.try_evaluate_with(memory, options)
        .map(|value| value.is_truthy())
        .unwrap_or(false)
}

fn validate_if(expr: &Expression) -> Result<(), ExpressionError> {
    validate_arity(expr, 3, 3)
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new(
            kinds::AND,
            ReturnType::BOOLEAN,
            |expr, memory, options| {
                let all = expr.children().iter().all(|child| truthy(child, memory, options));
                Ok(Value::Boolean(all))
            },
            arity(2, usize::MAX),
        ),
        ExpressionEvaluator::new(
            kinds::OR,
            ReturnType::BOOLEAN,
            |expr, memory, options| {
                let any = expr.children().iter().any(|child| truthy(child, memory, options));
                Ok(Value::Boolean(any))
            },
            arity(2, usize::MAX),
        ),
        ExpressionEvaluator::new(
            kinds::NOT,
            ReturnType::BOOLEAN,
            |expr, memory, options| Ok(Value::Boolean(!truthy(&expr.children()[0], memory, options))),
            arity(1, 1),
        ),
        ExpressionEvaluator::new(
            "if",
            ReturnType::OBJECT,
            |expr, memory, options| {
                let [condition, then, otherwise] = expr.children() else {
                    return Ok(Value::Null);
                };
                if truthy(condition, memory, options) {
                    then.try_evaluate_with(memory, options)
                } else {
                    otherwise.try_evaluate_with(memory, options)
                }
            },
            validate_if,
        ),
        ExpressionEvaluator::new(
            kinds::COALESCE,
            ReturnType::OBJECT,
            |expr, memory, options| {
                for child in expr.children() {
                    let value = child.try_evaluate_with(memory, options)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                Ok(Value::Null)
            },
            arity(1, usize::MAX),
        ),
        ExpressionEvaluator::new(
            "exists",
            ReturnType::BOOLEAN,
            |expr, memory, options| {
                let found = expr.children()[0]
                    .try_evaluate_with(memory, options)
                    .is_ok_and(|value| !value.is_null());
                Ok(Value::Boolean(found))
            },
            arity(1, 1),
        ),
    ]
}
