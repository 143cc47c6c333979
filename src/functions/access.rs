//! Core node kinds: constants and memory access through `Accessor` and
//! `Element` chains.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::utils::validate_arity;
use crate::{
    ast::kinds,
    error::{EvalError, ExpressionError},
    evaluator::{EvalResult, ExpressionEvaluator, Options, ReturnType},
    expression::Expression,
    memory::Memory,
    path::{Path, PathSegment, format_path, resolve},
    value::Value,
};

static CONSTANT: Lazy<Arc<ExpressionEvaluator>> = Lazy::new(|| {
    Arc::new(ExpressionEvaluator::new(
        kinds::CONSTANT,
        ReturnType::OBJECT,
        |expr, _, _| Ok(expr.constant_value().cloned().unwrap_or_default()),
        |expr| validate_arity(expr, 0, 0),
    ))
});

static ACCESSOR: Lazy<Arc<ExpressionEvaluator>> = Lazy::new(|| {
    Arc::new(ExpressionEvaluator::new(
        kinds::ACCESSOR,
        ReturnType::OBJECT,
        evaluate_path,
        validate_accessor,
    ))
});

static ELEMENT: Lazy<Arc<ExpressionEvaluator>> = Lazy::new(|| {
    Arc::new(ExpressionEvaluator::new(
        kinds::ELEMENT,
        ReturnType::OBJECT,
        evaluate_path,
        validate_element,
    ))
});

pub(crate) fn constant_evaluator() -> Arc<ExpressionEvaluator> {
    Arc::clone(&CONSTANT)
}

pub(crate) fn accessor_evaluator() -> Arc<ExpressionEvaluator> {
    Arc::clone(&ACCESSOR)
}

pub(crate) fn element_evaluator() -> Arc<ExpressionEvaluator> {
    Arc::clone(&ELEMENT)
}

fn validate_accessor(expr: &Expression) -> Result<(), ExpressionError> {
    validate_arity(expr, 1, 2)?;
    if expr.property_name().is_none() {
        return Err(ExpressionError::Invalid {
            expression: expr.to_string(),
            message: "property name must be a string constant".to_string(),
        });
    }
    Ok(())
}

fn validate_element(expr: &Expression) -> Result<(), ExpressionError> {
    validate_arity(expr, 2, 2)?;
    let index = &expr.children()[1];
    if !(ReturnType::NUMBER | ReturnType::STRING).accepts(index.return_type()) {
        return Err(ExpressionError::Type {
            expression: expr.to_string(),
            child: index.to_string(),
            expected: "a number or a string".to_string(),
        });
    }
    Ok(())
}

/// Turn an evaluated index into a path segment.
pub(crate) fn index_segment(expr: &Expression, index: Value) -> Result<PathSegment, EvalError> {
    match index {
        Value::String(name) => Ok(PathSegment::Field(name)),
        other => other.as_i64().map(PathSegment::Index).ok_or_else(|| EvalError::InvalidIndex {
            expression: expr.to_string(),
            index: other.to_string(),
        }),
    }
}

/// Split an `Accessor`/`Element` chain into the memory path it names and the
/// non-path expression it starts from, if any.
///
/// `a.b[1 + 1]` yields `([a, b, 2], None)`; `first(x).y` yields
/// `([y], Some(first(x)))`. Computed indices are evaluated here.
pub(crate) fn try_accumulate_path<'e>(
    expr: &'e Expression,
    memory: &mut dyn Memory,
    options: &Options,
) -> Result<(Path, Option<&'e Expression>), EvalError> {
    let mut segments = Vec::new();
    let mut current = Some(expr);
    let mut left = None;

    while let Some(node) = current {
        match (node.kind(), node.children()) {
            (kinds::ACCESSOR, [_, rest @ ..]) => {
                let name = node.property_name().unwrap_or_default();
                segments.push(PathSegment::Field(name.to_string()));
                current = rest.first();
            }
            (kinds::ELEMENT, [instance, index]) => {
                let index = index.try_evaluate_with(memory, options)?;
                segments.push(index_segment(node, index)?);
                current = Some(instance);
            }
            _ => {
                left = Some(node);
                current = None;
            }
        }
    }

    segments.reverse();
    Ok((segments, left))
}

/// Read a path from memory, applying null substitution and strictness.
pub(crate) fn read_memory(memory: &dyn Memory, path: &[PathSegment], options: &Options) -> EvalResult {
    let found = memory.get_path(path);
    if matches!(found, None | Some(Value::Null))
        && let Some(substitute) = &options.null_substitution
    {
        return Ok(substitute(&format_path(path)));
    }
    match found {
        Some(value) => Ok(value),
        None if options.strict_paths => Err(EvalError::PathNotFound {
            path: format_path(path),
        }),
        None => Ok(Value::Null),
    }
}

fn evaluate_path(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (path, left) = try_accumulate_path(expr, memory, options)?;
    let Some(left) = left else {
        return read_memory(memory, &path, options);
    };

    let instance = left.try_evaluate_with(memory, options)?;
    match resolve(&instance, &path) {
        Some(value) => Ok(value.clone()),
        None if options.strict_paths => {
            let separator = if matches!(path.first(), Some(PathSegment::Field(_))) { "." } else { "" };
            Err(EvalError::PathNotFound {
                path: format!("{}{}{}", left, separator, format_path(&path)),
            })
        }
        None => Ok(Value::Null),
    }
}
