//! Object construction and property functions, and `setPathToValue`, the only
//! built-in that writes to memory.

use std::collections::BTreeMap;

use super::{
    access::{read_memory, try_accumulate_path},
    utils::{apply, arity, evaluate_children, order, str_arg, validate_arity},
};
use crate::{
    ast::kinds,
    error::{EvalError, ExpressionError},
    evaluator::{EvalResult, ExpressionEvaluator, Options, ReturnType},
    expression::Expression,
    memory::Memory,
    output::to_json,
    path::{PathSegment, find_key, format_path},
    value::Value,
};

const OBJECT: ReturnType = ReturnType::OBJECT;
const STRING: ReturnType = ReturnType::STRING;

fn object_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a BTreeMap<String, Value>, EvalError> {
    match args.get(index) {
        Some(Value::Object(map)) => Ok(map),
        other => Err(EvalError::function(
            function,
            format!(
                "argument {} must be an object, found {}",
                index + 1,
                other.map_or("nothing", Value::type_name)
            ),
        )),
    }
}

fn json(args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::String(text) => serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from_json)
            .map_err(|e| EvalError::function("json", format!("invalid JSON {:?}: {}", text, e))),
        other => Ok(other.clone()),
    }
}

fn json_stringify(args: &[Value]) -> EvalResult {
    Ok(Value::from(to_json(&args[0])))
}

/// `getProperty(object, name)`, or `getProperty(name)` to read a top-level
/// memory value by a computed name.
fn get_property(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let args = evaluate_children(expr, memory, options, None)?;
    if args.len() == 1 {
        let name = str_arg("getProperty", &args, 0)?;
        return read_memory(memory, &[PathSegment::Field(name.to_string())], options);
    }

    let name = str_arg("getProperty", &args, 1)?;
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Object(map) => Ok(find_key(map, name)
            .and_then(|key| map.get(key))
            .cloned()
            .unwrap_or_default()),
        other => Err(EvalError::function(
            "getProperty",
            format!("argument 1 must be an object, found {}", other.type_name()),
        )),
    }
}

fn add_property(args: &[Value]) -> EvalResult {
    let mut map = object_arg("addProperty", args, 0)?.clone();
    let name = str_arg("addProperty", args, 1)?;
    if find_key(&map, name).is_some() {
        return Err(EvalError::function(
            "addProperty",
            format!("property '{}' already exists", name),
        ));
    }
    map.insert(name.to_string(), args[2].clone());
    Ok(Value::Object(map))
}

fn set_property(args: &[Value]) -> EvalResult {
    let mut map = object_arg("setProperty", args, 0)?.clone();
    let name = str_arg("setProperty", args, 1)?;
    let key = find_key(&map, name).cloned().unwrap_or_else(|| name.to_string());
    map.insert(key, args[2].clone());
    Ok(Value::Object(map))
}

fn remove_property(args: &[Value]) -> EvalResult {
    let mut map = object_arg("removeProperty", args, 0)?.clone();
    let name = str_arg("removeProperty", args, 1)?;
    if let Some(key) = find_key(&map, name).cloned() {
        map.remove(&key);
    }
    Ok(Value::Object(map))
}

/// Shallow merge, later objects winning.
fn merge(args: &[Value]) -> EvalResult {
    let mut merged = BTreeMap::new();
    for index in 0..args.len() {
        for (key, value) in object_arg("merge", args, index)? {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

fn validate_set_path(expr: &Expression) -> Result<(), ExpressionError> {
    validate_arity(expr, 2, 2)?;
    let target = &expr.children()[0];
    if !matches!(target.kind(), kinds::ACCESSOR | kinds::ELEMENT) {
        return Err(ExpressionError::Invalid {
            expression: expr.to_string(),
            message: format!("{} is not a memory path", target),
        });
    }
    Ok(())
}

fn set_path_to_value(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (path, left) = try_accumulate_path(&expr.children()[0], memory, options)?;
    if let Some(left) = left {
        return Err(EvalError::function(
            kinds::SET_PATH_TO_VALUE,
            format!("cannot write through {}", left),
        ));
    }
    let value = expr.children()[1].try_evaluate_with(memory, options)?;
    if memory.set_path(&path, value.clone()) {
        Ok(value)
    } else {
        Err(EvalError::SetFailed {
            path: format_path(&path),
        })
    }
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new(kinds::JSON, OBJECT, apply(json), order(&[STRING], &[])),
        ExpressionEvaluator::new("jsonStringify", STRING, apply(json_stringify), arity(1, 1)),
        ExpressionEvaluator::new("getProperty", OBJECT, get_property, arity(1, 2)),
        ExpressionEvaluator::new("addProperty", OBJECT, apply(add_property), order(&[OBJECT, STRING, OBJECT], &[])),
        ExpressionEvaluator::new(
            kinds::SET_PROPERTY,
            OBJECT,
            apply(set_property),
            order(&[OBJECT, STRING, OBJECT], &[]),
        ),
        ExpressionEvaluator::new(
            "removeProperty",
            OBJECT,
            apply(remove_property),
            order(&[OBJECT, STRING], &[]),
        ),
        ExpressionEvaluator::new("merge", OBJECT, apply(merge), arity(1, usize::MAX)),
        ExpressionEvaluator::new(kinds::SET_PATH_TO_VALUE, OBJECT, set_path_to_value, validate_set_path),
    ]
}
