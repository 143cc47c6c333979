//! Collection functions and the lambda forms `foreach`, `select`, `where`,
//! `any` and `all`.
//!
//! A lambda form evaluates its body once per item with the iterator name bound
//! in a fresh [`StackedMemory`] frame. Objects iterate as `{key, value}` pairs.

use std::{cmp::Ordering, collections::BTreeMap};

use super::{
    comparison::{compare_values, loose_equals},
    utils::{
        apply, arity, array_arg, evaluate_children, int_arg, opt_str_arg, order, validate_lambda,
    },
};
use crate::{
    ast::kinds,
    error::EvalError,
    evaluator::{EvalResult, ExpressionEvaluator, Options, ReturnType},
    expression::Expression,
    memory::{Memory, StackedMemory},
    path::{PathSegment, resolve},
    value::Value,
};

const ARRAY: ReturnType = ReturnType::ARRAY;
const NUMBER: ReturnType = ReturnType::NUMBER;
const CONTAINER: ReturnType = ReturnType::STRING.union(ARRAY).union(ReturnType::OBJECT);
const SEQUENCE: ReturnType = ARRAY.union(ReturnType::STRING);
const ARRAY_OR_OBJECT: ReturnType = ARRAY.union(ReturnType::OBJECT);

// ========================================
// Lambda forms
// ========================================

/// Items of a lambda source, and whether it was an object.
fn lambda_source(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> Result<(Vec<Value>, bool), EvalError> {
    let source = &expr.children()[0];
    match source.try_evaluate_with(memory, options)? {
        Value::Array(items) => Ok((items, false)),
        Value::Object(map) => {
            let pairs = map
                .into_iter()
                .map(|(key, value)| Value::object([("key", Value::String(key)), ("value", value)]))
                .collect();
            Ok((pairs, true))
        }
        other => Err(EvalError::TypeMismatch {
            expression: source.to_string(),
            expected: "an array or an object".to_string(),
            found: other.type_name(),
        }),
    }
}

/// Evaluate the body for each item until `visit` returns `false`.
fn iterate<F>(
    expr: &Expression,
    items: &[Value],
    memory: &mut dyn Memory,
    options: &Options,
    mut visit: F,
) -> Result<(), EvalError>
where
    F: FnMut(&Value, Value) -> bool,
{
    let [_, iterator, body] = expr.children() else {
        return Ok(());
    };
    let name = iterator.property_name().unwrap_or_default();
    let mut scope = StackedMemory::new(memory);

    for item in items {
        scope.push(name, item.clone());
        let result = body.try_evaluate_with(&mut scope, options);
        scope.pop();
        if !visit(item, result?) {
            break;
        }
    }
    Ok(())
}

fn foreach(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (items, _) = lambda_source(expr, memory, options)?;
    let mut out = Vec::with_capacity(items.len());
    iterate(expr, &items, memory, options, |_, result| {
        out.push(result);
        true
    })?;
    Ok(Value::Array(out))
}

fn where_(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (items, is_object) = lambda_source(expr, memory, options)?;
    let mut kept = Vec::new();
    iterate(expr, &items, memory, options, |item, result| {
        if result.is_truthy() {
            kept.push(item.clone());
        }
        true
    })?;

    if !is_object {
        return Ok(Value::Array(kept));
    }
    let map: BTreeMap<String, Value> = kept
        .into_iter()
        .filter_map(|pair| match pair {
            Value::Object(mut fields) => {
                let key = fields.remove("key")?.as_str()?.to_string();
                Some((key, fields.remove("value").unwrap_or_default()))
            }
            _ => None,
        })
        .collect();
    Ok(Value::Object(map))
}

fn any(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (items, _) = lambda_source(expr, memory, options)?;
    let mut found = false;
    iterate(expr, &items, memory, options, |_, result| {
        found = result.is_truthy();
        !found
    })?;
    Ok(Value::Boolean(found))
}

fn all(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let (items, _) = lambda_source(expr, memory, options)?;
    let mut every = true;
    iterate(expr, &items, memory, options, |_, result| {
        every = result.is_truthy();
        every
    })?;
    Ok(Value::Boolean(every))
}

// ========================================
// Plain collection functions
// ========================================

fn count(args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Array(items) => Ok(Value::from(items.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        other => Err(EvalError::function(
            "count",
            format!("{} is not a string, an array or an object", other.type_name()),
        )),
    }
}

fn contains(args: &[Value]) -> EvalResult {
    let found = match (&args[0], &args[1]) {
        (Value::String(s), Value::String(part)) => s.contains(part.as_str()),
        (Value::Array(items), target) => items.iter().any(|item| loose_equals(item, target)),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    };
    Ok(Value::Boolean(found))
}

fn empty(args: &[Value]) -> EvalResult {
    Ok(Value::Boolean(match &args[0] {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }))
}

fn edge(last: bool) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| {
        Ok(match &args[0] {
            Value::String(s) => {
                let c = if last { s.chars().last() } else { s.chars().next() };
                c.map(|c| Value::from(c.to_string())).unwrap_or_default()
            }
            Value::Array(items) => {
                let item = if last { items.last() } else { items.first() };
                item.cloned().unwrap_or_default()
            }
            _ => Value::Null,
        })
    }
}

fn push_unique(out: &mut Vec<Value>, item: &Value) {
    if !out.iter().any(|seen| loose_equals(seen, item)) {
        out.push(item.clone());
    }
}

fn union(args: &[Value]) -> EvalResult {
    let mut out = Vec::new();
    for index in 0..args.len() {
        for item in array_arg("union", args, index)? {
            push_unique(&mut out, item);
        }
    }
    Ok(Value::Array(out))
}

fn intersection(args: &[Value]) -> EvalResult {
    let first = array_arg("intersection", args, 0)?;
    let mut rest = Vec::with_capacity(args.len() - 1);
    for index in 1..args.len() {
        rest.push(array_arg("intersection", args, index)?);
    }
    let mut out = Vec::new();
    for item in first {
        if rest.iter().all(|other| other.iter().any(|x| loose_equals(x, item))) {
            push_unique(&mut out, item);
        }
    }
    Ok(Value::Array(out))
}

fn clamp_count(n: i64, len: usize) -> usize {
    usize::try_from(n).unwrap_or(0).min(len)
}

fn skip(args: &[Value]) -> EvalResult {
    let items = array_arg("skip", args, 0)?;
    let start = clamp_count(int_arg("skip", args, 1)?, items.len());
    Ok(Value::Array(items[start..].to_vec()))
}

fn take(args: &[Value]) -> EvalResult {
    let n = int_arg("take", args, 1)?;
    match &args[0] {
        Value::String(s) => {
            let n = clamp_count(n, s.chars().count());
            Ok(Value::from(s.chars().take(n).collect::<String>()))
        }
        _ => {
            let items = array_arg("take", args, 0)?;
            Ok(Value::Array(items[..clamp_count(n, items.len())].to_vec()))
        }
    }
}

fn sub_array(args: &[Value]) -> EvalResult {
    let items = array_arg("subArray", args, 0)?;
    let start = int_arg("subArray", args, 1)?;
    let end = match args.get(2) {
        Some(_) => int_arg("subArray", args, 2)?,
        None => items.len() as i64,
    };
    if start < 0 || end < start || end as usize > items.len() {
        return Err(EvalError::function(
            "subArray",
            format!("range {}..{} is out of bounds for {} items", start, end, items.len()),
        ));
    }
    Ok(Value::Array(items[start as usize..end as usize].to_vec()))
}

fn sort_by(descending: bool) -> impl Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static {
    move |expr, memory, options| {
        let function = if descending { "sortByDescending" } else { "sortBy" };
        let args = evaluate_children(expr, memory, options, None)?;
        let mut items = array_arg(function, &args, 0)?.clone();
        let key = opt_str_arg(function, &args, 1)?.map(|name| [PathSegment::Field(name.to_string())]);

        let sort_key = |item: &Value| -> Value {
            match &key {
                Some(path) => resolve(item, path).cloned().unwrap_or_default(),
                None => item.clone(),
            }
        };

        let mut error = None;
        items.sort_by(|a, b| match compare_values(expr, &sort_key(a), &sort_key(b)) {
            Ok(ordering) if descending => ordering.reverse(),
            Ok(ordering) => ordering,
            Err(e) => {
                error.get_or_insert(e);
                Ordering::Equal
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(Value::Array(items)),
        }
    }
}

fn indices_and_values(args: &[Value]) -> EvalResult {
    let pairs = match &args[0] {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| Value::object([("index", Value::from(i)), ("value", item.clone())]))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| Value::object([("index", Value::from(key.as_str())), ("value", item.clone())]))
            .collect(),
        other => {
            return Err(EvalError::function(
                "indicesAndValues",
                format!("{} is not an array or an object", other.type_name()),
            ));
        }
    };
    Ok(Value::Array(pairs))
}

fn flatten_into(items: &[Value], depth: i64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => flatten_into(inner, depth - 1, out),
            other => out.push(other.clone()),
        }
    }
}

fn flatten(args: &[Value]) -> EvalResult {
    let items = array_arg("flatten", args, 0)?;
    let depth = match args.get(1) {
        Some(_) => int_arg("flatten", args, 1)?,
        None => 100,
    };
    let mut out = Vec::new();
    flatten_into(items, depth, &mut out);
    Ok(Value::Array(out))
}

fn unique(args: &[Value]) -> EvalResult {
    let mut out = Vec::new();
    for item in array_arg("unique", args, 0)? {
        push_unique(&mut out, item);
    }
    Ok(Value::Array(out))
}

fn reverse(args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::String(s) => Ok(Value::from(s.chars().rev().collect::<String>())),
        _ => {
            let mut items = array_arg("reverse", args, 0)?.clone();
            items.reverse();
            Ok(Value::Array(items))
        }
    }
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new(kinds::FOREACH, ARRAY, foreach, validate_lambda),
        ExpressionEvaluator::new(kinds::SELECT, ARRAY, foreach, validate_lambda),
        ExpressionEvaluator::new(kinds::WHERE, ARRAY | ReturnType::OBJECT, where_, validate_lambda),
        ExpressionEvaluator::new(kinds::ANY, ReturnType::BOOLEAN, any, validate_lambda),
        ExpressionEvaluator::new(kinds::ALL, ReturnType::BOOLEAN, all, validate_lambda),
        ExpressionEvaluator::new("count", NUMBER, apply(count), order(&[CONTAINER], &[])),
        ExpressionEvaluator::new("contains", ReturnType::BOOLEAN, apply(contains), arity(2, 2)),
        ExpressionEvaluator::new("empty", ReturnType::BOOLEAN, apply(empty), arity(1, 1)),
        ExpressionEvaluator::new("first", ReturnType::OBJECT, apply(edge(false)), arity(1, 1)),
        ExpressionEvaluator::new("last", ReturnType::OBJECT, apply(edge(true)), arity(1, 1)),
        ExpressionEvaluator::new("union", ARRAY, apply(union), arity(1, usize::MAX)),
        ExpressionEvaluator::new("intersection", ARRAY, apply(intersection), arity(1, usize::MAX)),
        ExpressionEvaluator::new("skip", ARRAY, apply(skip), order(&[ARRAY, NUMBER], &[])),
        ExpressionEvaluator::new(
            "take",
            ARRAY | ReturnType::STRING,
            apply(take),
            order(&[SEQUENCE, NUMBER], &[]),
        ),
        ExpressionEvaluator::new("subArray", ARRAY, apply(sub_array), order(&[ARRAY, NUMBER], &[NUMBER])),
        ExpressionEvaluator::new("sortBy", ARRAY, sort_by(false), order(&[ARRAY], &[ReturnType::STRING])),
        ExpressionEvaluator::new(
            "sortByDescending",
            ARRAY,
            sort_by(true),
            order(&[ARRAY], &[ReturnType::STRING]),
        ),
        ExpressionEvaluator::new(
            "indicesAndValues",
            ARRAY,
            apply(indices_and_values),
            order(&[ARRAY_OR_OBJECT], &[]),
        ),
        ExpressionEvaluator::new("flatten", ARRAY, apply(flatten), order(&[ARRAY], &[NUMBER])),
        ExpressionEvaluator::new("unique", ARRAY, apply(unique), order(&[ARRAY], &[])),
        ExpressionEvaluator::new(
            "reverse",
            ARRAY | ReturnType::STRING,
            apply(reverse),
            order(&[SEQUENCE], &[]),
        ),
        ExpressionEvaluator::new(
            kinds::CREATE_ARRAY,
            ARRAY,
            apply(|args| Ok(Value::Array(args.to_vec()))),
            arity(0, usize::MAX),
        ),
    ]
}
