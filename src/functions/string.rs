//! String functions, plus `indexOf`/`lastIndexOf` which also search arrays.
//!
//! Character positions count Unicode scalar values, not bytes.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    comparison::loose_equals,
    utils::{
        apply, apply_verified, arity, array_arg, int_arg, opt_str_arg, order, str_arg, text_arg,
        validate_order, verify_string_or_null,
    },
};
use crate::{
    ast::kinds,
    error::{EvalError, ExpressionError},
    evaluator::{EvalResult, ExpressionEvaluator, ReturnType},
    expression::Expression,
    value::Value,
};

const STRING: ReturnType = ReturnType::STRING;
const NUMBER: ReturnType = ReturnType::NUMBER;
const SEQUENCE: ReturnType = STRING.union(ReturnType::ARRAY);

static REGEX_CACHE: Lazy<DashMap<String, Regex>> = Lazy::new(DashMap::new);

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(cached) = REGEX_CACHE.get(pattern) {
        return Ok(cached.clone());
    }
    let regex = Regex::new(pattern)?;
    REGEX_CACHE.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// `concat` joins text, except that two or more array arguments are merged
/// into one array.
fn concat(args: &[Value]) -> EvalResult {
    if args.len() >= 2 && args.iter().all(|arg| matches!(arg, Value::Array(_))) {
        let merged = args
            .iter()
            .filter_map(Value::as_array)
            .flat_map(|items| items.iter().cloned())
            .collect();
        return Ok(Value::Array(merged));
    }
    Ok(Value::String(args.iter().map(Value::to_text).collect()))
}

fn length(args: &[Value]) -> EvalResult {
    Ok(Value::from(text_arg("length", args, 0)?.chars().count()))
}

fn replace(args: &[Value]) -> EvalResult {
    let text = text_arg("replace", args, 0)?;
    let old = str_arg("replace", args, 1)?;
    if old.is_empty() {
        return Err(EvalError::function("replace", "the value to replace cannot be empty"));
    }
    Ok(Value::from(text.replace(old, text_arg("replace", args, 2)?)))
}

fn replace_ignore_case(args: &[Value]) -> EvalResult {
    let text = text_arg("replaceIgnoreCase", args, 0)?;
    let old = str_arg("replaceIgnoreCase", args, 1)?;
    if old.is_empty() {
        return Err(EvalError::function(
            "replaceIgnoreCase",
            "the value to replace cannot be empty",
        ));
    }
    let new = text_arg("replaceIgnoreCase", args, 2)?;
    let regex = compile(&format!("(?i){}", regex::escape(old)))
        .map_err(|e| EvalError::function("replaceIgnoreCase", e.to_string()))?;
    Ok(Value::from(regex.replace_all(text, regex::NoExpand(new)).into_owned()))
}

fn split(args: &[Value]) -> EvalResult {
    let text = text_arg("split", args, 0)?;
    let separator = text_arg("split", args, 1)?;
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        text.split(separator).map(Value::from).collect()
    };
    Ok(Value::Array(parts))
}

fn substring(args: &[Value]) -> EvalResult {
    let chars: Vec<char> = text_arg("substring", args, 0)?.chars().collect();
    let start = int_arg("substring", args, 1)?;
    if start < 0 || start as usize > chars.len() {
        return Err(EvalError::function(
            "substring",
            format!("start index {} is out of range for a string of length {}", start, chars.len()),
        ));
    }
    let start = start as usize;
    let end = match args.get(2) {
        Some(_) => {
            let length = int_arg("substring", args, 2)?;
            if length < 0 || start + length as usize > chars.len() {
                return Err(EvalError::function(
                    "substring",
                    format!("length {} from index {} is out of range", length, start),
                ));
            }
            start + length as usize
        }
        None => chars.len(),
    };
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

fn sentence_case(args: &[Value]) -> EvalResult {
    let lower = text_arg("sentenceCase", args, 0)?.to_lowercase();
    let mut chars = lower.chars();
    Ok(Value::from(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }))
}

fn title_case(args: &[Value]) -> EvalResult {
    let text = text_arg("titleCase", args, 0)?.to_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut start_of_word = true;
    for c in text.chars() {
        if start_of_word && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        start_of_word = c.is_whitespace();
    }
    Ok(Value::from(out))
}

fn count_word(args: &[Value]) -> EvalResult {
    Ok(Value::from(text_arg("countWord", args, 0)?.split_whitespace().count()))
}

fn add_ordinal(args: &[Value]) -> EvalResult {
    let n = int_arg("addOrdinal", args, 0)?;
    if n <= 0 {
        return Ok(Value::from(n.to_string()));
    }
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    Ok(Value::from(format!("{}{}", n, suffix)))
}

fn join(args: &[Value]) -> EvalResult {
    let items = array_arg("join", args, 0)?;
    let separator = text_arg("join", args, 1)?;
    let texts: Vec<String> = items.iter().map(Value::to_text).collect();
    let joined = match (opt_str_arg("join", args, 2)?, texts.split_last()) {
        (Some(last), Some((tail, head))) if !head.is_empty() => {
            format!("{}{}{}", head.join(separator), last, tail)
        }
        _ => texts.join(separator),
    };
    Ok(Value::from(joined))
}

fn is_match(args: &[Value]) -> EvalResult {
    let text = text_arg("isMatch", args, 0)?;
    let pattern = str_arg("isMatch", args, 1)?;
    let regex = compile(pattern).map_err(|e| EvalError::function("isMatch", e.to_string()))?;
    Ok(Value::Boolean(regex.is_match(text)))
}

fn validate_is_match(expr: &Expression) -> Result<(), ExpressionError> {
    validate_order(expr, &[STRING, STRING], &[])?;
    if let Some(Value::String(pattern)) = expr.children()[1].constant_value()
        && let Err(e) = compile(pattern)
    {
        return Err(ExpressionError::Invalid {
            expression: expr.to_string(),
            message: format!("'{}' is not a valid regular expression: {}", pattern, e),
        });
    }
    Ok(())
}

fn index_of(function: &'static str, last: bool) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| {
        if let Some(Value::Array(items)) = args.first() {
            let target = &args[1];
            let position = if last {
                items.iter().rposition(|item| loose_equals(item, target))
            } else {
                items.iter().position(|item| loose_equals(item, target))
            };
            return Ok(position.map_or(Value::Integer(-1), Value::from));
        }

        let Some(Value::String(text)) = args.first() else {
            return match args.first() {
                Some(Value::Null) => Ok(Value::Integer(-1)),
                _ => Err(EvalError::function(function, "argument 1 must be a string or an array")),
            };
        };
        let search = text_arg(function, args, 1)?;
        if search.is_empty() {
            let len = text.chars().count() as i64;
            return Ok(Value::Integer(if last { (len - 1).max(0) } else { 0 }));
        }
        let found = if last { text.rfind(search) } else { text.find(search) };
        Ok(match found {
            Some(byte) => Value::from(text[..byte].chars().count()),
            None => Value::Integer(-1),
        })
    }
}

fn affix_check(function: &'static str, test: fn(&str, &str) -> bool) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| {
        let text = text_arg(function, args, 0)?;
        let affix = text_arg(function, args, 1)?;
        Ok(Value::Boolean(test(text, affix)))
    }
}

fn map_text(function: &'static str, f: fn(&str) -> String) -> impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static {
    move |args| Ok(Value::from(f(text_arg(function, args, 0)?)))
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        ExpressionEvaluator::new(kinds::CONCAT, STRING | ReturnType::ARRAY, apply(concat), arity(1, usize::MAX)),
        ExpressionEvaluator::new(
            "length",
            NUMBER,
            apply_verified(length, verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "replace",
            STRING,
            apply_verified(replace, verify_string_or_null),
            order(&[STRING, STRING, STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "replaceIgnoreCase",
            STRING,
            apply_verified(replace_ignore_case, verify_string_or_null),
            order(&[STRING, STRING, STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "split",
            ReturnType::ARRAY,
            apply_verified(split, verify_string_or_null),
            order(&[STRING], &[STRING]),
        ),
        ExpressionEvaluator::new("substring", STRING, apply(substring), order(&[STRING, NUMBER], &[NUMBER])),
        ExpressionEvaluator::new(
            "toLower",
            STRING,
            apply_verified(map_text("toLower", str::to_lowercase), verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "toUpper",
            STRING,
            apply_verified(map_text("toUpper", str::to_uppercase), verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "trim",
            STRING,
            apply_verified(map_text("trim", |s| s.trim().to_string()), verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "startsWith",
            ReturnType::BOOLEAN,
            apply_verified(affix_check("startsWith", |s, p| s.starts_with(p)), verify_string_or_null),
            order(&[STRING, STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "endsWith",
            ReturnType::BOOLEAN,
            apply_verified(affix_check("endsWith", |s, p| s.ends_with(p)), verify_string_or_null),
            order(&[STRING, STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "sentenceCase",
            STRING,
            apply_verified(sentence_case, verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "titleCase",
            STRING,
            apply_verified(title_case, verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "countWord",
            NUMBER,
            apply_verified(count_word, verify_string_or_null),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new("addOrdinal", STRING, apply(add_ordinal), order(&[NUMBER], &[])),
        ExpressionEvaluator::new(
            "join",
            STRING,
            apply(join),
            order(&[ReturnType::ARRAY, STRING], &[STRING]),
        ),
        ExpressionEvaluator::new("isMatch", ReturnType::BOOLEAN, apply(is_match), validate_is_match),
        ExpressionEvaluator::new("newLine", STRING, apply(|_| Ok(Value::from("\n"))), arity(0, 0)),
        ExpressionEvaluator::new(
            "indexOf",
            NUMBER,
            apply(index_of("indexOf", false)),
            order(&[SEQUENCE, ReturnType::OBJECT], &[]),
        ),
        ExpressionEvaluator::new(
            "lastIndexOf",
            NUMBER,
            apply(index_of("lastIndexOf", true)),
            order(&[SEQUENCE, ReturnType::OBJECT], &[]),
        ),
    ]
}
