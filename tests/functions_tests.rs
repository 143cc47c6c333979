// tests/functions_tests.rs

use adaptive_expressions::functions::utils::{apply, validate_arity};
use adaptive_expressions::memory::SimpleObjectMemory;
use adaptive_expressions::{
    EvalError, Expression, ExpressionError, ExpressionEvaluator, FunctionTable, ReturnType, Value,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

fn eval_with(table: &FunctionTable, text: &str) -> Result<Value, EvalError> {
    let expr = Expression::parse_with(text, table).unwrap_or_else(|e| panic!("failed to parse {}: {}", text, e));
    expr.try_evaluate(&mut SimpleObjectMemory::default())
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_fn() {
    let table = FunctionTable::new();
    assert!(!table.contains("double"));

    let previous = table.register_fn("double", ReturnType::NUMBER, |args| {
        Ok(Value::Integer(args[0].as_i64().unwrap_or(0) * 2))
    });
    assert!(previous.is_none());
    assert!(table.contains("double"));
    assert_eq!(eval_with(&table, "double(21)"), Ok(Value::Integer(42)));
    assert_eq!(eval_with(&table, "double(1) + 1"), Ok(Value::Integer(3)));
}

#[test]
fn test_register_replaces_custom_entry() {
    let table = FunctionTable::new();
    table.register_fn("answer", ReturnType::NUMBER, |_| Ok(Value::Integer(1)));
    let previous = table.register_fn("answer", ReturnType::NUMBER, |_| Ok(Value::Integer(2)));

    assert_eq!(previous.map(|e| e.kind().to_string()), Some("answer".to_string()));
    assert_eq!(eval_with(&table, "answer()"), Ok(Value::Integer(2)));
}

#[test]
fn test_custom_shadows_builtin() {
    let table = FunctionTable::new();
    table.register_fn("length", ReturnType::NUMBER, |_| Ok(Value::Integer(-1)));

    assert_eq!(eval_with(&table, "length('abc')"), Ok(Value::Integer(-1)));
    assert_eq!(
        eval_with(FunctionTable::global(), "length('abc')"),
        Ok(Value::Integer(3))
    );
}

#[test]
fn test_remove_restores_builtin() {
    let table = FunctionTable::new();
    table.register_fn("length", ReturnType::NUMBER, |_| Ok(Value::Integer(-1)));

    assert!(table.remove("length"));
    assert!(!table.remove("length"));
    assert!(table.contains("length"));
    assert_eq!(eval_with(&table, "length('abc')"), Ok(Value::Integer(3)));
}

#[test]
fn test_registration_affects_later_parses_only() {
    let table = FunctionTable::new();
    table.register_fn("pick", ReturnType::STRING, |_| Ok(Value::from("first")));
    let before = Expression::parse_with("pick()", &table).unwrap();

    table.register_fn("pick", ReturnType::STRING, |_| Ok(Value::from("second")));
    let after = Expression::parse_with("pick()", &table).unwrap();

    let mut memory = SimpleObjectMemory::default();
    assert_eq!(before.try_evaluate(&mut memory), Ok(Value::from("first")));
    assert_eq!(after.try_evaluate(&mut memory), Ok(Value::from("second")));
}

#[test]
fn test_custom_validator_runs_at_parse() {
    let table = FunctionTable::new();
    table.register(ExpressionEvaluator::new(
        "twice",
        ReturnType::STRING,
        apply(|args| Ok(Value::from(args[0].to_text().repeat(2)))),
        |expr| validate_arity(expr, 1, 1),
    ));

    assert_eq!(eval_with(&table, "twice('ab')"), Ok(Value::from("abab")));
    let err = Expression::parse_with("twice()", &table).unwrap_err();
    assert!(matches!(err, ExpressionError::Arity { actual: 0, .. }), "{:?}", err);
}

#[test]
fn test_custom_error_propagates() {
    let table = FunctionTable::new();
    table.register_fn("fail", ReturnType::OBJECT, |_| Err(EvalError::function("fail", "always")));

    assert_eq!(
        eval_with(&table, "fail()"),
        Err(EvalError::Function {
            function: "fail".to_string(),
            expression: "fail()".to_string(),
            message: "always".to_string(),
        })
    );
    assert_eq!(eval_with(&table, "if(fail(), 1, 2)"), Ok(Value::Integer(2)));
}

#[test]
fn test_unknown_function() {
    let table = FunctionTable::new();
    assert_eq!(
        Expression::parse_with("missing(1)", &table).unwrap_err(),
        ExpressionError::UnknownFunction {
            name: "missing".to_string()
        }
    );
    assert!(table.lookup("missing").is_err());
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_names_sorted_and_include_aliases() {
    let table = FunctionTable::new();
    table.register_fn("zzz", ReturnType::OBJECT, |_| Ok(Value::Null));
    let names = table.names();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    for name in ["+", "add", "concat", "&", "where", "zzz"] {
        assert!(names.iter().any(|n| n == name), "missing {}", name);
    }
    assert_eq!(table.len(), names.len());
}

#[test]
fn test_aliases_share_evaluator() {
    let table = FunctionTable::global();
    let (alias, canonical) = (table.get("add"), table.get("+"));
    assert!(matches!((alias, canonical), (Some(a), Some(c)) if Arc::ptr_eq(&a, &c)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_register_and_lookup() {
    let table = Arc::new(FunctionTable::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let name = format!("f{}", i);
                table.register_fn(&name, ReturnType::NUMBER, move |_| Ok(Value::Integer(i)));
                let expr = Expression::parse_with(&format!("{}() + length('ab')", name), &table).unwrap();
                expr.try_evaluate(&mut SimpleObjectMemory::default())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Ok(Value::Integer(i as i64 + 2)));
    }
    assert!((0..8).all(|i| table.contains(&format!("f{}", i))));
}
