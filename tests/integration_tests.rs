use adaptive_expressions::memory::{JsonMemory, SimpleObjectMemory};
use adaptive_expressions::{
    EvalError, Expression, ExpressionProperty, Options, StringExpression, Value, ValueExpression,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn eval(text: &str, state: serde_json::Value) -> Result<Value, EvalError> {
    let expr = Expression::parse(text).unwrap_or_else(|e| panic!("failed to parse {}: {}", text, e));
    let mut memory = JsonMemory::new(state);
    expr.try_evaluate(&mut memory)
}

fn eval_json(text: &str, state: serde_json::Value) -> serde_json::Value {
    eval(text, state)
        .unwrap_or_else(|e| panic!("failed to evaluate {}: {}", text, e))
        .to_json_value()
}

fn refs(text: &str) -> Vec<String> {
    Expression::parse(text).unwrap().references().into_iter().collect()
}

// ============================================================================
// Literal-vs-Expression Scenarios
// ============================================================================

#[test]
fn test_plain_text_is_literal() {
    let property = StringExpression::from_text("hello").unwrap();
    assert_eq!(property, ExpressionProperty::Literal("hello".to_string()));
    let mut memory = SimpleObjectMemory::default();
    assert_eq!(property.try_get_value(&mut memory).unwrap(), "hello");
}

#[test]
fn test_equals_prefix_is_expression() {
    let property = ValueExpression::from_text("=1+2").unwrap();
    assert!(!property.is_literal());
    let mut memory = SimpleObjectMemory::default();
    assert_eq!(property.try_get_value(&mut memory), Ok(Value::Integer(3)));
}

#[test]
fn test_interpolated_text() {
    let property = StringExpression::from_text("Hello ${user.name}").unwrap();
    let mut memory = JsonMemory::new(json!({ "user": { "name": "Ann" } }));
    assert_eq!(property.try_get_value(&mut memory).unwrap(), "Hello Ann");
}

#[test]
fn test_escaped_equals_is_literal() {
    let property = StringExpression::from_text("\\=foo").unwrap();
    assert_eq!(property, ExpressionProperty::Literal("=foo".to_string()));
}

#[test]
fn test_path_expression_and_references() {
    let state = json!({ "a": { "b": [ { "c": 42 } ] } });
    assert_eq!(eval("=a.b[0].c", state), Ok(Value::Integer(42)));
    assert_eq!(refs("=a.b[0].c"), ["a.b[0].c"]);
}

#[test]
fn test_foreach_and_references() {
    let state = json!({ "items": [ { "value": 1 }, { "value": 2 } ] });
    assert_eq!(eval_json("=foreach(items, x, x.value)", state), json!([1, 2]));
    assert_eq!(refs("=foreach(items, x, x.value)"), ["items"]);
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_arithmetic() {
    assert_eq!(eval("1 + 2 * 3", json!({})), Ok(Value::Integer(7)));
    assert_eq!(eval("7 / 2", json!({})), Ok(Value::Integer(3)));
    assert_eq!(eval("7 % 3", json!({})), Ok(Value::Integer(1)));
    assert_eq!(eval("-7 / 2", json!({})), Ok(Value::Integer(-3)));
}

#[test]
fn test_float_arithmetic_is_decimal() {
    assert_eq!(eval("0.1 + 0.2", json!({})), Ok(Value::Float(0.3)));
    assert_eq!(eval("7 / 2.0", json!({})), Ok(Value::Float(3.5)));
    assert_eq!(eval("2 ^ 10", json!({})), Ok(Value::Float(1024.0)));
}

#[test]
fn test_tiny_float_arithmetic_keeps_precision() {
    let tiny = "0.000000000000000000000000000001";
    assert_eq!(eval(&format!("{} * 2", tiny), json!({})), Ok(Value::Float(2e-30)));
    assert_eq!(eval(&format!("{} + 0.0", tiny), json!({})), Ok(Value::Float(1e-30)));
    assert_eq!(eval(&format!("{} - {}", tiny, tiny), json!({})), Ok(Value::Float(0.0)));
}

#[test]
fn test_integer_overflow_becomes_float() {
    let result = eval("9223372036854775807 + 1", json!({})).unwrap();
    assert!(matches!(result, Value::Float(_)), "{:?}", result);
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval("1 / 0", json!({})), Err(EvalError::DivisionByZero { .. })));
    assert!(matches!(eval("1 % 0", json!({})), Err(EvalError::DivisionByZero { .. })));
    let result = eval("1.0 / 0", json!({})).unwrap();
    assert_eq!(result, Value::Float(f64::INFINITY));
}

#[test]
fn test_plus_concatenates_strings() {
    assert_eq!(eval("'a' + 1", json!({})), Ok(Value::from("a1")));
    assert_eq!(eval("name + '!'", json!({})), Ok(Value::from("!")));
    assert_eq!(eval("'n=' & 1 & true", json!({})), Ok(Value::from("n=1true")));
}

#[test]
fn test_arithmetic_type_mismatch_at_runtime() {
    let err = eval("a - 1", json!({ "a": "x" })).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { found: "string", .. }), "{:?}", err);
    assert!(err.to_string().contains('a'), "{}", err);
}

#[test]
fn test_math_functions() {
    assert_eq!(eval("max(1, 5, 3)", json!({})), Ok(Value::Integer(5)));
    assert_eq!(eval("min(nums)", json!({ "nums": [4, 2.5, 9] })), Ok(Value::Float(2.5)));
    assert_eq!(eval("sum(createArray(1, 2, 3))", json!({})), Ok(Value::Integer(6)));
    assert_eq!(eval("average(createArray(1, 2))", json!({})), Ok(Value::Float(1.5)));
    assert_eq!(eval_json("range(2, 3)", json!({})), json!([2, 3, 4]));
    assert_eq!(eval("abs(-4)", json!({})), Ok(Value::Integer(4)));
    assert_eq!(eval("floor(2.7)", json!({})), Ok(Value::Float(2.0)));
    assert_eq!(eval("ceiling(2.1)", json!({})), Ok(Value::Float(3.0)));
    assert_eq!(eval("round(2.345, 2)", json!({})), Ok(Value::Float(2.35)));
    assert_eq!(eval("round(2.5)", json!({})), Ok(Value::Float(3.0)));
    assert_eq!(eval("sqrt(16)", json!({})), Ok(Value::Float(4.0)));
    assert!(eval("sqrt(-1)", json!({})).is_err());
    assert!(eval("range(1, 0)", json!({})).is_err());
}

#[test]
fn test_range_count_is_bounded() {
    for text in [
        "range(0, 1000000000000000000)",
        "range(0, -5)",
        "range(2147483647, 2)",
        "range(4294967296, 1)",
    ] {
        let err = eval(text, json!({})).unwrap_err();
        assert!(matches!(err, EvalError::Function { ref function, .. } if function == "range"), "{}: {:?}", text, err);
    }
    assert_eq!(eval_json("range(2147483646, 2)", json!({})), json!([2147483646, 2147483647]));
    assert_eq!(eval("count(range(0, 1000000))", json!({})), Ok(Value::Integer(1_000_000)));
}

// ============================================================================
// Comparison and Logic
// ============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(eval("1 < 2.5", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("'abc' < 'abd'", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("3 >= 3", json!({})), Ok(Value::Boolean(true)));
    assert!(matches!(
        eval("a < 1", json!({})),
        Err(EvalError::NotComparable { left: "null", .. })
    ));
}

#[test]
fn test_loose_equality() {
    assert_eq!(eval("1 == 1.0", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("'1' == 1", json!({})), Ok(Value::Boolean(false)));
    assert_eq!(eval("a == b", json!({ "a": [1, {"x": 2}], "b": [1.0, {"x": 2}] })), Ok(Value::Boolean(true)));
    assert_eq!(eval("missing == null", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("1 != 2", json!({})), Ok(Value::Boolean(true)));
}

#[test]
fn test_truthiness() {
    assert_eq!(eval("!0", json!({})), Ok(Value::Boolean(false)));
    assert_eq!(eval("!''", json!({})), Ok(Value::Boolean(false)));
    assert_eq!(eval("!missing", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("if(items, 'yes', 'no')", json!({ "items": [] })), Ok(Value::from("yes")));
}

#[test]
fn test_errored_operand_reads_false() {
    assert_eq!(eval("(1 / 0) || true", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("!(1 / 0)", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("if(1 / 0, 'a', 'b')", json!({})), Ok(Value::from("b")));
}

#[test]
fn test_if_evaluates_one_branch() {
    assert_eq!(eval("if(true, 1, 1 / 0)", json!({})), Ok(Value::Integer(1)));
}

#[test]
fn test_coalesce() {
    assert_eq!(eval("a ?? b ?? 'default'", json!({ "b": 0 })), Ok(Value::Integer(0)));
    assert_eq!(eval("coalesce(a, 'x')", json!({})), Ok(Value::from("x")));
    assert_eq!(eval("exists(a.b)", json!({ "a": { "b": false } })), Ok(Value::Boolean(true)));
    assert_eq!(eval("exists(a.c)", json!({ "a": {} })), Ok(Value::Boolean(false)));
}

// ============================================================================
// Short-Circuit Evaluation
// ============================================================================

fn counting_stub(result: bool) -> (Expression, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let stub = Expression::lambda(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Boolean(result))
    });
    (stub, calls)
}

#[test]
fn test_and_skips_right_when_left_false() {
    let (stub, calls) = counting_stub(true);
    let expr = Expression::and(vec![Expression::constant(false), stub]).unwrap();
    let mut memory = SimpleObjectMemory::default();
    assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::Boolean(false)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_or_skips_right_when_left_true() {
    let (stub, calls) = counting_stub(false);
    let expr = Expression::or(vec![Expression::constant(true), stub]).unwrap();
    let mut memory = SimpleObjectMemory::default();
    assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::Boolean(true)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_and_evaluates_right_when_needed() {
    let (stub, calls) = counting_stub(true);
    let expr = Expression::and(vec![Expression::constant(true), stub]).unwrap();
    let mut memory = SimpleObjectMemory::default();
    assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::Boolean(true)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Memory Access
// ============================================================================

#[test]
fn test_missing_path_is_null() {
    assert_eq!(eval("a.b.c", json!({ "a": 1 })), Ok(Value::Null));
    assert_eq!(eval("items[5]", json!({ "items": [1] })), Ok(Value::Null));
}

#[test]
fn test_strict_paths() {
    let expr = Expression::parse("user.email").unwrap();
    let mut memory = JsonMemory::new(json!({ "user": {} }));
    let options = Options::new().strict_paths(true);
    assert_eq!(
        expr.try_evaluate_with(&mut memory, &options),
        Err(EvalError::PathNotFound {
            path: "user.email".into()
        })
    );
}

#[test]
fn test_null_substitution() {
    let expr = Expression::parse("`Hi ${user.name}`").unwrap();
    let mut memory = JsonMemory::new(json!({}));
    let options = Options::new().null_substitution(|path| Value::from(format!("<{}>", path)));
    assert_eq!(
        expr.try_evaluate_with(&mut memory, &options),
        Ok(Value::from("Hi <user.name>"))
    );
}

#[test]
fn test_computed_and_string_indices() {
    let state = json!({ "items": [10, 20, 30], "key": "b", "bag": { "b": "found" } });
    assert_eq!(eval("items[count(items) - 1]", state.clone()), Ok(Value::Integer(30)));
    assert_eq!(eval("bag[key]", state.clone()), Ok(Value::from("found")));
    assert_eq!(eval("bag['b']", state), Ok(Value::from("found")));
}

#[test]
fn test_property_lookup_ignores_case() {
    assert_eq!(eval("User.Name", json!({ "user": { "name": "Ann" } })), Ok(Value::from("Ann")));
}

#[test]
fn test_access_on_function_result() {
    let state = json!({ "items": [ { "name": "first" } ] });
    assert_eq!(eval("first(items).name", state), Ok(Value::from("first")));
    assert_eq!(eval("json('{\"a\": [5]}').a[0]", json!({})), Ok(Value::Integer(5)));
}

#[test]
fn test_invalid_index_type() {
    let err = eval("items[flag]", json!({ "items": [1], "flag": true })).unwrap_err();
    assert!(matches!(err, EvalError::InvalidIndex { .. }), "{:?}", err);
}

#[test]
fn test_set_path_to_value() {
    let expr = Expression::parse("setPathToValue(user.tags[1], 'b')").unwrap();
    let mut memory = JsonMemory::new(json!({ "user": { "tags": ["a"] } }));
    assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::from("b")));
    assert_eq!(memory.root(), &json!({ "user": { "tags": ["a", "b"] } }));
}

#[test]
fn test_set_path_requires_path() {
    assert!(Expression::parse("setPathToValue(1, 2)").is_err());
}

// ============================================================================
// Lambda Forms
// ============================================================================

#[test]
fn test_where_and_select() {
    let state = json!({ "orders": [ { "id": 1, "total": 5 }, { "id": 2, "total": 20 } ] });
    assert_eq!(
        eval_json("where(orders, o, o.total > 10)", state.clone()),
        json!([{ "id": 2, "total": 20 }])
    );
    assert_eq!(eval_json("select(orders, o, o.id)", state), json!([1, 2]));
}

#[test]
fn test_lambda_over_object() {
    let state = json!({ "scores": { "ann": 3, "bob": 9 } });
    assert_eq!(eval_json("foreach(scores, s, s.key)", state.clone()), json!(["ann", "bob"]));
    assert_eq!(eval_json("where(scores, s, s.value > 5)", state), json!({ "bob": 9 }));
}

#[test]
fn test_any_and_all() {
    let state = json!({ "nums": [1, 2, 3] });
    assert_eq!(eval("any(nums, n, n > 2)", state.clone()), Ok(Value::Boolean(true)));
    assert_eq!(eval("all(nums, n, n > 2)", state.clone()), Ok(Value::Boolean(false)));
    assert_eq!(eval("all(empty, n, false)", json!({ "empty": [] })), Ok(Value::Boolean(true)));
    assert_eq!(eval("any(nums, n, n > 5)", state), Ok(Value::Boolean(false)));
}

#[test]
fn test_iterator_shadows_and_falls_through() {
    let state = json!({ "x": "outer", "items": [1, 2], "factor": 10 });
    assert_eq!(eval_json("foreach(items, x, x * factor)", state.clone()), json!([10, 20]));
    // The binding is gone once the lambda finishes
    assert_eq!(eval("concat(string(count(foreach(items, x, x))), x)", state), Ok(Value::from("2outer")));
}

#[test]
fn test_nested_lambdas() {
    let state = json!({ "rows": [[1, 2], [3]] });
    assert_eq!(eval_json("foreach(rows, r, foreach(r, c, c * 2))", state), json!([[2, 4], [6]]));
}

#[test]
fn test_lambda_source_must_be_collection() {
    assert!(matches!(
        eval("foreach(missing, x, x)", json!({})),
        Err(EvalError::TypeMismatch { found: "null", .. })
    ));
}

#[test]
fn test_lambda_does_not_write_outer_memory() {
    let expr = Expression::parse("foreach(items, x, x)").unwrap();
    let state = json!({ "items": [1, 2] });
    let mut memory = JsonMemory::new(state.clone());
    expr.try_evaluate(&mut memory).unwrap();
    assert_eq!(memory.root(), &state);
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_functions() {
    let s = json!({ "s": "Hello World" });
    assert_eq!(eval("length(s)", s.clone()), Ok(Value::Integer(11)));
    assert_eq!(eval("toUpper(s)", s.clone()), Ok(Value::from("HELLO WORLD")));
    assert_eq!(eval("toLower(s)", s.clone()), Ok(Value::from("hello world")));
    assert_eq!(eval("substring(s, 6)", s.clone()), Ok(Value::from("World")));
    assert_eq!(eval("substring(s, 0, 5)", s.clone()), Ok(Value::from("Hello")));
    assert_eq!(eval("replace(s, 'World', 'There')", s.clone()), Ok(Value::from("Hello There")));
    assert_eq!(eval("replaceIgnoreCase(s, 'world', '$1')", s.clone()), Ok(Value::from("Hello $1")));
    assert_eq!(eval("indexOf(s, 'o')", s.clone()), Ok(Value::Integer(4)));
    assert_eq!(eval("lastIndexOf(s, 'o')", s.clone()), Ok(Value::Integer(7)));
    assert_eq!(eval("indexOf(s, 'z')", s.clone()), Ok(Value::Integer(-1)));
    assert_eq!(eval("startsWith(s, 'Hell')", s.clone()), Ok(Value::Boolean(true)));
    assert_eq!(eval("endsWith(s, 'd')", s.clone()), Ok(Value::Boolean(true)));
    assert_eq!(eval("countWord(s)", s.clone()), Ok(Value::Integer(2)));
    assert_eq!(eval_json("split(s, ' ')", s), json!(["Hello", "World"]));
    assert_eq!(eval("trim('  x ')", json!({})), Ok(Value::from("x")));
    assert_eq!(eval("sentenceCase('hELLO there')", json!({})), Ok(Value::from("Hello there")));
    assert_eq!(eval("titleCase('hello there')", json!({})), Ok(Value::from("Hello There")));
}

#[test]
fn test_substring_out_of_range() {
    let err = eval("substring('abc', 2, 5)", json!({})).unwrap_err();
    assert!(matches!(err, EvalError::Function { ref function, .. } if function == "substring"), "{:?}", err);
}

#[test]
fn test_function_error_names_failing_expression() {
    let err = eval("concat('x', substring('abc', 1 + 4))", json!({})).unwrap_err();
    match &err {
        EvalError::Function { function, expression, .. } => {
            assert_eq!(function, "substring");
            assert_eq!(expression, "substring('abc', (1 + 4))");
        }
        other => panic!("Expected function error, got {:?}", other),
    }
    assert!(err.to_string().contains("substring('abc', (1 + 4))"), "{}", err);
}

#[test]
fn test_string_functions_treat_null_as_empty() {
    assert_eq!(eval("length(missing)", json!({})), Ok(Value::Integer(0)));
    assert_eq!(eval("toUpper(missing)", json!({})), Ok(Value::from("")));
    assert_eq!(eval("indexOf(missing, 'a')", json!({})), Ok(Value::Integer(-1)));
}

#[test]
fn test_is_match() {
    assert_eq!(eval("isMatch('abc123', '^[a-z]+\\d+$')", json!({})), Ok(Value::Boolean(true)));
    assert!(Expression::parse("isMatch('a', '(')").is_err());
}

#[test]
fn test_concat_merges_arrays() {
    assert_eq!(eval_json("concat(createArray(1), createArray(2, 3))", json!({})), json!([1, 2, 3]));
    assert_eq!(eval("concat('a', missing, 1)", json!({})), Ok(Value::from("a1")));
}

#[test]
fn test_templates() {
    let state = json!({ "user": { "name": "Ann", "age": 7 } });
    assert_eq!(
        eval("`${user.name} is ${user.age + 1}`", state.clone()),
        Ok(Value::from("Ann is 8"))
    );
    assert_eq!(eval("'${user.name}'", state), Ok(Value::from("${user.name}")));
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_collection_functions() {
    let state = json!({ "a": [3, 1, 2, 1], "b": [2, 5] });
    assert_eq!(eval("count(a)", state.clone()), Ok(Value::Integer(4)));
    assert_eq!(eval("contains(a, 2)", state.clone()), Ok(Value::Boolean(true)));
    assert_eq!(eval("contains('team', 'ea')", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("first(a)", state.clone()), Ok(Value::Integer(3)));
    assert_eq!(eval("last(a)", state.clone()), Ok(Value::Integer(1)));
    assert_eq!(eval("empty(missing)", state.clone()), Ok(Value::Boolean(true)));
    assert_eq!(eval_json("union(a, b)", state.clone()), json!([3, 1, 2, 5]));
    assert_eq!(eval_json("intersection(a, b)", state.clone()), json!([2]));
    assert_eq!(eval_json("skip(a, 2)", state.clone()), json!([2, 1]));
    assert_eq!(eval_json("take(a, 2)", state.clone()), json!([3, 1]));
    assert_eq!(eval_json("subArray(a, 1, 3)", state.clone()), json!([1, 2]));
    assert_eq!(eval_json("unique(a)", state.clone()), json!([3, 1, 2]));
    assert_eq!(eval_json("reverse(b)", state.clone()), json!([5, 2]));
    assert_eq!(eval_json("sortBy(a)", state.clone()), json!([1, 1, 2, 3]));
    assert_eq!(eval_json("sortByDescending(a)", state.clone()), json!([3, 2, 1, 1]));
    assert_eq!(eval_json("flatten(createArray(1, createArray(2, createArray(3))))", json!({})), json!([1, 2, 3]));
    assert_eq!(eval("join(b, ', ')", state.clone()), Ok(Value::from("2, 5")));
    assert_eq!(eval("indexOf(a, 1)", state.clone()), Ok(Value::Integer(1)));
    assert_eq!(eval("lastIndexOf(a, 1)", state), Ok(Value::Integer(3)));
}

#[test]
fn test_sort_by_property() {
    let state = json!({ "people": [ { "n": "b", "age": 30 }, { "n": "a", "age": 20 } ] });
    assert_eq!(eval_json("foreach(sortBy(people, 'age'), p, p.n)", state), json!(["a", "b"]));
}

#[test]
fn test_sort_mixed_types_fails() {
    assert!(matches!(
        eval("sortBy(createArray(1, 'a'))", json!({})),
        Err(EvalError::NotComparable { .. })
    ));
}

#[test]
fn test_indices_and_values() {
    assert_eq!(
        eval_json("indicesAndValues(createArray('x', 'y'))", json!({})),
        json!([{ "index": 0, "value": "x" }, { "index": 1, "value": "y" }])
    );
}

// ============================================================================
// Objects and Conversions
// ============================================================================

#[test]
fn test_object_functions() {
    assert_eq!(eval_json("{a: 1, b: [true]}", json!({})), json!({ "a": 1, "b": [true] }));
    assert_eq!(eval_json("addProperty({a: 1}, 'b', 2)", json!({})), json!({ "a": 1, "b": 2 }));
    assert!(eval("addProperty({a: 1}, 'a', 2)", json!({})).is_err());
    assert_eq!(eval_json("setProperty({a: 1}, 'a', 2)", json!({})), json!({ "a": 2 }));
    assert_eq!(eval_json("removeProperty({a: 1, b: 2}, 'a')", json!({})), json!({ "b": 2 }));
    assert_eq!(eval_json("merge({a: 1}, {a: 2, b: 3})", json!({})), json!({ "a": 2, "b": 3 }));
    assert_eq!(eval("getProperty({a: 1}, 'a')", json!({})), Ok(Value::Integer(1)));
    assert_eq!(eval("getProperty(name)", json!({ "name": "k", "k": 5 })), Ok(Value::Integer(5)));
    assert_eq!(eval("jsonStringify({b: 1, a: 'x'})", json!({})), Ok(Value::from(r#"{"a":"x","b":1}"#)));
}

#[test]
fn test_conversions() {
    assert_eq!(eval("int('42')", json!({})), Ok(Value::Integer(42)));
    assert_eq!(eval("int(3.9)", json!({})), Ok(Value::Integer(3)));
    assert_eq!(eval("float('2.5')", json!({})), Ok(Value::Float(2.5)));
    assert_eq!(eval("string(12)", json!({})), Ok(Value::from("12")));
    assert_eq!(eval("bool(0)", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("formatNumber(1234.5, 1)", json!({})), Ok(Value::from("1,234.5")));
    assert_eq!(eval("base64('hello')", json!({})), Ok(Value::from("aGVsbG8=")));
    assert_eq!(eval("base64ToString('aGVsbG8=')", json!({})), Ok(Value::from("hello")));
    assert_eq!(eval("isInteger(1) && isFloat(1.5) && isString('') && isArray([])", json!({})), Ok(Value::Boolean(true)));
    assert_eq!(eval("isObject({}) && isBoolean(false)", json!({})), Ok(Value::Boolean(true)));
    assert!(eval("int('x')", json!({})).is_err());
}

// ============================================================================
// Engine Properties
// ============================================================================

#[test]
fn test_idempotent_evaluation() {
    let expr = Expression::parse("concat(user.name, '-', string(count(items)))").unwrap();
    let mut memory = JsonMemory::new(json!({ "user": { "name": "z" }, "items": [1, 2] }));
    let first = expr.try_evaluate(&mut memory);
    let second = expr.try_evaluate(&mut memory);
    assert_eq!(first, second);
    assert_eq!(first, Ok(Value::from("z-2")));
}

#[test]
fn test_reads_do_not_mutate_memory() {
    let state = json!({ "a": { "b": [1, 2, { "c": null }] }, "s": "x" });
    let mut memory = JsonMemory::new(state.clone());
    for text in [
        "a.b[2].c",
        "where(a.b, x, x == 1)",
        "a.missing.deeper",
        "sortByDescending(createArray(1, 2))",
        "`${s}${a.b[0]}`",
    ] {
        Expression::parse(text).unwrap().try_evaluate(&mut memory).unwrap();
    }
    assert_eq!(memory.root(), &state);
}

#[test]
fn test_concurrent_evaluation() {
    let expr = Arc::new(Expression::parse("sum(foreach(nums, n, n * k))").unwrap());
    let handles: Vec<_> = (1..=8)
        .map(|k| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                let mut memory = JsonMemory::new(json!({ "nums": [1, 2, 3], "k": k }));
                expr.try_evaluate(&mut memory)
            })
        })
        .collect();

    for (k, handle) in (1..=8).zip(handles) {
        assert_eq!(handle.join().unwrap(), Ok(Value::Integer(6 * k)));
    }
}

#[test]
fn test_error_messages_name_the_subexpression() {
    let err = eval("substring(name, 10)", json!({ "name": "abc" })).unwrap_err();
    assert!(err.to_string().contains("substring"), "{}", err);

    let err = eval("count(n)", json!({ "n": 5 })).unwrap_err();
    assert!(err.to_string().contains("integer"), "{}", err);
}
