// tests/parser_tests.rs

use adaptive_expressions::error::{ExpressionError, ParseError};
use adaptive_expressions::lexer::Lexer;
use adaptive_expressions::parser::Parser;
use adaptive_expressions::{Expression, FunctionTable, Value};
use pretty_assertions::assert_eq;

fn shape(text: &str) -> String {
    Expression::parse(text).unwrap().to_string()
}

// ============================================================================
// Precedence and Associativity
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(shape("(1 + 2) * 3"), "((1 + 2) * 3)");
}

#[test]
fn test_left_associative_subtraction() {
    assert_eq!(shape("10 - 4 - 3"), "((10 - 4) - 3)");
}

#[test]
fn test_power_is_right_associative() {
    assert_eq!(shape("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
    assert_eq!(shape("2 * 3 ^ 2"), "(2 * (3 ^ 2))");
}

#[test]
fn test_logical_precedence() {
    assert_eq!(shape("a || b && c"), "(a || (b && c))");
    assert_eq!(shape("a < 1 && b >= 2"), "((a < 1) && (b >= 2))");
}

#[test]
fn test_equality_binds_tighter_than_ordering() {
    assert_eq!(shape("a == b < c"), "((a == b) < c)");
}

#[test]
fn test_concat_operator() {
    assert_eq!(shape("'a' & 1 & b"), "concat(concat('a', 1), b)");
}

#[test]
fn test_coalesce_is_lowest() {
    assert_eq!(shape("a ?? b || c"), "coalesce(a, (b || c))");
}

// ============================================================================
// Unary Operators
// ============================================================================

#[test]
fn test_negative_literals_fold() {
    let expr = Expression::parse("-5").unwrap();
    assert_eq!(expr.constant_value(), Some(&Value::Integer(-5)));

    let expr = Expression::parse("-2.5").unwrap();
    assert_eq!(expr.constant_value(), Some(&Value::Float(-2.5)));
}

#[test]
fn test_negated_path_is_subtraction() {
    assert_eq!(shape("-x"), "(0 - x)");
}

#[test]
fn test_not_and_unary_plus() {
    assert_eq!(shape("!a"), "!a");
    assert_eq!(shape("!!a"), "!!a");
    assert_eq!(shape("+3"), "3");
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_dotted_path() {
    let expr = Expression::parse("a.b.c").unwrap();
    assert_eq!(expr.kind(), "Accessor");
    assert_eq!(expr.to_string(), "a.b.c");
}

#[test]
fn test_element_access() {
    let expr = Expression::parse("items[0].name").unwrap();
    assert_eq!(expr.kind(), "Accessor");
    assert_eq!(expr.children()[1].kind(), "Element");
    assert_eq!(expr.to_string(), "items[0].name");
}

#[test]
fn test_computed_index() {
    assert_eq!(shape("items[count(items) - 1]"), "items[(count(items) - 1)]");
}

#[test]
fn test_boolean_index_rejected() {
    let err = Expression::parse("items[true]").unwrap_err();
    assert!(matches!(err, ExpressionError::Type { .. }), "{:?}", err);
}

// ============================================================================
// Function Calls
// ============================================================================

#[test]
fn test_function_call() {
    let expr = Expression::parse("substring('hello', 1, 3)").unwrap();
    assert_eq!(expr.kind(), "substring");
    assert_eq!(expr.children().len(), 3);
}

#[test]
fn test_alias_resolves_to_same_evaluator() {
    let alias = Expression::parse("add(1, 2)").unwrap();
    let infix = Expression::parse("1 + 2").unwrap();
    assert_eq!(alias.kind(), "+");
    assert_eq!(alias, infix);
}

#[test]
fn test_unknown_function() {
    assert_eq!(
        Expression::parse("frobnicate(1)"),
        Err(ExpressionError::UnknownFunction {
            name: "frobnicate".into()
        })
    );
}

#[test]
fn test_wrong_arity() {
    let err = Expression::parse("if(true, 1)").unwrap_err();
    assert!(matches!(err, ExpressionError::Arity { actual: 2, .. }), "{:?}", err);

    let err = Expression::parse("substring()").unwrap_err();
    assert!(matches!(err, ExpressionError::Arity { actual: 0, .. }), "{:?}", err);
}

#[test]
fn test_static_type_error() {
    let err = Expression::parse("1 - 'a'").unwrap_err();
    assert!(matches!(err, ExpressionError::Type { .. }), "{:?}", err);
    // Paths are untyped and pass validation
    assert!(Expression::parse("1 - a").is_ok());
}

#[test]
fn test_lambda_iterator_must_be_a_name() {
    let err = Expression::parse("foreach(items, 1, 2)").unwrap_err();
    assert!(matches!(err, ExpressionError::Invalid { .. }), "{:?}", err);
}

#[test]
fn test_call_on_non_name() {
    let err = Expression::parse("(a)(1)");
    assert!(err.is_err());
    let err = Expression::parse("items[0](1)").unwrap_err();
    assert!(
        matches!(err, ExpressionError::Parse(ParseError::NotCallable { .. })),
        "{:?}",
        err
    );
}

#[test]
fn test_dotted_function_names() {
    let table = FunctionTable::new();
    table.register_fn("math.double", adaptive_expressions::ReturnType::NUMBER, |args| {
        Ok(Value::Integer(args[0].as_i64().unwrap_or(0) * 2))
    });
    let expr = Expression::parse_with("math.double(4)", &table).unwrap();
    assert_eq!(expr.kind(), "math.double");
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_array_literal() {
    assert_eq!(shape("[1, 'a', [true]]"), "createArray(1, 'a', createArray(true))");
    assert_eq!(shape("[]"), "createArray()");
}

#[test]
fn test_object_literal() {
    assert_eq!(
        shape("{a: 1, 'b c': x}"),
        "setProperty(setProperty(json('{}'), 'a', 1), 'b c', x)"
    );
    assert_eq!(shape("{}"), "json('{}')");
}

#[test]
fn test_template_literal() {
    assert_eq!(shape("`Hello ${user.name}!`"), "concat('Hello ', user.name, '!')");
}

#[test]
fn test_template_without_interpolation_is_constant() {
    let expr = Expression::parse("`plain`").unwrap();
    assert_eq!(expr.constant_value(), Some(&Value::from("plain")));
    let expr = Expression::parse("``").unwrap();
    assert_eq!(expr.constant_value(), Some(&Value::from("")));
}

#[test]
fn test_template_with_only_expression() {
    assert_eq!(shape("`${a}`"), "concat(a)");
}

#[test]
fn test_template_interpolation_errors_surface() {
    assert!(matches!(
        Expression::parse("`${nope(1)}`"),
        Err(ExpressionError::UnknownFunction { .. })
    ));
}

// ============================================================================
// Whole-Text Rules
// ============================================================================

#[test]
fn test_leading_equals_is_ignored() {
    assert_eq!(Expression::parse("=1 + 2").unwrap(), Expression::parse("1 + 2").unwrap());
    assert_eq!(Expression::parse("  = a ").unwrap(), Expression::parse("a").unwrap());
}

#[test]
fn test_empty_text_is_empty_string() {
    for text in ["", "   ", "="] {
        let expr = Expression::parse(text).unwrap();
        assert_eq!(expr.constant_value(), Some(&Value::from("")), "Failed for {:?}", text);
    }
}

#[test]
fn test_trailing_tokens_rejected() {
    let err = Expression::parse("1 2").unwrap_err();
    assert_eq!(
        err,
        ExpressionError::Parse(ParseError::UnexpectedToken {
            expected: "end of input".into(),
            found: "number 2".into(),
            position: 2,
        })
    );
}

#[test]
fn test_missing_operand() {
    let err = Expression::parse("1 +").unwrap_err();
    assert!(
        matches!(err, ExpressionError::Parse(ParseError::UnexpectedToken { .. })),
        "{:?}",
        err
    );
}

#[test]
fn test_parser_directly() {
    let table = FunctionTable::new();
    let mut parser = Parser::new(Lexer::new("max(1, 2) > 1"), &table).unwrap();
    let expr = parser.parse().unwrap();
    assert_eq!(expr.kind(), ">");
}

#[test]
fn test_display_reparses_to_same_tree() {
    for text in [
        "a.b[0] + 1",
        "foreach(items, x, x.v * 2)",
        "!(a && b) || c",
        "concat('it\\'s', name)",
        "if(x > 1, 'big', 'small')",
    ] {
        let expr = Expression::parse(text).unwrap();
        let reparsed = Expression::parse(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed, "Failed for {}", text);
    }
}
