//! Static reference analysis: unit cases and a property test checking that
//! pure path chains report exactly the path evaluation reads.

use adaptive_expressions::memory::{Memory, SimpleObjectMemory};
use adaptive_expressions::path::{PathSegment, format_path};
use adaptive_expressions::{Expression, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::RefCell;

fn refs(text: &str) -> Vec<String> {
    Expression::parse(text).unwrap().references().into_iter().collect()
}

// ============================================================================
// Path Accumulation
// ============================================================================

#[test]
fn test_simple_paths() {
    assert_eq!(refs("a"), ["a"]);
    assert_eq!(refs("a.b.c"), ["a.b.c"]);
    assert_eq!(refs("a.b[0].c"), ["a.b[0].c"]);
}

#[test]
fn test_string_index_becomes_dotted() {
    assert_eq!(refs("a['b'].c"), ["a.b.c"]);
}

#[test]
fn test_constants_have_no_references() {
    assert!(refs("1 + 2").is_empty());
    assert!(refs("'text'").is_empty());
    assert!(refs("").is_empty());
}

#[test]
fn test_operators_flush_paths() {
    assert_eq!(refs("a.b + c[1]"), ["a.b", "c[1]"]);
    assert_eq!(refs("a.b > 1 && !c"), ["a.b", "c"]);
}

#[test]
fn test_dynamic_index_flushes_instance() {
    assert_eq!(refs("bag.list[bag.index - 2]"), ["bag.index", "bag.list"]);
    assert_eq!(refs("items[i].name"), ["i", "items"]);
}

#[test]
fn test_non_path_constant_index_flushes_instance() {
    assert_eq!(refs("a.b[1.5]"), ["a.b"]);
    assert_eq!(refs("a[null].c"), ["a"]);
    assert_eq!(refs("a[2].c"), ["a[2].c"]);
}

#[test]
fn test_access_on_function_result() {
    assert_eq!(refs("first(items).name"), ["items"]);
}

#[test]
fn test_duplicates_collapse() {
    assert_eq!(refs("a + a + a.b"), ["a", "a.b"]);
}

#[test]
fn test_templates_report_interpolated_paths() {
    assert_eq!(refs("`Hi ${user.name}, you are ${user.age}`"), ["user.age", "user.name"]);
}

// ============================================================================
// Lambda Scoping
// ============================================================================

#[test]
fn test_iterator_paths_are_local() {
    assert_eq!(refs("foreach(items, x, x.value)"), ["items"]);
    assert_eq!(refs("where(items, x, x)"), ["items"]);
    assert_eq!(refs("select(items, x, x[0])"), ["items"]);
}

#[test]
fn test_body_outer_paths_are_kept() {
    assert_eq!(
        refs("where(orders, o, o.total > limits.max)"),
        ["limits.max", "orders"]
    );
}

#[test]
fn test_iterator_prefix_is_not_a_name_match() {
    assert_eq!(refs("foreach(items, x, xy.z)"), ["items", "xy.z"]);
}

#[test]
fn test_nested_lambdas() {
    assert_eq!(
        refs("foreach(rows, r, foreach(r.cells, c, c.v + offset))"),
        ["offset", "rows"]
    );
}

// ============================================================================
// Path Equivalence
// ============================================================================

/// Memory that records every path it is asked for.
struct RecordingMemory {
    inner: SimpleObjectMemory,
    reads: RefCell<Vec<String>>,
}

impl Memory for RecordingMemory {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value> {
        self.reads.borrow_mut().push(format_path(path));
        self.inner.get_path(path)
    }

    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool {
        self.inner.set_path(path, value)
    }
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("keywords are not names", |s| {
        !matches!(s.as_str(), "true" | "false" | "null")
    })
}

fn arb_segment() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        arb_name().prop_map(PathSegment::Field),
        (0i64..4).prop_map(PathSegment::Index),
    ]
}

fn arb_shape() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{0,4}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(arb_name(), inner, 0..4).prop_map(Value::Object),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_references_match_the_path_read(
        root in arb_name(),
        rest in prop::collection::vec(arb_segment(), 0..5),
        shape in arb_shape(),
    ) {
        let mut path = vec![PathSegment::Field(root)];
        path.extend(rest);
        let text = format_path(&path);

        let expr = Expression::parse(&text).unwrap();
        let references: Vec<String> = expr.references().into_iter().collect();

        let mut memory = RecordingMemory {
            inner: SimpleObjectMemory::new(Value::object([(path_root(&path), shape)])),
            reads: RefCell::new(Vec::new()),
        };
        expr.try_evaluate(&mut memory).unwrap();

        prop_assert_eq!(references, vec![text.clone()]);
        prop_assert_eq!(memory.reads.into_inner(), vec![text]);
    }
}

fn path_root(path: &[PathSegment]) -> String {
    match path.first() {
        Some(PathSegment::Field(name)) => name.clone(),
        _ => String::new(),
    }
}
