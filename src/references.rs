//! Static reference analysis.
//!
//! Walks a tree and collects the memory paths it would read, without
//! evaluating anything. A path is built up through `Accessor` and `Element`
//! nodes with constant string or integer indices; any other node ends it.
//! Paths rooted at a lambda iterator are local and are not reported.

use std::collections::BTreeSet;

use crate::{ast::kinds, expression::Expression, value::Value};

/// All static memory paths `expr` reads.
///
/// ```
/// use adaptive_expressions::Expression;
///
/// let expr = Expression::parse("bag.list[bag.index - 2]").unwrap();
/// let refs: Vec<String> = expr.references().into_iter().collect();
/// assert_eq!(refs, ["bag.index", "bag.list"]);
/// ```
pub fn references(expr: &Expression) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    if let Some(path) = walk(expr, &mut refs) {
        refs.insert(path);
    }
    refs
}

fn flush(path: Option<String>, refs: &mut BTreeSet<String>) {
    if let Some(path) = path {
        refs.insert(path);
    }
}

/// Returns the path still being accumulated at `expr`, if any. Completed
/// paths go into `refs`.
fn walk(expr: &Expression, refs: &mut BTreeSet<String>) -> Option<String> {
    match (expr.kind(), expr.children()) {
        (kinds::ACCESSOR, [_]) => expr.property_name().map(str::to_string),
        (kinds::ACCESSOR, [_, instance]) => {
            let instance = walk(instance, refs)?;
            Some(format!("{}.{}", instance, expr.property_name()?))
        }
        (kinds::ELEMENT, [instance, index]) => {
            let path = walk(instance, refs);
            match index.constant_value() {
                Some(Value::String(name)) => Some(format!("{}.{}", path?, name)),
                Some(Value::Integer(n)) => Some(format!("{}[{}]", path?, n)),
                Some(_) => {
                    flush(path, refs);
                    None
                }
                None => {
                    flush(path, refs);
                    let index = walk(index, refs);
                    flush(index, refs);
                    None
                }
            }
        }
        (kind, [collection, iterator, body]) if kinds::is_lambda_form(kind) => {
            let source = walk(collection, refs);
            flush(source, refs);

            let mut inner = BTreeSet::new();
            let body = walk(body, &mut inner);
            flush(body, &mut inner);

            let name = iterator.property_name().unwrap_or_default();
            let (dotted, indexed) = (format!("{}.", name), format!("{}[", name));
            refs.extend(
                inner
                    .into_iter()
                    .filter(|path| path != name && !path.starts_with(&dotted) && !path.starts_with(&indexed)),
            );
            None
        }
        (_, children) => {
            for child in children {
                let path = walk(child, refs);
                flush(path, refs);
            }
            None
        }
    }
}
