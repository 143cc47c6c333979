//! Memory paths such as `user.addresses[0].city`.
//!
//! A path is a sequence of [`PathSegment`]s. Paths are produced by accessor
//! and element expressions during evaluation, by [`parse_path`] for textual
//! paths handed to [`Memory::get`](crate::memory::Memory::get), and rendered
//! back with [`format_path`] in the same form that reference analysis reports.

use std::collections::BTreeMap;

use crate::{error::ParseError, value::Value};

/// A segment in a navigable memory path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object property access by name
    ///
    /// # Examples
    /// - `user` → `Field("user")`
    /// - `user['first name']` → `[Field("user"), Field("first name")]`
    Field(String),

    /// Array element access by index
    ///
    /// # Examples
    /// - `items[0]` → `[Field("items"), Index(0)]`
    ///
    /// Negative indices never resolve.
    Index(i64),
}

/// A sequence of path segments, outermost first.
pub type Path = Vec<PathSegment>;

/// Parse textual path syntax: dotted names and bracketed indices or quoted keys.
///
/// ```
/// use adaptive_expressions::path::{parse_path, PathSegment};
///
/// let path = parse_path("a.b[0]['c d']").unwrap();
/// assert_eq!(
///     path,
///     vec![
///         PathSegment::Field("a".into()),
///         PathSegment::Field("b".into()),
///         PathSegment::Index(0),
///         PathSegment::Field("c d".into()),
///     ]
/// );
/// ```
pub fn parse_path(text: &str) -> Result<Path, ParseError> {
    let invalid = |message: &str| ParseError::InvalidPath {
        path: text.to_string(),
        message: message.to_string(),
    };

    let chars: Vec<char> = text.trim().chars().collect();
    let mut segments = Vec::new();
    let mut name = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if name.is_empty() && !matches!(chars.get(i.wrapping_sub(1)), Some(']')) {
                    return Err(invalid("empty property name"));
                }
                if !name.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut name)));
                }
                i += 1;
            }
            '[' => {
                if !name.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut name)));
                }
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|p| p + i)
                    .ok_or_else(|| invalid("missing ']'"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                let inner = inner.trim();
                let quoted = inner.len() >= 2
                    && ((inner.starts_with('\'') && inner.ends_with('\''))
                        || (inner.starts_with('"') && inner.ends_with('"')));
                if quoted {
                    segments.push(PathSegment::Field(inner[1..inner.len() - 1].to_string()));
                } else if let Ok(index) = inner.parse::<i64>() {
                    segments.push(PathSegment::Index(index));
                } else if inner.is_empty() {
                    return Err(invalid("empty index"));
                } else {
                    segments.push(PathSegment::Field(inner.to_string()));
                }
                i = close + 1;
            }
            c => {
                name.push(c);
                i += 1;
            }
        }
    }

    if !name.is_empty() {
        segments.push(PathSegment::Field(name));
    } else if chars.last() == Some(&'.') {
        return Err(invalid("trailing '.'"));
    }

    if segments.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(segments)
}

/// Render a path in the canonical form used by reference analysis.
///
/// ```
/// use adaptive_expressions::path::{format_path, PathSegment};
///
/// let path = vec![PathSegment::Field("a".into()), PathSegment::Index(2), PathSegment::Field("b".into())];
/// assert_eq!(format_path(&path), "a[2].b");
/// ```
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Find an object key, exactly first and then case-insensitively when only one
/// key matches.
pub fn find_key<'a>(map: &'a BTreeMap<String, Value>, name: &str) -> Option<&'a String> {
    if let Some((key, _)) = map.get_key_value(name) {
        return Some(key);
    }
    let mut matches = map.keys().filter(|k| k.eq_ignore_ascii_case(name));
    match (matches.next(), matches.next()) {
        (Some(key), None) => Some(key),
        _ => None,
    }
}

/// Resolve a path inside a value. Never mutates and never fails loudly.
pub fn resolve<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Field(name), Value::Object(map)) => {
                let key = find_key(map, name)?;
                map.get(key)?
            }
            (PathSegment::Index(index), Value::Array(items)) => {
                usize::try_from(*index).ok().and_then(|i| items.get(i))?
            }
            (PathSegment::Index(index), Value::Object(map)) => {
                let key = find_key(map, &index.to_string())?;
                map.get(key)?
            }
            (PathSegment::Field(name), Value::Array(items)) => {
                name.parse::<usize>().ok().and_then(|i| items.get(i))?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Write `new_value` at `path`, creating intermediate containers.
///
/// A `null` slot becomes an array when the next segment is an index and an
/// object otherwise. Arrays are padded with `null` up to the target index.
/// Returns `false` when an existing non-container value is in the way.
pub fn assign(target: &mut Value, path: &[PathSegment], new_value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        *target = new_value;
        return true;
    };

    let mut current = target;
    for segment in parents {
        current = match child_mut(current, segment) {
            Some(child) => child,
            None => return false,
        };
    }

    match child_mut(current, last) {
        Some(slot) => {
            *slot = new_value;
            true
        }
        None => false,
    }
}

fn child_mut<'a>(current: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    if current.is_null() {
        *current = match segment {
            PathSegment::Index(_) => Value::Array(Vec::new()),
            PathSegment::Field(_) => Value::Object(BTreeMap::new()),
        };
    }

    match (segment, current) {
        (PathSegment::Field(name), Value::Object(map)) => {
            let key = find_key(map, name).cloned().unwrap_or_else(|| name.clone());
            Some(map.entry(key).or_insert(Value::Null))
        }
        (PathSegment::Index(index), Value::Object(map)) => {
            Some(map.entry(index.to_string()).or_insert(Value::Null))
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            let i = usize::try_from(*index).ok()?;
            if items.len() <= i {
                items.resize(i + 1, Value::Null);
            }
            items.get_mut(i)
        }
        _ => None,
    }
}
