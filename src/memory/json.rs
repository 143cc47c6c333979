use super::Memory;
use crate::{path::PathSegment, value::Value};

/// Memory over a `serde_json` tree, read and written in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonMemory {
    root: serde_json::Value,
}

impl JsonMemory {
    pub fn new(root: serde_json::Value) -> Self {
        JsonMemory { root }
    }

    pub fn root(&self) -> &serde_json::Value {
        &self.root
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.root
    }
}

fn find_key<'a>(map: &'a serde_json::Map<String, serde_json::Value>, name: &str) -> Option<&'a String> {
    if let Some((key, _)) = map.get_key_value(name) {
        return Some(key);
    }
    let mut matches = map.keys().filter(|k| k.eq_ignore_ascii_case(name));
    match (matches.next(), matches.next()) {
        (Some(key), None) => Some(key),
        _ => None,
    }
}

fn child_mut<'a>(
    current: &'a mut serde_json::Value,
    segment: &PathSegment,
) -> Option<&'a mut serde_json::Value> {
    if current.is_null() {
        *current = match segment {
            PathSegment::Index(_) => serde_json::Value::Array(Vec::new()),
            PathSegment::Field(_) => serde_json::Value::Object(serde_json::Map::new()),
        };
    }
    match (segment, current) {
        (PathSegment::Field(name), serde_json::Value::Object(map)) => {
            let key = find_key(map, name).cloned().unwrap_or_else(|| name.clone());
            Some(map.entry(key).or_insert(serde_json::Value::Null))
        }
        (PathSegment::Index(index), serde_json::Value::Array(items)) => {
            let i = usize::try_from(*index).ok()?;
            if items.len() <= i {
                items.resize(i + 1, serde_json::Value::Null);
            }
            items.get_mut(i)
        }
        _ => None,
    }
}

impl Memory for JsonMemory {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value> {
        let mut current = &self.root;
        for segment in path {
            current = match (segment, current) {
                (PathSegment::Field(name), serde_json::Value::Object(map)) => {
                    map.get(find_key(map, name)?)?
                }
                (PathSegment::Index(index), serde_json::Value::Array(items)) => {
                    usize::try_from(*index).ok().and_then(|i| items.get(i))?
                }
                (PathSegment::Index(index), serde_json::Value::Object(map)) => {
                    map.get(&index.to_string())?
                }
                _ => return None,
            };
        }
        Some(Value::from_json(current.clone()))
    }

    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut current = &mut self.root;
        for segment in parents {
            current = match child_mut(current, segment) {
                Some(child) => child,
                None => return false,
            };
        }
        match child_mut(current, last) {
            Some(slot) => {
                *slot = value.to_json_value();
                true
            }
            None => false,
        }
    }
}
