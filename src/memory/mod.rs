//! Memory adapters: uniform path access over caller-supplied state.
//!
//! Expressions read state only through the [`Memory`] trait. Built-in
//! adapters cover owned value trees ([`SimpleObjectMemory`]), `serde_json`
//! trees ([`JsonMemory`]), host structs ([`RecordMemory`]) and the layered
//! scopes used by `foreach`-style functions ([`StackedMemory`]).

mod json;
mod record;
mod stacked;

pub use json::JsonMemory;
pub use record::{Record, RecordMemory};
pub use stacked::StackedMemory;

use crate::{
    path::{PathSegment, assign, parse_path, resolve},
    value::Value,
};

/// Read/write access to a state object by path.
///
/// `get_path` must not have side effects. `None` means the path does not
/// resolve, which is different from resolving to `null`.
pub trait Memory {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value>;

    /// Write a value, creating intermediate containers. Returns `false` when
    /// the path cannot be written.
    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool;

    /// Read using textual path syntax (`a.b[0]`).
    fn get(&self, path: &str) -> Option<Value> {
        parse_path(path).ok().and_then(|p| self.get_path(&p))
    }

    /// Write using textual path syntax (`a.b[0]`).
    fn set(&mut self, path: &str, value: Value) -> bool {
        match parse_path(path) {
            Ok(p) => self.set_path(&p, value),
            Err(_) => false,
        }
    }
}

/// Memory over an owned [`Value`] tree (maps, sequences and scalars).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleObjectMemory {
    root: Value,
}

impl SimpleObjectMemory {
    pub fn new(root: impl Into<Value>) -> Self {
        SimpleObjectMemory { root: root.into() }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_inner(self) -> Value {
        self.root
    }
}

impl From<Value> for SimpleObjectMemory {
    fn from(root: Value) -> Self {
        SimpleObjectMemory { root }
    }
}

impl Memory for SimpleObjectMemory {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value> {
        resolve(&self.root, path).cloned()
    }

    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool {
        if path.is_empty() {
            return false;
        }
        assign(&mut self.root, path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_none_not_null() {
        let memory = SimpleObjectMemory::new(Value::object([("a", Value::Null)]));
        assert_eq!(memory.get("a"), Some(Value::Null));
        assert_eq!(memory.get("b"), None);
    }

    #[test]
    fn test_empty_path_is_not_writable() {
        let mut memory = SimpleObjectMemory::default();
        assert!(!memory.set_path(&[], Value::Integer(1)));
    }
}
