use std::collections::BTreeMap;

use super::Memory;
use crate::{
    path::{PathSegment, assign, resolve},
    value::Value,
};

/// A layered view over another memory.
///
/// Each frame binds local names (the iterator of a `foreach`). Reads whose
/// first segment names a bound variable resolve against the innermost frame
/// holding it; everything else falls through to the base memory. The base is
/// never written for bound names, and popping a frame discards its bindings.
pub struct StackedMemory<'a> {
    base: &'a mut dyn Memory,
    frames: Vec<BTreeMap<String, Value>>,
}

impl<'a> StackedMemory<'a> {
    pub fn new(base: &'a mut dyn Memory) -> Self {
        StackedMemory {
            base,
            frames: Vec::new(),
        }
    }

    /// Push a fresh frame binding `name` to `value`.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let mut frame = BTreeMap::new();
        frame.insert(name.into(), value);
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<BTreeMap<String, Value>> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn bound_frame(&self, path: &[PathSegment]) -> Option<usize> {
        let Some(PathSegment::Field(root)) = path.first() else {
            return None;
        };
        self.frames.iter().rposition(|frame| frame.contains_key(root))
    }
}

impl Memory for StackedMemory<'_> {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value> {
        match (self.bound_frame(path), path.first()) {
            (Some(i), Some(PathSegment::Field(root))) => {
                let bound = self.frames[i].get(root)?;
                resolve(bound, &path[1..]).cloned()
            }
            _ => self.base.get_path(path),
        }
    }

    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool {
        match (self.bound_frame(path), path.first()) {
            (Some(i), Some(PathSegment::Field(root))) => {
                let root = root.clone();
                match self.frames[i].get_mut(&root) {
                    Some(bound) => assign(bound, &path[1..], value),
                    None => false,
                }
            }
            _ => self.base.set_path(path, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;

    #[test]
    fn test_frames_shadow_and_unwind() {
        let mut base = SimpleObjectMemory::new(Value::object([("x", 1), ("y", 2)]));
        {
            let mut stacked = StackedMemory::new(&mut base);
            stacked.push("x", Value::Integer(10));
            assert_eq!(stacked.get("x"), Some(Value::Integer(10)));
            assert_eq!(stacked.get("y"), Some(Value::Integer(2)));

            stacked.push("x", Value::Integer(20));
            assert_eq!(stacked.get("x"), Some(Value::Integer(20)));
            stacked.pop();
            assert_eq!(stacked.get("x"), Some(Value::Integer(10)));
            stacked.pop();
            assert_eq!(stacked.get("x"), Some(Value::Integer(1)));
        }
        assert_eq!(base.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_bound_writes_stay_local() {
        let mut base = SimpleObjectMemory::new(Value::object([("item", 1)]));
        {
            let mut stacked = StackedMemory::new(&mut base);
            stacked.push("item", Value::object([("a", 1)]));
            assert!(stacked.set("item.a", Value::Integer(5)));
            assert_eq!(stacked.get("item.a"), Some(Value::Integer(5)));
        }
        assert_eq!(base.get("item"), Some(Value::Integer(1)));
    }
}
