use super::Memory;
use crate::{
    path::{PathSegment, assign, resolve},
    value::Value,
};

/// A host type that exposes named fields to expressions.
///
/// Implement this instead of relying on reflection:
///
/// ```
/// use adaptive_expressions::memory::{Memory, Record, RecordMemory};
/// use adaptive_expressions::Value;
///
/// struct User { name: String, age: i64 }
///
/// impl Record for User {
///     fn field_names(&self) -> Vec<&'static str> {
///         vec!["name", "age"]
///     }
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(self.name.clone().into()),
///             "age" => Some(self.age.into()),
///             _ => None,
///         }
///     }
/// }
///
/// let memory = RecordMemory::new(User { name: "Ann".into(), age: 7 });
/// assert_eq!(memory.get("Name"), Some(Value::from("Ann")));
/// ```
pub trait Record {
    fn field_names(&self) -> Vec<&'static str>;

    fn field(&self, name: &str) -> Option<Value>;

    /// Replace a field. Read-only records keep the default.
    fn set_field(&mut self, _name: &str, _value: Value) -> bool {
        false
    }
}

/// Memory whose first path segment selects a field of a [`Record`].
pub struct RecordMemory<R> {
    record: R,
}

impl<R: Record> RecordMemory<R> {
    pub fn new(record: R) -> Self {
        RecordMemory { record }
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn into_inner(self) -> R {
        self.record
    }

    fn field_name(&self, name: &str) -> Option<&'static str> {
        let names = self.record.field_names();
        names
            .iter()
            .find(|n| **n == name)
            .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(name)))
            .copied()
    }
}

impl<R: Record> Memory for RecordMemory<R> {
    fn get_path(&self, path: &[PathSegment]) -> Option<Value> {
        let (PathSegment::Field(first), rest) = path.split_first()? else {
            return None;
        };
        let field = self.record.field(self.field_name(first)?)?;
        resolve(&field, rest).cloned()
    }

    fn set_path(&mut self, path: &[PathSegment], value: Value) -> bool {
        let Some((PathSegment::Field(first), rest)) = path.split_first() else {
            return false;
        };
        let Some(name) = self.field_name(first) else {
            return false;
        };
        if rest.is_empty() {
            return self.record.set_field(name, value);
        }
        let mut field = self.record.field(name).unwrap_or_default();
        assign(&mut field, rest, value) && self.record.set_field(name, field)
    }
}
