//! JSON output serialization for expression values.
//!
//! This module provides JSON serialization with support for both compact and
//! pretty-printed output formats. Output is deterministic because objects keep
//! their keys sorted.
//!
//! - **Compact output** via [`to_json()`], used by `jsonStringify`, `string()`
//!   and string concatenation of containers
//! - **Pretty output** via [`to_json_pretty()`], used by the `adx` binary
//! - Floats with an integral value keep a trailing `.0` so they stay
//!   distinguishable from integers
//!
//! # Examples
//!
//! ```
//! use adaptive_expressions::Value;
//! use adaptive_expressions::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(vec![Value::Integer(1), Value::Float(2.0)]);
//!
//! assert_eq!(to_json(&value), "[1,2.0]");
//! assert_eq!(to_json_pretty(&value), "[\n  1,\n  2.0\n]");
//! ```

use std::collections::BTreeMap;

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) if n.is_finite() => format_float(*n),
            Value::Float(_) => "null".to_string(),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Array(arr) => self.print_array(arr, indent),
            Value::Object(obj) => self.print_object(obj, indent),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize) -> String {
        if arr.is_empty() {
            return "[]".to_string();
        }

        let items: Vec<String> = arr
            .iter()
            .map(|v| {
                if self.pretty {
                    format!(
                        "{}{}",
                        self.indent(indent + 1),
                        self.print_value(v, indent + 1)
                    )
                } else {
                    self.print_value(v, indent)
                }
            })
            .collect();

        if self.pretty {
            format!("[\n{}\n{}]", items.join(",\n"), self.indent(indent))
        } else {
            format!("[{}]", items.join(","))
        }
    }

    fn print_object(&self, obj: &BTreeMap<String, Value>, indent: usize) -> String {
        if obj.is_empty() {
            return "{}".to_string();
        }

        let items: Vec<String> = obj
            .iter()
            .map(|(k, v)| {
                if self.pretty {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(indent + 1),
                        escape_string(k),
                        self.print_value(v, indent + 1)
                    )
                } else {
                    format!("\"{}\":{}", escape_string(k), self.print_value(v, indent))
                }
            })
            .collect();

        if self.pretty {
            format!("{{\n{}\n{}}}", items.join(",\n"), self.indent(indent))
        } else {
            format!("{{{}}}", items.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

/// Format a float, keeping `.0` on integral values.
pub fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// Escape a string for inclusion between JSON double quotes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Converts a Value to compact JSON string representation.
///
/// ```
/// use adaptive_expressions::Value;
/// use adaptive_expressions::output::to_json;
///
/// let obj = Value::object([("name", Value::from("Alice")), ("age", Value::Integer(30))]);
/// assert_eq!(to_json(&obj), r#"{"age":30,"name":"Alice"}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to pretty-printed JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
