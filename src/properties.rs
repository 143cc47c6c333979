//! Configuration properties that hold either a literal or an expression.
//!
//! Host configuration often carries values as text. [`ExpressionProperty`]
//! decides once, when the text is read, whether it is literal data or an
//! expression to compile:
//!
//! | Text                | Result                                    |
//! |---------------------|-------------------------------------------|
//! | `=1 + 2`            | compiled expression `1 + 2`               |
//! | `\=foo`             | literal `=foo`                            |
//! | `Hello ${user.name}`| compiled template (string and value kinds) |
//! | `hello`             | literal, parsed into the target type      |
//!
//! ```
//! use adaptive_expressions::{StringExpression, Value};
//! use adaptive_expressions::memory::SimpleObjectMemory;
//!
//! let mut memory = SimpleObjectMemory::new(Value::object([("user", Value::object([("name", "Ann")]))]));
//! let greeting = StringExpression::from_text("Hello ${user.name}").unwrap();
//! assert_eq!(greeting.try_get_value(&mut memory).unwrap(), "Hello Ann");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    convert::{FromValue, Json},
    error::{EvalError, ExpressionError},
    evaluator::Options,
    expression::Expression,
    memory::Memory,
    value::Value,
};

/// Types a property can hold as a literal.
pub trait LiteralText: Sized {
    /// Whether un-prefixed text containing `${` is compiled as a template
    const INTERPOLATE: bool = false;

    fn from_text(text: &str) -> Result<Self, ExpressionError>;

    fn to_value(&self) -> Value;
}

fn invalid_literal(text: &str, target: &str, reason: impl fmt::Display) -> ExpressionError {
    ExpressionError::Invalid {
        expression: text.to_string(),
        message: format!("not a valid {}: {}", target, reason),
    }
}

impl LiteralText for String {
    const INTERPOLATE: bool = true;

    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        Ok(text.to_string())
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl LiteralText for Value {
    const INTERPOLATE: bool = true;

    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        Ok(Value::from(text))
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl LiteralText for bool {
    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        match text.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(true),
            t if t.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(invalid_literal(text, "boolean", "expected true or false")),
        }
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl LiteralText for i64 {
    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        text.trim().parse().map_err(|e| invalid_literal(text, "integer", e))
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl LiteralText for f64 {
    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        text.trim().parse().map_err(|e| invalid_literal(text, "number", e))
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

/// Literal arrays are written as JSON.
impl<T: Serialize + DeserializeOwned> LiteralText for Vec<T> {
    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        serde_json::from_str(text).map_err(|e| invalid_literal(text, "array", e))
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).map(Value::from_json).unwrap_or_default()
    }
}

/// Literal objects are written as JSON.
impl<T: Serialize + DeserializeOwned> LiteralText for Json<T> {
    fn from_text(text: &str) -> Result<Self, ExpressionError> {
        serde_json::from_str(text)
            .map(Json)
            .map_err(|e| invalid_literal(text, "object", e))
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(&self.0).map(Value::from_json).unwrap_or_default()
    }
}

/// A literal value or a compiled expression producing one.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionProperty<T> {
    Literal(T),
    Compiled(Expression),
}

pub type StringExpression = ExpressionProperty<String>;
pub type ValueExpression = ExpressionProperty<Value>;
pub type BoolExpression = ExpressionProperty<bool>;
pub type NumberExpression = ExpressionProperty<f64>;
pub type IntExpression = ExpressionProperty<i64>;
pub type ArrayExpression<T> = ExpressionProperty<Vec<T>>;
pub type ObjectExpression<T> = ExpressionProperty<Json<T>>;

impl<T: LiteralText + FromValue + Clone> ExpressionProperty<T> {
    /// Classify configuration text as literal or expression.
    pub fn from_text(text: &str) -> Result<Self, ExpressionError> {
        if let Some(source) = text.strip_prefix('=') {
            return Ok(ExpressionProperty::Compiled(Expression::parse(source)?));
        }
        if let Some(rest) = text.strip_prefix("\\=") {
            return T::from_text(&format!("={}", rest)).map(ExpressionProperty::Literal);
        }
        if T::INTERPOLATE && text.contains("${") {
            let template = format!("`{}`", text.replace('`', "\\`"));
            return Ok(ExpressionProperty::Compiled(Expression::parse(&template)?));
        }
        T::from_text(text).map(ExpressionProperty::Literal)
    }

    pub fn from_value(value: T) -> Self {
        ExpressionProperty::Literal(value)
    }

    pub fn from_expression(expression: Expression) -> Self {
        ExpressionProperty::Compiled(expression)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, ExpressionProperty::Literal(_))
    }

    pub fn try_get_value(&self, memory: &mut dyn Memory) -> Result<T, EvalError> {
        self.try_get_value_with(memory, &Options::default())
    }

    pub fn try_get_value_with(&self, memory: &mut dyn Memory, options: &Options) -> Result<T, EvalError> {
        match self {
            ExpressionProperty::Literal(value) => Ok(value.clone()),
            ExpressionProperty::Compiled(expression) => expression.try_evaluate_as_with(memory, options),
        }
    }

    /// The value, or `T::default()` when evaluation fails.
    pub fn get_value(&self, memory: &mut dyn Memory) -> T
    where
        T: Default,
    {
        self.try_get_value(memory).unwrap_or_else(|e| {
            debug!(property = %self, error = %e, "property evaluation failed, using default");
            T::default()
        })
    }

    /// An expression producing this property's value; literals become constants.
    pub fn to_expression(&self) -> Expression {
        match self {
            ExpressionProperty::Literal(value) => Expression::constant(value.to_value()),
            ExpressionProperty::Compiled(expression) => expression.clone(),
        }
    }
}

/// Configuration text form: `=`-prefixed for expressions, `\=`-escaped for
/// literals that start with `=`.
impl<T: LiteralText> fmt::Display for ExpressionProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionProperty::Compiled(expression) => write!(f, "={}", expression),
            ExpressionProperty::Literal(value) => match value.to_value() {
                Value::String(s) if s.starts_with('=') => write!(f, "\\{}", s),
                other => write!(f, "{}", other),
            },
        }
    }
}

/// JSON strings go through [`ExpressionProperty::from_text`]; any other JSON
/// value is a literal.
impl<'de, T: LiteralText + FromValue + Clone> Deserialize<'de> for ExpressionProperty<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => Self::from_text(&text).map_err(D::Error::custom),
            other => T::from_value(Value::from_json(other))
                .map(ExpressionProperty::Literal)
                .map_err(D::Error::custom),
        }
    }
}
