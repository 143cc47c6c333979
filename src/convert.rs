//! Typed retrieval of evaluation results.
//!
//! [`FromValue`] is what [`Expression::try_evaluate_as`](crate::Expression::try_evaluate_as)
//! uses to turn a [`Value`] into a host type. Conversions try, in order: a
//! direct match, `null` as the empty or default value where the target has
//! one, numeric conversion that must round-trip exactly, string conversion,
//! and finally a serde round trip through [`Json`].

use serde::de::DeserializeOwned;

use crate::{error::EvalError, output::to_json, value::Value};

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, EvalError>;
}

fn coercion<T>(value: &Value, reason: impl Into<String>) -> EvalError {
    EvalError::Coercion {
        value: to_json(value),
        target: std::any::type_name::<T>().to_string(),
        reason: reason.into(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match &value {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(coercion::<bool>(&value, "not a boolean")),
        }
    }
}

macro_rules! integer_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, EvalError> {
                    match &value {
                        Value::Integer(n) => <$t>::try_from(*n)
                            .map_err(|_| coercion::<$t>(&value, "out of range")),
                        // `MAX as f64` may round up, so the upper bound is strict
                        Value::Float(f)
                            if f.is_finite()
                                && f.fract() == 0.0
                                && *f >= <$t>::MIN as f64
                                && *f < <$t>::MAX as f64 + 1.0 =>
                        {
                            Ok(*f as $t)
                        }
                        Value::Float(_) => {
                            Err(coercion::<$t>(&value, "the fractional part or magnitude would be lost"))
                        }
                        Value::String(s) => s
                            .trim()
                            .parse::<$t>()
                            .map_err(|e| coercion::<$t>(&value, e.to_string())),
                        other => Err(coercion::<$t>(&value, format!("{} is not a number", other.type_name()))),
                    }
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match &value {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => {
                let f = *n as f64;
                if f < i64::MAX as f64 && f as i64 == *n {
                    Ok(f)
                } else {
                    Err(coercion::<f64>(&value, "precision would be lost"))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| coercion::<f64>(&value, e.to_string())),
            other => Err(coercion::<f64>(&value, format!("{} is not a number", other.type_name()))),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        let wide = f64::from_value(value.clone())?;
        let narrow = wide as f32;
        if f64::from(narrow) == wide || wide.is_nan() {
            Ok(narrow)
        } else {
            Err(coercion::<f32>(&value, "precision would be lost"))
        }
    }
}

/// `null` becomes `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// `null` becomes an empty vector.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(coercion::<Vec<T>>(&other, format!("{} is not an array", other.type_name()))),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value.to_json_value())
    }
}

/// Any deserializable type, converted through its JSON form.
///
/// ```
/// use adaptive_expressions::{Expression, Json};
/// use adaptive_expressions::memory::SimpleObjectMemory;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let mut memory = SimpleObjectMemory::default();
/// let Json(point) = Expression::parse("{x: 1, y: 2}").unwrap().try_evaluate_as::<Json<Point>>(&mut memory).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, EvalError> {
        serde_json::from_value(value.to_json_value())
            .map(Json)
            .map_err(|e| coercion::<T>(&value, e.to_string()))
    }
}
