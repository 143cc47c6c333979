use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::{
    error::{EvalError, ExpressionError},
    expression::Expression,
    memory::Memory,
    timezone::TimeZoneTable,
    value::Value,
};

/// Result of evaluating an expression: a value or an evaluation error.
pub type EvalResult = Result<Value, EvalError>;

/// Evaluation callback: `(node, memory, options) -> value | error`.
pub type EvaluateFn = dyn Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync;

/// Construction-time check of a node's children.
pub type ValidateFn = dyn Fn(&Expression) -> Result<(), ExpressionError> + Send + Sync;

bitflags! {
    /// Declared result category of an expression.
    ///
    /// `OBJECT` means "unknown or any" and is compatible with every expected
    /// type during validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReturnType: u8 {
        const BOOLEAN = 1;
        const NUMBER = 2;
        const OBJECT = 4;
        const STRING = 8;
        const ARRAY = 16;
    }
}

impl ReturnType {
    /// Return type of a literal value
    pub fn of_value(value: &Value) -> ReturnType {
        match value {
            Value::Boolean(_) => ReturnType::BOOLEAN,
            Value::Integer(_) | Value::Float(_) => ReturnType::NUMBER,
            Value::String(_) => ReturnType::STRING,
            Value::Array(_) => ReturnType::ARRAY,
            Value::Null | Value::Object(_) => ReturnType::OBJECT,
        }
    }

    /// Whether a child declaring `actual` may be passed where `self` is expected.
    pub fn accepts(self, actual: ReturnType) -> bool {
        self.contains(ReturnType::OBJECT) || actual.contains(ReturnType::OBJECT) || self.intersects(actual)
    }

    /// Describe the category for error messages ("a number", "a string or a number").
    pub fn describe(self) -> String {
        let names: Vec<&str> = [
            (ReturnType::BOOLEAN, "a boolean"),
            (ReturnType::NUMBER, "a number"),
            (ReturnType::OBJECT, "an object"),
            (ReturnType::STRING, "a string"),
            (ReturnType::ARRAY, "an array"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        names.join(" or ")
    }
}

/// A named operation: evaluation callback, validator and declared return type.
///
/// Evaluators are owned by a [`FunctionTable`](crate::functions::FunctionTable)
/// and shared by every node that was built from them.
#[derive(Clone)]
pub struct ExpressionEvaluator {
    kind: String,
    return_type: ReturnType,
    evaluate: Arc<EvaluateFn>,
    validate: Arc<ValidateFn>,
}

impl ExpressionEvaluator {
    pub fn new<E, V>(kind: impl Into<String>, return_type: ReturnType, evaluate: E, validate: V) -> Self
    where
        E: Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static,
        V: Fn(&Expression) -> Result<(), ExpressionError> + Send + Sync + 'static,
    {
        ExpressionEvaluator {
            kind: kind.into(),
            return_type,
            evaluate: Arc::new(evaluate),
            validate: Arc::new(validate),
        }
    }

    /// An evaluator that accepts any children.
    pub fn unchecked<E>(kind: impl Into<String>, return_type: ReturnType, evaluate: E) -> Self
    where
        E: Fn(&Expression, &mut dyn Memory, &Options) -> EvalResult + Send + Sync + 'static,
    {
        Self::new(kind, return_type, evaluate, |_| Ok(()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn evaluate(&self, expression: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
        (self.evaluate)(expression, memory, options)
    }

    pub fn validate(&self, expression: &Expression) -> Result<(), ExpressionError> {
        (self.validate)(expression)
    }
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("kind", &self.kind)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Substitutes a value for a path that is missing or `null` in memory.
pub type NullSubstitution = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Per-call evaluation settings.
///
/// ```
/// use adaptive_expressions::{Options, Value};
///
/// let options = Options::new()
///     .strict_paths(true)
///     .null_substitution(|path| Value::from(format!("<{}>", path)));
/// # let _ = options;
/// ```
#[derive(Clone, Default)]
pub struct Options {
    /// Value used in place of a missing or `null` memory path
    pub null_substitution: Option<NullSubstitution>,

    /// Report missing memory paths as [`EvalError::PathNotFound`] instead of `null`
    pub strict_paths: bool,

    /// Timezone names used by `convertFromUTC`/`convertToUTC`; the global table
    /// when unset
    pub timezones: Option<Arc<TimeZoneTable>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_paths(mut self, strict: bool) -> Self {
        self.strict_paths = strict;
        self
    }

    pub fn null_substitution(mut self, f: impl Fn(&str) -> Value + Send + Sync + 'static) -> Self {
        self.null_substitution = Some(Arc::new(f));
        self
    }

    pub fn timezones(mut self, table: Arc<TimeZoneTable>) -> Self {
        self.timezones = Some(table);
        self
    }

    pub fn timezone_table(&self) -> &TimeZoneTable {
        match &self.timezones {
            Some(table) => table,
            None => TimeZoneTable::global(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("null_substitution", &self.null_substitution.is_some())
            .field("strict_paths", &self.strict_paths)
            .field("timezones", &self.timezones.is_some())
            .finish()
    }
}
