//! The immutable expression tree.
//!
//! An [`Expression`] is a node holding the evaluator it was resolved to at
//! construction, its children, and (for constants) a literal value. Trees are
//! values: they can be cloned cheaply, shared across threads and evaluated any
//! number of times against different memory.
//!
//! ```
//! use adaptive_expressions::{Expression, Value};
//! use adaptive_expressions::memory::SimpleObjectMemory;
//!
//! let expr = Expression::parse("user.age + 1").unwrap();
//! let mut memory = SimpleObjectMemory::new(Value::object([("user", Value::object([("age", 41)]))]));
//!
//! assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::Integer(42)));
//! assert!(expr.references().contains("user.age"));
//! ```

use std::{collections::BTreeSet, fmt, sync::Arc};

use tracing::debug;

use crate::{
    ast::kinds,
    convert::FromValue,
    error::{EvalError, ExpressionError},
    evaluator::{EvalResult, ExpressionEvaluator, Options, ReturnType},
    functions::{FunctionTable, access},
    memory::Memory,
    output::to_json,
    parser, references,
    value::Value,
};

#[derive(Clone)]
pub struct Expression {
    evaluator: Arc<ExpressionEvaluator>,
    children: Vec<Expression>,
    value: Option<Value>,
}

impl Expression {
    /// Parse expression text using the global function table.
    ///
    /// A leading `=` is ignored and empty text yields the constant `""`.
    pub fn parse(text: &str) -> Result<Expression, ExpressionError> {
        parser::parse(text, FunctionTable::global())
    }

    /// Parse expression text, resolving function names against `table`.
    pub fn parse_with(text: &str, table: &FunctionTable) -> Result<Expression, ExpressionError> {
        parser::parse(text, table)
    }

    /// Build and validate a node for a registered function name.
    pub fn make(kind: &str, children: Vec<Expression>) -> Result<Expression, ExpressionError> {
        Self::make_with(FunctionTable::global(), kind, children)
    }

    pub fn make_with(
        table: &FunctionTable,
        kind: &str,
        children: Vec<Expression>,
    ) -> Result<Expression, ExpressionError> {
        Self::from_evaluator(table.lookup(kind)?, children)
    }

    /// Build a node around an already resolved evaluator and validate it.
    pub fn from_evaluator(
        evaluator: Arc<ExpressionEvaluator>,
        children: Vec<Expression>,
    ) -> Result<Expression, ExpressionError> {
        let expression = Expression {
            evaluator,
            children,
            value: None,
        };
        expression.validate()?;
        Ok(expression)
    }

    /// A literal leaf. Never reads memory.
    pub fn constant(value: impl Into<Value>) -> Expression {
        Expression {
            evaluator: access::constant_evaluator(),
            children: Vec::new(),
            value: Some(value.into()),
        }
    }

    /// `property` read from memory, or from `instance` when given.
    pub fn accessor(property: &str, instance: Option<Expression>) -> Expression {
        let mut children = vec![Expression::constant(property)];
        children.extend(instance);
        Expression {
            evaluator: access::accessor_evaluator(),
            children,
            value: None,
        }
    }

    /// `instance[index]`
    pub fn element(instance: Expression, index: Expression) -> Expression {
        Expression {
            evaluator: access::element_evaluator(),
            children: vec![instance, index],
            value: None,
        }
    }

    /// A leaf backed by a host closure over memory.
    pub fn lambda<F>(f: F) -> Expression
    where
        F: Fn(&mut dyn Memory) -> EvalResult + Send + Sync + 'static,
    {
        let evaluator =
            ExpressionEvaluator::unchecked(kinds::LAMBDA, ReturnType::OBJECT, move |_, memory, _| f(memory));
        Expression {
            evaluator: Arc::new(evaluator),
            children: Vec::new(),
            value: None,
        }
    }

    pub fn and(children: Vec<Expression>) -> Result<Expression, ExpressionError> {
        Self::make(kinds::AND, children)
    }

    pub fn or(children: Vec<Expression>) -> Result<Expression, ExpressionError> {
        Self::make(kinds::OR, children)
    }

    pub fn not(child: Expression) -> Result<Expression, ExpressionError> {
        Self::make(kinds::NOT, vec![child])
    }

    pub fn equals(left: Expression, right: Expression) -> Result<Expression, ExpressionError> {
        Self::make(kinds::EQUAL, vec![left, right])
    }

    /// `setPathToValue(path, value)`, the only built-in that writes memory.
    pub fn set_path_to_value(path: Expression, value: Expression) -> Result<Expression, ExpressionError> {
        Self::make(kinds::SET_PATH_TO_VALUE, vec![path, value])
    }

    pub fn kind(&self) -> &str {
        self.evaluator.kind()
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub fn evaluator(&self) -> &Arc<ExpressionEvaluator> {
        &self.evaluator
    }

    /// The literal held by a constant node.
    pub fn constant_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_constant(&self) -> bool {
        self.value.is_some()
    }

    pub fn return_type(&self) -> ReturnType {
        match &self.value {
            Some(value) => ReturnType::of_value(value),
            None => self.evaluator.return_type(),
        }
    }

    /// Run this node's validator.
    pub fn validate(&self) -> Result<(), ExpressionError> {
        self.evaluator.validate(self)
    }

    /// Validate every node, children first.
    pub fn validate_tree(&self) -> Result<(), ExpressionError> {
        for child in &self.children {
            child.validate_tree()?;
        }
        self.validate()
    }

    /// Evaluate against memory with default options.
    pub fn try_evaluate(&self, memory: &mut dyn Memory) -> EvalResult {
        let result = self.try_evaluate_with(memory, &Options::default());
        if let Err(e) = &result {
            debug!(expression = %self, error = %e, "evaluation failed");
        }
        result
    }

    pub fn try_evaluate_with(&self, memory: &mut dyn Memory, options: &Options) -> EvalResult {
        self.evaluator
            .evaluate(self, memory, options)
            .map_err(|e| e.located(self))
    }

    /// Evaluate and coerce the result to `T`.
    ///
    /// ```
    /// use adaptive_expressions::Expression;
    /// use adaptive_expressions::memory::SimpleObjectMemory;
    ///
    /// let mut memory = SimpleObjectMemory::default();
    /// let n: i32 = Expression::parse("5.0").unwrap().try_evaluate_as(&mut memory).unwrap();
    /// assert_eq!(n, 5);
    /// assert!(Expression::parse("5.5").unwrap().try_evaluate_as::<i32>(&mut memory).is_err());
    /// ```
    pub fn try_evaluate_as<T: FromValue>(&self, memory: &mut dyn Memory) -> Result<T, EvalError> {
        self.try_evaluate_as_with(memory, &Options::default())
    }

    pub fn try_evaluate_as_with<T: FromValue>(
        &self,
        memory: &mut dyn Memory,
        options: &Options,
    ) -> Result<T, EvalError> {
        let value = self.try_evaluate_with(memory, options)?;
        T::from_value(value).inspect_err(|e| debug!(expression = %self, error = %e, "coercion failed"))
    }

    /// Static memory paths this expression reads.
    pub fn references(&self) -> BTreeSet<String> {
        references::references(self)
    }

    /// Structural equality: same kinds, same constants, equal children.
    pub fn deep_equals(&self, other: &Expression) -> bool {
        self.kind() == other.kind()
            && self.value == other.value
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.deep_equals(b))
    }

    /// Property name of an accessor node
    pub(crate) fn property_name(&self) -> Option<&str> {
        if self.kind() != kinds::ACCESSOR {
            return None;
        }
        self.children.first()?.constant_value()?.as_str()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equals(other)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("Constant").field(value).finish(),
            None => f
                .debug_struct("Expression")
                .field("kind", &self.kind())
                .field("children", &self.children)
                .finish(),
        }
    }
}

/// Canonical source text, infix for operators and `name(args)` for functions.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.value {
            return match value {
                Value::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
                other => f.write_str(&to_json(other)),
            };
        }

        let kind = self.kind();
        match (kind, self.children.as_slice()) {
            (kinds::ACCESSOR, [_]) => f.write_str(self.property_name().unwrap_or_default()),
            (kinds::ACCESSOR, [_, instance]) => {
                write!(f, "{}.{}", instance, self.property_name().unwrap_or_default())
            }
            (kinds::ELEMENT, [instance, index]) => write!(f, "{}[{}]", instance, index),
            (kinds::NOT, [child]) => write!(f, "!{}", child),
            (kind, children) if children.len() >= 2 && kinds::INFIX.contains(&kind) => {
                let parts: Vec<String> = children.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(&format!(" {} ", kind)))
            }
            (kind, children) => {
                let args: Vec<String> = children.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", kind, args.join(", "))
            }
        }
    }
}
