//! Error types for parsing, construction and evaluation.
//!
//! Parse and construction failures ([`ParseError`], [`ExpressionError`]) are
//! raised when an expression is built. Evaluation failures ([`EvalError`]) are
//! returned from [`Expression::try_evaluate`](crate::Expression::try_evaluate)
//! and never panic.

use std::fmt;

use thiserror::Error;

/// Lexical or grammatical failure while reading expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Unterminated template starting at position {position}")]
    UnterminatedTemplate { position: usize },

    #[error("Unterminated interpolation '${{' at position {position}")]
    UnterminatedInterpolation { position: usize },

    #[error("Invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("Expected {expected} at position {position}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("'{callee}' at position {position} is not a function name")]
    NotCallable { callee: String, position: usize },

    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },
}

/// Failure while constructing an expression tree.
///
/// These are static errors: the expression can never be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("{expression} should have {expected} children but has {actual}")]
    Arity {
        expression: String,
        expected: String,
        actual: usize,
    },

    #[error("{child} in {expression} is not {expected}")]
    Type {
        expression: String,
        child: String,
        expected: String,
    },

    #[error("{expression}: {message}")]
    Invalid { expression: String, message: String },
}

/// Failure while evaluating an expression against memory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{expression} is not {expected} (found {found})")]
    TypeMismatch {
        expression: String,
        expected: String,
        found: &'static str,
    },

    #[error("Cannot compare {left} with {right} in {expression}")]
    NotComparable {
        expression: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("Division by zero in {expression}")]
    DivisionByZero { expression: String },

    #[error("'{path}' does not exist in memory")]
    PathNotFound { path: String },

    #[error("{index} is not a valid index in {expression}")]
    InvalidIndex { expression: String, index: String },

    #[error("Cannot set '{path}' in memory")]
    SetFailed { path: String },

    #[error("Cannot convert {value} to {target}: {reason}")]
    Coercion {
        value: String,
        target: String,
        reason: String,
    },

    #[error("{function}: {message} in {expression}")]
    Function {
        function: String,
        expression: String,
        message: String,
    },
}

impl EvalError {
    /// Shorthand for a failure raised by a named built-in or custom function.
    ///
    /// The failing sub-expression is filled in by the node that evaluated it.
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Function {
            function: function.into(),
            expression: String::new(),
            message: message.into(),
        }
    }

    /// Attach the failing sub-expression to a function error that lacks one.
    pub(crate) fn located(self, expression: impl fmt::Display) -> Self {
        match self {
            EvalError::Function {
                function,
                expression: located,
                message,
            } if located.is_empty() => EvalError::Function {
                function,
                expression: expression.to_string(),
                message,
            },
            other => other,
        }
    }
}
