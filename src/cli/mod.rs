//! CLI support for adaptive-expressions
//!
//! Provides programmatic access to the `adx` commands for embedding in other
//! tools.

mod check;
mod functions;
mod refs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use functions::list_functions;
pub use refs::execute_refs;

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid expression: {0}")]
    Expression(#[from] crate::ExpressionError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
