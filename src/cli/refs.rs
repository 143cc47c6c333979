//! List the memory paths an expression reads

use super::CliError;
use crate::Expression;

/// Parse `expression` and return its static references, sorted.
pub fn execute_refs(expression: &str) -> Result<Vec<String>, CliError> {
    let expr = Expression::parse(expression)?;
    Ok(expr.references().into_iter().collect())
}
