//! Validate expressions and evaluate them against JSON input

use super::CliError;
use crate::{Expression, Options, Value, memory::JsonMemory};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON input string; an empty object when absent
    pub input: Option<String>,
    /// Only validate the expression, don't evaluate it
    pub syntax_only: bool,
    /// Report missing memory paths as errors
    pub strict: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// The expression parsed and validated
    SyntaxValid,
    /// The expression evaluated to a value
    Success(Value),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expr = Expression::parse(&options.expression)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json = match &options.input {
        Some(input) => serde_json::from_str(input)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    let mut memory = JsonMemory::new(json);
    let evaluation = Options::new().strict_paths(options.strict);

    let value = expr.try_evaluate_with(&mut memory, &evaluation)?;
    Ok(CheckResult::Success(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_evaluates_against_input() {
        let options = CheckOptions {
            expression: "=user.age + 1".to_string(),
            input: Some(r#"{"user": {"age": 41}}"#.to_string()),
            ..Default::default()
        };
        match execute_check(&options).unwrap() {
            CheckResult::Success(value) => assert_eq!(value, Value::Integer(42)),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_syntax_only_reports_unknown_function() {
        let options = CheckOptions {
            expression: "nope(1)".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(execute_check(&options), Err(CliError::Expression(_))));
    }
}
