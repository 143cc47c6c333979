//! # adaptive-expressions
//!
//! A small expression language for evaluating conditions and computing values
//! against caller-supplied state.
//!
//! Text is parsed once into an immutable [`Expression`] tree whose function
//! names are resolved against a [`FunctionTable`]. The tree is then evaluated
//! any number of times against a [`Memory`](memory::Memory) adapter. Evaluation
//! never panics: failures come back as [`EvalError`].
//!
//! ```
//! use adaptive_expressions::{Expression, Value};
//! use adaptive_expressions::memory::JsonMemory;
//! use serde_json::json;
//!
//! let expr = Expression::parse("=where(orders, o, o.total > 10)").unwrap();
//! let mut memory = JsonMemory::new(json!({
//!     "orders": [{"id": 1, "total": 5}, {"id": 2, "total": 20}]
//! }));
//!
//! let big = expr.try_evaluate(&mut memory).unwrap();
//! assert_eq!(big.as_array().map(Vec::len), Some(1));
//! assert_eq!(expr.references().into_iter().collect::<Vec<_>>(), ["orders"]);
//! ```
//!
//! Configuration values that may be either literals or expressions are
//! modelled by [`ExpressionProperty`]; see the [`properties`] module.

pub mod ast;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod memory;
pub mod output;
pub mod parser;
pub mod path;
pub mod properties;
pub mod references;
pub mod timezone;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::Token;
pub use convert::{FromValue, Json};
pub use error::{EvalError, ExpressionError, ParseError};
pub use evaluator::{EvalResult, ExpressionEvaluator, NullSubstitution, Options, ReturnType};
pub use expression::Expression;
pub use functions::FunctionTable;
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty};
pub use properties::{
    ArrayExpression, BoolExpression, ExpressionProperty, IntExpression, LiteralText, NumberExpression,
    ObjectExpression, StringExpression, ValueExpression,
};
pub use timezone::TimeZoneTable;
pub use value::Value;
