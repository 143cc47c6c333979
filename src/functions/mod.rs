//! The function registry and built-in functions.
//!
//! A [`FunctionTable`] maps names to shared [`ExpressionEvaluator`]s. Built-in
//! entries are loaded once; host applications add or override entries at any
//! time through [`FunctionTable::register`]. Lookups and registrations are
//! safe from any thread.
//!
//! Names are resolved when an expression is built, so a registration only
//! affects expressions parsed afterwards.
//!
//! ```
//! use adaptive_expressions::{Expression, FunctionTable, ReturnType, Value};
//! use adaptive_expressions::memory::SimpleObjectMemory;
//!
//! let table = FunctionTable::new();
//! table.register_fn("double", ReturnType::NUMBER, |args| {
//!     Ok(Value::Integer(args[0].as_i64().unwrap_or(0) * 2))
//! });
//!
//! let expr = Expression::parse_with("double(21)", &table).unwrap();
//! let mut memory = SimpleObjectMemory::default();
//! assert_eq!(expr.try_evaluate(&mut memory), Ok(Value::Integer(42)));
//! ```

pub mod access;
mod collection;
mod comparison;
mod conversion;
mod datetime;
mod logic;
mod math;
mod object;
mod string;
pub mod utils;

use std::{collections::HashMap, fmt, sync::Arc};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    error::ExpressionError,
    evaluator::{EvalResult, ExpressionEvaluator, ReturnType},
    value::Value,
};

pub use comparison::{compare_values, loose_equals};

static FUNCTIONS: Lazy<FunctionTable> = Lazy::new(FunctionTable::new);

/// Alternative names for built-ins: `(alias, canonical name)`.
const ALIASES: [(&str, &str); 16] = [
    ("add", "+"),
    ("sub", "-"),
    ("mul", "*"),
    ("div", "/"),
    ("mod", "%"),
    ("exp", "^"),
    ("equals", "=="),
    ("greater", ">"),
    ("greaterOrEquals", ">="),
    ("less", "<"),
    ("lessOrEquals", "<="),
    ("and", "&&"),
    ("or", "||"),
    ("not", "!"),
    ("&", "concat"),
    ("??", "coalesce"),
];

pub struct FunctionTable {
    builtin: HashMap<String, Arc<ExpressionEvaluator>>,
    custom: DashMap<String, Arc<ExpressionEvaluator>>,
}

impl FunctionTable {
    /// A table holding only the built-in functions.
    pub fn new() -> Self {
        let mut builtin: HashMap<String, Arc<ExpressionEvaluator>> = HashMap::new();

        let core = [
            access::constant_evaluator(),
            access::accessor_evaluator(),
            access::element_evaluator(),
        ];
        let evaluators = math::evaluators()
            .into_iter()
            .chain(comparison::evaluators())
            .chain(logic::evaluators())
            .chain(string::evaluators())
            .chain(collection::evaluators())
            .chain(object::evaluators())
            .chain(conversion::evaluators())
            .chain(datetime::evaluators())
            .map(Arc::new)
            .chain(core);

        for evaluator in evaluators {
            builtin.insert(evaluator.kind().to_string(), evaluator);
        }
        for (alias, name) in ALIASES {
            if let Some(evaluator) = builtin.get(name).cloned() {
                builtin.insert(alias.to_string(), evaluator);
            }
        }

        debug!(count = builtin.len(), "loaded built-in functions");
        FunctionTable {
            builtin,
            custom: DashMap::new(),
        }
    }

    /// The process-wide table used by [`Expression::parse`](crate::Expression::parse).
    pub fn global() -> &'static FunctionTable {
        &FUNCTIONS
    }

    /// Find an evaluator; custom registrations shadow built-ins.
    pub fn get(&self, name: &str) -> Option<Arc<ExpressionEvaluator>> {
        self.custom
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .or_else(|| self.builtin.get(name).cloned())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ExpressionEvaluator>, ExpressionError> {
        self.get(name).ok_or_else(|| ExpressionError::UnknownFunction {
            name: name.to_string(),
        })
    }

    /// Add or replace a function under its kind name. Returns the custom
    /// entry it replaced, if any.
    pub fn register(&self, evaluator: ExpressionEvaluator) -> Option<Arc<ExpressionEvaluator>> {
        let name = evaluator.kind().to_string();
        debug!(function = %name, "registering function");
        self.custom.insert(name, Arc::new(evaluator))
    }

    /// Register a function over already evaluated arguments.
    pub fn register_fn<F>(&self, name: &str, return_type: ReturnType, f: F) -> Option<Arc<ExpressionEvaluator>>
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        self.register(ExpressionEvaluator::unchecked(name, return_type, utils::apply(f)))
    }

    /// Remove a custom registration. Built-ins cannot be removed.
    pub fn remove(&self, name: &str) -> bool {
        self.custom.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || self.builtin.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .builtin
            .keys()
            .cloned()
            .chain(self.custom.iter().map(|entry| entry.key().clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("builtin", &self.builtin.len())
            .field("custom", &self.custom.len())
            .finish()
    }
}
