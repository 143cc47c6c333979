//! List the registered function names

use crate::FunctionTable;

/// Every built-in name and alias, sorted.
pub fn list_functions() -> Vec<String> {
    FunctionTable::global()
        .names()
        .into_iter()
        .filter(|name| !matches!(name.as_str(), "Accessor" | "Element" | "Constant"))
        .collect()
}
