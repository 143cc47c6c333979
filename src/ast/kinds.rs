//! Names of expression node kinds that the parser and the reference walk
//! treat specially. Every other kind is a plain function name.

pub const ACCESSOR: &str = "Accessor";
pub const ELEMENT: &str = "Element";
pub const CONSTANT: &str = "Constant";
pub const LAMBDA: &str = "Lambda";

pub const ADD: &str = "+";
pub const SUBTRACT: &str = "-";
pub const MULTIPLY: &str = "*";
pub const DIVIDE: &str = "/";
pub const MOD: &str = "%";
pub const POWER: &str = "^";

pub const EQUAL: &str = "==";
pub const NOT_EQUAL: &str = "!=";
pub const LESS_THAN: &str = "<";
pub const LESS_THAN_OR_EQUAL: &str = "<=";
pub const GREATER_THAN: &str = ">";
pub const GREATER_THAN_OR_EQUAL: &str = ">=";

pub const AND: &str = "&&";
pub const OR: &str = "||";
pub const NOT: &str = "!";

pub const CONCAT: &str = "concat";
pub const COALESCE: &str = "coalesce";
pub const CREATE_ARRAY: &str = "createArray";
pub const JSON: &str = "json";
pub const SET_PROPERTY: &str = "setProperty";
pub const SET_PATH_TO_VALUE: &str = "setPathToValue";

pub const FOREACH: &str = "foreach";
pub const SELECT: &str = "select";
pub const WHERE: &str = "where";
pub const ANY: &str = "any";
pub const ALL: &str = "all";

/// Functions whose second argument binds an iteration variable for the third.
pub const LAMBDA_FORMS: [&str; 5] = [FOREACH, SELECT, WHERE, ANY, ALL];

/// Kinds printed infix by `Display`.
pub const INFIX: [&str; 14] = [
    ADD,
    SUBTRACT,
    MULTIPLY,
    DIVIDE,
    MOD,
    POWER,
    EQUAL,
    NOT_EQUAL,
    LESS_THAN,
    LESS_THAN_OR_EQUAL,
    GREATER_THAN,
    GREATER_THAN_OR_EQUAL,
    AND,
    OR,
];

pub fn is_lambda_form(kind: &str) -> bool {
    LAMBDA_FORMS.contains(&kind)
}
