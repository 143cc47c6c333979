//! # Expression Syntax
//!
//! This module defines the lexical tokens of the expression language and the
//! names of the node kinds the rest of the crate treats specially.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[kinds]** - Node kind names (`Accessor`, `Element`, operators, lambda forms)
//!
//! ## Quick Start
//!
//! ```text
//! user.age >= 18 && contains(user.roles, 'admin')
//! ```
//!
//! ## Core Concepts
//!
//! ### Property Paths
//!
//! Bare names read memory. `a.b.c` becomes a right-nested chain of `Accessor`
//! nodes and `a[expr]` becomes an `Element` node whose index may be computed:
//!
//! ```text
//! items[0].name
//! bag['name']
//! items[count(items) - 1]
//! ```
//!
//! ### Operators
//!
//! From lowest to highest precedence:
//!
//! | Operators | Meaning |
//! |---|---|
//! | `??` | null coalescing |
//! | `\|\|` | logical or |
//! | `&&` | logical and |
//! | `< <= > >=` | ordering |
//! | `&` | string concatenation |
//! | `== !=` | equality |
//! | `+ -` | addition, subtraction, string concatenation |
//! | `* / %` | multiplication, division, modulo |
//! | `^` | exponentiation (right-associative) |
//! | `! - +` | unary |
//!
//! ### Lambda Forms
//!
//! `foreach`, `select`, `where`, `any` and `all` bind their second argument as
//! an iteration variable visible only inside the third:
//!
//! ```text
//! foreach(items, x, x.value * 2)
//! ```
//!
//! ### Literals
//!
//! ```text
//! 42  3.5  'single'  "double"  true  null
//! [1, 2, 3]
//! {name: 'Ann', age: 7}
//! `Hello ${user.name}`
//! ```
pub mod kinds;
pub mod tokens;

pub use tokens::{TemplatePart, Token};
