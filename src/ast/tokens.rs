use std::fmt;

/// A piece of a backtick template string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text with escapes already resolved
    Text(String),

    /// Source of an embedded `${...}` expression and its position in the input
    Expression { source: String, position: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 314
    /// ```
    Integer(i64),

    /// String literal enclosed in single or double quotes
    ///
    /// Never interpolated.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// Backtick template with `${...}` interpolation
    ///
    /// # Examples
    /// ```text
    /// `Hello ${user.name}!`
    /// ```
    Template(Vec<TemplatePart>),

    /// Boolean values (case-insensitive)
    Boolean(bool),

    /// Null value (case-insensitive)
    Null,

    // Identifiers
    /// Memory property name or function name
    ///
    /// Starts with a letter, `_`, `@`, `#` or `$`, followed by letters,
    /// digits or underscores.
    ///
    /// # Examples
    /// ```text
    /// user
    /// $local
    /// @entity
    /// ```
    Identifier(String),

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction or unary minus
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    /// Exponentiation (right-associative)
    Caret,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Logical
    /// Logical AND
    AndAnd,

    /// Logical OR
    OrOr,

    /// Logical NOT
    Exclamation,

    /// String concatenation operator
    ///
    /// # Examples
    /// ```text
    /// 'a' & 1
    /// ```
    Ampersand,

    /// Null coalescing
    ///
    /// # Examples
    /// ```text
    /// user.nickname ?? user.name
    /// ```
    DoubleQuestion,

    // Delimiters
    /// Left bracket for element access or array literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Left brace for object literals
    LBrace,

    /// Right brace
    RBrace,

    /// Dot for property access
    Dot,

    /// Comma for separating arguments or array elements
    Comma,

    /// Colon for object literal key-value pairs
    Colon,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Float(n) => return write!(f, "number {}", n),
            Token::Integer(n) => return write!(f, "number {}", n),
            Token::String(s) => return write!(f, "string '{}'", s),
            Token::Template(_) => "template string",
            Token::Boolean(b) => return write!(f, "'{}'", b),
            Token::Null => "'null'",
            Token::Identifier(name) => return write!(f, "identifier '{}'", name),
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Caret => "'^'",
            Token::EqEq => "'=='",
            Token::NotEq => "'!='",
            Token::Lt => "'<'",
            Token::Gt => "'>'",
            Token::LtEq => "'<='",
            Token::GtEq => "'>='",
            Token::AndAnd => "'&&'",
            Token::OrOr => "'||'",
            Token::Exclamation => "'!'",
            Token::Ampersand => "'&'",
            Token::DoubleQuestion => "'??'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::Dot => "'.'",
            Token::Comma => "','",
            Token::Colon => "':'",
            Token::Eof => "end of input",
        };
        f.write_str(text)
    }
}
