use std::mem;

use tracing::trace;

use crate::{
    ast::{TemplatePart, Token, kinds},
    error::{ExpressionError, ParseError},
    expression::Expression,
    functions::FunctionTable,
    lexer::Lexer,
    value::Value,
};

type ParseResult = Result<Expression, ExpressionError>;

/// Recursive-descent parser producing validated [`Expression`] trees.
///
/// Function names are resolved against `table` as each node is built, so an
/// unknown function or a wrong argument count fails here rather than at
/// evaluation time.
pub struct Parser<'t> {
    lexer: Lexer,
    current_token: Token,
    position: usize,
    table: &'t FunctionTable,
}

impl<'t> Parser<'t> {
    pub fn new(mut lexer: Lexer, table: &'t FunctionTable) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            position,
            table,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token.to_string(),
            position: self.position,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&expected.to_string()));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn make(&self, kind: &str, children: Vec<Expression>) -> ParseResult {
        Expression::make_with(self.table, kind, children)
    }

    /// Parse primary expressions: literals, identifiers, templates, `( )`,
    /// object and array literals.
    fn parse_primary(&mut self) -> ParseResult {
        let position = self.position;
        match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Float(n) => {
                self.advance()?;
                Ok(Expression::constant(n))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expression::constant(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expression::constant(s))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expression::constant(b))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expression::constant(Value::Null))
            }
            Token::Template(parts) => {
                self.advance()?;
                self.parse_template(parts)
            }

            // Memory reference, or a function name when followed by '('
            Token::Identifier(name) => {
                self.advance()?;
                Ok(Expression::accessor(&name, None))
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBrace => {
                self.advance()?;
                self.parse_object_literal()
            }
            Token::LBracket => {
                self.advance()?;
                self.parse_array_literal()
            }

            token => Err(ParseError::UnexpectedToken {
                expected: "an expression".to_string(),
                found: token.to_string(),
                position,
            }
            .into()),
        }
    }

    /// A template is a constant when it has no `${...}` parts, otherwise the
    /// `concat` of its pieces.
    fn parse_template(&self, parts: Vec<TemplatePart>) -> ParseResult {
        let mut children = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => children.push(Expression::constant(text)),
                TemplatePart::Expression { source, position } => {
                    trace!(%source, position, "parsing interpolation");
                    children.push(parse(&source, self.table)?);
                }
            }
        }

        if children.is_empty() {
            return Ok(Expression::constant(""));
        }
        if children.len() == 1 && matches!(children[0].constant_value(), Some(Value::String(_))) {
            return Ok(children.swap_remove(0));
        }
        self.make(kinds::CONCAT, children)
    }

    /// `{a: 1, 'b c': 2}` builds `setProperty(setProperty(json('{}'), 'a', 1), 'b c', 2)`.
    fn parse_object_literal(&mut self) -> ParseResult {
        let mut object = self.make(kinds::JSON, vec![Expression::constant("{}")])?;

        while !self.check(&Token::RBrace) {
            let key = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::String(s) | Token::Identifier(s) => s,
                token => {
                    self.current_token = token;
                    return Err(self.unexpected("a string or identifier as object key").into());
                }
            };
            self.advance()?;
            self.expect(Token::Colon)?;

            let value = self.parse_expression()?;
            object = self.make(kinds::SET_PROPERTY, vec![object, Expression::constant(key), value])?;

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(object)
    }

    fn parse_array_literal(&mut self) -> ParseResult {
        let mut elements = vec![];

        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBracket)?;
        self.make(kinds::CREATE_ARRAY, elements)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ExpressionError> {
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Parse `.name`, `[index]` and `(args)` suffixes
    fn parse_postfix(&mut self) -> ParseResult {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance()?; // consume '.'

                let name = match &self.current_token {
                    Token::Identifier(n) => n.clone(),
                    _ => return Err(self.unexpected("a property name after '.'").into()),
                };
                self.advance()?;

                expr = Expression::accessor(&name, Some(expr));
            } else if self.check(&Token::LBracket) {
                self.advance()?; // consume '['
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;

                let element = Expression::element(expr, index);
                element.validate()?;
                expr = element;
            } else if self.check(&Token::LParen) {
                let position = self.position;
                let Some(name) = function_name(&expr) else {
                    return Err(ParseError::NotCallable {
                        callee: expr.to_string(),
                        position,
                    }
                    .into());
                };
                self.advance()?; // consume '('
                let args = self.parse_arguments()?;

                expr = self.make(&name, args)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult {
        match self.current_token {
            Token::Exclamation => {
                self.advance()?;
                let operand = self.parse_unary()?;
                self.make(kinds::NOT, vec![operand])
            }
            Token::Minus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                match operand.constant_value() {
                    Some(Value::Integer(n)) => Ok(Expression::constant(
                        n.checked_neg().map_or(Value::Float(-(*n as f64)), Value::Integer),
                    )),
                    Some(Value::Float(f)) => Ok(Expression::constant(-f)),
                    // Represent as 0 - operand
                    _ => self.make(kinds::SUBTRACT, vec![Expression::constant(0), operand]),
                }
            }
            Token::Plus => {
                self.advance()?;
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    /// `^` is right-associative: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn parse_power(&mut self) -> ParseResult {
        let base = self.parse_unary()?;

        if self.check(&Token::Caret) {
            self.advance()?;
            let exponent = self.parse_power()?;
            return self.make(kinds::POWER, vec![base, exponent]);
        }
        Ok(base)
    }

    fn parse_multiplicative(&mut self) -> ParseResult {
        let mut left = self.parse_power()?;

        loop {
            let kind = match &self.current_token {
                Token::Star => kinds::MULTIPLY,
                Token::Slash => kinds::DIVIDE,
                Token::Percent => kinds::MOD,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_power()?;
            left = self.make(kind, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult {
        let mut left = self.parse_multiplicative()?;

        loop {
            let kind = match &self.current_token {
                Token::Plus => kinds::ADD,
                Token::Minus => kinds::SUBTRACT,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.make(kind, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult {
        let mut left = self.parse_additive()?;

        loop {
            let kind = match &self.current_token {
                Token::EqEq => kinds::EQUAL,
                Token::NotEq => kinds::NOT_EQUAL,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_additive()?;
            left = self.make(kind, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> ParseResult {
        let mut left = self.parse_equality()?;

        while self.check(&Token::Ampersand) {
            self.advance()?;
            let right = self.parse_equality()?;
            left = self.make(kinds::CONCAT, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult {
        let mut left = self.parse_concat()?;

        loop {
            let kind = match &self.current_token {
                Token::Lt => kinds::LESS_THAN,
                Token::LtEq => kinds::LESS_THAN_OR_EQUAL,
                Token::Gt => kinds::GREATER_THAN,
                Token::GtEq => kinds::GREATER_THAN_OR_EQUAL,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_concat()?;
            left = self.make(kind, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult {
        let mut left = self.parse_relational()?;

        while self.check(&Token::AndAnd) {
            self.advance()?;
            let right = self.parse_relational()?;
            left = self.make(kinds::AND, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult {
        let mut left = self.parse_and()?;

        while self.check(&Token::OrOr) {
            self.advance()?;
            let right = self.parse_and()?;
            left = self.make(kinds::OR, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_coalesce(&mut self) -> ParseResult {
        let mut left = self.parse_or()?;

        while self.check(&Token::DoubleQuestion) {
            self.advance()?;
            let right = self.parse_or()?;
            left = self.make(kinds::COALESCE, vec![left, right])?;
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> ParseResult {
        self.parse_coalesce()
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub fn parse(&mut self) -> ParseResult {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}

/// `a.b.c` used as a callee names the function `a.b.c`.
fn function_name(expr: &Expression) -> Option<String> {
    match expr.children() {
        [_] => expr.property_name().map(str::to_string),
        [_, instance] => {
            let name = expr.property_name()?;
            Some(format!("{}.{}", function_name(instance)?, name))
        }
        _ => None,
    }
}

/// Parse expression text against `table`.
///
/// Surrounding whitespace and a single leading `=` are ignored; empty text is
/// the constant `""`.
pub fn parse(text: &str, table: &FunctionTable) -> ParseResult {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    if body.trim().is_empty() {
        return Ok(Expression::constant(""));
    }

    let mut parser = Parser::new(Lexer::new(body), table)?;
    let expr = parser.parse()?;
    trace!(text, expression = %expr, "parsed");
    Ok(expr)
}
