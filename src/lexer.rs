use crate::{
    ast::{TemplatePart, Token},
    error::ParseError,
};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Character offset where the most recent token began
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_identifier_start(ch: char) -> bool {
        ch.is_alphabetic() || matches!(ch, '_' | '@' | '#' | '$')
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        if let Some(ch) = self.current_char() {
            result.push(ch);
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Resolve the escape sequence starting at the current backslash.
    ///
    /// `\n`, `\r`, `\t`, `\\` and the enclosing quote are unescaped; templates
    /// also unescape `\$`. Any other sequence is kept verbatim.
    fn read_escape(&mut self, quote: char, start: usize, out: &mut String) -> Result<(), ParseError> {
        self.advance(); // Consume backslash
        match self.current_char() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(c) if c == quote => out.push(c),
            Some('$') if quote == '`' => out.push('$'),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None if quote == '`' => return Err(ParseError::UnterminatedTemplate { position: start }),
            None => return Err(ParseError::UnterminatedString { position: start }),
        }
        self.advance();
        Ok(())
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => self.read_escape(quote, start, &mut result)?,
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedString { position: start })
    }

    fn read_template(&mut self) -> Result<Vec<TemplatePart>, ParseError> {
        let start = self.position;
        let mut parts = Vec::new();
        let mut text = String::new();
        self.advance(); // Consume opening backtick

        while let Some(ch) = self.current_char() {
            match ch {
                '`' => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(text));
                    }
                    return Ok(parts);
                }
                '\\' => self.read_escape('`', start, &mut text)?,
                '$' if self.peek_char(1) == Some('{') => {
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let position = self.position;
                    self.advance();
                    self.advance();
                    let source = self.read_interpolation(position)?;
                    parts.push(TemplatePart::Expression { source, position });
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedTemplate { position: start })
    }

    /// Read the body of `${...}` up to its matching brace, skipping quoted text.
    fn read_interpolation(&mut self, start: usize) -> Result<String, ParseError> {
        let mut depth = 1;
        let mut source = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(source);
                    }
                }
                '\'' | '"' | '`' => {
                    source.push(ch);
                    self.advance();
                    while let Some(inner) = self.current_char() {
                        source.push(inner);
                        self.advance();
                        if inner == '\\' {
                            if let Some(escaped) = self.current_char() {
                                source.push(escaped);
                                self.advance();
                            }
                        } else if inner == ch {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
            source.push(ch);
            self.advance();
        }

        Err(ParseError::UnterminatedInterpolation { position: start })
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let invalid = || ParseError::InvalidNumber {
            text: number.clone(),
            position: start,
        };
        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            match number.parse::<i64>() {
                Ok(n) => Ok(Token::Integer(n)),
                // Too large for an integer
                Err(_) => number.parse::<f64>().map(Token::Float).map_err(|_| invalid()),
            }
        }
    }

    /// Read a one- or two-character operator.
    fn operator(&mut self, single: Option<Token>, second: char, double: Token) -> Result<Token, ParseError> {
        if self.peek_char(1) == Some(second) {
            self.advance();
            self.advance();
            return Ok(double);
        }
        match single {
            Some(token) => {
                self.advance();
                Ok(token)
            }
            None => Err(ParseError::UnexpectedChar {
                ch: self.current_char().unwrap_or(second),
                position: self.position,
            }),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('=') => self.operator(None, '=', Token::EqEq)?,
            Some('!') => self.operator(Some(Token::Exclamation), '=', Token::NotEq)?,
            Some('<') => self.operator(Some(Token::Lt), '=', Token::LtEq)?,
            Some('>') => self.operator(Some(Token::Gt), '=', Token::GtEq)?,
            Some('&') => self.operator(Some(Token::Ampersand), '&', Token::AndAnd)?,
            Some('|') => self.operator(None, '|', Token::OrOr)?,
            Some('?') => self.operator(None, '?', Token::DoubleQuestion)?,
            Some('"') => Token::String(self.read_string('"')?),
            Some('\'') => Token::String(self.read_string('\'')?),
            Some('`') => Token::Template(self.read_template()?),
            Some(ch) if Self::is_identifier_start(ch) => {
                let ident = self.read_identifier();
                match ident.to_ascii_lowercase().as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => {
                let token = match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '.' => Token::Dot,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    _ => {
                        return Err(ParseError::UnexpectedChar {
                            ch,
                            position: self.position,
                        });
                    }
                };
                self.advance();
                token
            }
        };
        Ok(token)
    }

    /// Read every remaining token, ending with [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords_ignore_case() {
    let mut lexer = Lexer::new("TRUE False nULL");
    assert_eq!(lexer.next_token().unwrap(), Token::Boolean(true));
    assert_eq!(lexer.next_token().unwrap(), Token::Boolean(false));
    assert_eq!(lexer.next_token().unwrap(), Token::Null);
}

#[test]
fn test_token_start() {
    let mut lexer = Lexer::new("a  >= 1");
    lexer.next_token().unwrap();
    assert_eq!(lexer.next_token().unwrap(), Token::GtEq);
    assert_eq!(lexer.token_start(), 3);
}

#[test]
fn test_interpolation_skips_quoted_braces() {
    let mut lexer = Lexer::new("`a ${concat('}', b)} c`");
    assert_eq!(
        lexer.next_token().unwrap(),
        Token::Template(vec![
            TemplatePart::Text("a ".into()),
            TemplatePart::Expression {
                source: "concat('}', b)".into(),
                position: 3
            },
            TemplatePart::Text(" c".into()),
        ])
    );
}
