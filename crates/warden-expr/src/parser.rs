//! Lexer and recursive-descent parser for trigger conditions.
//!
//! Conditions are untrusted operator input: the lexer and parser enforce an
//! input size limit and a nesting depth limit, and every error carries the
//! byte offset of the offending token so load-time failures point at the
//! exact spot in the contract document.
//!
//! Grammar (informal):
//!
//! ```text
//! expr    := or
//! or      := and ( ("or"  | "||") and )*
//! and     := unary ( ("and" | "&&") unary )*
//! unary   := ("not" | "!") unary | cmp
//! cmp     := primary ( ("<" | "<=" | ">" | ">=" | "==" | "!=" | "in") primary )?
//! primary := literal | path | "len" "(" expr ")"
//!          | "count" "(" expr "," ident "," expr ")" | "(" expr ")"
//! path    := ident ( "." ident | "[" integer "]" )*
//! literal := number | string | "true" | "false" | "null"
//! ```

use warden_contracts::EvaluationContext;

use crate::ast::{CmpOp, Expr, Literal, Segment};
use crate::error::ParseError;

/// Maximum allowed condition size in bytes.
const MAX_INPUT_BYTES: usize = 64 * 1024;
/// Maximum supported nesting depth for parenthesized and function forms.
const MAX_NESTING: usize = 32;

/// Parse a trigger condition into an [`Expr`].
///
/// Called once per rule at contract load time. The returned tree is the
/// only representation ever evaluated — conditions are never re-parsed or
/// interpreted as host code.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    if input.len() > MAX_INPUT_BYTES {
        return Err(ParseError::InputTooLarge {
            max_bytes: MAX_INPUT_BYTES,
            actual_bytes: input.len(),
        });
    }

    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

/// A lexical token from a condition string.
#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Number(&'a str),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Eof,
}

/// Token paired with its byte offset into the condition string.
#[derive(Debug, Clone, PartialEq)]
struct SpannedToken<'a> {
    token: Token<'a>,
    position: usize,
}

struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn lex(mut self) -> Result<Vec<SpannedToken<'a>>, ParseError> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();

        while self.offset < bytes.len() {
            let position = self.offset;
            match bytes[self.offset] {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                }
                b'(' => self.push_simple(&mut tokens, Token::LParen),
                b')' => self.push_simple(&mut tokens, Token::RParen),
                b'[' => self.push_simple(&mut tokens, Token::LBracket),
                b']' => self.push_simple(&mut tokens, Token::RBracket),
                b'.' => self.push_simple(&mut tokens, Token::Dot),
                b',' => self.push_simple(&mut tokens, Token::Comma),
                b'<' => self.push_maybe_eq(&mut tokens, Token::Lt, Token::Le),
                b'>' => self.push_maybe_eq(&mut tokens, Token::Gt, Token::Ge),
                b'!' => self.push_maybe_eq(&mut tokens, Token::Not, Token::Ne),
                b'=' => {
                    if self.peek() == Some(b'=') {
                        tokens.push(SpannedToken { token: Token::EqEq, position });
                        self.offset += 2;
                    } else {
                        return Err(ParseError::UnexpectedToken {
                            expected: "`==`",
                            found: "=".to_string(),
                            position,
                        });
                    }
                }
                b'&' => {
                    if self.peek() == Some(b'&') {
                        tokens.push(SpannedToken { token: Token::And, position });
                        self.offset += 2;
                    } else {
                        return Err(ParseError::UnexpectedToken {
                            expected: "`&&`",
                            found: "&".to_string(),
                            position,
                        });
                    }
                }
                b'|' => {
                    if self.peek() == Some(b'|') {
                        tokens.push(SpannedToken { token: Token::Or, position });
                        self.offset += 2;
                    } else {
                        return Err(ParseError::UnexpectedToken {
                            expected: "`||`",
                            found: "|".to_string(),
                            position,
                        });
                    }
                }
                b'"' => {
                    let value = self.lex_string()?;
                    tokens.push(SpannedToken {
                        token: Token::Str(value),
                        position,
                    });
                }
                b'-' | b'0'..=b'9' => {
                    let raw = self.lex_number(position)?;
                    tokens.push(SpannedToken {
                        token: Token::Number(raw),
                        position,
                    });
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    let start = self.offset;
                    self.consume_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                    let slice = &self.input[start..self.offset];
                    tokens.push(SpannedToken {
                        token: keyword_or_ident(slice),
                        position: start,
                    });
                }
                _ => {
                    let found = self.input[self.offset..]
                        .chars()
                        .next()
                        .map(|c| c.to_string())
                        .unwrap_or_default();
                    return Err(ParseError::UnexpectedToken {
                        expected: "identifier, literal, or operator",
                        found,
                        position,
                    });
                }
            }
        }

        if tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    fn push_simple(&mut self, tokens: &mut Vec<SpannedToken<'a>>, token: Token<'a>) {
        tokens.push(SpannedToken {
            token,
            position: self.offset,
        });
        self.offset += 1;
    }

    /// Emit `two` if the next byte is `=`, otherwise `one`.
    fn push_maybe_eq(
        &mut self,
        tokens: &mut Vec<SpannedToken<'a>>,
        one: Token<'a>,
        two: Token<'a>,
    ) {
        let position = self.offset;
        if self.peek() == Some(b'=') {
            tokens.push(SpannedToken { token: two, position });
            self.offset += 2;
        } else {
            tokens.push(SpannedToken { token: one, position });
            self.offset += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.offset + 1).copied()
    }

    fn consume_while<F>(&mut self, condition: F)
    where
        F: Fn(u8) -> bool,
    {
        let bytes = self.input.as_bytes();
        while let Some(&b) = bytes.get(self.offset) {
            if condition(b) {
                self.offset += 1;
            } else {
                break;
            }
        }
    }

    /// Lex a double-quoted string with `\"`, `\\`, `\n`, and `\t` escapes.
    fn lex_string(&mut self) -> Result<String, ParseError> {
        let start = self.offset;
        self.offset += 1; // opening quote
        let mut value = String::new();

        loop {
            match self.input.as_bytes().get(self.offset) {
                None => return Err(ParseError::UnterminatedString { position: start }),
                Some(b'"') => {
                    self.offset += 1;
                    return Ok(value);
                }
                Some(b'\\') => {
                    let escaped = self
                        .input
                        .as_bytes()
                        .get(self.offset + 1)
                        .copied()
                        .ok_or(ParseError::UnterminatedString { position: start })?;
                    let ch = match escaped {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'n' => '\n',
                        b't' => '\t',
                        other => {
                            return Err(ParseError::UnexpectedToken {
                                expected: "escape sequence",
                                found: char::from(other).to_string(),
                                position: self.offset,
                            })
                        }
                    };
                    value.push(ch);
                    self.offset += 2;
                }
                Some(_) => {
                    if let Some(ch) = self.input[self.offset..].chars().next() {
                        value.push(ch);
                        self.offset += ch.len_utf8();
                    } else {
                        return Err(ParseError::UnterminatedString { position: start });
                    }
                }
            }
        }
    }

    /// Lex a number: optional leading `-`, digits, optional fraction.
    fn lex_number(&mut self, position: usize) -> Result<&'a str, ParseError> {
        let start = self.offset;
        let bytes = self.input.as_bytes();

        if bytes[self.offset] == b'-' {
            self.offset += 1;
            if !matches!(bytes.get(self.offset), Some(b) if b.is_ascii_digit()) {
                return Err(ParseError::UnexpectedToken {
                    expected: "digit after `-`",
                    found: "-".to_string(),
                    position,
                });
            }
        }

        self.consume_while(|b| b.is_ascii_digit());
        if matches!(bytes.get(self.offset), Some(b'.'))
            && matches!(bytes.get(self.offset + 1), Some(b) if b.is_ascii_digit())
        {
            self.offset += 1;
            self.consume_while(|b| b.is_ascii_digit());
        }

        Ok(&self.input[start..self.offset])
    }
}

fn keyword_or_ident(slice: &str) -> Token<'_> {
    match slice {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Ident(slice),
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser<'a> {
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<SpannedToken<'a>>) -> Self {
        Self {
            tokens,
            index: 0,
            nesting: 0,
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.parse_and()?];
        while self.matches(&Token::Or) {
            parts.push(self.parse_and()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Expr::Any(parts))
        }
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.parse_unary()?];
        while self.matches(&Token::And) {
            parts.push(self.parse_unary()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Expr::All(parts))
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&Token::Not) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_primary()?;

        let op = match self.current().token {
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            Token::EqEq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            Token::In => CmpOp::In,
            _ => return Ok(lhs),
        };
        self.advance();

        let rhs = self.parse_primary()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.current().position;
        match self.current().token.clone() {
            Token::Number(raw) => {
                self.advance();
                number_literal(raw, position)
            }
            Token::Str(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(value)))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            Token::LParen => {
                self.advance();
                self.with_nesting(position, |parser| {
                    let expr = parser.parse_expression()?;
                    parser.expect(&Token::RParen, "`)`")?;
                    Ok(expr)
                })
            }
            Token::Ident(name) => {
                self.advance();
                if self.matches(&Token::LParen) {
                    self.with_nesting(position, |parser| parser.parse_function(name, position))
                } else {
                    self.parse_path_tail(name)
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "a value, path, or `(`",
                found: self.describe_current(),
                position,
            }),
        }
    }

    /// Parse the body of `len(...)` or `count(...)`. The opening paren has
    /// already been consumed. Any other callee is rejected — the language
    /// has exactly these two functions.
    fn parse_function(&mut self, name: &'a str, name_pos: usize) -> Result<Expr, ParseError> {
        match name {
            "len" => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "`)` after len(...)")?;
                Ok(Expr::Len(Box::new(inner)))
            }
            "count" => {
                let seq = self.parse_expression()?;
                self.expect(&Token::Comma, "`,` after the count sequence")?;

                let var_pos = self.current().position;
                let var = match self.current().token {
                    Token::Ident(var) => var.to_string(),
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "loop variable name",
                            found: self.describe_current(),
                            position: var_pos,
                        })
                    }
                };
                if EvaluationContext::is_reserved_root(&var) {
                    return Err(ParseError::ReservedBinding {
                        name: var,
                        position: var_pos,
                    });
                }
                self.advance();

                self.expect(&Token::Comma, "`,` after the loop variable")?;
                let pred = self.parse_expression()?;
                self.expect(&Token::RParen, "`)` after count(...)")?;

                Ok(Expr::Count {
                    seq: Box::new(seq),
                    var,
                    pred: Box::new(pred),
                })
            }
            _ => Err(ParseError::UnknownFunction {
                name: name.to_string(),
                position: name_pos,
            }),
        }
    }

    /// Parse `.field` and `[index]` segments after a root identifier.
    fn parse_path_tail(&mut self, root: &'a str) -> Result<Expr, ParseError> {
        let mut segments = Vec::new();
        loop {
            if self.matches(&Token::Dot) {
                let position = self.current().position;
                match self.current().token {
                    Token::Ident(key) => {
                        segments.push(Segment::Key(key.to_string()));
                        self.advance();
                    }
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "field name after `.`",
                            found: self.describe_current(),
                            position,
                        })
                    }
                }
            } else if self.matches(&Token::LBracket) {
                let position = self.current().position;
                match self.current().token {
                    Token::Number(raw) => {
                        let index: usize =
                            raw.parse().map_err(|_| ParseError::InvalidNumber {
                                raw: raw.to_string(),
                                position,
                            })?;
                        segments.push(Segment::Index(index));
                        self.advance();
                        self.expect(&Token::RBracket, "`]` after index")?;
                    }
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "array index",
                            found: self.describe_current(),
                            position,
                        })
                    }
                }
            } else {
                break;
            }
        }

        Ok(Expr::Path {
            root: root.to_string(),
            segments,
        })
    }

    fn with_nesting<T>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting + 1 > MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                max_depth: MAX_NESTING,
                position,
            });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn expect(&mut self, token: &Token<'_>, expected: &'static str) -> Result<(), ParseError> {
        if std::mem::discriminant(&self.current().token) == std::mem::discriminant(token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                found: self.describe_current(),
                position: self.current().position,
            })
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if matches!(self.current().token, Token::Eof) {
            Ok(())
        } else {
            Err(ParseError::TrailingInput {
                position: self.current().position,
            })
        }
    }

    fn matches(&mut self, token: &Token<'_>) -> bool {
        if std::mem::discriminant(&self.current().token) == std::mem::discriminant(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current(&self) -> &SpannedToken<'a> {
        debug_assert!(self.index < self.tokens.len(), "parser index out of bounds");
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn describe_current(&self) -> String {
        match &self.current().token {
            Token::Ident(name) => (*name).to_string(),
            Token::Number(raw) => (*raw).to_string(),
            Token::Str(value) => format!("\"{value}\""),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::Null => "null".to_string(),
            Token::And => "and".to_string(),
            Token::Or => "or".to_string(),
            Token::Not => "not".to_string(),
            Token::In => "in".to_string(),
            Token::Lt => "<".to_string(),
            Token::Le => "<=".to_string(),
            Token::Gt => ">".to_string(),
            Token::Ge => ">=".to_string(),
            Token::EqEq => "==".to_string(),
            Token::Ne => "!=".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::Dot => ".".to_string(),
            Token::Comma => ",".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

fn number_literal(raw: &str, position: usize) -> Result<Expr, ParseError> {
    let literal = if raw.contains('.') {
        raw.parse::<f64>().map(Literal::Float).map_err(|_| ())
    } else {
        raw.parse::<i64>().map(Literal::Int).map_err(|_| ())
    };
    literal.map(Expr::Literal).map_err(|_| ParseError::InvalidNumber {
        raw: raw.to_string(),
        position,
    })
}
