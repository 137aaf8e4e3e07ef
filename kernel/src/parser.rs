//! S-expression reader for core terms.
//!
//! ```text
//! term  ::= <int>                      bound variable (de Bruijn index)
//!         | Prop | Type                 Sort 0 / Sort 1
//!         | <symbol>                   constant
//!         | (sort level)
//!         | (pi term term) | (ipi term term)   explicit / implicit binder
//!         | (lam term term)
//!         | (let term term term)
//!         | (app term term+)
//!         | (ind Name level*) | (ctor Name <int> level*) | (const Name level*)
//! level ::= <int> | <symbol> | (succ level) | (max level level) | (imax level level)
//! ```

use crate::ast::{BinderInfo, Level, Term};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected EOF")]
    UnexpectedEof,
    #[error("Expected {0}")]
    Expected(String),
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    #[error("Trailing input after term")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
    Int(usize),
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            peeked: None,
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            self.peeked = self.scan();
        }
        self.peeked.as_ref()
    }

    fn next_token(&mut self) -> Option<Token> {
        match self.peeked.take() {
            Some(tok) => Some(tok),
            None => self.scan(),
        }
    }

    fn scan(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.chars.next()?;
        match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => {
                let mut s = String::new();
                s.push(c);
                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                match s.parse::<usize>() {
                    Ok(n) => Some(Token::Int(n)),
                    Err(_) => Some(Token::Symbol(s)),
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

/// Parse a complete term, rejecting trailing input.
pub fn parse_term(input: &str) -> Result<Rc<Term>, ParseError> {
    let mut parser = Parser::new(input);
    let term = parser.parse_term()?;
    if parser.lexer.next_token().is_some() {
        return Err(ParseError::TrailingInput);
    }
    Ok(term)
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
        }
    }

    pub fn parse_term(&mut self) -> Result<Rc<Term>, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Int(n)) => Ok(Term::var(n)),
            Some(Token::Symbol(s)) => match s.as_str() {
                "Prop" => Ok(Term::prop()),
                "Type" => Ok(Term::sort(Level::succ(Level::Zero))), // Type 0
                _ => Ok(Rc::new(Term::Const(s, vec![]))),
            },
            Some(Token::LParen) => {
                let head = self.expect_symbol()?;
                let term = match head.as_str() {
                    "lam" => {
                        let ty = self.parse_term()?;
                        let body = self.parse_term()?;
                        Term::lam(ty, body, BinderInfo::Default)
                    }
                    "pi" => {
                        let ty = self.parse_term()?;
                        let body = self.parse_term()?;
                        Term::pi(ty, body, BinderInfo::Default)
                    }
                    "ipi" => {
                        let ty = self.parse_term()?;
                        let body = self.parse_term()?;
                        Term::pi(ty, body, BinderInfo::Implicit)
                    }
                    "let" => {
                        let ty = self.parse_term()?;
                        let val = self.parse_term()?;
                        let body = self.parse_term()?;
                        Rc::new(Term::LetE(ty, val, body))
                    }
                    "app" => {
                        let mut result = self.parse_term()?;
                        result = Term::app(result, self.parse_term()?);
                        while !matches!(self.lexer.peek(), Some(Token::RParen) | None) {
                            result = Term::app(result, self.parse_term()?);
                        }
                        result
                    }
                    "sort" => Term::sort(self.parse_level()?),
                    "ind" => {
                        // (ind Name levels...) - reference to inductive type
                        let name = self.expect_symbol()?;
                        Rc::new(Term::Ind(name, self.parse_trailing_levels()?))
                    }
                    "ctor" => {
                        // (ctor IndName idx levels...) - constructor reference
                        let ind_name = self.expect_symbol()?;
                        let idx = self.expect_int()?;
                        Rc::new(Term::Ctor(ind_name, idx, self.parse_trailing_levels()?))
                    }
                    "const" => {
                        let name = self.expect_symbol()?;
                        Rc::new(Term::Const(name, self.parse_trailing_levels()?))
                    }
                    _ => return Err(ParseError::UnknownToken(head)),
                };
                self.expect_rparen()?;
                Ok(term)
            }
            Some(Token::RParen) => Err(ParseError::Expected("term".to_string())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_level(&mut self) -> Result<Level, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Int(n)) => Ok((0..n).fold(Level::Zero, |l, _| Level::succ(l))),
            Some(Token::Symbol(s)) => Ok(Level::Param(s)),
            Some(Token::LParen) => {
                let head = self.expect_symbol()?;
                let level = match head.as_str() {
                    "succ" => Level::succ(self.parse_level()?),
                    "max" => {
                        let a = self.parse_level()?;
                        let b = self.parse_level()?;
                        Level::Max(Box::new(a), Box::new(b))
                    }
                    "imax" => {
                        let a = self.parse_level()?;
                        let b = self.parse_level()?;
                        Level::IMax(Box::new(a), Box::new(b))
                    }
                    _ => return Err(ParseError::UnknownToken(head)),
                };
                self.expect_rparen()?;
                Ok(level)
            }
            Some(Token::RParen) => Err(ParseError::Expected("level".to_string())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_trailing_levels(&mut self) -> Result<Vec<Level>, ParseError> {
        let mut levels = Vec::new();
        while !matches!(self.lexer.peek(), Some(Token::RParen) | None) {
            levels.push(self.parse_level()?);
        }
        Ok(levels)
    }

    fn expect_symbol(&mut self) -> Result<String, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Symbol(s)) => Ok(s),
            _ => Err(ParseError::Expected("symbol".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.lexer.next_token() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ParseError::Expected(")".to_string())),
        }
    }

    fn expect_int(&mut self) -> Result<usize, ParseError> {
        match self.lexer.next_token() {
            Some(Token::Int(n)) => Ok(n),
            _ => Err(ParseError::Expected("integer".to_string())),
        }
    }
}
