//! Formula tokenizer
//!
//! Converts a prepared formula (variables already substituted) such as
//! `max(1, 5 - 3 * 0.5)` into a sequence of tokens for the parser.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Arithmetic operator symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Plus),
            '-' => Some(Operator::Minus),
            '*' => Some(Operator::Star),
            '/' => Some(Operator::Slash),
            '^' => Some(Operator::Caret),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Plus => '+',
            Operator::Minus => '-',
            Operator::Star => '*',
            Operator::Slash => '/',
            Operator::Caret => '^',
        }
    }
}

/// A token in a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 12, 0.5, .25)
    Number(f64),
    /// A function name, or a variable name nobody bound
    Identifier(String),
    /// One of `+ - * / ^`
    Operator(Operator),
    OpenParen,
    CloseParen,
    Comma,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenizeError {
    #[error("Invalid number: {literal}")]
    InvalidNumber { literal: String, position: usize },

    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
}

/// Tokenizer for formula expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given formula string
    pub fn new(formula: &'a str) -> Self {
        Self {
            chars: formula.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire formula into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token, or None if at end of input
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            c if c.is_ascii_digit() || c == '.' => self.read_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),
            c => match Operator::from_char(c) {
                Some(op) => {
                    self.advance();
                    Token::Operator(op)
                }
                None => {
                    return Err(TokenizeError::UnexpectedChar {
                        found: c,
                        position: self.position,
                    });
                }
            },
        };
        Ok(Some(token))
    }

    /// Peek at the next character without consuming it
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Consume characters while `pred` holds
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    /// Read a run of digits and decimal points as one number.
    ///
    /// No exponent or locale separators: `1.2.3` and `.` are rejected.
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let literal = self.take_while(|c| c.is_ascii_digit() || c == '.');

        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::InvalidNumber {
                literal,
                position: start_pos,
            })
    }

    fn read_identifier(&mut self) -> Token {
        Token::Identifier(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'))
    }
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(formula).tokenize()
}
