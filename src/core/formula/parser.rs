//! Formula parser
//!
//! Converts a sequence of tokens into an Abstract Syntax Tree (AST).
//! Recursive descent, lowest to highest binding:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := power (('*' | '/') power)*
//! power   := unary ('^' power)?          right-associative
//! unary   := ('+' | '-') unary | primary
//! primary := call | '(' expr ')' | NUMBER
//! call    := FUNCTION '(' expr (',' expr)* ')'
//! ```

use super::functions::FunctionKind;
use super::tokenizer::{Operator, Token};
use thiserror::Error;

/// Deepest nesting of parentheses, calls, operator chains and unary signs
/// accepted in one formula. Keeps parsing and evaluation off the stack limit.
pub const MAX_DEPTH: usize = 256;

/// Binary arithmetic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Abstract Syntax Tree node for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Number(f64),
    /// An identifier left over after substitution
    Variable(String),
    /// Built-in function call: NAME(arg1, arg2, ...)
    Call {
        function: FunctionKind,
        args: Vec<Expr>,
    },
    /// Binary operation: left op right
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary minus
    Negate(Box<Expr>),
}

/// Error during parsing; `position` is a token index
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Empty expression")]
    Empty,

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String, position: usize },

    #[error("Function '{name}' must be called with arguments")]
    FunctionWithoutCall { name: String, position: usize },

    #[error("Expected ')' at token {position}")]
    MissingCloseParen { position: usize },

    #[error("Unexpected token {found} at token {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Expression nested too deeply at token {position}")]
    TooDeep { position: usize },
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("'{n}'"),
        Token::Identifier(name) => format!("'{name}'"),
        Token::Operator(op) => format!("'{}'", op.symbol()),
        Token::OpenParen => "'('".to_string(),
        Token::CloseParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
    }
}

/// Parser for formula tokens
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse the tokens into an AST
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let expr = self.expression()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::UnexpectedToken {
                found: describe(token),
                position: self.position,
            });
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is one of `ops`
    fn match_any_operator(&mut self, ops: &[Operator]) -> Option<Operator> {
        match self.peek() {
            Some(Token::Operator(op)) if ops.contains(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect_close_paren(&mut self) -> Result<(), ParseError> {
        if self.match_token(&Token::CloseParen) {
            Ok(())
        } else {
            Err(ParseError::MissingCloseParen {
                position: self.position,
            })
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.position,
            });
        }
        Ok(())
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.enter()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Expression: term (( "+" | "-" ) term)*
    fn expression(&mut self) -> Result<Expr, ParseError> {
        // each link of a left-nested chain is one level of the tree
        let outer = self.depth;
        let mut left = self.term()?;

        while let Some(op) = self.match_any_operator(&[Operator::Plus, Operator::Minus]) {
            self.enter()?;
            let right = self.term()?;
            let op = if op == Operator::Plus {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = outer;
        Ok(left)
    }

    /// Term: power (( "*" | "/" ) power)*
    fn term(&mut self) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut left = self.power()?;

        while let Some(op) = self.match_any_operator(&[Operator::Star, Operator::Slash]) {
            self.enter()?;
            let right = self.power()?;
            let op = if op == Operator::Star {
                BinaryOp::Mul
            } else {
                BinaryOp::Div
            };
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = outer;
        Ok(left)
    }

    /// Power: unary ( "^" power )?
    fn power(&mut self) -> Result<Expr, ParseError> {
        let left = self.unary()?;

        if self.match_any_operator(&[Operator::Caret]).is_some() {
            let right = self.nested(Self::power)?;
            Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    /// Unary: ( "+" | "-" ) unary | primary
    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.match_any_operator(&[Operator::Plus, Operator::Minus]) {
            Some(Operator::Minus) => Ok(Expr::Negate(Box::new(self.nested(Self::unary)?))),
            Some(_) => self.nested(Self::unary),
            None => self.primary(),
        }
    }

    /// Primary: NUMBER | call | "(" expr ")"
    fn primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.position;

        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => self.identifier(name, start),
            Some(Token::OpenParen) => {
                let expr = self.nested(Self::expression)?;
                self.expect_close_paren()?;
                Ok(expr)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                found: describe(&token),
                position: start,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// An identifier is a call when followed by `(`, otherwise a variable
    fn identifier(&mut self, name: String, start: usize) -> Result<Expr, ParseError> {
        if !self.match_token(&Token::OpenParen) {
            if FunctionKind::lookup(&name).is_some() {
                return Err(ParseError::FunctionWithoutCall {
                    name,
                    position: start,
                });
            }
            return Ok(Expr::Variable(name));
        }

        let function = FunctionKind::lookup(&name).ok_or(ParseError::UnknownFunction {
            name,
            position: start,
        })?;
        let args = self.nested(Self::arguments)?;
        self.expect_close_paren()?;

        Ok(Expr::Call { function, args })
    }

    /// Arguments: expr ( "," expr )*
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![self.expression()?];

        while self.match_token(&Token::Comma) {
            args.push(self.expression()?);
        }

        Ok(args)
    }
}

/// Convenience function to parse tokens into an AST
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}
