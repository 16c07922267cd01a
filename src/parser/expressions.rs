//! Expression parsing implementation
//!
//! Operator precedence comes from the grammar's layering rather than a
//! precedence table. Each level loops, folding every new right operand into
//! a growing left-leaning [`Expression::Operation`], so all binary operators
//! associate to the left.
//!
//! # Grammar
//!
//! ```text
//! expression        ::= simple_expression [ relop simple_expression ]
//! simple_expression ::= [ "+" | "-" ] term { ( "+" | "-" | "or" ) term }
//! term              ::= factor { ( "*" | "/" | "div" | "mod" | "and" ) factor }
//! factor            ::= id | id "[" expression "]" | id [ "(" expression_list ")" ]
//!                     | num | "(" expression ")" | "not" factor
//! ```
//!
//! An identifier in a factor becomes a variable, an array element or a
//! function call according to its symbol.

use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use crate::symbols::SymbolKind;

impl Parser<'_> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_simple_expression()?;

        let op = match self.peek().kind {
            TokenKind::Equal => BinOp::Eq,
            TokenKind::NotEqual => BinOp::Ne,
            TokenKind::Less => BinOp::Lt,
            TokenKind::LessEqual => BinOp::Le,
            TokenKind::Greater => BinOp::Gt,
            TokenKind::GreaterEqual => BinOp::Ge,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_simple_expression()?;
        Ok(Expression::operation(op, left, right))
    }

    /// Parse addition-level operators (`+ - or`), with an optional leading sign.
    pub(crate) fn parse_simple_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = if self.match_token(TokenKind::Minus) {
            Expression::unary(UnOp::Neg, self.parse_term()?)
        } else {
            self.match_token(TokenKind::Plus);
            self.parse_term()?
        };

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Or => BinOp::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expression::operation(op, left, right);
        }

        Ok(left)
    }

    /// Parse multiplication-level operators (`* / div mod and`).
    pub(crate) fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Divide,
                TokenKind::Div => BinOp::Div,
                TokenKind::Mod => BinOp::Mod,
                TokenKind::And => BinOp::And,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expression::operation(op, left, right);
        }

        Ok(left)
    }

    /// Parse primary expressions
    pub(crate) fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        match self.peek().kind {
            TokenKind::Number => {
                let number = self.advance();
                self.literal(number)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_factor()?;
                Ok(Expression::unary(UnOp::Not, operand))
            }
            TokenKind::Identifier => {
                let name = self.advance();
                self.parse_identifier_factor(name)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_identifier_factor(&mut self, name: Token) -> Result<Expression, ParseError> {
        let ty = self.resolve(&name)?.value_type;

        if self.symbols.is_kind(&name.lexeme, SymbolKind::Variable) {
            if let Some(ty) = ty {
                return Ok(Expression::variable(name.lexeme, ty));
            }
        } else if self.symbols.is_kind(&name.lexeme, SymbolKind::Array) {
            if let Some(ty) = ty {
                let index = self.parse_index()?;
                return Ok(Expression::array(name.lexeme, ty, index));
            }
        } else if self.symbols.is_kind(&name.lexeme, SymbolKind::Function) {
            if let Some(ty) = ty {
                let args = self.parse_call_arguments(&name)?;
                return Ok(Expression::FunctionCall {
                    name: name.lexeme,
                    ty,
                    args,
                });
            }
        }

        Err(self.wrong_kind(&name, "variable, array or function"))
    }

    /// Parse an optional `( expression_list )` and check it against the
    /// callee's declared arity.
    pub(crate) fn parse_call_arguments(&mut self, name: &Token) -> Result<Vec<Expression>, ParseError> {
        let expected = self
            .resolve(name)?
            .arg_types()
            .map(<[ValueType]>::len)
            .unwrap_or(0);

        let mut args = Vec::new();
        if self.match_token(TokenKind::LParen) {
            args.push(self.parse_expression()?);
            while self.match_token(TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
            self.expect(TokenKind::RParen)?;
        }

        if args.len() != expected {
            return Err(ParseError::ArityMismatch {
                name: name.lexeme.clone(),
                expected,
                found: args.len(),
                location: name.location,
            });
        }
        Ok(args)
    }

    /// Build a literal, rejecting spellings that do not denote a number.
    fn literal(&self, number: Token) -> Result<Expression, ParseError> {
        let valid = match ValueType::of_literal(&number.lexeme) {
            ValueType::Integer => number.lexeme.parse::<i32>().is_ok(),
            ValueType::Real => number.lexeme.parse::<f32>().is_ok_and(f32::is_finite),
        };

        if valid {
            Ok(Expression::value(number.lexeme))
        } else {
            Err(ParseError::MalformedLiteral {
                literal: number.lexeme,
                location: number.location,
            })
        }
    }
}
