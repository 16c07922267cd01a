//! Statement parsing implementation
//!
//! This module handles parsing of all statement forms:
//!
//! - Assignments: `x := e`, `a[i] := e`, and `f := e` for a function result
//! - Procedure calls: `p`, `p(e1, e2)`
//! - Control flow: `if ... then ... else ...`, `while ... do ...`
//! - Compound statements: `begin ... end`
//! - I/O: `read(x)`, `write(e)`
//!
//! # Grammar
//!
//! ```text
//! compound_statement ::= "begin" [ statement { ";" statement } ] "end"
//! statement ::= variable ":=" expression | procedure_call | compound_statement
//!             | "if" expression "then" statement "else" statement
//!             | "while" expression "do" statement
//!             | "read" "(" variable ")" | "write" "(" expression ")"
//! variable  ::= id | id "[" expression "]"
//! ```
//!
//! A statement starting with an identifier is an assignment or a procedure
//! call depending on what the identifier is declared as.

use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use crate::symbols::SymbolKind;

impl Parser<'_> {
    /// Parse `begin [ statement { ; statement } ] end`.
    pub(crate) fn parse_compound_statement(&mut self) -> Result<CompoundStatement, ParseError> {
        self.expect(TokenKind::Begin)?;

        let mut statements = Vec::new();
        if !self.check(TokenKind::End) {
            statements.push(self.parse_statement()?);
            while self.match_token(TokenKind::Semicolon) {
                // An empty statement before `end` is allowed.
                if self.check(TokenKind::End) {
                    break;
                }
                statements.push(self.parse_statement()?);
            }
        }

        self.expect(TokenKind::End)?;
        Ok(CompoundStatement { statements })
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek().kind {
            TokenKind::Identifier => self.parse_identifier_statement(),
            TokenKind::Begin => Ok(Statement::Compound(self.parse_compound_statement()?)),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Read => self.parse_read_statement(),
            TokenKind::Write => self.parse_write_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Assignment or procedure call, decided by the identifier's symbol.
    fn parse_identifier_statement(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_identifier()?;

        if self.symbols.is_kind(&name.lexeme, SymbolKind::Procedure) {
            let args = self.parse_call_arguments(&name)?;
            return Ok(Statement::ProcedureCall {
                name: name.lexeme,
                args,
            });
        }

        let target = self.parse_variable(name)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(Statement::Assignment { target, value })
    }

    /// Parse the rest of an assignable `variable` whose name was just read.
    ///
    /// Inside a function's own body its name stands for the result slot.
    pub(crate) fn parse_variable(&mut self, name: Token) -> Result<Lvalue, ParseError> {
        let symbol = self.resolve(&name)?;
        let kind = symbol.kind();
        let ty = symbol.value_type;

        match (kind, ty) {
            (SymbolKind::Variable, Some(ty)) => Ok(Lvalue::Variable(Variable::new(name.lexeme, ty))),
            (SymbolKind::Array, Some(ty)) => {
                let index = self.parse_index()?;
                Ok(Lvalue::Array(ArrayElement {
                    name: name.lexeme,
                    ty,
                    index: Box::new(index),
                }))
            }
            (SymbolKind::Function, Some(ty)) if self.enclosing.contains(&name.lexeme) => {
                Ok(Lvalue::Variable(Variable::new(name.lexeme, ty)))
            }
            _ => Err(self.wrong_kind(&name, "variable")),
        }
    }

    /// Parse `[ expression ]`.
    pub(crate) fn parse_index(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_expression()?;
        self.expect(TokenKind::RBracket)?;
        Ok(index)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::If)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement()?);
        self.expect(TokenKind::Else)?;
        let else_branch = Box::new(self.parse_statement()?);

        Ok(Statement::If {
            test,
            then_branch,
            else_branch,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::While)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While { test, body })
    }

    fn parse_read_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Read)?;
        self.expect(TokenKind::LParen)?;
        let name = self.expect_identifier()?;
        let target = self.parse_variable(name)?;
        self.expect(TokenKind::RParen)?;

        Ok(Statement::Read { target })
    }

    fn parse_write_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Write)?;
        self.expect(TokenKind::LParen)?;
        let data = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        Ok(Statement::Write { data })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseError, Parser};
    use crate::symbols::{SymbolKind, SymbolTable};

    fn parse_body(declarations: &str, body: &str) -> Result<Vec<Statement>, ParseError> {
        let source = format!("program t; {} begin {} end .", declarations, body);
        let mut table = SymbolTable::new();
        let program = Parser::new(&source, &mut table)?.parse_program()?;
        Ok(program.body.statements)
    }

    #[test]
    fn test_assignment_to_variable() {
        let statements = parse_body("var x : integer;", "x := 3").unwrap();
        assert_eq!(
            statements,
            vec![Statement::Assignment {
                target: Lvalue::Variable(Variable::new("x", ValueType::Integer)),
                value: Expression::value("3"),
            }]
        );
    }

    #[test]
    fn test_assignment_to_array_element() {
        let statements = parse_body("var a : array [0 : 4] of real;", "a[2] := 1.5").unwrap();
        match &statements[0] {
            Statement::Assignment {
                target: Lvalue::Array(element),
                value,
            } => {
                assert_eq!(element.name, "a");
                assert_eq!(element.ty, ValueType::Real);
                assert_eq!(*element.index, Expression::value("2"));
                assert_eq!(value.value_type(), ValueType::Real);
            }
            other => panic!("Expected array assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_procedure_call_with_and_without_arguments() {
        let statements = parse_body(
            "var x : integer;
             procedure show(n : integer); begin write(n) end;
             procedure tick; begin end;",
            "show(x + 1); tick",
        )
        .unwrap();

        assert_eq!(
            statements[0],
            Statement::ProcedureCall {
                name: "show".to_string(),
                args: vec![Expression::operation(
                    BinOp::Add,
                    Expression::variable("x", ValueType::Integer),
                    Expression::value("1"),
                )],
            }
        );
        assert_eq!(
            statements[1],
            Statement::ProcedureCall {
                name: "tick".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_if_while_compound() {
        let statements = parse_body(
            "var i : integer;",
            "while i < 10 do begin if i = 5 then write(i) else i := i + 1; i := i + 1 end",
        )
        .unwrap();

        match &statements[0] {
            Statement::While { test, body } => {
                assert!(matches!(test, Expression::Operation { op: BinOp::Lt, .. }));
                match body.as_ref() {
                    Statement::Compound(compound) => {
                        assert_eq!(compound.statements.len(), 2);
                        assert!(matches!(compound.statements[0], Statement::If { .. }));
                    }
                    other => panic!("Expected compound body, got {:?}", other),
                }
            }
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_read_and_write() {
        let statements = parse_body("var a : array [1:3] of integer;", "read(a[1]); write(a[1] * 2)").unwrap();
        assert!(matches!(&statements[0], Statement::Read { target: Lvalue::Array(_) }));
        assert!(matches!(&statements[1], Statement::Write { data: Expression::Operation { .. } }));
    }

    #[test]
    fn test_trailing_semicolon_before_end() {
        let statements = parse_body("var x : integer;", "x := 1; x := 2;").unwrap();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_if_requires_else() {
        let err = parse_body("var x : integer;", "if x = 1 then x := 2").unwrap_err();
        match err {
            ParseError::Mismatch { expected, found, .. } => {
                assert_eq!(expected, "'else'");
                assert_eq!(found, "'end'");
            }
            other => panic!("Expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_to_undeclared_name() {
        let err = parse_body("", "ghost := 1").unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedName { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn test_assignment_to_procedure_is_a_call_error() {
        let err = parse_body("procedure p; begin end;", "p := 1").unwrap_err();
        assert!(matches!(err, ParseError::Mismatch { .. }));
    }

    #[test]
    fn test_function_result_only_inside_function() {
        let ok = parse_body("function f : integer; begin f := 1 end;", "").unwrap();
        assert!(ok.is_empty());

        let err = parse_body("var x : integer; function f : integer; begin f := 1 end;", "f := 2").unwrap_err();
        match err {
            ParseError::KindMismatch { name, found, .. } => {
                assert_eq!(name, "f");
                assert_eq!(found, SymbolKind::Function);
            }
            other => panic!("Expected kind mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_procedure_arity_checked() {
        let err = parse_body("procedure p(a, b : integer); begin end;", "p(1)").unwrap_err();
        assert!(matches!(err, ParseError::ArityMismatch { expected: 2, found: 1, .. }));
    }
}
