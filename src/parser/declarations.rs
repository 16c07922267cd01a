//! Declaration parsing implementation
//!
//! This module handles the declaring parts of a program:
//!
//! - Variable sections: `var a, b : integer;`
//! - Types: `integer`, `real`, `array [lo : hi] of standard_type`
//! - Functions and procedures, including their parameters and nested
//!   declarations
//!
//! # Grammar
//!
//! ```text
//! declarations     ::= "var" id_list ":" type ";" { id_list ":" type ";" } declarations | λ
//! type             ::= standard_type | "array" "[" num ":" num "]" "of" standard_type
//! subprogram_decls ::= subprogram_decl ";" subprogram_decls | λ
//! subprogram_decl  ::= head declarations subprogram_decls compound_statement
//! head             ::= "function" id arguments ":" standard_type ";"
//!                    | "procedure" id arguments ";"
//! arguments        ::= "(" id_list ":" standard_type { ";" id_list ":" standard_type } ")" | λ
//! ```
//!
//! A subprogram's own symbol goes into the enclosing scope before its body
//! is parsed, so recursive calls resolve. Its parameters and locals live in a
//! fresh scope that is attached to the symbol once the body is finished.

use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use crate::symbols::{ArrayBounds, Symbol};
use log::debug;

/// Type written in a declaration
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DeclaredType {
    Scalar(ValueType),
    Array(ValueType, ArrayBounds),
}

impl Parser<'_> {
    /// Parse any number of `var` sections.
    pub(crate) fn parse_declarations(&mut self) -> Result<Declarations, ParseError> {
        let mut declarations = Declarations::default();

        while self.match_token(TokenKind::Var) {
            loop {
                let names = self.parse_identifier_list()?;
                self.expect(TokenKind::Colon)?;
                let declared = self.parse_type()?;
                self.expect(TokenKind::Semicolon)?;

                for name in names {
                    let (symbol, ty) = match declared {
                        DeclaredType::Scalar(ty) => (Symbol::variable(name.lexeme.clone(), ty), ty),
                        DeclaredType::Array(ty, bounds) => {
                            (Symbol::array(name.lexeme.clone(), ty, bounds), ty)
                        }
                    };
                    self.declare(symbol, &name)?;
                    declarations.variables.push(Variable::new(name.lexeme, ty));
                }

                // Further groups may follow without repeating `var`.
                if !self.check(TokenKind::Identifier) {
                    break;
                }
            }
        }

        Ok(declarations)
    }

    /// Parse `id { , id }`.
    pub(crate) fn parse_identifier_list(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    pub(crate) fn parse_type(&mut self) -> Result<DeclaredType, ParseError> {
        if !self.match_token(TokenKind::Array) {
            return Ok(DeclaredType::Scalar(self.parse_standard_type()?));
        }

        let location = self.current_location();
        self.expect(TokenKind::LBracket)?;
        let lo = self.parse_bound()?;
        self.expect(TokenKind::Colon)?;
        let hi = self.parse_bound()?;
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::Of)?;
        let element = self.parse_standard_type()?;

        if lo > hi {
            return Err(ParseError::InvalidBounds { lo, hi, location });
        }
        Ok(DeclaredType::Array(element, ArrayBounds::new(lo, hi)))
    }

    /// Parse an optionally negated integer array bound.
    fn parse_bound(&mut self) -> Result<i32, ParseError> {
        let negative = self.match_token(TokenKind::Minus);
        let number = self.expect(TokenKind::Number)?;
        let text = if negative {
            format!("-{}", number.lexeme)
        } else {
            number.lexeme.clone()
        };
        text.parse::<i32>().map_err(|_| ParseError::MalformedLiteral {
            literal: text,
            location: number.location,
        })
    }

    pub(crate) fn parse_standard_type(&mut self) -> Result<ValueType, ParseError> {
        if self.match_token(TokenKind::Integer) {
            Ok(ValueType::Integer)
        } else if self.match_token(TokenKind::Real) {
            Ok(ValueType::Real)
        } else {
            Err(self.unexpected("'integer' or 'real'"))
        }
    }

    /// Parse `{ subprogram_declaration ; }`.
    pub(crate) fn parse_subprogram_declarations(&mut self) -> Result<Vec<SubProgram>, ParseError> {
        let mut subprograms = Vec::new();

        while self.check(TokenKind::Function) || self.check(TokenKind::Procedure) {
            subprograms.push(self.parse_subprogram_declaration()?);
            self.expect(TokenKind::Semicolon)?;
        }

        Ok(subprograms)
    }

    pub(crate) fn parse_subprogram_declaration(&mut self) -> Result<SubProgram, ParseError> {
        let kind = if self.match_token(TokenKind::Function) {
            SubProgramKind::Function
        } else {
            self.expect(TokenKind::Procedure)?;
            SubProgramKind::Procedure
        };

        let name = self.expect_identifier()?;
        let params = self.parse_arguments()?;
        let arg_types: Vec<ValueType> = params.iter().map(|(_, ty)| *ty).collect();

        let return_type = match kind {
            SubProgramKind::Function => {
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_standard_type()?;
                self.declare(Symbol::function(name.lexeme.clone(), ty, arg_types), &name)?;
                Some(ty)
            }
            SubProgramKind::Procedure => {
                self.declare(Symbol::procedure(name.lexeme.clone(), arg_types), &name)?;
                None
            }
        };
        self.expect(TokenKind::Semicolon)?;
        debug!("parsing body of {:?} '{}'", kind, name.lexeme);

        self.symbols.enter_scope();
        self.enclosing.push(name.lexeme.clone());

        let mut args = Vec::with_capacity(params.len());
        for (param, ty) in params {
            self.declare(Symbol::variable(param.lexeme.clone(), ty), &param)?;
            args.push(Variable::new(param.lexeme, ty));
        }

        let declarations = self.parse_declarations()?;
        let subprograms = self.parse_subprogram_declarations()?;
        let body = self.parse_compound_statement()?;

        self.enclosing.pop();
        if let Some(scope) = self.symbols.exit_scope() {
            self.symbols.attach_local_scope(&name.lexeme, scope);
        }

        Ok(SubProgram {
            kind,
            name: name.lexeme,
            return_type,
            args,
            declarations,
            subprograms,
            body,
            location: name.location,
        })
    }

    /// Parse an optional parenthesised parameter list.
    fn parse_arguments(&mut self) -> Result<Vec<(Token, ValueType)>, ParseError> {
        let mut params = Vec::new();
        if !self.match_token(TokenKind::LParen) {
            return Ok(params);
        }

        loop {
            let names = self.parse_identifier_list()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_standard_type()?;
            params.extend(names.into_iter().map(|name| (name, ty)));

            if !self.match_token(TokenKind::Semicolon) {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseError, Parser};
    use crate::symbols::{ArrayBounds, SymbolKind, SymbolTable};

    fn parse(source: &str) -> Result<(Program, SymbolTable), ParseError> {
        let mut table = SymbolTable::new();
        let program = Parser::new(source, &mut table)?.parse_program()?;
        Ok((program, table))
    }

    #[test]
    fn test_variable_declarations_in_source_order() {
        let (program, table) = parse(
            "program p;
             var a, b : integer;
                 c : real;
             var d : array [1 : 10] of real;
             begin end .",
        )
        .unwrap();

        let names: Vec<&str> = program
            .declarations
            .variables
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(program.declarations.variables[2].ty, ValueType::Real);

        let d = table.lookup("d").unwrap();
        assert_eq!(d.kind(), SymbolKind::Array);
        assert_eq!(d.value_type, Some(ValueType::Real));
        assert_eq!(d.array_bounds(), Some(ArrayBounds::new(1, 10)));
    }

    #[test]
    fn test_negative_array_bounds() {
        let (_, table) = parse("program p; var a : array [-2 : 2] of integer; begin end .").unwrap();
        assert_eq!(table.lookup("a").unwrap().array_bounds().unwrap().len(), 5);
    }

    #[test]
    fn test_empty_array_bounds_rejected() {
        let err = parse("program p; var a : array [5 : 1] of integer; begin end .").unwrap_err();
        assert!(matches!(err, ParseError::InvalidBounds { lo: 5, hi: 1, .. }));
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let err = parse("program p; var a : integer; var a : real; begin end .").unwrap_err();
        match err {
            ParseError::Redeclaration { name, location } => {
                assert_eq!(name, "a");
                assert_eq!(location.line, 1);
            }
            other => panic!("Expected redeclaration, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_named_like_program_rejected() {
        let err = parse("program p; var p : integer; begin end .").unwrap_err();
        assert!(matches!(err, ParseError::Redeclaration { .. }));
    }

    #[test]
    fn test_function_scope_is_attached() {
        let (program, mut table) = parse(
            "program p;
             var x : integer;
             function f(a, b : integer; c : real) : real;
             var x : real;
             begin f := a + c end;
             begin x := 1 end .",
        )
        .unwrap();

        let f = &program.subprograms[0];
        assert_eq!(f.kind, SubProgramKind::Function);
        assert_eq!(f.return_type, Some(ValueType::Real));
        assert_eq!(f.args.len(), 3);
        assert_eq!(f.declarations.variables, vec![Variable::new("x", ValueType::Real)]);

        // Only the global x is visible after parsing.
        assert_eq!(table.lookup("x").unwrap().value_type, Some(ValueType::Integer));
        assert_eq!(
            table.lookup("f").unwrap().arg_types(),
            Some(&[ValueType::Integer, ValueType::Integer, ValueType::Real][..])
        );

        let scope = table.detach_local_scope("f").unwrap();
        assert_eq!(scope.len(), 4);
        assert!(scope.contains("a") && scope.contains("c"));
        assert_eq!(scope.get("x").unwrap().value_type, Some(ValueType::Real));
    }

    #[test]
    fn test_nested_subprograms() {
        let (program, mut table) = parse(
            "program p;
             procedure outer;
               var n : integer;
               procedure inner(k : integer);
               begin end;
             begin inner(n) end;
             begin outer end .",
        )
        .unwrap();

        let outer = &program.subprograms[0];
        assert_eq!(outer.subprograms.len(), 1);
        assert_eq!(outer.subprograms[0].name, "inner");

        assert!(table.lookup("inner").is_none());
        let scope = table.detach_local_scope("outer").unwrap();
        assert_eq!(scope.get("inner").unwrap().kind(), SymbolKind::Procedure);
        assert!(scope.get("inner").unwrap().local_scope.is_some());
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = parse("program p; procedure q(a : integer; a : real); begin end; begin end .").unwrap_err();
        assert!(matches!(err, ParseError::Redeclaration { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_array_parameter_rejected() {
        let err = parse("program p; procedure q(a : array [1:2] of integer); begin end; begin end .")
            .unwrap_err();
        assert!(matches!(err, ParseError::Mismatch { .. }));
    }
}
