//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, token helpers, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a one-token-lookahead recursive descent parser; each
//! grammar nonterminal has its own method:
//! - This module: Parser struct, helper methods, and `parse_program`
//! - `declarations`: `var` sections, types, functions and procedures
//! - `statements`: statements and compound statements
//! - `expressions`: expressions, terms and factors
//!
//! # Symbol Table Feedback
//!
//! The grammar cannot tell `a[i]`, `a(i)` and `a` apart without knowing what
//! `a` is, so the Parser borrows a [`SymbolTable`], declares names as it meets
//! them and resolves identifiers against it while parsing.
//!
//! Every error is fatal: the first one aborts the parse and no partial tree
//! is returned.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Token, TokenKind, TokenStream};
use crate::symbols::{Symbol, SymbolKind, SymbolTable};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Parse error at line {}, column {}: expected {expected}, found {found}", .location.line, .location.column)]
    Mismatch {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: '{name}' is already declared in this scope", .location.line, .location.column)]
    Redeclaration {
        name: String,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: '{name}' is not declared", .location.line, .location.column)]
    UnresolvedName {
        name: String,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: '{name}' is a {found}, expected {expected}", .location.line, .location.column)]
    KindMismatch {
        name: String,
        expected: String,
        found: SymbolKind,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: '{name}' takes {expected} argument(s), {found} given", .location.line, .location.column)]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: malformed number '{literal}'", .location.line, .location.column)]
    MalformedLiteral {
        literal: String,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: array bounds [{lo}:{hi}] are empty", .location.line, .location.column)]
    InvalidBounds {
        lo: i32,
        hi: i32,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Lex(err) => err.location,
            ParseError::Mismatch { location, .. }
            | ParseError::Redeclaration { location, .. }
            | ParseError::UnresolvedName { location, .. }
            | ParseError::KindMismatch { location, .. }
            | ParseError::ArityMismatch { location, .. }
            | ParseError::MalformedLiteral { location, .. }
            | ParseError::InvalidBounds { location, .. } => *location,
        }
    }
}

/// Recursive descent parser for mini-Pascal
pub struct Parser<'t> {
    pub(crate) tokens: TokenStream,
    pub(crate) symbols: &'t mut SymbolTable,
    /// Names of the subprograms whose bodies are being parsed, outermost first
    pub(crate) enclosing: Vec<String>,
}

impl<'t> Parser<'t> {
    /// Scan `source` and prepare to parse it into `symbols`.
    pub fn new(source: &str, symbols: &'t mut SymbolTable) -> Result<Self, ParseError> {
        let tokens = TokenStream::from_source(source)?;
        Ok(Self::with_tokens(tokens, symbols))
    }

    pub fn with_tokens(tokens: TokenStream, symbols: &'t mut SymbolTable) -> Self {
        Parser {
            tokens,
            symbols,
            enclosing: Vec::new(),
        }
    }

    /// Parse the entire program:
    /// `program id ; declarations subprogram_declarations compound_statement .`
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.expect(TokenKind::Program)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Semicolon)?;

        self.declare(Symbol::program(name.lexeme.clone()), &name)?;
        let mut program = Program::new(name.lexeme, name.location);

        program.declarations = self.parse_declarations()?;
        program.subprograms = self.parse_subprogram_declarations()?;
        program.body = self.parse_compound_statement()?;
        self.expect(TokenKind::Period)?;
        self.expect(TokenKind::Eof)?;

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn peek(&self) -> &Token {
        self.tokens.current()
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.tokens.advance()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Consume a token of `kind` or fail with the expected and actual kinds.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Token, ParseError> {
        self.expect(TokenKind::Identifier)
    }

    /// Mismatch error against the current token.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Mismatch {
            expected: expected.to_string(),
            found: self.peek().to_string(),
            location: self.current_location(),
        }
    }

    /// Declare `symbol` in the innermost scope, failing on a duplicate.
    pub(crate) fn declare(&mut self, symbol: Symbol, at: &Token) -> Result<(), ParseError> {
        if self.symbols.declare(symbol) {
            Ok(())
        } else {
            Err(ParseError::Redeclaration {
                name: at.lexeme.clone(),
                location: at.location,
            })
        }
    }

    /// Resolve an identifier token that must already be declared.
    pub(crate) fn resolve(&self, name: &Token) -> Result<&Symbol, ParseError> {
        self.symbols
            .lookup(&name.lexeme)
            .ok_or_else(|| ParseError::UnresolvedName {
                name: name.lexeme.clone(),
                location: name.location,
            })
    }

    /// Error for a name that resolved to a symbol of the wrong kind.
    pub(crate) fn wrong_kind(&self, name: &Token, expected: &str) -> ParseError {
        match self.resolve(name) {
            Ok(symbol) => ParseError::KindMismatch {
                name: name.lexeme.clone(),
                expected: expected.to_string(),
                found: symbol.kind(),
                location: name.location,
            },
            Err(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<(Program, SymbolTable), ParseError> {
        let mut table = SymbolTable::new();
        let program = Parser::new(source, &mut table)?.parse_program()?;
        Ok((program, table))
    }

    #[test]
    fn test_parse_empty_program() {
        let (program, table) = parse("program foo; begin end .").unwrap();

        assert_eq!(program.name, "foo");
        assert!(program.declarations.is_empty());
        assert!(program.subprograms.is_empty());
        assert!(program.body.statements.is_empty());
        assert!(table.is_kind("foo", SymbolKind::Program));
    }

    #[test]
    fn test_missing_semicolon_reports_expected_and_found() {
        let err = parse("program foo begin end .").unwrap_err();
        match err {
            ParseError::Mismatch {
                expected,
                found,
                location,
            } => {
                assert_eq!(expected, "';'");
                assert_eq!(found, "'begin'");
                assert_eq!(location, SourceLocation::new(1, 13));
            }
            other => panic!("Expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse("program foo; begin end . begin").unwrap_err();
        assert!(err.to_string().contains("expected end of input"));
    }

    #[test]
    fn test_lex_error_is_fatal() {
        let err = parse("program foo; begin x := 1 ? end .").unwrap_err();
        assert!(matches!(err, ParseError::Lex(_)));
        assert_eq!(err.location().line, 1);
    }

    #[test]
    fn test_error_display_has_line() {
        let err = parse("program foo;\nbegin\n  y := 1\nend .").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 3: 'y' is not declared"
        );
    }
}
