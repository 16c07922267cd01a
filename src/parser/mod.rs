//! Mini-Pascal front end
//!
//! This module transforms source text into a typed syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → syntax tree), with its grammar split over
//!   `declarations`, `statements` and `expressions`
//! - [`ast`]: Syntax tree definitions
//! - [`display`]: Indented tree dump
//!
//! # Supported Language
//!
//! - Types: `integer`, `real`, one-dimensional `array [lo : hi] of` either
//! - Nested functions and procedures with by-value scalar parameters
//! - Statements: assignment, procedure call, `begin`/`end`, `if`/`then`/`else`,
//!   `while`/`do`, `read`, `write`
//! - Expressions: `+ - * / div mod and or not`, comparisons, calls, indexing
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one token of lookahead. The
//! parser consults a [`SymbolTable`](crate::symbols::SymbolTable) to decide
//! what an identifier means. No external parser generator dependencies.

pub mod ast;
pub mod declarations;
pub mod display;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;

pub use parse::{ParseError, Parser};
