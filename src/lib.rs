//! # Introduction
//!
//! mipascal compiles a small Pascal dialect to MIPS32 assembly that runs in
//! the SPIM or MARS simulators.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser + SymbolTable → Program → Folding → Generator → Assembly
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds a typed syntax tree,
//!    resolving every identifier against the [`symbols::SymbolTable`].
//! 2. [`symbols`]: the scoped symbol table shared by the parser and the
//!    generator.
//! 3. [`optimizer`]: replaces operations on literals by their value.
//! 4. [`codegen`]: lowers the tree to assembly using a register pool and one
//!    stack frame per subprogram.
//!
//! ## Supported language
//!
//! Types: `integer`, `real`, one-dimensional arrays of either.
//! Nested functions and procedures with by-value scalar parameters.
//! Statements: assignment, procedure call, `begin`/`end`, `if`/`then`/`else`,
//! `while`/`do`, `read`, `write`.

pub mod codegen;
pub mod optimizer;
pub mod parser;
pub mod symbols;

use log::info;

use parser::ast::Program;
use parser::{ParseError, Parser};
use symbols::SymbolTable;

/// Options controlling [`compile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fold operations on literals before generating code
    pub fold: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { fold: true }
    }
}

/// Parse `source` into a syntax tree and the symbol table built for it.
pub fn parse(source: &str) -> Result<(Program, SymbolTable), ParseError> {
    let mut symbols = SymbolTable::new();
    let program = Parser::new(source, &mut symbols)?.parse_program()?;
    info!("parsed program '{}'", program.name);
    Ok((program, symbols))
}

/// Compile `source` to MIPS assembly.
///
/// Only lexical and syntax errors fail. Constructs the generator cannot lower
/// are marked with `# ERROR:` lines in the returned text.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String, ParseError> {
    let (mut program, mut symbols) = parse(source)?;

    if options.fold {
        program = optimizer::fold(program);
        info!("folded constant expressions");
    }

    let assembly = codegen::generate(&program, &mut symbols);
    info!("generated {} line(s) of assembly", assembly.lines().count());
    Ok(assembly)
}
