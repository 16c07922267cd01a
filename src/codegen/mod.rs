//! MIPS32 code generation
//!
//! This module lowers a parsed [`Program`] to SPIM/MARS assembly text:
//! - [`engine`]: the [`Generator`] with program, data and frame layout
//! - [`statements`]: statement lowering, including `if`/`while` labels
//! - [`expressions`]: expression lowering through the register pool
//! - [`storage`]: addresses assigned to symbols while generating
//! - [`constants`]: registers, sizes and syscall codes
//!
//! # Register Discipline
//!
//! Expression results live in `$s0..$s7`, picked by a register cursor. An
//! expression evaluated at cursor `r` leaves its value in register `r` and
//! may use every register above it. Evaluation restores the cursor, so
//! generating a whole statement leaves it where it started.
//!
//! # Frames
//!
//! Every subprogram saves the full register pool and `$ra`, then reserves one
//! word per parameter, local scalar and array element, plus one word for a
//! function's result. All of them are addressed relative to `$sp`.
//!
//! # Diagnostics
//!
//! Code generation does not fail. A construct it cannot lower produces a
//! `# ERROR:` comment line at that point in the output and is recorded in
//! [`Generator::diagnostics`].

pub mod constants;
pub mod engine;
pub mod expressions;
pub mod statements;
pub mod storage;

pub use engine::Generator;
pub use storage::{Storage, StorageMap};

use crate::parser::ast::Program;
use crate::symbols::SymbolTable;

/// Generate assembly for `program` whose names were resolved into `symbols`.
pub fn generate(program: &Program, symbols: &mut SymbolTable) -> String {
    let mut generator = Generator::new(symbols);
    generator.generate_program(program);
    generator.finish()
}
