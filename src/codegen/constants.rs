// Constants for the MIPS32 code generator

/// General-purpose registers indexed by the register cursor.
///
/// These are also the callee-saved bank: every subprogram prologue stores
/// all of them, so values live in the caller survive a call.
pub const REGISTER_POOL: [&str; 8] = ["$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7"];

/// Registers carrying the first arguments of a call
pub const ARGUMENT_REGISTERS: [&str; 4] = ["$a0", "$a1", "$a2", "$a3"];

/// Function results and syscall codes
pub const RESULT_REGISTER: &str = "$v0";

/// Scratch registers, never live across an instruction sequence
pub const SCRATCH_REGISTER: &str = "$t8";
pub const ADDRESS_REGISTER: &str = "$t9";

pub const RETURN_ADDRESS: &str = "$ra";
pub const STACK_POINTER: &str = "$sp";

/// Coprocessor 1 registers used to evaluate real arithmetic
pub const FLOAT_LEFT: &str = "$f0";
pub const FLOAT_RIGHT: &str = "$f1";
pub const FLOAT_ARGUMENT: &str = "$f12";

/// Bytes per word; every scalar and array element takes one word
pub const WORD_SIZE: i32 = 4;

/// Bytes a subprogram prologue reserves for the register pool plus `$ra`
pub const SAVE_AREA_SIZE: i32 = (REGISTER_POOL.len() as i32 + 1) * WORD_SIZE;

// SPIM/MARS syscall codes
pub const SYSCALL_PRINT_INT: i32 = 1;
pub const SYSCALL_PRINT_FLOAT: i32 = 2;
pub const SYSCALL_READ_INT: i32 = 5;
pub const SYSCALL_READ_FLOAT: i32 = 6;
pub const SYSCALL_EXIT: i32 = 10;
pub const SYSCALL_PRINT_CHAR: i32 = 11;
