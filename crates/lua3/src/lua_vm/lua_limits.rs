//! Compile-time and runtime limits.

use crate::lua_vm::Instruction;

/// Hard cap on the symbolic operand stack of one function
pub const MAXSTACK: usize = 255;

/// Active local variables per function
pub const MAXLOCALS: usize = 32;

/// Upvalues captured by one function
pub const MAXUPVALUES: usize = 16;

/// Targets of one multiple assignment
pub const MAXVARSLH: usize = 16;

/// Pending operators in one arithmetic expression
pub const MAXOPS: usize = 20;

/// Values flushed per SETLIST in a table constructor
pub const LFIELDS_PER_FLUSH: usize = 64;

/// Key/value pairs flushed per SETMAP in a table constructor
pub const RFIELDS_PER_FLUSH: usize = 32;

/// Instructions a `while` condition may occupy
pub const MAX_WHILE_EXPR: usize = 200;

/// How far back the number constant pool is scanned for reuse
pub const LOOKBACK_NUMS: usize = 20;

/// Nested call frames the executor allows
pub const MAXCALLS: usize = 200;

/// Result-count sentinel meaning "keep every result"
pub const MULT_RET: u32 = Instruction::MAXARG_B;
