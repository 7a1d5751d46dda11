use smol_str::SmolStr;

use crate::compiler::expdesc::UpvalDesc;
use crate::lua_value::{Chunk, LuaStr};

/// Per-function compilation state. The compiler keeps these on an
/// explicit stack; the previous element is the enclosing function and
/// the bottom element is the main chunk.
pub struct FuncState {
    /// Prototype under construction
    pub chunk: Chunk,
    /// Declared local names; `nlocals` of them are active, the rest are
    /// reserved by a declaration whose initialiser is still parsing
    pub locals: Vec<SmolStr>,
    pub nlocals: usize,
    /// Captured upvalues, appended uniquely on first reference
    pub upvalues: Vec<UpvalDesc>,
    /// Symbolic operand-stack depth; equals `nlocals` at every
    /// statement boundary
    pub stack_depth: usize,
    /// Nesting depth of blocks inside this function
    pub block_depth: usize,
    /// Last line a SETLINE was emitted for
    pub last_line: usize,
}

impl FuncState {
    pub fn new(source_name: Option<LuaStr>, debug_info: bool) -> Self {
        FuncState {
            chunk: Chunk::new(source_name, debug_info),
            locals: Vec::new(),
            nlocals: 0,
            upvalues: Vec::new(),
            stack_depth: 0,
            block_depth: 0,
            last_line: 0,
        }
    }

    /// Next instruction position
    pub fn pc(&self) -> usize {
        self.chunk.code.len()
    }

    /// Innermost declaration wins, so the scan runs backwards over the
    /// active slots.
    pub fn search_local(&self, name: &str) -> Option<u32> {
        self.locals[..self.nlocals]
            .iter()
            .rposition(|local| local.as_str() == name)
            .map(|slot| slot as u32)
    }
}
