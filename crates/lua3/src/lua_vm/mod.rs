mod execute;
mod lua_error;
mod lua_limits;
mod opcode;

pub use lua_error::{LuaError, LuaResult};
pub use lua_limits::{
    LFIELDS_PER_FLUSH, LOOKBACK_NUMS, MAXCALLS, MAXLOCALS, MAXOPS, MAXSTACK, MAXUPVALUES,
    MAXVARSLH, MAX_WHILE_EXPR, MULT_RET, RFIELDS_PER_FLUSH,
};
pub use opcode::{Instruction, OpCode, OpMode};

use ahash::RandomState;
use std::collections::HashMap;
use std::rc::Rc;

use crate::compiler::Compiler;
use crate::lua_value::{Chunk, LuaClosure, LuaStr, LuaValue, StringInterner};

/// The runtime: interner, global table and the shared value stack that
/// compiled functions execute on. Strictly single-threaded; concurrent
/// work means independent VMs.
pub struct LuaVM {
    pub(crate) interner: StringInterner,
    pub(crate) globals: HashMap<LuaStr, LuaValue, RandomState>,
    pub(crate) stack: Vec<LuaValue>,
    pub(crate) call_depth: usize,
    debug_info: bool,
}

impl LuaVM {
    pub fn new() -> Self {
        LuaVM {
            interner: StringInterner::new(),
            globals: HashMap::with_hasher(RandomState::new()),
            stack: Vec::new(),
            call_depth: 0,
            debug_info: false,
        }
    }

    pub fn intern(&mut self, s: &str) -> LuaStr {
        self.interner.intern(s)
    }

    /// Whether compilations record local-variable debug info and line
    /// markers.
    pub fn set_debug_info(&mut self, on: bool) {
        self.debug_info = on;
    }

    pub fn debug_info(&self) -> bool {
        self.debug_info
    }

    /// The compiler announces every referenced global so the table
    /// carries an entry for it even before the first store.
    pub(crate) fn register_global(&mut self, name: &LuaStr) {
        self.globals.entry(name.clone()).or_insert(LuaValue::Nil);
    }

    pub fn get_global(&mut self, name: &str) -> LuaValue {
        let key = self.intern(name);
        self.globals.get(&key).cloned().unwrap_or(LuaValue::Nil)
    }

    pub fn set_global(&mut self, name: &str, value: LuaValue) {
        let key = self.intern(name);
        self.globals.insert(key, value);
    }

    pub fn open_libs(&mut self) {
        crate::stdlib::open_libs(self);
    }

    pub fn compile(&mut self, text: &str) -> LuaResult<Chunk> {
        Compiler::compile(self, text)
    }

    pub fn compile_with_name(&mut self, text: &str, chunk_name: &str) -> LuaResult<Chunk> {
        Compiler::compile_with_name(self, text, chunk_name)
    }

    /// Run a compiled main chunk; yields whatever its `return` produced
    pub fn execute(&mut self, chunk: Rc<Chunk>) -> LuaResult<Vec<LuaValue>> {
        let closure = Rc::new(LuaClosure {
            chunk,
            upvalues: Vec::new(),
        });
        self.stack.clear();
        self.call_depth = 0;
        let result = execute::run(self, &closure, 0);
        self.stack.clear();
        result
    }

    pub fn execute_string(&mut self, text: &str) -> LuaResult<Vec<LuaValue>> {
        let chunk = self.compile(text)?;
        self.execute(Rc::new(chunk))
    }

    pub fn execute_string_with_name(
        &mut self,
        text: &str,
        chunk_name: &str,
    ) -> LuaResult<Vec<LuaValue>> {
        let chunk = self.compile_with_name(text, chunk_name)?;
        self.execute(Rc::new(chunk))
    }
}

impl Default for LuaVM {
    fn default() -> Self {
        Self::new()
    }
}
