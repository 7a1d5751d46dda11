// Classic Lua 3.x runtime
// A compact single-pass bytecode compiler and stack VM

#[cfg(test)]
mod test;

pub mod compiler;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use compiler::Compiler;
pub use lua_value::{Chunk, LuaClosure, LuaStr, LuaTable, LuaValue};
pub use lua_vm::{Instruction, LuaError, LuaResult, LuaVM, OpCode};

use std::rc::Rc;

/// Compile and run a chunk on a fresh VM with the basic library open
pub fn execute(source: &str) -> LuaResult<Vec<LuaValue>> {
    let mut vm = LuaVM::new();
    vm.open_libs();
    let chunk = vm.compile(source)?;
    vm.execute(Rc::new(chunk))
}

/// Compile and run a chunk on a caller-provided VM
pub fn execute_with_vm(vm: &mut LuaVM, source: &str) -> LuaResult<Vec<LuaValue>> {
    let chunk = vm.compile(source)?;
    vm.execute(Rc::new(chunk))
}
