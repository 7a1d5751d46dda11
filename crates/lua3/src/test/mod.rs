pub mod test_exec;
pub mod test_operators;
pub mod test_properties;
pub mod test_syntax;
pub mod test_table;

use crate::{Chunk, Instruction, LuaVM, LuaValue, OpCode};

pub(crate) fn run_chunk(src: &str) -> Vec<LuaValue> {
    let mut vm = LuaVM::new();
    vm.open_libs();
    match vm.execute_string(src) {
        Ok(values) => values,
        Err(err) => panic!("execution failed: {}", err),
    }
}

pub(crate) fn run_one(src: &str) -> LuaValue {
    run_chunk(src).into_iter().next().unwrap_or(LuaValue::Nil)
}

pub(crate) fn run_number(src: &str) -> f64 {
    match run_one(src) {
        LuaValue::Number(n) => n,
        other => panic!("expected a number result, got {:?}", other),
    }
}

pub(crate) fn run_string(src: &str) -> String {
    match run_one(src) {
        LuaValue::Str(s) => s.as_str().to_string(),
        other => panic!("expected a string result, got {:?}", other),
    }
}

pub(crate) fn compile_chunk(src: &str) -> Chunk {
    let mut vm = LuaVM::new();
    match vm.compile(src) {
        Ok(chunk) => chunk,
        Err(err) => panic!("compilation failed: {}", err),
    }
}

pub(crate) fn compile_error(src: &str) -> String {
    let mut vm = LuaVM::new();
    match vm.compile(src) {
        Ok(_) => panic!("expected a compile error for: {}", src),
        Err(err) => err.to_string(),
    }
}

pub(crate) fn opcodes(chunk: &Chunk) -> Vec<OpCode> {
    chunk
        .code
        .iter()
        .map(|&inst| Instruction::get_opcode(inst).expect("valid opcode"))
        .collect()
}

pub(crate) fn find_op(chunk: &Chunk, op: OpCode) -> Option<u32> {
    chunk.code.iter().find_map(|&inst| {
        if Instruction::get_opcode(inst) == Some(op) {
            Some(inst)
        } else {
            None
        }
    })
}
