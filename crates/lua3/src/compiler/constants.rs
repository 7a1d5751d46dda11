// Constant pool management for the prototype under construction.
use crate::compiler::Compiler;
use crate::compiler::parser::CompileError;
use crate::lua_value::LuaStr;
use crate::lua_vm::{Instruction, LOOKBACK_NUMS};

/// Index of `s` in the string pool of the function at `level`,
/// appending on first use. The interned string caches its last pool
/// index; the cache is trusted only after checking it names this very
/// pool entry.
pub(crate) fn string_constant(
    c: &mut Compiler,
    level: usize,
    s: &str,
) -> Result<u32, CompileError> {
    let line = c.lex.line;
    let Compiler { vm, funcs, .. } = c;
    let interned = vm.intern(s);
    let proto = &mut funcs[level].chunk;

    let hint = interned.const_hint();
    if let Some(entry) = proto.strings.get(hint as usize) {
        if LuaStr::ptr_eq(entry, &interned) {
            return Ok(hint);
        }
    }

    if proto.strings.len() >= Instruction::MAXARG_U as usize {
        return Err(CompileError::new("too many string constants", line));
    }
    proto.strings.push(interned.clone());
    let index = (proto.strings.len() - 1) as u32;
    interned.set_const_hint(index);
    Ok(index)
}

/// Index of `n` in the current number pool. Only the most recent
/// entries are scanned; a duplicate past the window is tolerated.
pub(crate) fn number_constant(c: &mut Compiler, n: f64) -> Result<u32, CompileError> {
    let line = c.lex.line;
    let numbers = &mut c.fs().chunk.numbers;

    let start = numbers.len().saturating_sub(LOOKBACK_NUMS);
    for i in (start..numbers.len()).rev() {
        if numbers[i] == n {
            return Ok(i as u32);
        }
    }

    if numbers.len() >= Instruction::MAXARG_U as usize {
        return Err(CompileError::new("too many number constants", line));
    }
    numbers.push(n);
    Ok((numbers.len() - 1) as u32)
}
