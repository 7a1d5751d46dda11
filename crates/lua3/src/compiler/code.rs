// Instruction constructors. Every emit goes through here so the
// symbolic stack depth and the prototype's max stack stay in step with
// the code vector.
use crate::compiler::Compiler;
use crate::compiler::parser::CompileError;
use crate::lua_vm::{Instruction, MULT_RET, MAXSTACK, OpCode};

/// Apply an instruction's net stack effect; raises the prototype's high
/// water mark and enforces MAXSTACK.
pub(crate) fn stack_delta(c: &mut Compiler, delta: isize) -> Result<(), CompileError> {
    let line = c.lex.line;
    let fs = c.fs();
    if delta >= 0 {
        fs.stack_depth += delta as usize;
        if fs.stack_depth > fs.chunk.max_stack as usize {
            if fs.stack_depth > MAXSTACK {
                return Err(CompileError::new(
                    "too many temporaries or local variables",
                    line,
                ));
            }
            fs.chunk.max_stack = fs.stack_depth as u32;
        }
    } else {
        debug_assert!(fs.stack_depth >= delta.unsigned_abs());
        fs.stack_depth -= delta.unsigned_abs();
    }
    Ok(())
}

fn emit(c: &mut Compiler, inst: u32, delta: isize) -> Result<usize, CompileError> {
    let fs = c.fs();
    let pc = fs.pc();
    fs.chunk.code.push(inst);
    stack_delta(c, delta)?;
    Ok(pc)
}

pub(crate) fn code_o(c: &mut Compiler, op: OpCode, delta: isize) -> Result<usize, CompileError> {
    emit(c, Instruction::encode_o(op), delta)
}

pub(crate) fn code_u(
    c: &mut Compiler,
    op: OpCode,
    u: u32,
    delta: isize,
) -> Result<usize, CompileError> {
    debug_assert!(u <= Instruction::MAXARG_U);
    emit(c, Instruction::encode_u(op, u), delta)
}

pub(crate) fn code_s(
    c: &mut Compiler,
    op: OpCode,
    s: i32,
    delta: isize,
) -> Result<usize, CompileError> {
    if s.unsigned_abs() > Instruction::MAXARG_S as u32 {
        return c.error_plain("control structure too long");
    }
    emit(c, Instruction::encode_s(op, s), delta)
}

pub(crate) fn code_ab(
    c: &mut Compiler,
    op: OpCode,
    a: u32,
    b: u32,
    delta: isize,
) -> Result<usize, CompileError> {
    debug_assert!(a <= Instruction::MAXARG_A && b <= Instruction::MAXARG_B);
    emit(c, Instruction::encode_ab(op, a, b), delta)
}

/// Point the jump at `pc` to `target`. Offsets are relative to the
/// instruction after the jump.
pub(crate) fn fix_jump(c: &mut Compiler, pc: usize, target: usize) -> Result<(), CompileError> {
    let offset = target as i64 - (pc as i64 + 1);
    if offset.unsigned_abs() > Instruction::MAXARG_S as u64 {
        return c.error_plain("control structure too long");
    }
    let fs = c.fs();
    Instruction::set_s(&mut fs.chunk.code[pc], offset as i32);
    Ok(())
}

/// Back-patch a forward jump to land here
pub(crate) fn fix_jump_here(c: &mut Compiler, pc: usize) -> Result<(), CompileError> {
    let target = c.fs_ref().pc();
    fix_jump(c, pc, target)
}

/// Rewrite an open call's result count. Open calls are carried at one
/// symbolic result, so the tracker is adjusted by the difference.
pub(crate) fn set_call_results(
    c: &mut Compiler,
    pc: usize,
    nresults: u32,
) -> Result<(), CompileError> {
    {
        let fs = c.fs();
        Instruction::set_b(&mut fs.chunk.code[pc], nresults);
    }
    if nresults == MULT_RET {
        Ok(())
    } else if nresults == 0 {
        stack_delta(c, -1)
    } else {
        stack_delta(c, nresults as isize - 1)
    }
}
