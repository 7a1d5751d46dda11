// Name resolution and local-variable bookkeeping.
use smol_str::SmolStr;

use crate::compiler::code::code_u;
use crate::compiler::constants::string_constant;
use crate::compiler::parser::CompileError;
use crate::compiler::{Compiler, ExpDesc, UpvalDesc};
use crate::lua_value::LocVar;
use crate::lua_vm::{MAXLOCALS, MAXUPVALUES, OpCode};

/// Resolve `name` in the scope of the function at `level`: a local of
/// that function, or a global. A local of any function further out is
/// an error; capture is only through the explicit `%` form.
pub(crate) fn singlevar(
    c: &mut Compiler,
    name: &str,
    level: usize,
) -> Result<ExpDesc, CompileError> {
    if let Some(slot) = c.funcs[level].search_local(name) {
        return Ok(ExpDesc::Local(slot));
    }
    for outer in (0..level).rev() {
        if c.funcs[outer].search_local(name).is_some() {
            return c.error_plain(format!(
                "cannot access a variable in outer scope: '{}'",
                name
            ));
        }
    }
    let index = string_constant(c, level, name)?;
    let interned = c.funcs[level].chunk.strings[index as usize].clone();
    c.vm.register_global(&interned);
    Ok(ExpDesc::Global(index))
}

/// `%name`: bind an upvalue of the current function. The name resolves
/// in the parent scope; equal descriptors share one capture slot.
pub(crate) fn pushupvalue(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    c.lex.bump(); // skip '%'
    let name = super::stmt::checkname(c)?;

    let level = c.funcs.len() - 1;
    if level == 0 {
        return c.error_plain(format!(
            "cannot access upvalue '{}' in the main chunk",
            name
        ));
    }
    if c.funcs[level].search_local(&name).is_some() {
        return c.error_plain(format!(
            "cannot access an upvalue in current scope: '{}'",
            name
        ));
    }

    let desc = match singlevar(c, &name, level - 1)? {
        ExpDesc::Local(slot) => UpvalDesc::Local(slot),
        ExpDesc::Global(index) => UpvalDesc::Global(index),
        _ => unreachable!(),
    };

    let existing = c.fs_ref().upvalues.iter().position(|u| *u == desc);
    let index = match existing {
        Some(found) => found,
        None => {
            if c.fs_ref().upvalues.len() >= MAXUPVALUES {
                return c.error_plain("too many upvalues in a single function");
            }
            let fs = c.fs();
            fs.upvalues.push(desc);
            fs.upvalues.len() - 1
        }
    };

    code_u(c, OpCode::PushUpvalue, index as u32, 1)?;
    Ok(ExpDesc::Stacked)
}

/// Reserve the slot `nlocals + i` for `name` without activating it; an
/// initialiser must not see the names it is initialising.
pub(crate) fn store_localvar(
    c: &mut Compiler,
    name: SmolStr,
    i: usize,
) -> Result<(), CompileError> {
    if c.fs_ref().nlocals + i + 1 > MAXLOCALS {
        return c.error_plain("too many local variables");
    }
    let fs = c.fs();
    debug_assert_eq!(fs.locals.len(), fs.nlocals + i);
    fs.locals.push(name);
    Ok(())
}

/// Activate the next `n` reserved names, recording each declaration in
/// the debug vector when debug info is on.
pub(crate) fn adjustlocalvars(c: &mut Compiler, n: usize) {
    let line = c.lex.line as u32;
    let Compiler { vm, funcs, .. } = c;
    let fs = funcs.last_mut().unwrap();
    for _ in 0..n {
        let name = fs.locals[fs.nlocals].clone();
        if let Some(vars) = fs.chunk.locvars.as_mut() {
            vars.push(LocVar {
                name: Some(vm.intern(&name)),
                line,
            });
        }
        fs.nlocals += 1;
    }
}

/// Drop the locals declared since `to_level`, appending one unnamed
/// close marker per removed variable to the debug vector.
pub(crate) fn removelocalvars(c: &mut Compiler, to_level: usize) {
    let line = c.lex.line as u32;
    let fs = c.fs();
    let removed = fs.nlocals - to_level;
    if let Some(vars) = fs.chunk.locvars.as_mut() {
        for _ in 0..removed {
            vars.push(LocVar { name: None, line });
        }
    }
    fs.nlocals = to_level;
    fs.locals.truncate(to_level);
}
