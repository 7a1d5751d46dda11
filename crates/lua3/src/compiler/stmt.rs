// Statement parsing. Control flow is emitted as it is recognised;
// between any two statements the symbolic stack holds exactly the
// active locals.
use smol_str::SmolStr;

use crate::compiler::code::{code_ab, code_s, code_u, fix_jump_here, set_call_results};
use crate::compiler::expr::{
    adjust_mult_assign, close_exp, explist, expression, parse_varlist, storevar, suffixedexp,
};
use crate::compiler::parser::{CompileError, TokenKind};
use crate::compiler::var::{adjustlocalvars, removelocalvars, singlevar, store_localvar};
use crate::compiler::{Compiler, ExpDesc, ExpList, UpvalDesc, close_func, open_func};
use crate::compiler::constants::string_constant;
use crate::lua_value::Chunk;
use crate::lua_vm::{Instruction, MAX_WHILE_EXPR, MULT_RET, OpCode};

/// Entry point: the main chunk is an ordinary function body that ends
/// at end-of-stream.
pub(crate) fn mainfunc(c: &mut Compiler) -> Result<Chunk, CompileError> {
    open_func(c);
    statlist(c)?;
    if c.lex.current_kind() != TokenKind::TkEof {
        return c.error("'<eof>' expected");
    }
    let (chunk, upvalues) = close_func(c)?;
    debug_assert!(upvalues.is_empty());
    Ok(chunk)
}

pub(crate) fn statlist(c: &mut Compiler) -> Result<(), CompileError> {
    // statlist -> { stat [';'] }
    while !block_follow(c) {
        if c.lex.current_kind() == TokenKind::TkReturn {
            statement(c)?;
            return Ok(()); // 'return' must be last statement
        }
        statement(c)?;
    }
    Ok(())
}

fn block_follow(c: &Compiler) -> bool {
    matches!(
        c.lex.current_kind(),
        TokenKind::TkElse
            | TokenKind::TkElseIf
            | TokenKind::TkEnd
            | TokenKind::TkUntil
            | TokenKind::TkEof
    )
}

fn statement(c: &mut Compiler) -> Result<(), CompileError> {
    let line = c.lex.line;

    if c.debug_info && line != c.fs_ref().last_line {
        code_u(c, OpCode::SetLine, line as u32, 0)?;
        c.fs().last_line = line;
    }

    match c.lex.current_kind() {
        TokenKind::TkSemicolon => {
            c.lex.bump();
        }
        TokenKind::TkIf => {
            ifstat(c, line)?;
        }
        TokenKind::TkWhile => {
            whilestat(c, line)?;
        }
        TokenKind::TkDo => {
            c.lex.bump();
            block(c)?;
            check_match(c, TokenKind::TkEnd, TokenKind::TkDo, line)?;
        }
        TokenKind::TkRepeat => {
            repeatstat(c, line)?;
        }
        TokenKind::TkFunction => {
            funcstat(c, line)?;
        }
        TokenKind::TkLocal => {
            localstat(c)?;
        }
        TokenKind::TkReturn => {
            retstat(c)?;
        }
        _ => {
            exprstat(c)?;
        }
    }

    let fs = c.fs_ref();
    debug_assert_eq!(
        fs.stack_depth, fs.nlocals,
        "operand stack unbalanced at a statement boundary"
    );
    Ok(())
}

/// A nested scope: locals declared inside are popped at the end
fn block(c: &mut Compiler) -> Result<(), CompileError> {
    let saved = {
        let fs = c.fs();
        fs.block_depth += 1;
        fs.nlocals
    };
    statlist(c)?;
    c.fs().block_depth -= 1;
    let n = c.fs_ref().nlocals - saved;
    if n > 0 {
        removelocalvars(c, saved);
        code_u(c, OpCode::Pop, n as u32, -(n as isize))?;
    }
    Ok(())
}

fn ifstat(c: &mut Compiler, line: usize) -> Result<(), CompileError> {
    // ifstat -> IF cond THEN block {ELSEIF cond THEN block} [ELSE block] END
    let mut escapes: Vec<usize> = Vec::new();
    let jump_on_false;
    loop {
        c.lex.bump(); // skip 'if' / 'elseif'
        let mut cond = expression(c)?;
        close_exp(c, &mut cond)?;
        check(c, TokenKind::TkThen)?;
        let jf = code_s(c, OpCode::IfFJmp, 0, -1)?;
        block(c)?;
        if c.lex.current_kind() == TokenKind::TkElseIf {
            escapes.push(code_s(c, OpCode::Jmp, 0, 0)?);
            fix_jump_here(c, jf)?;
            continue;
        }
        jump_on_false = jf;
        break;
    }

    if c.lex.current_kind() == TokenKind::TkElse {
        let over = code_s(c, OpCode::Jmp, 0, 0)?;
        fix_jump_here(c, jump_on_false)?;
        c.lex.bump();
        block(c)?;
        if c.fs_ref().pc() == over + 1 {
            // the else part produced no code: the jump over it is the
            // last instruction and can go
            c.fs().chunk.code.truncate(over);
            fix_jump_here(c, jump_on_false)?;
        } else {
            escapes.push(over);
        }
    } else {
        fix_jump_here(c, jump_on_false)?;
    }

    check_match(c, TokenKind::TkEnd, TokenKind::TkIf, line)?;
    for pc in escapes {
        fix_jump_here(c, pc)?;
    }
    Ok(())
}

/// `while` emits body first, condition last. The condition is parsed in
/// place, lifted out, and re-emitted after the body so the loop runs it
/// once per iteration off a single pass over the source.
fn whilestat(c: &mut Compiler, line: usize) -> Result<(), CompileError> {
    c.lex.bump(); // skip WHILE
    let init = c.fs_ref().pc();

    let mut cond = expression(c)?;
    close_exp(c, &mut cond)?;

    if c.fs_ref().pc() - init > MAX_WHILE_EXPR {
        return c.error_plain("'while' condition too complex");
    }
    let cond_buf = {
        let fs = c.fs();
        let buf: Vec<u32> = fs.chunk.code[init..].to_vec();
        fs.chunk.code.truncate(init);
        // the condition value is gone until the code is replayed
        fs.stack_depth -= 1;
        buf
    };

    let entry = code_s(c, OpCode::Jmp, 0, 0)?;
    check(c, TokenKind::TkDo)?;
    block(c)?;
    check_match(c, TokenKind::TkEnd, TokenKind::TkWhile, line)?;

    fix_jump_here(c, entry)?;
    {
        let fs = c.fs();
        fs.chunk.code.extend_from_slice(&cond_buf);
        fs.stack_depth += 1;
    }
    let body_start = init + 1;
    let back = body_start as i64 - (c.fs_ref().pc() as i64 + 1);
    code_s(c, OpCode::IfTJmp, back as i32, -1)?;
    Ok(())
}

fn repeatstat(c: &mut Compiler, line: usize) -> Result<(), CompileError> {
    // repeatstat -> REPEAT block UNTIL cond
    c.lex.bump(); // skip REPEAT
    let init = c.fs_ref().pc();
    block(c)?;
    check_match(c, TokenKind::TkUntil, TokenKind::TkRepeat, line)?;
    let mut cond = expression(c)?;
    close_exp(c, &mut cond)?;
    let back = init as i64 - (c.fs_ref().pc() as i64 + 1);
    code_s(c, OpCode::IfFJmp, back as i32, -1)?;
    Ok(())
}

/// `local name {, name} [= explist]`; names activate only after the
/// initialiser so it cannot see them.
fn localstat(c: &mut Compiler) -> Result<(), CompileError> {
    c.lex.bump(); // skip LOCAL
    let mut nvars = 0;
    loop {
        let name = checkname(c)?;
        store_localvar(c, name, nvars)?;
        nvars += 1;
        if !testnext(c, TokenKind::TkComma) {
            break;
        }
    }

    let list = if testnext(c, TokenKind::TkAssign) {
        explist(c)?
    } else {
        ExpList {
            n: 0,
            open_call: None,
        }
    };
    adjust_mult_assign(c, nvars, &list)?;
    adjustlocalvars(c, nvars);
    Ok(())
}

/// `function name{.name}[:name] body`, main-chunk top level only
fn funcstat(c: &mut Compiler, line: usize) -> Result<(), CompileError> {
    if c.funcs.len() != 1 || c.fs_ref().block_depth != 0 {
        return c.error_plain(
            "'function' statement is only allowed at the top level of the main chunk",
        );
    }
    c.lex.bump(); // skip FUNCTION
    let name = checkname(c)?;
    let mut target = singlevar(c, &name, 0)?;
    let mut needs_self = false;
    loop {
        match c.lex.current_kind() {
            TokenKind::TkDot => {
                c.lex.bump();
                let field = checkname(c)?;
                close_exp(c, &mut target)?;
                let index = string_constant(c, 0, &field)?;
                code_u(c, OpCode::PushString, index, 1)?;
                target = ExpDesc::Indexed;
            }
            TokenKind::TkColon => {
                c.lex.bump();
                let field = checkname(c)?;
                close_exp(c, &mut target)?;
                let index = string_constant(c, 0, &field)?;
                code_u(c, OpCode::PushString, index, 1)?;
                target = ExpDesc::Indexed;
                needs_self = true;
                break;
            }
            _ => break,
        }
    }
    body(c, needs_self, line)?;
    storevar(c, &target)?;
    Ok(())
}

/// A statement that starts with an expression is either a call or the
/// head of an assignment.
fn exprstat(c: &mut Compiler) -> Result<(), CompileError> {
    let v = suffixedexp(c)?;
    if let ExpDesc::Call(pc) = v {
        // a call statement discards every result
        set_call_results(c, pc, 0)?;
        return Ok(());
    }
    assignment(c, v)
}

/// Multiple assignment. Stores run right to left; table/key pairs of
/// indexed targets stay on the stack until every store is done, so the
/// store opcode addresses them at a depth.
fn assignment(c: &mut Compiler, first: ExpDesc) -> Result<(), CompileError> {
    let vars = parse_varlist(c, first)?;
    check(c, TokenKind::TkAssign)?;
    let list = explist(c)?;
    adjust_mult_assign(c, vars.len(), &list)?;

    if vars.len() == 1 {
        return storevar(c, &vars[0]);
    }

    let mut indexed_after = 0usize;
    for i in (0..vars.len()).rev() {
        match vars[i] {
            ExpDesc::Local(slot) => {
                code_u(c, OpCode::SetLocal, slot, -1)?;
            }
            ExpDesc::Global(index) => {
                code_u(c, OpCode::SetGlobal, index, -1)?;
            }
            ExpDesc::Indexed => {
                let depth = i + 2 * indexed_after;
                code_u(c, OpCode::SetTable, depth as u32, -1)?;
                indexed_after += 1;
            }
            _ => unreachable!(),
        }
    }
    if indexed_after > 0 {
        let pairs = 2 * indexed_after;
        code_u(c, OpCode::Pop, pairs as u32, -(pairs as isize))?;
    }
    Ok(())
}

fn retstat(c: &mut Compiler) -> Result<(), CompileError> {
    c.lex.bump(); // skip RETURN
    if !block_follow(c) && c.lex.current_kind() != TokenKind::TkSemicolon {
        let list = explist(c)?;
        if let Some(pc) = list.open_call {
            set_call_results(c, pc, MULT_RET)?;
        }
    }
    let nlocals = c.fs_ref().nlocals;
    code_u(c, OpCode::RetCode, nlocals as u32, 0)?;
    // whatever sat above the locals is the return area
    c.fs().stack_depth = nlocals;
    testnext(c, TokenKind::TkSemicolon);
    Ok(())
}

/// Function body: parameters, block, END. On close the parent pushes
/// the captured upvalues and wraps them with CLOSURE, so the closure
/// sees their values as of this point.
pub(crate) fn body(c: &mut Compiler, needs_self: bool, line: usize) -> Result<(), CompileError> {
    open_func(c);

    check(c, TokenKind::TkLeftParen)?;
    let mut nparams = 0usize;
    let mut is_vararg = false;
    if needs_self {
        store_localvar(c, SmolStr::new_static("self"), 0)?;
        nparams = 1;
    }
    if c.lex.current_kind() != TokenKind::TkRightParen {
        loop {
            match c.lex.current_kind() {
                TokenKind::TkDots => {
                    c.lex.bump();
                    is_vararg = true;
                    // surplus arguments arrive as the implicit 'arg' table
                    store_localvar(c, SmolStr::new_static("arg"), nparams)?;
                    nparams += 1;
                    break;
                }
                TokenKind::TkName => {
                    let name = checkname(c)?;
                    store_localvar(c, name, nparams)?;
                    nparams += 1;
                }
                _ => return c.error("<name> or '...' expected"),
            }
            if !testnext(c, TokenKind::TkComma) {
                break;
            }
        }
    }
    check(c, TokenKind::TkRightParen)?;
    adjustlocalvars(c, nparams);
    {
        let fs = c.fs();
        fs.chunk.num_params = (nparams - usize::from(is_vararg)) as u8;
        fs.chunk.is_vararg = is_vararg;
        // parameter slots are populated by the caller, not by code
        fs.stack_depth = fs.nlocals;
        if fs.stack_depth > fs.chunk.max_stack as usize {
            fs.chunk.max_stack = fs.stack_depth as u32;
        }
    }

    statlist(c)?;
    check_match(c, TokenKind::TkEnd, TokenKind::TkFunction, line)?;
    let (chunk, upvalues) = close_func(c)?;

    for upvalue in &upvalues {
        match *upvalue {
            UpvalDesc::Local(slot) => {
                code_u(c, OpCode::PushLocal, slot, 1)?;
            }
            UpvalDesc::Global(index) => {
                code_u(c, OpCode::GetGlobal, index, 1)?;
            }
        }
    }

    if c.fs_ref().chunk.protos.len() >= Instruction::MAXARG_A as usize {
        return c.error_plain("too many nested functions");
    }
    let child = {
        let fs = c.fs();
        fs.chunk.protos.push(std::rc::Rc::new(chunk));
        (fs.chunk.protos.len() - 1) as u32
    };
    let nup = upvalues.len();
    code_ab(c, OpCode::Closure, child, nup as u32, 1 - nup as isize)?;
    Ok(())
}

// Token helpers, shared with the expression parser

pub(crate) fn testnext(c: &mut Compiler, expected: TokenKind) -> bool {
    if c.lex.current_kind() == expected {
        c.lex.bump();
        true
    } else {
        false
    }
}

pub(crate) fn check(c: &mut Compiler, expected: TokenKind) -> Result<(), CompileError> {
    if c.lex.current_kind() != expected {
        return c.error(format!("{} expected", expected.describe()));
    }
    c.lex.bump();
    Ok(())
}

/// Like `check`, but names the opening token and line when the pair is
/// split across lines.
pub(crate) fn check_match(
    c: &mut Compiler,
    expected: TokenKind,
    opening: TokenKind,
    opening_line: usize,
) -> Result<(), CompileError> {
    if c.lex.current_kind() != expected {
        if c.lex.line == opening_line {
            return c.error(format!("{} expected", expected.describe()));
        }
        return c.error(format!(
            "{} expected (to close {} at line {})",
            expected.describe(),
            opening.describe(),
            opening_line
        ));
    }
    c.lex.bump();
    Ok(())
}

pub(crate) fn checkname(c: &mut Compiler) -> Result<SmolStr, CompileError> {
    if c.lex.current_kind() != TokenKind::TkName {
        return c.error("<name> expected");
    }
    let name = SmolStr::new(c.lex.current_text());
    c.lex.bump();
    Ok(name)
}
