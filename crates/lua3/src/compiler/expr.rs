// Expression parsing and its code generation. Terminals either emit a
// load or return a descriptor whose materialisation is delayed.
use crate::compiler::code::{code_ab, code_o, code_s, code_u, fix_jump_here, set_call_results};
use crate::compiler::constants::{number_constant, string_constant};
use crate::compiler::parse_literal::{long_string_value, parse_number, unescape_string};
use crate::compiler::parser::{CompileError, TokenKind};
use crate::compiler::stmt::{check, check_match, checkname, testnext};
use crate::compiler::var::{pushupvalue, singlevar};
use crate::compiler::{Compiler, ConsKind, ExpDesc, ExpList};
use crate::lua_vm::{
    Instruction, LFIELDS_PER_FLUSH, MAXOPS, MAXVARSLH, MULT_RET, OpCode, RFIELDS_PER_FLUSH,
};

const UNARY_PRIORITY: u8 = 5;

/// Materialise: emit whatever puts the described value on top of the
/// operand stack.
pub(crate) fn close_exp(c: &mut Compiler, v: &mut ExpDesc) -> Result<(), CompileError> {
    match *v {
        ExpDesc::Local(slot) => {
            code_u(c, OpCode::PushLocal, slot, 1)?;
        }
        ExpDesc::Global(index) => {
            code_u(c, OpCode::GetGlobal, index, 1)?;
        }
        ExpDesc::Indexed => {
            code_o(c, OpCode::GetTable, -1)?;
        }
        ExpDesc::Call(pc) => {
            set_call_results(c, pc, 1)?;
        }
        ExpDesc::Stacked => {}
    }
    *v = ExpDesc::Stacked;
    Ok(())
}

/// Store the value on top of the stack into the described variable
pub(crate) fn storevar(c: &mut Compiler, v: &ExpDesc) -> Result<(), CompileError> {
    match *v {
        ExpDesc::Local(slot) => {
            code_u(c, OpCode::SetLocal, slot, -1)?;
        }
        ExpDesc::Global(index) => {
            code_u(c, OpCode::SetGlobal, index, -1)?;
        }
        ExpDesc::Indexed => {
            code_o(c, OpCode::SetTablePop, -3)?;
        }
        ExpDesc::Call(_) | ExpDesc::Stacked => {
            return c.error("cannot assign to this expression");
        }
    }
    Ok(())
}

/// Full expression: `or` at the loosest level, then `and`, then the
/// arithmetic engine.
pub(crate) fn expression(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    let mut v = and_expr(c)?;
    while c.lex.current_kind() == TokenKind::TkOr {
        c.lex.bump();
        close_exp(c, &mut v)?;
        // jump past the right operand keeping the value when it is true
        let pc = code_s(c, OpCode::OnTJmp, 0, -1)?;
        let mut right = and_expr(c)?;
        close_exp(c, &mut right)?;
        fix_jump_here(c, pc)?;
        v = ExpDesc::Stacked;
    }
    Ok(v)
}

fn and_expr(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    let mut v = arith_expr(c)?;
    while c.lex.current_kind() == TokenKind::TkAnd {
        c.lex.bump();
        close_exp(c, &mut v)?;
        let pc = code_s(c, OpCode::OnFJmp, 0, -1)?;
        let mut right = arith_expr(c)?;
        close_exp(c, &mut right)?;
        fix_jump_here(c, pc)?;
        v = ExpDesc::Stacked;
    }
    Ok(v)
}

struct BinOp {
    op: OpCode,
    priority: u8,
    right_assoc: bool,
}

fn get_binop(kind: TokenKind) -> Option<BinOp> {
    let (op, priority, right_assoc) = match kind {
        TokenKind::TkEq => (OpCode::Eq, 1, false),
        TokenKind::TkNe => (OpCode::Ne, 1, false),
        TokenKind::TkLt => (OpCode::Lt, 1, false),
        TokenKind::TkLe => (OpCode::Le, 1, false),
        TokenKind::TkGt => (OpCode::Gt, 1, false),
        TokenKind::TkGe => (OpCode::Ge, 1, false),
        TokenKind::TkConcat => (OpCode::Concat, 2, false),
        TokenKind::TkPlus => (OpCode::Add, 3, false),
        TokenKind::TkMinus => (OpCode::Sub, 3, false),
        TokenKind::TkMul => (OpCode::Mul, 4, false),
        TokenKind::TkDiv => (OpCode::Div, 4, false),
        TokenKind::TkPow => (OpCode::Pow, 6, true),
        _ => return None,
    };
    Some(BinOp {
        op,
        priority,
        right_assoc,
    })
}

enum Pending {
    Binary(OpCode, u8),
    Unary(OpCode),
}

impl Pending {
    fn priority(&self) -> u8 {
        match self {
            Pending::Binary(_, priority) => *priority,
            Pending::Unary(_) => UNARY_PRIORITY,
        }
    }
}

fn emit_pending(c: &mut Compiler, pending: Pending) -> Result<(), CompileError> {
    match pending {
        Pending::Binary(op, _) => code_o(c, op, -1).map(|_| ()),
        Pending::Unary(op) => code_o(c, op, 0).map(|_| ()),
    }
}

/// The operator-precedence engine: a shunting loop over a bounded
/// operator stack. Operands are materialised as soon as an operator
/// commits them; a lone operand passes through with its descriptor
/// intact.
fn arith_expr(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    let mut ops: Vec<Pending> = Vec::new();
    let mut v;
    loop {
        loop {
            let unary = match c.lex.current_kind() {
                TokenKind::TkNot => OpCode::Not,
                TokenKind::TkMinus => OpCode::Minus,
                _ => break,
            };
            if ops.len() >= MAXOPS {
                return c.error("expression too complex");
            }
            ops.push(Pending::Unary(unary));
            c.lex.bump();
        }

        v = operand(c)?;

        let Some(binop) = get_binop(c.lex.current_kind()) else {
            break;
        };
        c.lex.bump();
        close_exp(c, &mut v)?;

        // a left-associative operator flushes everything that binds at
        // least as tight; '^' only what binds tighter
        while let Some(top) = ops.last() {
            let flush = if binop.right_assoc {
                top.priority() > binop.priority
            } else {
                top.priority() >= binop.priority
            };
            if !flush {
                break;
            }
            let pending = ops.pop().unwrap();
            emit_pending(c, pending)?;
        }

        if ops.len() >= MAXOPS {
            return c.error("expression too complex");
        }
        ops.push(Pending::Binary(binop.op, binop.priority));
    }

    if !ops.is_empty() {
        close_exp(c, &mut v)?;
        while let Some(pending) = ops.pop() {
            emit_pending(c, pending)?;
        }
        v = ExpDesc::Stacked;
    }
    Ok(v)
}

/// A terminal of the arithmetic engine
fn operand(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    match c.lex.current_kind() {
        TokenKind::TkNumber => {
            let Some(n) = parse_number(c.lex.current_text()) else {
                return c.error("malformed number");
            };
            c.lex.bump();
            push_number(c, n)?;
            Ok(ExpDesc::Stacked)
        }
        TokenKind::TkString | TokenKind::TkLongString => {
            push_string_literal(c)?;
            Ok(ExpDesc::Stacked)
        }
        TokenKind::TkNil => {
            c.lex.bump();
            code_u(c, OpCode::PushNil, 0, 1)?;
            Ok(ExpDesc::Stacked)
        }
        TokenKind::TkLeftBrace => {
            constructor(c)?;
            Ok(ExpDesc::Stacked)
        }
        TokenKind::TkFunction => {
            let line = c.lex.line;
            c.lex.bump();
            super::stmt::body(c, false, line)?;
            Ok(ExpDesc::Stacked)
        }
        _ => suffixedexp(c),
    }
}

/// Small integers go inline, everything else through the number pool
fn push_number(c: &mut Compiler, n: f64) -> Result<(), CompileError> {
    if n.fract() == 0.0 && n.abs() <= Instruction::MAXARG_S as f64 {
        code_s(c, OpCode::PushInt, n as i32, 1)?;
    } else {
        let index = number_constant(c, n)?;
        code_u(c, OpCode::PushNum, index, 1)?;
    }
    Ok(())
}

fn push_string_literal(c: &mut Compiler) -> Result<(), CompileError> {
    let value = match c.lex.current_kind() {
        TokenKind::TkString => unescape_string(c.lex.current_text(), c.lex.line)?,
        _ => long_string_value(c.lex.current_text()).to_string(),
    };
    c.lex.bump();
    let level = c.funcs.len() - 1;
    let index = string_constant(c, level, &value)?;
    code_u(c, OpCode::PushString, index, 1)?;
    Ok(())
}

fn primaryexp(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    match c.lex.current_kind() {
        TokenKind::TkName => {
            let name = checkname(c)?;
            let level = c.funcs.len() - 1;
            singlevar(c, &name, level)
        }
        TokenKind::TkLeftParen => {
            let line = c.lex.line;
            c.lex.bump();
            let mut v = expression(c)?;
            close_exp(c, &mut v)?;
            check_match(c, TokenKind::TkRightParen, TokenKind::TkLeftParen, line)?;
            Ok(ExpDesc::Stacked)
        }
        TokenKind::TkPercent => pushupvalue(c),
        _ => c.error("unexpected symbol"),
    }
}

/// A variable or call: a primary followed by any number of `.name`,
/// `[exp]`, `:name(args)` and call suffixes.
pub(crate) fn suffixedexp(c: &mut Compiler) -> Result<ExpDesc, CompileError> {
    let line = c.lex.line;
    let mut v = primaryexp(c)?;
    loop {
        match c.lex.current_kind() {
            TokenKind::TkDot => {
                c.lex.bump();
                let name = checkname(c)?;
                close_exp(c, &mut v)?;
                let level = c.funcs.len() - 1;
                let index = string_constant(c, level, &name)?;
                code_u(c, OpCode::PushString, index, 1)?;
                v = ExpDesc::Indexed;
            }
            TokenKind::TkLeftBracket => {
                close_exp(c, &mut v)?;
                c.lex.bump();
                let mut key = expression(c)?;
                close_exp(c, &mut key)?;
                check(c, TokenKind::TkRightBracket)?;
                v = ExpDesc::Indexed;
            }
            TokenKind::TkColon => {
                c.lex.bump();
                let name = checkname(c)?;
                close_exp(c, &mut v)?;
                let level = c.funcs.len() - 1;
                let index = string_constant(c, level, &name)?;
                code_u(c, OpCode::PushSelf, index, 1)?;
                // the callee sits under the pushed receiver
                let slot = c.fs_ref().stack_depth - 2;
                v = funcargs(c, slot, line)?;
            }
            TokenKind::TkLeftParen
            | TokenKind::TkLeftBrace
            | TokenKind::TkString
            | TokenKind::TkLongString => {
                close_exp(c, &mut v)?;
                let slot = c.fs_ref().stack_depth - 1;
                v = funcargs(c, slot, line)?;
            }
            _ => break,
        }
    }
    Ok(v)
}

/// Parse call arguments and emit the CALL. The result count starts at
/// one and is rewritten by whoever consumes the descriptor.
fn funcargs(c: &mut Compiler, slot: usize, line: usize) -> Result<ExpDesc, CompileError> {
    match c.lex.current_kind() {
        TokenKind::TkLeftParen => {
            c.lex.bump();
            if c.lex.current_kind() != TokenKind::TkRightParen {
                let list = explist(c)?;
                if let Some(pc) = list.open_call {
                    set_call_results(c, pc, MULT_RET)?;
                }
            }
            check_match(c, TokenKind::TkRightParen, TokenKind::TkLeftParen, line)?;
        }
        TokenKind::TkLeftBrace => {
            constructor(c)?;
        }
        TokenKind::TkString | TokenKind::TkLongString => {
            push_string_literal(c)?;
        }
        _ => return c.error("function arguments expected"),
    }

    let depth = c.fs_ref().stack_depth;
    let delta = slot as isize + 1 - depth as isize;
    let pc = code_ab(c, OpCode::Call, slot as u32, 1, delta)?;
    Ok(ExpDesc::Call(pc))
}

/// Comma-separated expressions; every one but the last is materialised,
/// a trailing open call stays negotiable.
pub(crate) fn explist(c: &mut Compiler) -> Result<ExpList, CompileError> {
    let mut n = 1;
    let mut v = expression(c)?;
    while testnext(c, TokenKind::TkComma) {
        close_exp(c, &mut v)?;
        v = expression(c)?;
        n += 1;
    }
    let open_call = if let ExpDesc::Call(pc) = v {
        Some(pc)
    } else {
        close_exp(c, &mut v)?;
        None
    };
    Ok(ExpList { n, open_call })
}

/// Reconcile a value list against `nvars` consumers: pad with nils, pop
/// the surplus, or hand the difference to a trailing open call.
pub(crate) fn adjust_mult_assign(
    c: &mut Compiler,
    nvars: usize,
    list: &ExpList,
) -> Result<(), CompileError> {
    let n = list.n;
    if let Some(pc) = list.open_call {
        if n <= nvars {
            set_call_results(c, pc, (nvars - n + 1) as u32)?;
        } else {
            set_call_results(c, pc, 0)?;
            let surplus = n - 1 - nvars;
            if surplus > 0 {
                code_u(c, OpCode::Pop, surplus as u32, -(surplus as isize))?;
            }
        }
    } else if n < nvars {
        let missing = nvars - n;
        code_u(c, OpCode::PushNil, (missing - 1) as u32, missing as isize)?;
    } else if n > nvars {
        let surplus = n - nvars;
        code_u(c, OpCode::Pop, surplus as u32, -(surplus as isize))?;
    }
    Ok(())
}

/// Table constructor: `{ part [; part] }` with at most one list half
/// and one record half.
pub(crate) fn constructor(c: &mut Compiler) -> Result<(), CompileError> {
    let line = c.lex.line;
    check(c, TokenKind::TkLeftBrace)?;
    let create_pc = code_u(c, OpCode::CreateTable, 0, 1)?;

    let (first_kind, first_count) = cons_part(c)?;
    let mut total = first_count;
    if testnext(c, TokenKind::TkSemicolon) {
        let (second_kind, second_count) = cons_part(c)?;
        if second_kind == first_kind && first_kind != ConsKind::Empty {
            return c.error("invalid constructor syntax (parts of the same kind)");
        }
        total += second_count;
    }
    check_match(c, TokenKind::TkRightBrace, TokenKind::TkLeftBrace, line)?;

    // the size hint becomes known only once the '}' is reached
    let fs = c.fs();
    Instruction::set_u(&mut fs.chunk.code[create_pc], total as u32);
    Ok(())
}

/// Kind is inferred from the first item: `NAME =` or `[` opens a record
/// half, anything else a list half.
fn cons_part(c: &mut Compiler) -> Result<(ConsKind, usize), CompileError> {
    match c.lex.current_kind() {
        TokenKind::TkRightBrace | TokenKind::TkSemicolon => Ok((ConsKind::Empty, 0)),
        TokenKind::TkName if c.lex.peek_next() == TokenKind::TkAssign => recfields(c),
        TokenKind::TkLeftBracket => recfields(c),
        _ => listfields(c),
    }
}

fn recfields(c: &mut Compiler) -> Result<(ConsKind, usize), CompileError> {
    let mut n = 0;
    loop {
        match c.lex.current_kind() {
            TokenKind::TkName => {
                let name = checkname(c)?;
                let level = c.funcs.len() - 1;
                let index = string_constant(c, level, &name)?;
                code_u(c, OpCode::PushString, index, 1)?;
                check(c, TokenKind::TkAssign)?;
            }
            TokenKind::TkLeftBracket => {
                c.lex.bump();
                let mut key = expression(c)?;
                close_exp(c, &mut key)?;
                check(c, TokenKind::TkRightBracket)?;
                check(c, TokenKind::TkAssign)?;
            }
            _ => return c.error("<name> or '[' expected"),
        }

        let mut value = expression(c)?;
        close_exp(c, &mut value)?;
        n += 1;

        if n % RFIELDS_PER_FLUSH == 0 {
            code_u(
                c,
                OpCode::SetMap,
                (RFIELDS_PER_FLUSH - 1) as u32,
                -(2 * RFIELDS_PER_FLUSH as isize),
            )?;
        }

        if !testnext(c, TokenKind::TkComma) {
            break;
        }
    }

    let remainder = n % RFIELDS_PER_FLUSH;
    if remainder > 0 {
        code_u(
            c,
            OpCode::SetMap,
            (remainder - 1) as u32,
            -(2 * remainder as isize),
        )?;
    }
    Ok((ConsKind::Record, n))
}

fn listfields(c: &mut Compiler) -> Result<(ConsKind, usize), CompileError> {
    let mut n: usize = 0;
    loop {
        let mut value = expression(c)?;
        close_exp(c, &mut value)?;
        n += 1;

        if n > Instruction::MAXARG_A as usize * LFIELDS_PER_FLUSH {
            return c.error("too many items in a list constructor");
        }
        if n % LFIELDS_PER_FLUSH == 0 {
            code_ab(
                c,
                OpCode::SetList,
                (n / LFIELDS_PER_FLUSH - 1) as u32,
                (LFIELDS_PER_FLUSH - 1) as u32,
                -(LFIELDS_PER_FLUSH as isize),
            )?;
        }

        if !testnext(c, TokenKind::TkComma) {
            break;
        }
    }

    let remainder = n % LFIELDS_PER_FLUSH;
    if remainder > 0 {
        code_ab(
            c,
            OpCode::SetList,
            (n / LFIELDS_PER_FLUSH) as u32,
            (remainder - 1) as u32,
            -(remainder as isize),
        )?;
    }
    Ok((ConsKind::List, n))
}

/// Targets of a multiple assignment, validated as they are parsed
pub(crate) fn parse_varlist(
    c: &mut Compiler,
    first: ExpDesc,
) -> Result<Vec<ExpDesc>, CompileError> {
    if !first.is_storable() {
        return c.error("cannot assign to this expression");
    }
    let mut vars = vec![first];
    while testnext(c, TokenKind::TkComma) {
        let v = suffixedexp(c)?;
        if !v.is_storable() {
            return c.error("cannot assign to this expression");
        }
        if vars.len() >= MAXVARSLH {
            return c.error("too many variables in a multiple assignment");
        }
        vars.push(v);
    }
    Ok(vars)
}
