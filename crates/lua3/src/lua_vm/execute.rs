// The dispatch loop. One frame per script call; the frame's locals
// start at `base` on the shared stack and everything above them is the
// operand area.
use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::{
    Chunk, LuaClosure, LuaKey, LuaTable, LuaValue, number_to_string,
};
use crate::lua_vm::{Instruction, LFIELDS_PER_FLUSH, LuaError, LuaVM, MAXCALLS, MULT_RET, OpCode};

fn rt_error(chunk: &Chunk, line: usize, msg: impl AsRef<str>) -> LuaError {
    if line > 0 {
        LuaError::Runtime(format!("{}:{}: {}", chunk.source(), line, msg.as_ref()))
    } else {
        LuaError::Runtime(format!("{}: {}", chunk.source(), msg.as_ref()))
    }
}

pub(crate) fn run(
    vm: &mut LuaVM,
    closure: &Rc<LuaClosure>,
    base: usize,
) -> Result<Vec<LuaValue>, LuaError> {
    let chunk = closure.chunk.clone();
    let code = &chunk.code;
    let mut pc: usize = 0;
    let mut line: usize = 0;

    loop {
        let inst = match code.get(pc) {
            Some(&inst) => inst,
            None => return Ok(Vec::new()),
        };
        pc += 1;

        let op = match Instruction::get_opcode(inst) {
            Some(op) => op,
            None => return Err(rt_error(&chunk, line, "corrupt bytecode")),
        };

        match op {
            OpCode::EndCode => return Ok(Vec::new()),

            OpCode::PushNil => {
                let n = Instruction::get_u(inst) as usize + 1;
                for _ in 0..n {
                    vm.stack.push(LuaValue::Nil);
                }
            }

            OpCode::Pop => {
                let n = Instruction::get_u(inst) as usize;
                let len = vm.stack.len();
                vm.stack.truncate(len - n);
            }

            OpCode::PushInt => {
                vm.stack.push(LuaValue::Number(Instruction::get_s(inst) as f64));
            }

            OpCode::PushNum => {
                let n = chunk.numbers[Instruction::get_u(inst) as usize];
                vm.stack.push(LuaValue::Number(n));
            }

            OpCode::PushString => {
                let s = chunk.strings[Instruction::get_u(inst) as usize].clone();
                vm.stack.push(LuaValue::Str(s));
            }

            OpCode::PushLocal => {
                let slot = Instruction::get_u(inst) as usize;
                vm.stack.push(vm.stack[base + slot].clone());
            }

            OpCode::PushUpvalue => {
                let index = Instruction::get_u(inst) as usize;
                vm.stack.push(closure.upvalues[index].clone());
            }

            OpCode::PushSelf => {
                let name = chunk.strings[Instruction::get_u(inst) as usize].clone();
                let receiver = vm.stack.pop().unwrap();
                match &receiver {
                    LuaValue::Table(t) => {
                        let method = t.borrow().get_str(&name);
                        vm.stack.push(method);
                        vm.stack.push(receiver);
                    }
                    other => {
                        return Err(rt_error(
                            &chunk,
                            line,
                            format!("attempt to index a {} value", other.type_name()),
                        ));
                    }
                }
            }

            OpCode::GetGlobal => {
                let name = &chunk.strings[Instruction::get_u(inst) as usize];
                let value = vm.globals.get(name).cloned().unwrap_or(LuaValue::Nil);
                vm.stack.push(value);
            }

            OpCode::SetLocal => {
                let slot = Instruction::get_u(inst) as usize;
                let value = vm.stack.pop().unwrap();
                vm.stack[base + slot] = value;
            }

            OpCode::SetGlobal => {
                let name = chunk.strings[Instruction::get_u(inst) as usize].clone();
                let value = vm.stack.pop().unwrap();
                vm.globals.insert(name, value);
            }

            OpCode::GetTable => {
                let key = vm.stack.pop().unwrap();
                let table = vm.stack.pop().unwrap();
                match table {
                    LuaValue::Table(t) => {
                        let value = t.borrow().get_value(&key);
                        vm.stack.push(value);
                    }
                    other => {
                        return Err(rt_error(
                            &chunk,
                            line,
                            format!("attempt to index a {} value", other.type_name()),
                        ));
                    }
                }
            }

            OpCode::SetTable => {
                let depth = Instruction::get_u(inst) as usize;
                let value = vm.stack.pop().unwrap();
                let len = vm.stack.len();
                let key = vm.stack[len - 1 - depth].clone();
                let table = vm.stack[len - 2 - depth].clone();
                set_index(&chunk, line, table, key, value)?;
            }

            OpCode::SetTablePop => {
                let value = vm.stack.pop().unwrap();
                let key = vm.stack.pop().unwrap();
                let table = vm.stack.pop().unwrap();
                set_index(&chunk, line, table, key, value)?;
            }

            OpCode::SetList => {
                let batch = Instruction::get_a(inst) as usize;
                let count = Instruction::get_b(inst) as usize + 1;
                let len = vm.stack.len();
                let table = vm.stack[len - count - 1].clone();
                let LuaValue::Table(t) = table else {
                    return Err(rt_error(&chunk, line, "list initialiser without a table"));
                };
                {
                    let mut t = t.borrow_mut();
                    let first = batch * LFIELDS_PER_FLUSH + 1;
                    for (offset, value) in vm.stack[len - count..].iter().enumerate() {
                        let key = LuaKey::from_number((first + offset) as f64).unwrap();
                        t.set(key, value.clone());
                    }
                }
                vm.stack.truncate(len - count);
            }

            OpCode::SetMap => {
                let pairs = Instruction::get_u(inst) as usize + 1;
                let len = vm.stack.len();
                let table = vm.stack[len - 2 * pairs - 1].clone();
                let LuaValue::Table(t) = table else {
                    return Err(rt_error(&chunk, line, "record initialiser without a table"));
                };
                for i in 0..pairs {
                    let key = vm.stack[len - 2 * pairs + 2 * i].clone();
                    let value = vm.stack[len - 2 * pairs + 2 * i + 1].clone();
                    let Some(key) = LuaKey::from_value(&key) else {
                        return Err(rt_error(&chunk, line, "table index is nil"));
                    };
                    t.borrow_mut().set(key, value);
                }
                vm.stack.truncate(len - 2 * pairs);
            }

            OpCode::CreateTable => {
                let hint = Instruction::get_u(inst) as usize;
                vm.stack.push(LuaValue::Table(Rc::new(RefCell::new(
                    LuaTable::with_capacity(hint),
                ))));
            }

            OpCode::Add => arith(vm, &chunk, line, |a, b| a + b)?,
            OpCode::Sub => arith(vm, &chunk, line, |a, b| a - b)?,
            OpCode::Mul => arith(vm, &chunk, line, |a, b| a * b)?,
            OpCode::Div => arith(vm, &chunk, line, |a, b| a / b)?,
            OpCode::Pow => arith(vm, &chunk, line, |a, b| a.powf(b))?,

            OpCode::Concat => {
                let right = vm.stack.pop().unwrap();
                let left = vm.stack.pop().unwrap();
                let mut text = concat_part(&chunk, line, &left)?;
                text.push_str(&concat_part(&chunk, line, &right)?);
                let interned = vm.intern(&text);
                vm.stack.push(LuaValue::Str(interned));
            }

            OpCode::Eq => {
                let right = vm.stack.pop().unwrap();
                let left = vm.stack.pop().unwrap();
                vm.stack.push(bool_value(left == right));
            }

            OpCode::Ne => {
                let right = vm.stack.pop().unwrap();
                let left = vm.stack.pop().unwrap();
                vm.stack.push(bool_value(left != right));
            }

            OpCode::Lt => compare(vm, &chunk, line, |o| o == std::cmp::Ordering::Less)?,
            OpCode::Le => compare(vm, &chunk, line, |o| o != std::cmp::Ordering::Greater)?,
            OpCode::Gt => compare(vm, &chunk, line, |o| o == std::cmp::Ordering::Greater)?,
            OpCode::Ge => compare(vm, &chunk, line, |o| o != std::cmp::Ordering::Less)?,

            OpCode::Minus => {
                let value = vm.stack.pop().unwrap();
                match value.coerce_number() {
                    Some(n) => vm.stack.push(LuaValue::Number(-n)),
                    None => {
                        return Err(rt_error(
                            &chunk,
                            line,
                            format!(
                                "attempt to perform arithmetic on a {} value",
                                value.type_name()
                            ),
                        ));
                    }
                }
            }

            OpCode::Not => {
                let value = vm.stack.pop().unwrap();
                vm.stack.push(bool_value(!value.truthy()));
            }

            OpCode::Jmp => {
                pc = offset_pc(pc, Instruction::get_s(inst));
            }

            OpCode::IfTJmp => {
                let value = vm.stack.pop().unwrap();
                if value.truthy() {
                    pc = offset_pc(pc, Instruction::get_s(inst));
                }
            }

            OpCode::IfFJmp => {
                let value = vm.stack.pop().unwrap();
                if !value.truthy() {
                    pc = offset_pc(pc, Instruction::get_s(inst));
                }
            }

            OpCode::OnTJmp => {
                if vm.stack.last().unwrap().truthy() {
                    pc = offset_pc(pc, Instruction::get_s(inst));
                } else {
                    vm.stack.pop();
                }
            }

            OpCode::OnFJmp => {
                if !vm.stack.last().unwrap().truthy() {
                    pc = offset_pc(pc, Instruction::get_s(inst));
                } else {
                    vm.stack.pop();
                }
            }

            OpCode::Call => {
                let slot = Instruction::get_a(inst) as usize;
                let nresults = Instruction::get_b(inst);
                do_call(vm, base + slot, nresults).map_err(|e| match e {
                    LuaError::Runtime(msg) if !msg.contains(':') => rt_error(&chunk, line, msg),
                    other => other,
                })?;
            }

            OpCode::Closure => {
                let child = Instruction::get_a(inst) as usize;
                let nup = Instruction::get_b(inst) as usize;
                let len = vm.stack.len();
                let upvalues = vm.stack.split_off(len - nup);
                let value = LuaValue::Function(Rc::new(LuaClosure {
                    chunk: chunk.protos[child].clone(),
                    upvalues,
                }));
                vm.stack.push(value);
            }

            OpCode::RetCode => {
                let first = base + Instruction::get_u(inst) as usize;
                return Ok(vm.stack.split_off(first));
            }

            OpCode::SetLine => {
                line = Instruction::get_u(inst) as usize;
            }
        }
    }
}

/// Invoke the value at `f_abs`; arguments are everything above it. The
/// function slot and arguments are replaced by `nresults` results
/// (every result when `nresults` is the multret sentinel).
pub(crate) fn do_call(vm: &mut LuaVM, f_abs: usize, nresults: u32) -> Result<(), LuaError> {
    if vm.call_depth >= MAXCALLS {
        return Err(LuaError::Runtime(
            "stack overflow (too many nested calls)".to_string(),
        ));
    }

    let callee = vm.stack[f_abs].clone();
    match callee {
        LuaValue::Function(closure) => {
            let args = vm.stack.split_off(f_abs + 1);
            vm.stack.pop();
            let base = vm.stack.len();

            let nparams = closure.chunk.num_params as usize;
            for i in 0..nparams {
                vm.stack.push(args.get(i).cloned().unwrap_or(LuaValue::Nil));
            }
            if closure.chunk.is_vararg {
                let extra: &[LuaValue] = if args.len() > nparams {
                    &args[nparams..]
                } else {
                    &[]
                };
                let mut arg_table = LuaTable::with_capacity(extra.len() + 1);
                for (i, value) in extra.iter().enumerate() {
                    let key = LuaKey::from_number((i + 1) as f64).unwrap();
                    arg_table.set(key, value.clone());
                }
                let n_key = LuaKey::Str(vm.intern("n"));
                arg_table.set(n_key, LuaValue::Number(extra.len() as f64));
                vm.stack
                    .push(LuaValue::Table(Rc::new(RefCell::new(arg_table))));
            }

            vm.call_depth += 1;
            let outcome = run(vm, &closure, base);
            vm.call_depth -= 1;
            let results = outcome?;
            vm.stack.truncate(base);
            push_results(vm, results, nresults);
            Ok(())
        }
        LuaValue::Native(native) => {
            let args = vm.stack.split_off(f_abs + 1);
            vm.stack.pop();
            vm.call_depth += 1;
            let outcome = (native.callback)(vm, &args);
            vm.call_depth -= 1;
            push_results(vm, outcome?, nresults);
            Ok(())
        }
        other => Err(LuaError::Runtime(format!(
            "attempt to call a {} value",
            other.type_name()
        ))),
    }
}

fn push_results(vm: &mut LuaVM, mut results: Vec<LuaValue>, nresults: u32) {
    if nresults != MULT_RET {
        results.resize(nresults as usize, LuaValue::Nil);
    }
    vm.stack.append(&mut results);
}

fn offset_pc(pc: usize, s: i32) -> usize {
    (pc as i64 + s as i64) as usize
}

/// Comparisons yield 1 or nil
fn bool_value(b: bool) -> LuaValue {
    if b {
        LuaValue::Number(1.0)
    } else {
        LuaValue::Nil
    }
}

fn arith(
    vm: &mut LuaVM,
    chunk: &Chunk,
    line: usize,
    op: impl Fn(f64, f64) -> f64,
) -> Result<(), LuaError> {
    let right = vm.stack.pop().unwrap();
    let left = vm.stack.pop().unwrap();
    match (left.coerce_number(), right.coerce_number()) {
        (Some(a), Some(b)) => {
            vm.stack.push(LuaValue::Number(op(a, b)));
            Ok(())
        }
        _ => {
            let bad = if left.coerce_number().is_none() {
                left
            } else {
                right
            };
            Err(rt_error(
                chunk,
                line,
                format!("attempt to perform arithmetic on a {} value", bad.type_name()),
            ))
        }
    }
}

fn compare(
    vm: &mut LuaVM,
    chunk: &Chunk,
    line: usize,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<(), LuaError> {
    let right = vm.stack.pop().unwrap();
    let left = vm.stack.pop().unwrap();
    let ordering = match (&left, &right) {
        (LuaValue::Number(a), LuaValue::Number(b)) => a.partial_cmp(b),
        (LuaValue::Str(a), LuaValue::Str(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    };
    match ordering {
        Some(ordering) => {
            vm.stack.push(bool_value(accept(ordering)));
            Ok(())
        }
        None => Err(rt_error(
            chunk,
            line,
            format!(
                "attempt to compare {} with {}",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn concat_part(chunk: &Chunk, line: usize, value: &LuaValue) -> Result<String, LuaError> {
    match value {
        LuaValue::Str(s) => Ok(s.as_str().to_string()),
        LuaValue::Number(n) => Ok(number_to_string(*n)),
        other => Err(rt_error(
            chunk,
            line,
            format!("attempt to concatenate a {} value", other.type_name()),
        )),
    }
}

fn set_index(
    chunk: &Chunk,
    line: usize,
    table: LuaValue,
    key: LuaValue,
    value: LuaValue,
) -> Result<(), LuaError> {
    let t = match &table {
        LuaValue::Table(t) => t.clone(),
        other => {
            return Err(rt_error(
                chunk,
                line,
                format!("attempt to index a {} value", other.type_name()),
            ));
        }
    };
    let Some(key) = LuaKey::from_value(&key) else {
        let what = if key.is_nil() { "nil" } else { "NaN" };
        return Err(rt_error(chunk, line, format!("table index is {}", what)));
    };
    t.borrow_mut().set(key, value);
    Ok(())
}
