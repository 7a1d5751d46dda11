// The basic library: the handful of natives scripts can't live without.
use crate::lua_value::{LuaValue, str_to_number, value_to_display};
use crate::lua_vm::{LuaError, LuaVM};

pub(super) fn lua_print(_vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    let parts: Vec<String> = args.iter().map(value_to_display).collect();
    println!("{}", parts.join("\t"));
    Ok(Vec::new())
}

pub(super) fn lua_type(vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    let value = args.first().cloned().unwrap_or(LuaValue::Nil);
    let name = vm.intern(value.type_name());
    Ok(vec![LuaValue::Str(name)])
}

pub(super) fn lua_tostring(vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    let value = args.first().cloned().unwrap_or(LuaValue::Nil);
    let text = vm.intern(&value_to_display(&value));
    Ok(vec![LuaValue::Str(text)])
}

pub(super) fn lua_tonumber(_vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    let result = match args.first() {
        Some(LuaValue::Number(n)) => LuaValue::Number(*n),
        Some(LuaValue::Str(s)) => match str_to_number(s.as_str()) {
            Some(n) => LuaValue::Number(n),
            None => LuaValue::Nil,
        },
        _ => LuaValue::Nil,
    };
    Ok(vec![result])
}

pub(super) fn lua_error(_vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    let message = match args.first() {
        Some(value) => value_to_display(value),
        None => "error".to_string(),
    };
    Err(LuaError::Runtime(message))
}

pub(super) fn lua_assert(_vm: &mut LuaVM, args: &[LuaValue]) -> Result<Vec<LuaValue>, LuaError> {
    match args.first() {
        Some(value) if value.truthy() => Ok(args.to_vec()),
        _ => {
            let message = match args.get(1) {
                Some(value) => value_to_display(value),
                None => "assertion failed!".to_string(),
            };
            Err(LuaError::Runtime(message))
        }
    }
}
