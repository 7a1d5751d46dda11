mod basic;

use std::rc::Rc;

use crate::lua_value::{LuaValue, NativeCallback, NativeFn};
use crate::lua_vm::LuaVM;

/// Register the basic library into the VM's global table
pub fn open_libs(vm: &mut LuaVM) {
    register(vm, "print", basic::lua_print);
    register(vm, "type", basic::lua_type);
    register(vm, "tostring", basic::lua_tostring);
    register(vm, "tonumber", basic::lua_tonumber);
    register(vm, "error", basic::lua_error);
    register(vm, "assert", basic::lua_assert);
}

fn register(vm: &mut LuaVM, name: &'static str, callback: NativeCallback) {
    let key = vm.intern(name);
    vm.globals
        .insert(key, LuaValue::Native(Rc::new(NativeFn { name, callback })));
}
