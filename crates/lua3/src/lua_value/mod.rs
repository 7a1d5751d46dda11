mod chunk;
mod lua_table;
mod lua_value;
mod string_interner;

pub use chunk::{Chunk, LocVar};
pub use lua_table::{LuaKey, LuaTable};
pub use lua_value::{
    LuaClosure, LuaValue, NativeCallback, NativeFn, number_to_string, str_to_number,
    value_to_display,
};
pub use string_interner::{LuaStr, StringInterner};
