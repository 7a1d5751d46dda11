use ahash::RandomState;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::lua_value::{LuaClosure, LuaStr, LuaValue, NativeFn};

/// Normalised table key. Numbers are stored as bits (with `-0.0`
/// folded into `0.0`); strings by interned identity; reference values
/// by address, keeping the referent alive.
#[derive(Clone)]
pub enum LuaKey {
    Number(u64),
    Str(LuaStr),
    Table(Rc<RefCell<LuaTable>>),
    Function(Rc<LuaClosure>),
    Native(Rc<NativeFn>),
}

impl LuaKey {
    pub fn from_number(n: f64) -> Option<LuaKey> {
        if n.is_nan() {
            return None;
        }
        let n = if n == 0.0 { 0.0 } else { n };
        Some(LuaKey::Number(n.to_bits()))
    }

    /// `None` for values that cannot index a table (nil, NaN)
    pub fn from_value(v: &LuaValue) -> Option<LuaKey> {
        match v {
            LuaValue::Nil => None,
            LuaValue::Number(n) => LuaKey::from_number(*n),
            LuaValue::Str(s) => Some(LuaKey::Str(s.clone())),
            LuaValue::Table(t) => Some(LuaKey::Table(t.clone())),
            LuaValue::Function(f) => Some(LuaKey::Function(f.clone())),
            LuaValue::Native(f) => Some(LuaKey::Native(f.clone())),
        }
    }
}

impl PartialEq for LuaKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaKey::Number(a), LuaKey::Number(b)) => a == b,
            (LuaKey::Str(a), LuaKey::Str(b)) => LuaStr::ptr_eq(a, b),
            (LuaKey::Table(a), LuaKey::Table(b)) => Rc::ptr_eq(a, b),
            (LuaKey::Function(a), LuaKey::Function(b)) => Rc::ptr_eq(a, b),
            (LuaKey::Native(a), LuaKey::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for LuaKey {}

impl Hash for LuaKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            LuaKey::Number(bits) => {
                state.write_u8(0);
                state.write_u64(*bits);
            }
            LuaKey::Str(s) => {
                state.write_u8(1);
                s.hash(state);
            }
            LuaKey::Table(t) => {
                state.write_u8(2);
                state.write_usize(Rc::as_ptr(t) as usize);
            }
            LuaKey::Function(f) => {
                state.write_u8(3);
                state.write_usize(Rc::as_ptr(f) as usize);
            }
            LuaKey::Native(f) => {
                state.write_u8(4);
                state.write_usize(Rc::as_ptr(f) as usize);
            }
        }
    }
}

pub struct LuaTable {
    map: HashMap<LuaKey, LuaValue, RandomState>,
}

impl LuaTable {
    pub fn new() -> Self {
        LuaTable {
            map: HashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn with_capacity(hint: usize) -> Self {
        LuaTable {
            map: HashMap::with_capacity_and_hasher(hint, RandomState::new()),
        }
    }

    pub fn get(&self, key: &LuaKey) -> LuaValue {
        self.map.get(key).cloned().unwrap_or(LuaValue::Nil)
    }

    /// Reading an unindexable key yields nil rather than an error
    pub fn get_value(&self, key: &LuaValue) -> LuaValue {
        match LuaKey::from_value(key) {
            Some(k) => self.get(&k),
            None => LuaValue::Nil,
        }
    }

    pub fn get_str(&self, key: &LuaStr) -> LuaValue {
        self.get(&LuaKey::Str(key.clone()))
    }

    /// Storing nil removes the entry
    pub fn set(&mut self, key: LuaKey, value: LuaValue) {
        if value.is_nil() {
            self.map.remove(&key);
        } else {
            self.map.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaKey, &LuaValue)> {
        self.map.iter()
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new()
    }
}
