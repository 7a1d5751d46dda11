use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::lua_value::{Chunk, LuaStr, LuaTable};
use crate::lua_vm::{LuaError, LuaVM};

pub type NativeCallback = fn(&mut LuaVM, &[LuaValue]) -> Result<Vec<LuaValue>, LuaError>;

/// A native (Rust) function callable from scripts
pub struct NativeFn {
    pub name: &'static str,
    pub callback: NativeCallback,
}

/// A script closure: a prototype plus the upvalue values captured when
/// the CLOSURE instruction ran.
pub struct LuaClosure {
    pub chunk: Rc<Chunk>,
    pub upvalues: Vec<LuaValue>,
}

/// Runtime value. This language generation has no booleans: `nil` is
/// the only false value and comparisons produce `1` or `nil`.
#[derive(Clone, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Number(f64),
    Str(LuaStr),
    Table(Rc<RefCell<LuaTable>>),
    Function(Rc<LuaClosure>),
    Native(Rc<NativeFn>),
}

impl LuaValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    pub fn truthy(&self) -> bool {
        !matches!(self, LuaValue::Nil)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Number(_) => "number",
            LuaValue::Str(_) => "string",
            LuaValue::Table(_) => "table",
            LuaValue::Function(_) | LuaValue::Native(_) => "function",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Arithmetic coercion: numbers pass through, numeric strings convert
    pub(crate) fn coerce_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            LuaValue::Str(s) => str_to_number(s.as_str()),
            _ => None,
        }
    }
}

/// Identity semantics: strings are interned so pointer equality is
/// content equality; tables and functions compare by reference.
impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Number(a), LuaValue::Number(b)) => a == b,
            (LuaValue::Str(a), LuaValue::Str(b)) => LuaStr::ptr_eq(a, b),
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Native(a), LuaValue::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            LuaValue::Str(s) => write!(f, "{:?}", s.as_str()),
            LuaValue::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            LuaValue::Function(c) => write!(f, "function: {:p}", Rc::as_ptr(c)),
            LuaValue::Native(n) => write!(f, "function: builtin: {}", n.name),
        }
    }
}

/// Convert a number to its display form. Integral values use itoa so
/// `1 .. ""` yields `"1"`, not `"1.0"`.
pub fn number_to_string(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 9e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(n as i64).to_string()
    } else {
        format!("{}", n)
    }
}

/// Lenient string-to-number conversion used by arithmetic coercion and
/// `tonumber`.
pub fn str_to_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Display form used by `print`, `tostring` and error messages
pub fn value_to_display(v: &LuaValue) -> String {
    match v {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Number(n) => number_to_string(*n),
        LuaValue::Str(s) => s.as_str().to_string(),
        LuaValue::Table(t) => format!("table: {:p}", Rc::as_ptr(t)),
        LuaValue::Function(f) => format!("function: {:p}", Rc::as_ptr(f)),
        LuaValue::Native(f) => format!("function: builtin: {}", f.name),
    }
}
