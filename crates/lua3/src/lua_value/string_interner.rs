use ahash::RandomState;
use smol_str::SmolStr;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

/// Sentinel for "no cached constant index yet"
const NO_CONST_HINT: u32 = u32::MAX;

pub struct LuaStrData {
    text: SmolStr,
    hash: u64,
    /// Cached index into some prototype's string constant vector.
    /// Only a hint: the compiler validates it against the pool it is
    /// actually filling before trusting it.
    const_hint: Cell<u32>,
}

/// An interned string. Equality and hashing are by identity; the
/// interner guarantees one allocation per distinct content.
#[derive(Clone)]
pub struct LuaStr(Rc<LuaStrData>);

impl LuaStr {
    pub fn as_str(&self) -> &str {
        self.0.text.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.text.is_empty()
    }

    pub fn ptr_eq(a: &LuaStr, b: &LuaStr) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn const_hint(&self) -> u32 {
        self.0.const_hint.get()
    }

    pub(crate) fn set_const_hint(&self, index: u32) {
        self.0.const_hint.set(index);
    }
}

impl PartialEq for LuaStr {
    fn eq(&self, other: &Self) -> bool {
        LuaStr::ptr_eq(self, other)
    }
}

impl Eq for LuaStr {}

impl Hash for LuaStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for LuaStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for LuaStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// All strings in the system pass through here, compile-time names and
/// runtime concatenation results alike, so identity comparison is
/// sufficient everywhere.
pub struct StringInterner {
    map: HashMap<SmolStr, LuaStr, RandomState>,
    hash_builder: RandomState,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            map: HashMap::with_capacity_and_hasher(256, RandomState::new()),
            hash_builder: RandomState::new(),
        }
    }

    pub fn intern(&mut self, s: &str) -> LuaStr {
        if let Some(found) = self.map.get(s) {
            return found.clone();
        }
        let key = SmolStr::new(s);
        let hash = self.hash_builder.hash_one(key.as_str());
        let interned = LuaStr(Rc::new(LuaStrData {
            text: key.clone(),
            hash,
            const_hint: Cell::new(NO_CONST_HINT),
        }));
        self.map.insert(key, interned.clone());
        interned
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
