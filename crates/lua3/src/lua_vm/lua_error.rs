/// Error surface of the runtime.
///
/// Both variants carry a fully formatted message; compile errors
/// include `chunk:line:` context, runtime errors include the
/// `source:line:` context fed by SETLINE when debug info is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuaError {
    Compile(String),
    Runtime(String),
}

impl std::fmt::Display for LuaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LuaError::Compile(msg) => write!(f, "{}", msg),
            LuaError::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for LuaError {}

pub type LuaResult<T> = Result<T, LuaError>;
