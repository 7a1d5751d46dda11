// Single-pass bytecode compiler: parsing and code emission are one
// interleaved phase with no intermediate tree.
mod code;
mod constants;
mod expdesc;
mod expr;
mod func_state;
pub mod parser;
mod parse_literal;
mod stmt;
mod var;

pub use expdesc::{ConsKind, ExpDesc, ExpList, UpvalDesc};
pub use func_state::FuncState;
pub use parser::CompileError;

use crate::compiler::parser::{TokenStream, TokenKind};
use crate::lua_value::{Chunk, LuaStr};
use crate::lua_vm::{LuaError, LuaVM};

pub struct Compiler<'a> {
    pub(crate) lex: TokenStream<'a>,
    pub(crate) vm: &'a mut LuaVM,
    /// Stack of open function bodies; last is current, element 0 is the
    /// main chunk
    pub(crate) funcs: Vec<FuncState>,
    pub(crate) source: Option<LuaStr>,
    pub(crate) debug_info: bool,
}

impl<'a> Compiler<'a> {
    /// Compile source text into a prototype using the VM's interner and
    /// global table.
    pub fn compile(vm: &mut LuaVM, text: &str) -> Result<Chunk, LuaError> {
        Self::compile_with_name(vm, text, "chunk")
    }

    pub fn compile_with_name(
        vm: &mut LuaVM,
        text: &str,
        chunk_name: &str,
    ) -> Result<Chunk, LuaError> {
        let debug_info = vm.debug_info();
        let source = vm.intern(chunk_name);
        let lex = match TokenStream::new(text) {
            Ok(lex) => lex,
            Err(err) => return Err(beautify(chunk_name, err)),
        };
        let mut compiler = Compiler {
            lex,
            vm,
            funcs: Vec::new(),
            source: Some(source),
            debug_info,
        };
        stmt::mainfunc(&mut compiler).map_err(|err| beautify(chunk_name, err))
    }

    pub(crate) fn fs(&mut self) -> &mut FuncState {
        // non-empty from mainfunc's open_func until it closes
        self.funcs.last_mut().unwrap()
    }

    pub(crate) fn fs_ref(&self) -> &FuncState {
        self.funcs.last().unwrap()
    }

    /// Raise a compile error at the current token, quoting it
    pub(crate) fn error<T>(&self, msg: impl AsRef<str>) -> Result<T, CompileError> {
        let near = if self.lex.current_kind() == TokenKind::TkEof {
            "<eof>"
        } else {
            self.lex.current_text()
        };
        Err(CompileError::new(
            format!("{} near '{}'", msg.as_ref(), near),
            self.lex.line,
        ))
    }

    /// Raise a compile error without token context
    pub(crate) fn error_plain<T>(&self, msg: impl Into<String>) -> Result<T, CompileError> {
        Err(CompileError::new(msg, self.lex.line))
    }
}

fn beautify(chunk_name: &str, err: CompileError) -> LuaError {
    LuaError::Compile(format!("{}:{}: {}", chunk_name, err.line, err.message))
}

/// Open a fresh function body; the new record's parent is the previous
/// top of the stack.
pub(crate) fn open_func(c: &mut Compiler) {
    let fs = FuncState::new(c.source.clone(), c.debug_info);
    c.funcs.push(fs);
}

/// Close the current function: terminate the code, trim every vector to
/// its used length, append the debug sentinel, and hand the prototype
/// plus captured upvalues back to the caller.
pub(crate) fn close_func(c: &mut Compiler) -> Result<(Chunk, Vec<UpvalDesc>), CompileError> {
    code::code_o(c, crate::lua_vm::OpCode::EndCode, 0)?;
    let mut fs = c.funcs.pop().unwrap();
    if let Some(vars) = fs.chunk.locvars.as_mut() {
        vars.push(crate::lua_value::LocVar { name: None, line: 0 });
        vars.shrink_to_fit();
    }
    fs.chunk.code.shrink_to_fit();
    fs.chunk.strings.shrink_to_fit();
    fs.chunk.numbers.shrink_to_fit();
    fs.chunk.protos.shrink_to_fit();
    Ok((fs.chunk, fs.upvalues))
}
