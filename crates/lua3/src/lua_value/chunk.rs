use std::fmt::Write as _;
use std::rc::Rc;

use crate::lua_value::{LuaStr, number_to_string};
use crate::lua_vm::{Instruction, OpCode, OpMode};

/// Local-variable debug record. `name: None` marks a scope close; the
/// vector ends with one unnamed sentinel entry.
#[derive(Debug, Clone)]
pub struct LocVar {
    pub name: Option<LuaStr>,
    pub line: u32,
}

/// A compiled function prototype: the instruction stream, its constant
/// pools, nested prototypes and metadata. Produced by the compiler,
/// consumed by the executor.
pub struct Chunk {
    pub code: Vec<u32>,
    pub strings: Vec<LuaStr>,
    pub numbers: Vec<f64>,
    pub protos: Vec<Rc<Chunk>>,
    pub num_params: u8,
    pub is_vararg: bool,
    pub max_stack: u32,
    pub source_name: Option<LuaStr>,
    /// Present only when the VM's debug flag was set at compile time
    pub locvars: Option<Vec<LocVar>>,
}

impl Chunk {
    pub fn new(source_name: Option<LuaStr>, debug_info: bool) -> Self {
        Chunk {
            code: Vec::new(),
            strings: Vec::new(),
            numbers: Vec::new(),
            protos: Vec::new(),
            num_params: 0,
            is_vararg: false,
            max_stack: 0,
            source_name,
            locvars: if debug_info { Some(Vec::new()) } else { None },
        }
    }

    pub fn source(&self) -> &str {
        self.source_name.as_ref().map(|s| s.as_str()).unwrap_or("?")
    }

    /// Render the instruction stream (and nested prototypes) mnemonically
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        self.disassemble_into(&mut out, 0);
        out
    }

    fn disassemble_into(&self, out: &mut String, level: usize) {
        let indent = "  ".repeat(level);
        let _ = writeln!(
            out,
            "{}function <{}> ({} params{}, max stack {}, {} instructions)",
            indent,
            self.source(),
            self.num_params,
            if self.is_vararg { ", vararg" } else { "" },
            self.max_stack,
            self.code.len()
        );
        for (pc, &inst) in self.code.iter().enumerate() {
            let Some(op) = Instruction::get_opcode(inst) else {
                let _ = writeln!(out, "{}  {:4}  ??? {:#010x}", indent, pc, inst);
                continue;
            };
            let _ = write!(out, "{}  {:4}  {:<12}", indent, pc, op.name());
            match op.mode() {
                OpMode::Op => {}
                OpMode::OpU => {
                    let u = Instruction::get_u(inst);
                    let _ = write!(out, "{}", u);
                    match op {
                        OpCode::PushString | OpCode::GetGlobal | OpCode::SetGlobal
                        | OpCode::PushSelf => {
                            if let Some(s) = self.strings.get(u as usize) {
                                let _ = write!(out, "  ; {:?}", s.as_str());
                            }
                        }
                        OpCode::PushNum => {
                            if let Some(n) = self.numbers.get(u as usize) {
                                let _ = write!(out, "  ; {}", number_to_string(*n));
                            }
                        }
                        _ => {}
                    }
                }
                OpMode::OpS => {
                    let s = Instruction::get_s(inst);
                    let _ = write!(out, "{}", s);
                    if matches!(
                        op,
                        OpCode::Jmp
                            | OpCode::IfTJmp
                            | OpCode::IfFJmp
                            | OpCode::OnTJmp
                            | OpCode::OnFJmp
                    ) {
                        let _ = write!(out, "  ; to {}", pc as i64 + 1 + s as i64);
                    }
                }
                OpMode::OpAB => {
                    let _ = write!(
                        out,
                        "{} {}",
                        Instruction::get_a(inst),
                        Instruction::get_b(inst)
                    );
                }
            }
            let _ = writeln!(out);
        }
        for proto in &self.protos {
            proto.disassemble_into(out, level + 1);
        }
    }
}
