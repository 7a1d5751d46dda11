mod instruction;

pub use instruction::Instruction;

/// Instruction operand forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// opcode only
    Op,
    /// opcode + unsigned wide operand
    OpU,
    /// opcode + signed wide operand
    OpS,
    /// opcode + A/B pair
    OpAB,
}

/// Classic v3 stack-machine opcode set (41 opcodes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    EndCode = 0, // function terminator
    PushNil,     // push U+1 nils
    Pop,         // pop U values
    PushInt,     // push small integer S
    PushNum,     // push number-pool[U]
    PushString,  // push string-pool[U]
    PushLocal,   // push local slot U
    PushUpvalue, // push upvalue U
    PushSelf,    // replace table with method string-pool[U] and receiver
    GetGlobal,   // push globals[string-pool[U]]
    SetLocal,    // local[U] := pop
    SetGlobal,   // globals[string-pool[U]] := pop
    GetTable,    // replace table,key with table[key]
    SetTable,    // table,key sitting U slots below receive pop
    SetTablePop, // table,key,value on top; store and pop all three
    SetList,     // bulk list init: batch A, B+1 values
    SetMap,      // bulk record init: U+1 key/value pairs
    CreateTable, // push new table with size hint U

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,

    Concat,

    // Comparisons (result is 1 or nil)
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Unary
    Minus,
    Not,

    // Control flow; S is relative to the following instruction
    Jmp,
    IfTJmp, // pop; jump if truthy
    IfFJmp, // pop; jump if falsy
    OnTJmp, // jump keeping the value if truthy, else pop
    OnFJmp, // jump keeping the value if falsy, else pop

    Call,    // call stack slot A with B results (B = MULT_RET: all)
    Closure, // make closure from child proto A capturing B pushed upvalues
    RetCode, // return everything above local slot U
    SetLine, // debug: current source line is U
}

impl OpCode {
    pub fn from_u8(raw: u8) -> Option<OpCode> {
        use OpCode::*;
        Some(match raw {
            0 => EndCode,
            1 => PushNil,
            2 => Pop,
            3 => PushInt,
            4 => PushNum,
            5 => PushString,
            6 => PushLocal,
            7 => PushUpvalue,
            8 => PushSelf,
            9 => GetGlobal,
            10 => SetLocal,
            11 => SetGlobal,
            12 => GetTable,
            13 => SetTable,
            14 => SetTablePop,
            15 => SetList,
            16 => SetMap,
            17 => CreateTable,
            18 => Add,
            19 => Sub,
            20 => Mul,
            21 => Div,
            22 => Pow,
            23 => Concat,
            24 => Eq,
            25 => Ne,
            26 => Lt,
            27 => Le,
            28 => Gt,
            29 => Ge,
            30 => Minus,
            31 => Not,
            32 => Jmp,
            33 => IfTJmp,
            34 => IfFJmp,
            35 => OnTJmp,
            36 => OnFJmp,
            37 => Call,
            38 => Closure,
            39 => RetCode,
            40 => SetLine,
            _ => return None,
        })
    }

    pub fn mode(self) -> OpMode {
        use OpCode::*;
        match self {
            EndCode | GetTable | SetTablePop | Add | Sub | Mul | Div | Pow | Concat | Eq | Ne
            | Lt | Le | Gt | Ge | Minus | Not => OpMode::Op,
            PushNil | Pop | PushNum | PushString | PushLocal | PushUpvalue | PushSelf
            | GetGlobal | SetLocal | SetGlobal | SetTable | SetMap | CreateTable | RetCode
            | SetLine => OpMode::OpU,
            PushInt | Jmp | IfTJmp | IfFJmp | OnTJmp | OnFJmp => OpMode::OpS,
            SetList | Call | Closure => OpMode::OpAB,
        }
    }

    /// Mnemonic used by the disassembler
    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            EndCode => "ENDCODE",
            PushNil => "PUSHNIL",
            Pop => "POP",
            PushInt => "PUSHINT",
            PushNum => "PUSHNUM",
            PushString => "PUSHSTRING",
            PushLocal => "PUSHLOCAL",
            PushUpvalue => "PUSHUPVALUE",
            PushSelf => "PUSHSELF",
            GetGlobal => "GETGLOBAL",
            SetLocal => "SETLOCAL",
            SetGlobal => "SETGLOBAL",
            GetTable => "GETTABLE",
            SetTable => "SETTABLE",
            SetTablePop => "SETTABLEPOP",
            SetList => "SETLIST",
            SetMap => "SETMAP",
            CreateTable => "CREATETABLE",
            Add => "ADDOP",
            Sub => "SUBOP",
            Mul => "MULTOP",
            Div => "DIVOP",
            Pow => "POWOP",
            Concat => "CONCOP",
            Eq => "EQOP",
            Ne => "NEQOP",
            Lt => "LTOP",
            Le => "LEOP",
            Gt => "GTOP",
            Ge => "GEOP",
            Minus => "MINUSOP",
            Not => "NOTOP",
            Jmp => "JMP",
            IfTJmp => "IFTJMP",
            IfFJmp => "IFFJMP",
            OnTJmp => "ONTJMP",
            OnFJmp => "ONFJMP",
            Call => "CALL",
            Closure => "CLOSURE",
            RetCode => "RETCODE",
            SetLine => "SETLINE",
        }
    }
}
