//! Opcode definitions for the Slate bytecode.
//!
//! Every instruction is one opcode byte, optionally followed by a 2-byte
//! big-endian operand. Opcodes are grouped by high nibble.

use crate::error::DecodeError;

/// Identifies the operation to perform.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack push
    /// Push a clone of constant `operand`.
    Push = 0x01,
    /// Push `true`.
    PushTrue = 0x02,
    /// Push `false`.
    PushFalse = 0x03,
    /// Pop `operand` values and push them as a new array in source order.
    PushArray = 0x04,

    // Integer arithmetic
    IAdd = 0x10,
    ISub = 0x11,
    IMul = 0x12,
    /// Truncating division. A zero divisor is a runtime fault.
    IDiv = 0x13,
    /// Remainder with the sign of the dividend. A zero divisor is a runtime fault.
    IMod = 0x14,
    INeg = 0x15,

    // Comparison
    IGt = 0x20,
    IGte = 0x21,
    ILt = 0x22,
    ILte = 0x23,
    IEq = 0x24,
    INeq = 0x25,
    BEq = 0x26,
    BNeq = 0x27,

    // Logic
    Not = 0x30,

    // Locals: store pops into slot `operand`, load pushes from it
    IStore = 0x40,
    ILoad = 0x41,
    BStore = 0x42,
    BLoad = 0x43,
    SStore = 0x44,
    SLoad = 0x45,
    ArrStore = 0x46,
    ArrLoad = 0x47,

    // Compound assignment: pop rhs, update slot `operand` in place
    IAddStore = 0x50,
    ISubStore = 0x51,
    IMulStore = 0x52,
    IDivStore = 0x53,

    // Control flow: operand is a signed offset from the next instruction
    /// Unconditional jump.
    Jmp = 0x60,
    /// Pop a bool and jump if it is false.
    Jmpn = 0x61,
    /// Jump if the top bool is false, leaving it; otherwise pop it.
    JmpnKeep = 0x62,
    /// Jump if the top bool is true, leaving it; otherwise pop it.
    JmptKeep = 0x63,

    // Strings and arrays
    /// Pop two strings, push their concatenation.
    SConcat = 0x70,
    /// Pop index, pop array, push element.
    ArrLoadIdx = 0x71,
    /// Pop value, pop index, pop array, replace element.
    ArrStoreIdx = 0x72,
}

/// All valid opcodes, in definition order.
pub const ALL_OPCODES: [Opcode; 38] = [
    Opcode::Push,
    Opcode::PushTrue,
    Opcode::PushFalse,
    Opcode::PushArray,
    Opcode::IAdd,
    Opcode::ISub,
    Opcode::IMul,
    Opcode::IDiv,
    Opcode::IMod,
    Opcode::INeg,
    Opcode::IGt,
    Opcode::IGte,
    Opcode::ILt,
    Opcode::ILte,
    Opcode::IEq,
    Opcode::INeq,
    Opcode::BEq,
    Opcode::BNeq,
    Opcode::Not,
    Opcode::IStore,
    Opcode::ILoad,
    Opcode::BStore,
    Opcode::BLoad,
    Opcode::SStore,
    Opcode::SLoad,
    Opcode::ArrStore,
    Opcode::ArrLoad,
    Opcode::IAddStore,
    Opcode::ISubStore,
    Opcode::IMulStore,
    Opcode::IDivStore,
    Opcode::Jmp,
    Opcode::Jmpn,
    Opcode::JmpnKeep,
    Opcode::JmptKeep,
    Opcode::SConcat,
    Opcode::ArrLoadIdx,
    Opcode::ArrStoreIdx,
];

/// How the 2-byte operand following an opcode is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Index into the constant pool.
    Constant,
    /// Element count.
    Count,
    /// Index into the locals array.
    Slot,
    /// Signed relative jump distance.
    Jump,
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Opcode::Push),
            0x02 => Ok(Opcode::PushTrue),
            0x03 => Ok(Opcode::PushFalse),
            0x04 => Ok(Opcode::PushArray),

            0x10 => Ok(Opcode::IAdd),
            0x11 => Ok(Opcode::ISub),
            0x12 => Ok(Opcode::IMul),
            0x13 => Ok(Opcode::IDiv),
            0x14 => Ok(Opcode::IMod),
            0x15 => Ok(Opcode::INeg),

            0x20 => Ok(Opcode::IGt),
            0x21 => Ok(Opcode::IGte),
            0x22 => Ok(Opcode::ILt),
            0x23 => Ok(Opcode::ILte),
            0x24 => Ok(Opcode::IEq),
            0x25 => Ok(Opcode::INeq),
            0x26 => Ok(Opcode::BEq),
            0x27 => Ok(Opcode::BNeq),

            0x30 => Ok(Opcode::Not),

            0x40 => Ok(Opcode::IStore),
            0x41 => Ok(Opcode::ILoad),
            0x42 => Ok(Opcode::BStore),
            0x43 => Ok(Opcode::BLoad),
            0x44 => Ok(Opcode::SStore),
            0x45 => Ok(Opcode::SLoad),
            0x46 => Ok(Opcode::ArrStore),
            0x47 => Ok(Opcode::ArrLoad),

            0x50 => Ok(Opcode::IAddStore),
            0x51 => Ok(Opcode::ISubStore),
            0x52 => Ok(Opcode::IMulStore),
            0x53 => Ok(Opcode::IDivStore),

            0x60 => Ok(Opcode::Jmp),
            0x61 => Ok(Opcode::Jmpn),
            0x62 => Ok(Opcode::JmpnKeep),
            0x63 => Ok(Opcode::JmptKeep),

            0x70 => Ok(Opcode::SConcat),
            0x71 => Ok(Opcode::ArrLoadIdx),
            0x72 => Ok(Opcode::ArrStoreIdx),

            _ => Err(DecodeError::UnknownOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the mnemonic used by the disassembler.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Push => "PUSH",
            Opcode::PushTrue => "PUSH_TRUE",
            Opcode::PushFalse => "PUSH_FALSE",
            Opcode::PushArray => "PUSH_ARRAY",
            Opcode::IAdd => "IADD",
            Opcode::ISub => "ISUB",
            Opcode::IMul => "IMUL",
            Opcode::IDiv => "IDIV",
            Opcode::IMod => "IMOD",
            Opcode::INeg => "INEG",
            Opcode::IGt => "IGT",
            Opcode::IGte => "IGTE",
            Opcode::ILt => "ILT",
            Opcode::ILte => "ILTE",
            Opcode::IEq => "IEQ",
            Opcode::INeq => "INEQ",
            Opcode::BEq => "BEQ",
            Opcode::BNeq => "BNEQ",
            Opcode::Not => "NOT",
            Opcode::IStore => "ISTORE",
            Opcode::ILoad => "ILOAD",
            Opcode::BStore => "BSTORE",
            Opcode::BLoad => "BLOAD",
            Opcode::SStore => "SSTORE",
            Opcode::SLoad => "SLOAD",
            Opcode::ArrStore => "ARRSTORE",
            Opcode::ArrLoad => "ARRLOAD",
            Opcode::IAddStore => "IADDSTORE",
            Opcode::ISubStore => "ISUBSTORE",
            Opcode::IMulStore => "IMULSTORE",
            Opcode::IDivStore => "IDIVSTORE",
            Opcode::Jmp => "JMP",
            Opcode::Jmpn => "JMPN",
            Opcode::JmpnKeep => "JMPN_KEEP",
            Opcode::JmptKeep => "JMPT_KEEP",
            Opcode::SConcat => "SCONCAT",
            Opcode::ArrLoadIdx => "ARRLOADIDX",
            Opcode::ArrStoreIdx => "ARRSTOREIDX",
        }
    }

    /// The kind of operand this opcode carries, or `None` for single-byte
    /// instructions.
    pub fn operand_kind(&self) -> Option<OperandKind> {
        match self {
            Opcode::Push => Some(OperandKind::Constant),
            Opcode::PushArray => Some(OperandKind::Count),
            Opcode::IStore
            | Opcode::ILoad
            | Opcode::BStore
            | Opcode::BLoad
            | Opcode::SStore
            | Opcode::SLoad
            | Opcode::ArrStore
            | Opcode::ArrLoad
            | Opcode::IAddStore
            | Opcode::ISubStore
            | Opcode::IMulStore
            | Opcode::IDivStore => Some(OperandKind::Slot),
            Opcode::Jmp | Opcode::Jmpn | Opcode::JmpnKeep | Opcode::JmptKeep => {
                Some(OperandKind::Jump)
            }
            _ => None,
        }
    }

    /// Encoded size of an instruction with this opcode, in bytes.
    pub fn width(&self) -> usize {
        if self.operand_kind().is_some() {
            3
        } else {
            1
        }
    }
}
