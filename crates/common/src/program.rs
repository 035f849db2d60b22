//! Compiled program representation.
//!
//! A program is the hand-off between the code generator and the VM: a
//! flat instruction stream plus the constant pool its `PUSH` instructions
//! index into. Nothing here is persisted; programs live for one process.

use crate::instruction::Instructions;
use crate::value::Value;

/// Maximum number of constant-pool entries addressable by a 16-bit index.
pub const MAX_CONSTANTS: usize = u16::MAX as usize + 1;

/// A compiled Slate program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream.
    pub code: Vec<u8>,
    /// Constant pool, indexed by `PUSH` operands.
    pub constants: Vec<Value>,
}

impl Program {
    /// Create a program from raw code and constants.
    pub fn new(code: Vec<u8>, constants: Vec<Value>) -> Self {
        Self { code, constants }
    }

    /// Size of the instruction stream in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if the program has no code.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Iterate over the decoded instructions with their byte offsets.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.code)
    }
}
