//! Instruction encoding and decoding for the Slate bytecode.
//!
//! Instructions are variable width:
//! ```text
//! Byte 0:    opcode (u8)
//! Bytes 1-2: operand (u16, big-endian), present only for opcodes that take one
//! ```
//! Jump operands are `i16` offsets relative to the first byte after the
//! operand.

use crate::error::DecodeError;
use crate::opcode::{OperandKind, Opcode};

/// Width of an encoded operand, in bytes.
pub const OPERAND_WIDTH: usize = 2;

/// A single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Operand, present iff `opcode.operand_kind()` is `Some`.
    pub operand: Option<u16>,
}

impl Instruction {
    /// An instruction without an operand.
    pub fn simple(opcode: Opcode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    /// An instruction with a 2-byte operand.
    pub fn with_operand(opcode: Opcode, operand: u16) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    /// Encoded size in bytes.
    pub fn width(&self) -> usize {
        1 + self.operand.map_or(0, |_| OPERAND_WIDTH)
    }

    /// Append the encoded bytes to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode as u8);
        if let Some(operand) = self.operand {
            out.extend_from_slice(&operand.to_be_bytes());
        }
    }

    /// Decode the instruction starting at `at`.
    pub fn decode_at(code: &[u8], at: usize) -> Result<Self, DecodeError> {
        let byte = *code.get(at).ok_or(DecodeError::OutOfRange {
            at,
            len: code.len(),
        })?;
        let opcode = Opcode::try_from(byte)?;

        let operand = match opcode.operand_kind() {
            Some(_) => Some(read_operand(code, at + 1).ok_or(DecodeError::TruncatedOperand { at })?),
            None => None,
        };

        Ok(Self { opcode, operand })
    }

    /// Signed jump distance, for jump instructions.
    pub fn jump_offset(&self) -> Option<i16> {
        match self.opcode.operand_kind() {
            Some(OperandKind::Jump) => self.operand.map(|raw| raw as i16),
            _ => None,
        }
    }

    /// Absolute jump target for a jump instruction located at `at`.
    ///
    /// Returns `None` for non-jumps and for targets before the start of the
    /// code.
    pub fn jump_target(&self, at: usize) -> Option<usize> {
        let offset = self.jump_offset()?;
        let resume = (at + self.width()) as i64;
        usize::try_from(resume + offset as i64).ok()
    }
}

/// Read a big-endian operand starting at `at`.
pub fn read_operand(code: &[u8], at: usize) -> Option<u16> {
    let hi = *code.get(at)?;
    let lo = *code.get(at + 1)?;
    Some(u16::from_be_bytes([hi, lo]))
}

/// Iterator over `(offset, instruction)` pairs of a code buffer.
///
/// Decoding errors are yielded in place; after an error the iterator
/// resumes at the next byte.
pub struct Instructions<'a> {
    code: &'a [u8],
    at: usize,
}

impl<'a> Instructions<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, at: 0 }
    }
}

impl Iterator for Instructions<'_> {
    type Item = (usize, Result<Instruction, DecodeError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.at >= self.code.len() {
            return None;
        }
        let at = self.at;
        let decoded = Instruction::decode_at(self.code, at);
        self.at += match &decoded {
            Ok(instr) => instr.width(),
            Err(_) => 1,
        };
        Some((at, decoded))
    }
}
