//! Bytecode buffer with constant pool and jump fix-ups.
//!
//! Forward jumps are emitted with a zero placeholder operand. The caller
//! keeps the returned [`JumpPatch`] and calls [`Emitter::patch_jump`] once
//! the jumped-over code is in place.

use slate_common::instruction::{Instruction, OPERAND_WIDTH};
use slate_common::program::MAX_CONSTANTS;
use slate_common::{Opcode, Program, Value};
use tracing::trace;

use crate::error::CodegenError;

/// Position of a jump operand awaiting its final distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a forward jump must be patched"]
pub struct JumpPatch {
    operand_at: usize,
}

#[derive(Debug, Default)]
pub struct Emitter {
    code: Vec<u8>,
    constants: Vec<Value>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next instruction will be written at.
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    pub fn emit(&mut self, opcode: Opcode) {
        Instruction::simple(opcode).encode_into(&mut self.code);
    }

    pub fn emit_with(&mut self, opcode: Opcode, operand: u16) {
        Instruction::with_operand(opcode, operand).encode_into(&mut self.code);
    }

    /// Append `value` to the constant pool and return its index.
    pub fn add_constant(&mut self, value: Value) -> Result<u16, CodegenError> {
        let index = u16::try_from(self.constants.len()).map_err(|_| {
            CodegenError::TooManyConstants {
                limit: MAX_CONSTANTS,
            }
        })?;
        self.constants.push(value);
        Ok(index)
    }

    /// Emit a `PUSH` of a new constant.
    pub fn emit_constant(&mut self, value: Value) -> Result<(), CodegenError> {
        let index = self.add_constant(value)?;
        self.emit_with(Opcode::Push, index);
        Ok(())
    }

    /// Emit a forward jump with a placeholder distance.
    pub fn emit_jump(&mut self, opcode: Opcode) -> JumpPatch {
        self.emit_with(opcode, 0);
        JumpPatch {
            operand_at: self.code.len() - OPERAND_WIDTH,
        }
    }

    /// Point a forward jump at the current end of the code.
    pub fn patch_jump(&mut self, patch: JumpPatch) -> Result<(), CodegenError> {
        let resume = patch.operand_at + OPERAND_WIDTH;
        let distance = (self.code.len() - resume) as i64;
        let operand = encode_distance(patch.operand_at - 1, distance)?;
        self.code[patch.operand_at..resume].copy_from_slice(&operand.to_be_bytes());
        trace!(at = patch.operand_at - 1, distance, "patched jump");
        Ok(())
    }

    /// Emit an unconditional backward jump to `loop_start`.
    pub fn emit_loop(&mut self, loop_start: usize) -> Result<(), CodegenError> {
        let at = self.offset();
        let distance = loop_start as i64 - at as i64 - Opcode::Jmp.width() as i64;
        let operand = encode_distance(at, distance)?;
        self.emit_with(Opcode::Jmp, operand);
        trace!(at, distance, "loop jump");
        Ok(())
    }

    pub fn finish(self) -> Program {
        Program::new(self.code, self.constants)
    }
}

fn encode_distance(at: usize, distance: i64) -> Result<u16, CodegenError> {
    i16::try_from(distance)
        .map(|d| d as u16)
        .map_err(|_| CodegenError::JumpTooFar { at, distance })
}
