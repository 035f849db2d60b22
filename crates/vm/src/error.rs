//! Runtime errors for the Slate VM.
//!
//! Every fault is detected before the offending access and carries the
//! byte offset of the faulting instruction's opcode (`at`).

use slate_common::VarType;
use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Pop from an empty operand stack.
    #[error("stack underflow at offset {at}")]
    StackUnderflow { at: usize },

    /// Push beyond the configured stack depth.
    #[error("stack overflow (depth {depth}) at offset {at}")]
    StackOverflow { at: usize, depth: usize },

    /// Locals slot index not smaller than the locals array size.
    #[error("invalid slot {slot} (locals size {size}) at offset {at}")]
    InvalidSlot { at: usize, slot: u16, size: usize },

    /// `PUSH` of a constant index past the end of the pool.
    #[error("invalid constant {index} (pool size {size}) at offset {at}")]
    InvalidConstant { at: usize, index: u16, size: usize },

    #[error("division by zero at offset {at}")]
    DivisionByZero { at: usize },

    #[error("modulo by zero at offset {at}")]
    ModuloByZero { at: usize },

    /// Opcode byte that names no instruction.
    #[error("unknown opcode {byte:#04x} at offset {at}")]
    UnknownOpcode { at: usize, byte: u8 },

    /// The code ends inside an instruction's operand.
    #[error("truncated operand at offset {at}")]
    TruncatedOperand { at: usize },

    /// Operand of the wrong runtime type for the instruction.
    #[error("type mismatch at offset {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: usize,
        expected: &'static str,
        found: VarType,
    },

    /// Array index negative or not smaller than the array length.
    #[error("array index {index} out of bounds (length {length}) at offset {at}")]
    IndexOutOfBounds { at: usize, index: i32, length: usize },

    /// Jump target outside the code buffer.
    #[error("jump to {target} outside the code at offset {at}")]
    JumpOutOfBounds { at: usize, target: i64 },

    /// The configured instruction budget ran out.
    #[error("step limit of {limit} exceeded at offset {at}")]
    StepLimitExceeded { at: usize, limit: u64 },
}

impl RuntimeError {
    /// Offset of the instruction that faulted.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::StackUnderflow { at }
            | RuntimeError::StackOverflow { at, .. }
            | RuntimeError::InvalidSlot { at, .. }
            | RuntimeError::InvalidConstant { at, .. }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ModuloByZero { at }
            | RuntimeError::UnknownOpcode { at, .. }
            | RuntimeError::TruncatedOperand { at }
            | RuntimeError::TypeMismatch { at, .. }
            | RuntimeError::IndexOutOfBounds { at, .. }
            | RuntimeError::JumpOutOfBounds { at, .. }
            | RuntimeError::StepLimitExceeded { at, .. } => *at,
        }
    }
}
