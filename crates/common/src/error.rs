//! Decode errors for Slate instruction streams.

use thiserror::Error;

/// Errors that occur while decoding bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte does not correspond to any opcode.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Instruction at `at` needs a 2-byte operand but the stream ends first.
    #[error("truncated operand for instruction at offset {at}")]
    TruncatedOperand { at: usize },

    /// Decoding started past the end of the stream.
    #[error("offset {at} is past the end of the code ({len} bytes)")]
    OutOfRange { at: usize, len: usize },
}
