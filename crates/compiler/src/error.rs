//! Code generation errors.
//!
//! The generator trusts the frontend's annotations. These errors surface a
//! broken contract (a tree that skipped resolution or type checking) or a
//! program too large for the 16-bit operand encoding.

use slate_common::VarType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A variable reference the resolver never bound.
    #[error("line {line}: variable '{name}' has no slot")]
    UnresolvedSlot { line: usize, name: String },

    /// An expression the type checker never annotated.
    #[error("line {line}: expression has no type")]
    UntypedExpression { line: usize },

    /// No opcode implements `op` for operands of type `ty`.
    #[error("line {line}: no instruction for '{op}' on {ty}")]
    UnsupportedType {
        line: usize,
        op: &'static str,
        ty: VarType,
    },

    /// The constant pool is full.
    #[error("constant pool overflow (limit {limit} entries)")]
    TooManyConstants { limit: usize },

    /// A jump distance does not fit in a signed 16-bit operand.
    #[error("jump at offset {at} spans {distance} bytes, outside the 16-bit range")]
    JumpTooFar { at: usize, distance: i64 },

    /// An array literal with more elements than a count operand can hold.
    #[error("line {line}: array literal has {len} elements (limit {limit})")]
    ArrayTooLong {
        line: usize,
        len: usize,
        limit: usize,
    },
}
