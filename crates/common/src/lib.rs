//! Slate common types and bytecode encoding.
//!
//! This crate provides the data structures shared by the Slate compiler
//! and virtual machine:
//!
//! - [`Value`]: tagged runtime values with reference-counted strings and arrays
//! - [`VarType`] / [`BaseType`]: static and runtime type descriptors
//! - [`Opcode`]: the instruction set
//! - [`Instruction`]: one decoded instruction (opcode + optional operand)
//! - [`Program`]: an instruction stream plus its constant pool
//! - [`DecodeError`]: errors from decoding byte streams

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod types;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::{OperandKind, Opcode};
pub use program::Program;
pub use types::{BaseType, VarType};
pub use value::{ArrayValue, StringValue, Value};
