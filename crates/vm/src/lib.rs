//! Slate virtual machine: executes compiled bytecode.
//!
//! The VM is a stack-based machine with:
//! - An operand stack for intermediate values
//! - A fixed-size locals array indexed by resolver slots
//! - A read-only constant pool
//!
//! Strings and arrays are reference counted. Arrays are shared by
//! reference, so element writes through one local are visible through
//! every alias.
//!
//! # Usage
//!
//! ```
//! use slate_common::{Instruction, Opcode, Program, Value};
//! use slate_vm::run;
//!
//! let mut code = Vec::new();
//! Instruction::with_operand(Opcode::Push, 0).encode_into(&mut code);
//! Instruction::with_operand(Opcode::Push, 1).encode_into(&mut code);
//! Instruction::simple(Opcode::IAdd).encode_into(&mut code);
//! let program = Program::new(code, vec![Value::Int(40), Value::Int(2)]);
//!
//! let result = run(&program, 0).unwrap();
//! assert_eq!(result, Some(Value::Int(42)));
//! ```

pub mod config;
pub mod error;
pub mod execute;
pub mod machine;

pub use config::VmConfig;
pub use error::RuntimeError;
pub use machine::VM;

use slate_common::{Program, Value};

/// Execute a program with default limits and return its result.
///
/// `locals_count` sizes the locals array; for compiled programs it comes
/// from the resolver. The result is the value left on top of the operand
/// stack, or `None` when the program leaves nothing behind.
///
/// # Errors
///
/// Returns [`RuntimeError`] on the first fault (division by zero, bad slot,
/// out-of-bounds index, and so on). Execution stops there.
pub fn run(program: &Program, locals_count: usize) -> Result<Option<Value>, RuntimeError> {
    run_with_config(program, locals_count, VmConfig::default())
}

/// Execute a program under explicit limits.
pub fn run_with_config(
    program: &Program,
    locals_count: usize,
    config: VmConfig,
) -> Result<Option<Value>, RuntimeError> {
    let mut vm = VM::with_config(program.clone(), locals_count, config);
    vm.execute()
}
