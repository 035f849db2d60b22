//! Slate code generator: typed AST to bytecode.
//!
//! The generator trusts the frontend: it performs no semantic validation
//! and reports a [`CodegenError`] only when the tree breaks that contract
//! or the program exceeds what 16-bit operands can encode.
//!
//! # Usage
//!
//! ```
//! use slate_compiler::{compile, compile_source, disassemble};
//!
//! let typed = slate_frontend::analyze("int x = 40; x + 2;").unwrap();
//! let program = compile(&typed).unwrap();
//! assert_eq!(program.constants.len(), 2);
//!
//! let listing = disassemble(&compile_source("1 + 2;").unwrap());
//! assert!(listing.contains("IADD"));
//! ```

pub mod disassembler;
pub mod emitter;
pub mod error;

mod codegen;

pub use disassembler::{disassemble, render_constants};
pub use error::CodegenError;

use slate_common::Program;
use slate_frontend::{FrontendError, TypedProgram};
use thiserror::Error;
use tracing::debug;

use codegen::Codegen;

/// Compile a type-checked program.
pub fn compile(program: &TypedProgram) -> Result<Program, CodegenError> {
    let mut codegen = Codegen::new();
    codegen.block(&program.statements)?;
    let compiled = codegen.emitter.finish();
    debug!(
        code_bytes = compiled.len(),
        constants = compiled.constants.len(),
        locals = program.locals_count(),
        "compiled"
    );
    Ok(compiled)
}

/// Errors from the whole source-to-bytecode pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error("code generation failed: {0}")]
    Codegen(#[from] CodegenError),
}

/// Analyze and compile source text in one step.
pub fn compile_source(source: &str) -> Result<Program, CompileError> {
    let typed = slate_frontend::analyze(source)?;
    Ok(compile(&typed)?)
}
