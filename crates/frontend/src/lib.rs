//! Slate frontend: source text to a typed, slot-resolved AST.
//!
//! Four passes, each of which stops at the first error:
//! 1. [`lexer::tokenize`]: characters to tokens
//! 2. [`parser::parse`]: tokens to statements
//! 3. [`resolver::resolve`]: names to locals slots
//! 4. [`typechecker::check`]: a [`slate_common::VarType`] on every expression
//!
//! # Usage
//!
//! ```
//! use slate_frontend::analyze;
//!
//! let program = analyze("int x = 2; x * 21;").unwrap();
//! assert_eq!(program.locals_count(), 1);
//! assert!(program.has_result());
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod typechecker;

pub use ast::TypedProgram;
pub use error::{FrontendError, SemanticError, SyntaxError};

use tracing::debug;

/// Run every frontend pass over `source`.
pub fn analyze(source: &str) -> Result<TypedProgram, FrontendError> {
    let tokens = lexer::tokenize(source)?;
    debug!(tokens = tokens.len(), "tokenized");

    let mut statements = parser::parse(&tokens)?;
    debug!(statements = statements.len(), "parsed");

    let slot_types = resolver::resolve(&mut statements)?;
    debug!(locals = slot_types.len(), "resolved");

    typechecker::check(&mut statements, &slot_types)?;
    debug!("type checked");

    Ok(TypedProgram {
        statements,
        slot_types,
    })
}
