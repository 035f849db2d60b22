//! Error types for the Slate frontend.
//!
//! Syntax errors come from the lexer and parser; semantic errors from the
//! resolver and type checker. Every error carries the 1-based source line.

use slate_common::VarType;
use thiserror::Error;

/// Errors produced while tokenizing or parsing source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A character that starts no token.
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    /// A string literal with no closing quote.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    /// A backslash escape the language does not define.
    #[error("line {line}: unknown escape sequence '\\{ch}'")]
    InvalidEscape { line: usize, ch: char },

    /// An integer literal that does not fit in 32 bits.
    #[error("line {line}: invalid integer literal '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A token appeared where something else was required.
    #[error("line {line}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    /// Input ended in the middle of a construct.
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },

    /// Left side of `=` is neither a variable nor an indexed element.
    #[error("line {line}: invalid assignment target")]
    InvalidAssignTarget { line: usize },

    /// Blocks or expressions nested past the parser's limit.
    #[error("line {line}: nesting deeper than {limit} levels")]
    NestingTooDeep { line: usize, limit: usize },
}

/// Errors produced by slot resolution and type checking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("line {line}: undeclared variable '{name}'")]
    Undeclared { line: usize, name: String },

    /// A declaration reuses a name visible from an enclosing scope.
    #[error("line {line}: variable '{name}' is already declared")]
    Redeclared { line: usize, name: String },

    /// More declarations than a 16-bit slot operand can address.
    #[error("line {line}: too many variables (limit {limit})")]
    TooManyLocals { line: usize, limit: usize },

    #[error("line {line}: expected {expected}, found {found}")]
    TypeMismatch {
        line: usize,
        expected: VarType,
        found: VarType,
    },

    #[error("line {line}: operator '{op}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        line: usize,
        op: &'static str,
        left: VarType,
        right: VarType,
    },

    #[error("line {line}: operator '{op}' cannot be applied to {operand}")]
    InvalidOperand {
        line: usize,
        op: &'static str,
        operand: VarType,
    },

    #[error("line {line}: condition must be bool, found {found}")]
    ConditionNotBool { line: usize, found: VarType },

    #[error("line {line}: array elements must share one type, found {first} and {found}")]
    MixedArray {
        line: usize,
        first: VarType,
        found: VarType,
    },

    #[error("line {line}: cannot index into {found}")]
    NotIndexable { line: usize, found: VarType },

    #[error("line {line}: array index must be int, found {found}")]
    IndexNotInt { line: usize, found: VarType },

    /// An expression statement that is not the final top-level statement.
    #[error("line {line}: expression result is unused")]
    UnusedExpression { line: usize },
}

/// Any error the frontend can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
}

impl FrontendError {
    /// Source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            FrontendError::Syntax(e) => e.line(),
            FrontendError::Semantic(e) => e.line(),
        }
    }
}

impl SyntaxError {
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::UnexpectedChar { line, .. }
            | SyntaxError::UnterminatedString { line }
            | SyntaxError::InvalidEscape { line, .. }
            | SyntaxError::InvalidNumber { line, .. }
            | SyntaxError::UnexpectedToken { line, .. }
            | SyntaxError::UnexpectedEof { line, .. }
            | SyntaxError::InvalidAssignTarget { line }
            | SyntaxError::NestingTooDeep { line, .. } => *line,
        }
    }
}

impl SemanticError {
    pub fn line(&self) -> usize {
        match self {
            SemanticError::Undeclared { line, .. }
            | SemanticError::Redeclared { line, .. }
            | SemanticError::TooManyLocals { line, .. }
            | SemanticError::TypeMismatch { line, .. }
            | SemanticError::InvalidOperands { line, .. }
            | SemanticError::InvalidOperand { line, .. }
            | SemanticError::ConditionNotBool { line, .. }
            | SemanticError::MixedArray { line, .. }
            | SemanticError::NotIndexable { line, .. }
            | SemanticError::IndexNotInt { line, .. }
            | SemanticError::UnusedExpression { line } => *line,
        }
    }
}
