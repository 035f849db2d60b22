//! Slot resolution.
//!
//! Walks the tree in source order, giving every declaration a fresh locals
//! slot and binding every variable use to the slot of the declaration in
//! scope. Slots are never reused, so the locals count is the number of
//! declarations in the program.

use std::collections::HashMap;

use slate_common::VarType;
use tracing::trace;

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::error::SemanticError;

/// Largest number of slots a 16-bit operand can address.
pub const MAX_LOCALS: usize = u16::MAX as usize + 1;

/// Resolve all names in `statements`, returning the declared type of each slot.
pub fn resolve(statements: &mut [Stmt]) -> Result<Vec<VarType>, SemanticError> {
    let mut resolver = Resolver {
        scopes: vec![HashMap::new()],
        slot_types: Vec::new(),
    };
    resolver.statements(statements)?;
    Ok(resolver.slot_types)
}

struct Resolver {
    scopes: Vec<HashMap<String, u16>>,
    slot_types: Vec<VarType>,
}

impl Resolver {
    fn lookup(&self, name: &str) -> Option<u16> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn declare(&mut self, name: &str, ty: VarType, line: usize) -> Result<u16, SemanticError> {
        if self.lookup(name).is_some() {
            return Err(SemanticError::Redeclared {
                line,
                name: name.to_string(),
            });
        }
        let slot = u16::try_from(self.slot_types.len()).map_err(|_| {
            SemanticError::TooManyLocals {
                line,
                limit: MAX_LOCALS,
            }
        })?;
        self.slot_types.push(ty);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), slot);
        }
        trace!(name, slot, %ty, "declared");
        Ok(slot)
    }

    fn use_of(&self, name: &str, line: usize) -> Result<u16, SemanticError> {
        self.lookup(name).ok_or_else(|| SemanticError::Undeclared {
            line,
            name: name.to_string(),
        })
    }

    fn block(&mut self, statements: &mut [Stmt]) -> Result<(), SemanticError> {
        self.scopes.push(HashMap::new());
        let result = self.statements(statements);
        self.scopes.pop();
        result
    }

    fn statements(&mut self, statements: &mut [Stmt]) -> Result<(), SemanticError> {
        statements.iter_mut().try_for_each(|stmt| self.statement(stmt))
    }

    fn statement(&mut self, stmt: &mut Stmt) -> Result<(), SemanticError> {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Declare {
                ty,
                name,
                slot,
                value,
            } => {
                // The initializer cannot see the variable it initializes.
                self.expr(value)?;
                *slot = Some(self.declare(name, *ty, line)?);
            }
            StmtKind::Assign { target, value } => {
                self.expr(target)?;
                self.expr(value)?;
            }
            StmtKind::Compound {
                name, slot, value, ..
            } => {
                *slot = Some(self.use_of(name, line)?);
                self.expr(value)?;
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(cond)?;
                self.block(then_block)?;
                if let Some(else_block) = else_block {
                    self.block(else_block)?;
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(cond)?;
                self.block(body)?;
            }
            StmtKind::Block(body) => self.block(body)?,
            StmtKind::Expr(expr) => self.expr(expr)?,
        }
        Ok(())
    }

    fn expr(&mut self, expr: &mut Expr) -> Result<(), SemanticError> {
        let line = expr.line;
        match &mut expr.kind {
            ExprKind::Int(_) | ExprKind::Str(_) | ExprKind::Bool(_) => Ok(()),
            ExprKind::Var { name, slot } => {
                *slot = Some(self.use_of(name, line)?);
                Ok(())
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            ExprKind::Array(elements) => elements.iter_mut().try_for_each(|e| self.expr(e)),
            ExprKind::Index { array, index } => {
                self.expr(array)?;
                self.expr(index)
            }
        }
    }
}
