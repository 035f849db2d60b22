//! Static type checking.
//!
//! Annotates every expression with its [`VarType`] and rejects programs
//! whose operators, conditions, or assignments do not type. Must run after
//! slot resolution.

use slate_common::{BaseType, VarType};

use crate::ast::{BinaryOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};
use crate::error::SemanticError;

/// Type of an empty array literal.
pub const EMPTY_ARRAY: VarType = VarType::new(BaseType::Unknown, 0);

/// Type-check a resolved program. `slot_types` comes from the resolver.
pub fn check(statements: &mut [Stmt], slot_types: &[VarType]) -> Result<(), SemanticError> {
    let checker = Checker { slot_types };
    let last = statements.len().saturating_sub(1);
    for (i, stmt) in statements.iter_mut().enumerate() {
        checker.statement(stmt, i == last)?;
    }
    Ok(())
}

struct Checker<'a> {
    slot_types: &'a [VarType],
}

impl Checker<'_> {
    fn slot_type(&self, slot: Option<u16>) -> VarType {
        slot.and_then(|s| self.slot_types.get(s as usize).copied())
            .unwrap_or(VarType::UNKNOWN)
    }

    fn block(&self, statements: &mut [Stmt]) -> Result<(), SemanticError> {
        statements
            .iter_mut()
            .try_for_each(|stmt| self.statement(stmt, false))
    }

    /// `may_be_result` is true only for the final top-level statement.
    fn statement(&self, stmt: &mut Stmt, may_be_result: bool) -> Result<(), SemanticError> {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Declare { ty, value, .. } => {
                let found = self.expr(value)?;
                expect_fits(found, *ty, value.line)
            }
            StmtKind::Assign { target, value } => {
                let target_ty = self.expr(target)?;
                let found = self.expr(value)?;
                expect_fits(found, target_ty, value.line)
            }
            StmtKind::Compound { slot, value, .. } => {
                let var_ty = self.slot_type(*slot);
                if var_ty != VarType::INT {
                    return Err(SemanticError::TypeMismatch {
                        line,
                        expected: VarType::INT,
                        found: var_ty,
                    });
                }
                let found = self.expr(value)?;
                expect_fits(found, VarType::INT, value.line)
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.condition(cond)?;
                self.block(then_block)?;
                match else_block {
                    Some(else_block) => self.block(else_block),
                    None => Ok(()),
                }
            }
            StmtKind::While { cond, body } => {
                self.condition(cond)?;
                self.block(body)
            }
            StmtKind::Block(body) => self.block(body),
            StmtKind::Expr(expr) => {
                if !may_be_result {
                    return Err(SemanticError::UnusedExpression { line });
                }
                self.expr(expr).map(|_| ())
            }
        }
    }

    fn condition(&self, cond: &mut Expr) -> Result<(), SemanticError> {
        let found = self.expr(cond)?;
        if found != VarType::BOOL {
            return Err(SemanticError::ConditionNotBool {
                line: cond.line,
                found,
            });
        }
        Ok(())
    }

    /// Infer and record the type of `expr`.
    fn expr(&self, expr: &mut Expr) -> Result<VarType, SemanticError> {
        let line = expr.line;
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => VarType::INT,
            ExprKind::Str(_) => VarType::STRING,
            ExprKind::Bool(_) => VarType::BOOL,
            ExprKind::Var { slot, .. } => self.slot_type(*slot),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.expr(operand)?;
                let expected = match op {
                    UnaryOp::Neg => VarType::INT,
                    UnaryOp::Not => VarType::BOOL,
                };
                if operand_ty != expected {
                    return Err(SemanticError::InvalidOperand {
                        line,
                        op: op.symbol(),
                        operand: operand_ty,
                    });
                }
                expected
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.expr(left)?;
                let right_ty = self.expr(right)?;
                binary_result(*op, left_ty, right_ty).ok_or(SemanticError::InvalidOperands {
                    line,
                    op: op.symbol(),
                    left: left_ty,
                    right: right_ty,
                })?
            }
            ExprKind::Array(elements) => {
                let mut elem_ty: Option<VarType> = None;
                for element in elements.iter_mut() {
                    let found = self.expr(element)?;
                    elem_ty = Some(match elem_ty {
                        None => found,
                        Some(first) => first.unify(&found).ok_or(SemanticError::MixedArray {
                            line: element.line,
                            first,
                            found,
                        })?,
                    });
                }
                elem_ty.map_or(EMPTY_ARRAY, |t| t.array_of())
            }
            ExprKind::Index { array, index } => {
                let array_ty = self.expr(array)?;
                let index_ty = self.expr(index)?;
                let element = array_ty.element().ok_or(SemanticError::NotIndexable {
                    line,
                    found: array_ty,
                })?;
                if index_ty != VarType::INT {
                    return Err(SemanticError::IndexNotInt {
                        line: index.line,
                        found: index_ty,
                    });
                }
                element
            }
        };
        expr.ty = Some(ty);
        Ok(ty)
    }
}

fn expect_fits(found: VarType, expected: VarType, line: usize) -> Result<(), SemanticError> {
    if found.fits(&expected) {
        Ok(())
    } else {
        Err(SemanticError::TypeMismatch {
            line,
            expected,
            found,
        })
    }
}

/// Result type of a binary operator, or `None` if the operands do not type.
fn binary_result(op: BinaryOp, left: VarType, right: VarType) -> Option<VarType> {
    if left != right {
        return None;
    }
    match (op, left) {
        (BinaryOp::Add, VarType::INT | VarType::STRING) => Some(left),
        (BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod, VarType::INT) => {
            Some(VarType::INT)
        }
        (BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte, VarType::INT) => {
            Some(VarType::BOOL)
        }
        (BinaryOp::Eq | BinaryOp::Neq, VarType::INT | VarType::BOOL) => Some(VarType::BOOL),
        (BinaryOp::And | BinaryOp::Or, VarType::BOOL) => Some(VarType::BOOL),
        _ => None,
    }
}
