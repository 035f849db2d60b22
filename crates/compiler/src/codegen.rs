//! Typed AST → bytecode.
//!
//! A single depth-first pass. Every expression leaves exactly one value on
//! the operand stack; statements leave none, except the trailing result
//! expression. Opcode variants are picked from the static type of the
//! operands recorded by the type checker.

use slate_common::{BaseType, Opcode, Value, VarType};
use slate_frontend::ast::{BinaryOp, CompoundOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};

use crate::emitter::Emitter;
use crate::error::CodegenError;

pub(crate) struct Codegen {
    pub(crate) emitter: Emitter,
}

impl Codegen {
    pub(crate) fn new() -> Self {
        Self {
            emitter: Emitter::new(),
        }
    }

    pub(crate) fn block(&mut self, statements: &[Stmt]) -> Result<(), CodegenError> {
        statements.iter().try_for_each(|stmt| self.statement(stmt))
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Declare {
                ty,
                name,
                slot,
                value,
            } => {
                let slot = slot.ok_or_else(|| unresolved(name, stmt.line))?;
                self.expr(value)?;
                let store = store_opcode(*ty).ok_or(CodegenError::UnsupportedType {
                    line: stmt.line,
                    op: "=",
                    ty: *ty,
                })?;
                self.emitter.emit_with(store, slot);
            }
            StmtKind::Assign { target, value } => self.assign(target, value)?,
            StmtKind::Compound {
                op,
                name,
                slot,
                value,
            } => {
                let slot = slot.ok_or_else(|| unresolved(name, stmt.line))?;
                self.expr(value)?;
                self.emitter.emit_with(compound_opcode(*op), slot);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(cond)?;
                let to_else = self.emitter.emit_jump(Opcode::Jmpn);
                self.block(then_block)?;
                match else_block {
                    Some(else_block) => {
                        let to_end = self.emitter.emit_jump(Opcode::Jmp);
                        // Patched after the JMP so the distance skips it too.
                        self.emitter.patch_jump(to_else)?;
                        self.block(else_block)?;
                        self.emitter.patch_jump(to_end)?;
                    }
                    None => self.emitter.patch_jump(to_else)?,
                }
            }
            StmtKind::While { cond, body } => {
                let loop_start = self.emitter.offset();
                self.expr(cond)?;
                let exit = self.emitter.emit_jump(Opcode::Jmpn);
                self.block(body)?;
                self.emitter.emit_loop(loop_start)?;
                self.emitter.patch_jump(exit)?;
            }
            StmtKind::Block(body) => self.block(body)?,
            StmtKind::Expr(expr) => self.expr(expr)?,
        }
        Ok(())
    }

    fn assign(&mut self, target: &Expr, value: &Expr) -> Result<(), CodegenError> {
        match &target.kind {
            ExprKind::Var { name, slot } => {
                let slot = slot.ok_or_else(|| unresolved(name, target.line))?;
                let ty = type_of(target)?;
                self.expr(value)?;
                let store = store_opcode(ty).ok_or(CodegenError::UnsupportedType {
                    line: target.line,
                    op: "=",
                    ty,
                })?;
                self.emitter.emit_with(store, slot);
            }
            ExprKind::Index { array, index } => {
                self.expr(array)?;
                self.expr(index)?;
                self.expr(value)?;
                self.emitter.emit(Opcode::ArrStoreIdx);
            }
            _ => {
                return Err(CodegenError::UnsupportedType {
                    line: target.line,
                    op: "=",
                    ty: type_of(target)?,
                })
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Int(n) => self.emitter.emit_constant(Value::Int(*n))?,
            ExprKind::Str(s) => self.emitter.emit_constant(Value::string(s.as_str()))?,
            ExprKind::Bool(true) => self.emitter.emit(Opcode::PushTrue),
            ExprKind::Bool(false) => self.emitter.emit(Opcode::PushFalse),
            ExprKind::Var { name, slot } => {
                let slot = slot.ok_or_else(|| unresolved(name, expr.line))?;
                let ty = type_of(expr)?;
                let load = load_opcode(ty).ok_or(CodegenError::UnsupportedType {
                    line: expr.line,
                    op: "load",
                    ty,
                })?;
                self.emitter.emit_with(load, slot);
            }
            ExprKind::Unary { op, operand } => {
                self.expr(operand)?;
                self.emitter.emit(match op {
                    UnaryOp::Neg => Opcode::INeg,
                    UnaryOp::Not => Opcode::Not,
                });
            }
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => self.short_circuit(Opcode::JmpnKeep, left, right)?,
            ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => self.short_circuit(Opcode::JmptKeep, left, right)?,
            ExprKind::Binary { op, left, right } => {
                self.expr(left)?;
                self.expr(right)?;
                let operand_ty = type_of(left)?;
                let opcode =
                    binary_opcode(*op, operand_ty).ok_or(CodegenError::UnsupportedType {
                        line: expr.line,
                        op: op.symbol(),
                        ty: operand_ty,
                    })?;
                self.emitter.emit(opcode);
            }
            ExprKind::Array(elements) => {
                let count =
                    u16::try_from(elements.len()).map_err(|_| CodegenError::ArrayTooLong {
                        line: expr.line,
                        len: elements.len(),
                        limit: u16::MAX as usize,
                    })?;
                for element in elements {
                    self.expr(element)?;
                }
                self.emitter.emit_with(Opcode::PushArray, count);
            }
            ExprKind::Index { array, index } => {
                self.expr(array)?;
                self.expr(index)?;
                self.emitter.emit(Opcode::ArrLoadIdx);
            }
        }
        Ok(())
    }

    /// `left && right` / `left || right`: when the keep-jump is taken the
    /// left value stays on the stack as the result; otherwise it is popped
    /// and the right operand supplies the result.
    fn short_circuit(&mut self, jump: Opcode, left: &Expr, right: &Expr) -> Result<(), CodegenError> {
        self.expr(left)?;
        let skip_right = self.emitter.emit_jump(jump);
        self.expr(right)?;
        self.emitter.patch_jump(skip_right)
    }
}

fn unresolved(name: &str, line: usize) -> CodegenError {
    CodegenError::UnresolvedSlot {
        line,
        name: name.to_string(),
    }
}

fn type_of(expr: &Expr) -> Result<VarType, CodegenError> {
    expr.ty
        .ok_or(CodegenError::UntypedExpression { line: expr.line })
}

fn load_opcode(ty: VarType) -> Option<Opcode> {
    if ty.is_array() {
        return Some(Opcode::ArrLoad);
    }
    match ty.base {
        BaseType::Int => Some(Opcode::ILoad),
        BaseType::Bool => Some(Opcode::BLoad),
        BaseType::String => Some(Opcode::SLoad),
        BaseType::Unknown => None,
    }
}

fn store_opcode(ty: VarType) -> Option<Opcode> {
    if ty.is_array() {
        return Some(Opcode::ArrStore);
    }
    match ty.base {
        BaseType::Int => Some(Opcode::IStore),
        BaseType::Bool => Some(Opcode::BStore),
        BaseType::String => Some(Opcode::SStore),
        BaseType::Unknown => None,
    }
}

fn compound_opcode(op: CompoundOp) -> Opcode {
    match op {
        CompoundOp::Add => Opcode::IAddStore,
        CompoundOp::Sub => Opcode::ISubStore,
        CompoundOp::Mul => Opcode::IMulStore,
        CompoundOp::Div => Opcode::IDivStore,
    }
}

/// Opcode for a non-short-circuit binary operator on operands of type `ty`.
fn binary_opcode(op: BinaryOp, ty: VarType) -> Option<Opcode> {
    let opcode = match (op, ty) {
        (BinaryOp::Add, VarType::INT) => Opcode::IAdd,
        (BinaryOp::Add, VarType::STRING) => Opcode::SConcat,
        (BinaryOp::Sub, VarType::INT) => Opcode::ISub,
        (BinaryOp::Mul, VarType::INT) => Opcode::IMul,
        (BinaryOp::Div, VarType::INT) => Opcode::IDiv,
        (BinaryOp::Mod, VarType::INT) => Opcode::IMod,
        (BinaryOp::Gt, VarType::INT) => Opcode::IGt,
        (BinaryOp::Gte, VarType::INT) => Opcode::IGte,
        (BinaryOp::Lt, VarType::INT) => Opcode::ILt,
        (BinaryOp::Lte, VarType::INT) => Opcode::ILte,
        (BinaryOp::Eq, VarType::INT) => Opcode::IEq,
        (BinaryOp::Neq, VarType::INT) => Opcode::INeq,
        (BinaryOp::Eq, VarType::BOOL) => Opcode::BEq,
        (BinaryOp::Neq, VarType::BOOL) => Opcode::BNeq,
        _ => return None,
    };
    Some(opcode)
}
