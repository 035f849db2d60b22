//! Recursive-descent parser: tokens → untyped AST.
//!
//! One method per precedence level, lowest first:
//! `||`, `&&`, equality, ordering, additive, multiplicative, unary, postfix
//! indexing, primary.

use slate_common::{BaseType, VarType};

use crate::ast::{BinaryOp, CompoundOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

/// Deepest nesting of blocks and expressions the parser accepts.
///
/// Every later pass walks the tree recursively, so this also bounds their
/// stack use.
pub const MAX_NESTING: usize = 128;

/// Parse a token stream into a list of top-level statements.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, SyntaxError> {
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
    };
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.statement()?);
    }
    Ok(statements)
}

struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    /// Current nesting of blocks and expressions.
    depth: usize,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn peek_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + ahead).map(|t| &t.kind)
    }

    /// Line of the current token, or of the last token at end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &'static str) -> SyntaxError {
        match self.tokens.get(self.index) {
            Some(token) => SyntaxError::UnexpectedToken {
                line: token.line,
                expected,
                found: token.kind.to_string(),
            },
            None => SyntaxError::UnexpectedEof {
                line: self.line(),
                expected,
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), SyntaxError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::NestingTooDeep {
                line: self.line(),
                limit: MAX_NESTING,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn ident(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    // ---- Statements ----

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.line();
        match self.peek() {
            Some(TokenKind::KwInt | TokenKind::KwBool | TokenKind::KwString) => {
                self.declaration()
            }
            Some(TokenKind::If) => self.if_statement(),
            Some(TokenKind::While) => {
                self.index += 1;
                let cond = self.condition()?;
                let body = self.block()?;
                Ok(Stmt::new(StmtKind::While { cond, body }, line))
            }
            Some(TokenKind::LBrace) => Ok(Stmt::new(StmtKind::Block(self.block()?), line)),
            Some(TokenKind::Ident(_)) if self.compound_op_ahead().is_some() => {
                self.compound_assignment()
            }
            _ => {
                let expr = self.expression()?;
                if self.eat(&TokenKind::Assign) {
                    if !expr.is_place() {
                        return Err(SyntaxError::InvalidAssignTarget { line: expr.line });
                    }
                    let value = self.expression()?;
                    self.expect(TokenKind::Semicolon, "';'")?;
                    Ok(Stmt::new(StmtKind::Assign { target: expr, value }, line))
                } else {
                    self.expect(TokenKind::Semicolon, "';'")?;
                    Ok(Stmt::new(StmtKind::Expr(expr), line))
                }
            }
        }
    }

    fn compound_op_ahead(&self) -> Option<CompoundOp> {
        match self.peek_at(1)? {
            TokenKind::PlusAssign => Some(CompoundOp::Add),
            TokenKind::MinusAssign => Some(CompoundOp::Sub),
            TokenKind::StarAssign => Some(CompoundOp::Mul),
            TokenKind::SlashAssign => Some(CompoundOp::Div),
            _ => None,
        }
    }

    fn compound_assignment(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.line();
        let op = self
            .compound_op_ahead()
            .ok_or_else(|| self.error("compound assignment"))?;
        let name = self.ident()?;
        self.index += 1;
        let value = self.expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::new(
            StmtKind::Compound {
                op,
                name,
                slot: None,
                value,
            },
            line,
        ))
    }

    fn declaration(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.line();
        let ty = self.type_name()?;
        let name = self.ident()?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::new(
            StmtKind::Declare {
                ty,
                name,
                slot: None,
                value,
            },
            line,
        ))
    }

    fn type_name(&mut self) -> Result<VarType, SyntaxError> {
        let base = match self.peek() {
            Some(TokenKind::KwInt) => BaseType::Int,
            Some(TokenKind::KwBool) => BaseType::Bool,
            Some(TokenKind::KwString) => BaseType::String,
            _ => return Err(self.error("type")),
        };
        self.index += 1;

        let mut ty = VarType::scalar(base);
        while self.eat(&TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']'")?;
            ty = ty.array_of();
        }
        Ok(ty)
    }

    fn if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.line();
        self.expect(TokenKind::If, "'if'")?;
        let cond = self.condition()?;
        let then_block = self.block()?;

        let else_block = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(vec![self.nested(Self::if_statement)?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            line,
        ))
    }

    fn condition(&mut self) -> Result<Expr, SyntaxError> {
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(cond)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.error("'}'"));
            }
            statements.push(self.statement()?);
        }
        self.index += 1;
        Ok(statements)
    }

    // ---- Expressions ----

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::or)
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, SyntaxError>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, SyntaxError> {
        let mut left = next(self)?;
        while let Some(op) = self.peek().and_then(op_for) {
            let line = self.line();
            self.index += 1;
            let right = next(self)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::and, |t| match t {
            TokenKind::OrOr => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::equality, |t| match t {
            TokenKind::AndAnd => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::comparison, |t| match t {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::Neq),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::additive, |t| match t {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::Lte),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::Gte),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::multiplicative, |t| match t {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(Self::unary, |t| match t {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.index += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        while self.check(&TokenKind::LBracket) {
            let line = self.line();
            self.index += 1;
            let index = self.expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            expr = Expr::new(
                ExprKind::Index {
                    array: Box::new(expr),
                    index: Box::new(index),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let tokens = self.tokens;
        let Some(token) = tokens.get(self.index) else {
            return Err(self.error("expression"));
        };
        let line = token.line;
        self.index += 1;

        let kind = match &token.kind {
            TokenKind::Int(n) => ExprKind::Int(*n),
            TokenKind::Str(s) => ExprKind::Str(s.clone()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Var {
                name: name.clone(),
                slot: None,
            },
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBracket => ExprKind::Array(self.array_elements()?),
            _ => {
                self.index -= 1;
                return Err(self.error("expression"));
            }
        };
        Ok(Expr::new(kind, line))
    }

    /// Elements of an array literal; the opening `[` is already consumed.
    fn array_elements(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut elements = Vec::new();
        if self.eat(&TokenKind::RBracket) {
            return Ok(elements);
        }
        loop {
            elements.push(self.expression()?);
            if self.eat(&TokenKind::RBracket) {
                return Ok(elements);
            }
            self.expect(TokenKind::Comma, "',' or ']'")?;
        }
    }
}
