//! Abstract syntax tree for Slate programs.
//!
//! The parser builds the tree with every `slot` and `ty` left as `None`.
//! The resolver fills in slots and the type checker fills in types, so a
//! tree returned by [`crate::analyze`] is fully annotated.

use slate_common::VarType;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Operators of compound assignment statements (`+=` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl CompoundOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompoundOp::Add => "+=",
            CompoundOp::Sub => "-=",
            CompoundOp::Mul => "*=",
            CompoundOp::Div => "/=",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Static type, set by the type checker.
    pub ty: Option<VarType>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Int(i32),
    Str(String),
    Bool(bool),
    Var {
        name: String,
        /// Locals slot, set by the resolver.
        slot: Option<u16>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Array(Vec<Expr>),
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Self {
            kind,
            ty: None,
            line,
        }
    }

    /// Whether this expression may appear on the left of `=`.
    pub fn is_place(&self) -> bool {
        match &self.kind {
            ExprKind::Var { .. } => true,
            ExprKind::Index { array, .. } => array.is_place(),
            _ => false,
        }
    }
}

/// A statement node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    /// `type name = value;`
    Declare {
        ty: VarType,
        name: String,
        slot: Option<u16>,
        value: Expr,
    },
    /// `target = value;` where target is a variable or an indexed element.
    Assign { target: Expr, value: Expr },
    /// `name op= value;`
    Compound {
        op: CompoundOp,
        name: String,
        slot: Option<u16>,
        value: Expr,
    },
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    /// A bare expression; only legal as the program's final statement,
    /// where it supplies the result.
    Expr(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Self { kind, line }
    }
}

/// A fully resolved and type-checked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedProgram {
    pub statements: Vec<Stmt>,
    /// Declared type of each locals slot, indexed by slot.
    pub slot_types: Vec<VarType>,
}

impl TypedProgram {
    /// Number of locals slots the VM must allocate.
    pub fn locals_count(&self) -> usize {
        self.slot_types.len()
    }

    /// Whether the program ends in a result expression.
    pub fn has_result(&self) -> bool {
        matches!(
            self.statements.last(),
            Some(Stmt {
                kind: StmtKind::Expr(_),
                ..
            })
        )
    }
}
