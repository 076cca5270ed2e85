//! The typed abstract syntax tree.
//!
//! Expressions and statements are plain owned trees. Declarations live in a
//! [`DeclArena`] and are referred to by [`DeclId`]: symbol tables, identifier
//! expressions, a function's `locals` list and the generator's side tables
//! all share declaration nodes through their ids.
//!
//! Every expression node carries its type and lvalue-ness; both are assigned
//! by the semantic analyzer at construction, so a successfully parsed tree is
//! fully typed by construction.

use cinderc_util::{define_idx, IndexVec};

use crate::types::{TypeId, TypeRegistry};

define_idx!(DeclId);

/// Arena owning every declaration node of a translation unit.
pub type DeclArena = IndexVec<DeclId, Decl>;

/// A declaration.
#[derive(Debug)]
pub enum Decl {
    /// A local or global variable.
    Variable { name: String, ty: TypeId, line: u32 },

    /// A function parameter.
    Param { name: String, ty: TypeId, line: u32 },

    /// A function declaration or definition.
    Function(FunctionDecl),

    /// A type alias. Contributes nothing to code generation.
    Typedef { name: String, ty: TypeId, line: u32 },
}

/// Payload of `Decl::Function`.
///
/// A prototype has `body: None`. A definition created from an earlier
/// prototype reuses the same `DeclId`; its parameters are re-bound and the
/// body is attached exactly once.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    /// The function type (return, parameters, var-args flag).
    pub ty: TypeId,
    pub params: Vec<DeclId>,
    pub var_args: bool,
    pub body: Option<Stmt>,
    /// Local variables in declaration order, for entry-block allocation.
    pub locals: Vec<DeclId>,
    pub line: u32,
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Variable { name, .. }
            | Decl::Param { name, .. }
            | Decl::Typedef { name, .. } => name,
            Decl::Function(f) => &f.name,
        }
    }

    pub fn ty(&self) -> TypeId {
        match self {
            Decl::Variable { ty, .. } | Decl::Param { ty, .. } | Decl::Typedef { ty, .. } => *ty,
            Decl::Function(f) => f.ty,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Decl::Variable { line, .. }
            | Decl::Param { line, .. }
            | Decl::Typedef { line, .. } => *line,
            Decl::Function(f) => f.line,
        }
    }

    pub fn is_typedef(&self) -> bool {
        matches!(self, Decl::Typedef { .. })
    }
}

/// A typed expression node.
#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub is_lvalue: bool,
    pub line: u32,
}

#[derive(Debug)]
pub enum ExprKind {
    /// Integer literal; the value fits in a signed 32-bit integer.
    Integer(i32),

    /// String literal; the decoded bytes, embedded NULs preserved.
    String(Vec<u8>),

    /// Identifier, resolved to its declaration.
    Identifier { name: String, decl: DeclId },

    /// Prefix unary operator.
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operator, including assignment.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call.
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Member access; the member index is resolved during analysis.
    Dot {
        parent: Box<Expr>,
        member: String,
        index: u32,
    },

    /// Explicit cast; the target type is the node's own type.
    Cast { operand: Box<Expr> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+e`
    Plus,
    /// `-e`
    Neg,
    /// `*e`
    Deref,
    /// `&e`
    AddrOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    Assign,
}

impl BinaryOp {
    /// True for `+ - * / %`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    /// True for `< > <= >=`.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq
        )
    }

    /// True for `== !=`.
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::EqEq | BinaryOp::NotEq)
    }
}

/// A statement node.
#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug)]
pub enum StmtKind {
    Compound(Vec<Stmt>),

    Return(Option<Expr>),

    If {
        cond: Expr,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
    },

    While {
        cond: Expr,
        body: Box<Stmt>,
    },

    Do {
        body: Box<Stmt>,
        cond: Expr,
    },

    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    Break,

    Continue,

    /// A declaration statement. `None` for a bare type declaration such as
    /// `struct tag { int x; };`, whose whole effect is registering the tag.
    Decl(Option<DeclId>),

    Expr(Expr),
}

/// One source file's full compilation result: the top-level declarations
/// plus the arenas that own every declaration node and every type.
#[derive(Debug)]
pub struct TranslationUnit {
    pub filename: String,
    pub decls: Vec<DeclId>,
    pub arena: DeclArena,
    pub types: TypeRegistry,
}

impl TranslationUnit {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.arena[id]
    }
}
