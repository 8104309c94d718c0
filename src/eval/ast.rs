//! Query expression AST.
//!
//! A purpose-built tree for the closed query grammar: literals, the root
//! identifier, indexing and slicing, arithmetic and comparisons, boolean
//! operators, allowlisted calls, lambdas, and collection literals. There is
//! deliberately no node for anything that could reach the host environment.

use std::ops::Range;

/// Span information for source locations
pub type Span = Range<usize>;

/// Root expression type
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Null literal
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// String literal
    Str(String),
    /// Identifier: the root symbol, a builtin name, or a lambda parameter
    Ident(IdentExpr),
    /// List literal: [1, 2, 3]
    List(Vec<Expr>),
    /// Tuple literal: (1, 2)
    Tuple(Vec<Expr>),
    /// Mapping literal: {'a': 1}
    Mapping(Vec<(Expr, Expr)>),
    /// Index expression: obj[key]
    Index(Box<IndexExpr>),
    /// Slice expression: seq[a:b:c]
    Slice(Box<SliceExpr>),
    /// Attribute access: obj.name (always an evaluation error)
    Attribute(Box<AttributeExpr>),
    /// Call expression: fn(args)
    Call(Box<CallExpr>),
    /// Unary expression: -x, +x, not x
    Unary(Box<UnaryExpr>),
    /// Binary expression: a + b, a < b, a and b
    Binary(Box<BinaryExpr>),
    /// Lambda expression: lambda x: x + 1
    Lambda(Box<LambdaExpr>),
}

/// Identifier with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct IdentExpr {
    pub name: String,
    pub span: Span,
}

/// Index expression: obj[key]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub object: Expr,
    pub index: Expr,
    pub span: Span,
}

/// Slice expression: seq[start:stop:step], any part optional
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub object: Expr,
    pub start: Option<Expr>,
    pub stop: Option<Expr>,
    pub step: Option<Expr>,
    pub span: Span,
}

/// Attribute access: obj.name
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeExpr {
    pub object: Expr,
    pub name: String,
    pub span: Span,
}

/// Call expression: fn(arg1, arg2, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Unary expression
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
    pub span: Span,
}

/// Binary expression
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
    pub span: Span,
}

/// Lambda expression
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub params: Vec<String>,
    pub body: Expr,
    pub span: Span,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation: -x
    Neg,
    /// Plus: +x
    Pos,
    /// Logical not: not x
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    And,
    Or,
}

impl BinaryOp {
    /// Operator text for error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}
