//! Abstract syntax tree. A sum type per category (`Expr`, `Stmt`) dispatched
//! by tag, rather than a visitor hierarchy over class inheritance — owned
//! children are boxed, lists of children are owned vectors.

use crate::{common::Value, compiler::token::TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp { Add, Subtract, Multiply, Divide, Modulo, Equal, NotEqual, Greater, GreaterEqual, Less, LessEqual }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp { And, Or }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp { Negate, Not }

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> BinaryOp {
        use TokenKind::*;
        match kind {
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Subtract,
            Star => BinaryOp::Multiply,
            Slash => BinaryOp::Divide,
            Percent => BinaryOp::Modulo,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            _ => unreachable!("parser only constructs BinaryOp from binary-operator tokens"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: Value, line: usize },
    Variable { name: String, line: usize },
    Grouping { inner: Box<Expr>, line: usize },
    Unary { op: UnaryOp, operand: Box<Expr>, line: usize },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, line: usize },
    Logical { op: LogicalOp, left: Box<Expr>, right: Box<Expr>, line: usize },
    Ternary { condition: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr>, line: usize },
    Assignment { name: String, value: Box<Expr>, line: usize },
    Call { callee: Box<Expr>, args: Vec<Expr>, line: usize },
    ArrayLiteral { elements: Vec<Expr>, line: usize },
    MapLiteral { entries: Vec<(Expr, Expr)>, line: usize },
    Subscript { object: Box<Expr>, index: Box<Expr>, line: usize },
    SubscriptAssignment { object: Box<Expr>, index: Box<Expr>, value: Box<Expr>, line: usize },
    PropertyAccess { object: Box<Expr>, name: String, line: usize },
    FunctionExpr(FunctionExpr),
    /// Present in the AST for completeness with the bytecode listing; the
    /// parser never constructs one (see spec Open Questions).
    Postfix { operand: Box<Expr>, increment: bool, line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Variable { line, .. }
            | Expr::Grouping { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Logical { line, .. }
            | Expr::Ternary { line, .. }
            | Expr::Assignment { line, .. }
            | Expr::Call { line, .. }
            | Expr::ArrayLiteral { line, .. }
            | Expr::MapLiteral { line, .. }
            | Expr::Subscript { line, .. }
            | Expr::SubscriptAssignment { line, .. }
            | Expr::PropertyAccess { line, .. }
            | Expr::Postfix { line, .. } => *line,
            Expr::FunctionExpr(f) => f.line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    /// `for`'s increment clause, tracked here so `continue` still runs it.
    pub increment: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression { expr: Expr, line: usize },
    Print { expr: Expr, line: usize },
    Var { name: String, initializer: Option<Expr>, line: usize },
    Block { statements: Vec<Stmt>, line: usize },
    If { condition: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>>, line: usize },
    While(WhileStmt),
    Function { name: String, function: FunctionExpr, line: usize },
    Return { value: Option<Expr>, line: usize },
    Break { line: usize },
    Continue { line: usize },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Expression { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::Var { line, .. }
            | Stmt::Block { line, .. }
            | Stmt::If { line, .. }
            | Stmt::Function { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Break { line }
            | Stmt::Continue { line } => *line,
            Stmt::While(w) => w.line,
        }
    }
}
