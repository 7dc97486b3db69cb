// ABOUTME: Tagged-union AST for Lox expressions and statements

use crate::token::{Literal, Token};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity for an AST expression node, used as the resolution
/// table's key. Only node kinds the resolver actually annotates
/// (`Variable`, `Assign`, `This`, `Super`) carry one.
pub type ExprId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_expr_id() -> ExprId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub enum Expr {
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: Literal,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
    This {
        id: ExprId,
        keyword: Token,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        id: ExprId,
        name: Token,
    },
}

impl Expr {
    /// The resolver's identity key for the node kinds it annotates. `None`
    /// for node kinds the resolver only recurses through.
    pub fn resolve_id(&self) -> Option<ExprId> {
        match self {
            Expr::Assign { id, .. }
            | Expr::Variable { id, .. }
            | Expr::This { id, .. }
            | Expr::Super { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// A parsed `fun name(params) { body }` declaration or class method. Shared
/// via `Rc` since the same declaration backs both the plain function value
/// and, for methods, every bound-method closure created per instance access.
#[derive(Debug)]
pub struct FunctionStmt {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionStmt>>,
    },
    Expression(Expr),
    Function(Rc<FunctionStmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print(Expr),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
