use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Stable identity for the expression nodes the resolver tracks.
///
/// Ids are drawn from a process-wide counter rather than per-parser state:
/// the REPL keeps one interpreter (and therefore one resolution table) alive
/// across lines, so ids handed out by later parses must never collide with
/// entries recorded for functions that are still reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub enum Literal {
    Nil,
    True,
    False,
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),

    Grouping(Box<Expr>),

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing parenthesis, kept for runtime error positions.
        paren: Token,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// Function bodies are shared with the function values that close over
    /// them, hence the `Rc`.
    Function {
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
    },

    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}
