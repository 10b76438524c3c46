use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::stmt::FunctionDecl;
use crate::token::Token;

/// Identity of a variable-bearing expression node.
///
/// The resolver keys hop distances on this id, so two structurally identical
/// nodes must never share one.  Ids are drawn from a process-wide counter:
/// fresh ASTs parsed on later REPL lines keep extending the same id space and
/// the interpreter's locals map stays additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u64);

static NEXT_EXPR_ID: AtomicU64 = AtomicU64::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

#[derive(Debug)]
pub enum Expr {
    Literal(LiteralValue),

    // Parenthesized sub-expression
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

    // 'and' / 'or'
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // 'cond ? a : b'
    Ternary {
        condition: Box<Expr>,
        true_branch: Box<Expr>,
        false_branch: Box<Expr>,
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

    // The paren token is the closing ')', kept for error line reporting
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    // Property read: 'object.name'
    Get {
        object: Box<Expr>,
        name: Token,
    },

    // Property write: 'object.name = value'
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    // 'super.method'; resolved against the defining class's superclass
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    // Anonymous 'fun (...) { ... }' with a synthetic name token
    Lambda(Rc<FunctionDecl>),
}
