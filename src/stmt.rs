use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// Shared shape of named functions, methods and lambdas.  Wrapped in `Rc`
/// so that closures capture the declaration without cloning the body.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
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

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Function(Rc<FunctionDecl>),

    // The superclass, when present, is always an `Expr::Variable`
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
