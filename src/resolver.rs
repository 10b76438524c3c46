//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>` tracking declared
//!    (false) and fully defined (true) names in each nested block or function.
//! 2. **Enforce static rules**: reports errors such as redeclaration in the same scope,
//!    reading a variable in its own initializer, invalid `return` outside functions,
//!    returning a value from an initializer, and illegal use of `this` or `super`.
//! 3. **Record binding distances**: for every variable occurrence (`Variable`, `Assign`,
//!    `This`, `Super`), calls back into the interpreter to note whether it is a local
//!    (and at what depth) or a global. This enables the runtime to perform O(1)
//!    lookups by climbing exactly the right number of environment frames.
//!
//! Errors are accumulated, not fatal: the whole tree is walked and every
//! static problem reported in one pass.  The driver checks [`Resolver::has_error`]
//! and refuses to evaluate a program that failed resolution.
//!
//! Distances are keyed by expression identity ([`crate::expr::ExprId`]), so
//! resolving a fresh AST on a later REPL line is additive and safe.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{ErrorKind, LoxError};
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body, if any, is being resolved.  Used to validate
/// `return` and `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    errors: Vec<LoxError>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LoxError> {
        self.errors
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // 1. Self‑inheritance guard
                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    if super_name.lexeme == name.lexeme {
                        self.report(LoxError::resolve(
                            ErrorKind::NO_ERROR,
                            super_name.line,
                            super_name.lexeme.clone(),
                            "A class can't inherit from itself.".to_string(),
                        ));
                    }
                }

                // 2. Declare & define the class name so methods (including init) can refer to it
                self.declare(name);
                self.define(&name.lexeme);

                // 3. Save and enter the class context
                let enclosing_class: ClassType = self.current_class;

                // 4. If there's a superclass expression, we're in a subclass; otherwise in a plain class
                self.current_class = if superclass.is_some() {
                    ClassType::Subclass
                } else {
                    ClassType::Class
                };

                // 5. If there is a superclass, resolve it and bind `super`
                if let Some(super_expr) = superclass {
                    // Resolve the superclass variable (must exist and be a class)
                    self.resolve_expr(super_expr);

                    // Open a scope for `super`
                    self.begin_scope();
                    self.scopes
                        .last_mut()
                        .expect("scope just pushed")
                        .insert("super".to_string(), true);
                }

                // 6. Open the implicit `this` scope for methods
                self.begin_scope();
                self.scopes
                    .last_mut()
                    .expect("scope just pushed")
                    .insert("this".to_string(), true);

                // 7. Resolve each method in its own function context
                for method in methods {
                    let kind: FunctionType = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, &method.params, &method.body);
                }

                // 8. Close the `this` scope
                self.end_scope();

                // 9. If we opened a `super` scope, close it now
                if superclass.is_some() {
                    self.end_scope();
                }

                // 10. Restore the outer class context
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                // 1. Push a new anonymous scope for `{ … }`
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                // 2. Pop the block scope
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // 1. Declare the variable name (marked but not yet defined)
                self.declare(name);

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                // 3. Define the variable so it’s available in this scope
                self.define(&name.lexeme);
            }

            Stmt::Function(decl) => {
                // 1. Declare the function name (so it’s visible inside its own body)
                self.declare(&decl.name);

                // 2. Define it immediately (allow recursion)
                self.define(&decl.name.lexeme);

                // 3. Resolve the function’s parameters and body under a normal function context
                self.resolve_function(FunctionType::Function, &decl.params, &decl.body);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                // 1. Resolve the inner expression of expression/print statements
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // 1. Resolve the condition expression
                self.resolve_expr(condition);

                // 2. Resolve the 'then' branch
                self.resolve_stmt(then_branch);

                // 3. Resolve the 'else' branch, if present
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                // 1. Resolve the loop condition
                self.resolve_expr(condition);

                // 2. Resolve the loop body
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                // 1. Ensure we're inside a function or method
                if self.current_function == FunctionType::None {
                    self.report(LoxError::resolve(
                        ErrorKind::UNEXPECTED_RETURN,
                        keyword.line,
                        keyword.lexeme.clone(),
                        "Unexpected return in global scope".to_string(),
                    ));

                    return;
                }

                if let Some(expr) = value {
                    // 2. Resolve the return expression
                    self.resolve_expr(expr);

                    // 3. In an initializer, only `return;` or `return this;` is allowed
                    if self.current_function == FunctionType::Initializer
                        && !matches!(expr, Expr::This { .. })
                    {
                        self.report(LoxError::resolve(
                            ErrorKind::UNEXPECTED_RETURN,
                            keyword.line,
                            keyword.lexeme.clone(),
                            "Unexpected return expression in `init`".to_string(),
                        ));
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    pub fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);
        match expr {
            Expr::Literal(_) => {
                // 1. Literals have no sub‑expressions
            }

            Expr::Grouping(inner) => {
                // 2. Resolve the inner expression of a grouping
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                // 3. Resolve the operand of a unary expression
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                // 4. Resolve both sides of binary or logical operators
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                true_branch,
                false_branch,
            } => {
                // 5. Resolve all three arms of `?:`
                self.resolve_expr(condition);
                self.resolve_expr(true_branch);
                self.resolve_expr(false_branch);
            }

            Expr::Variable { id, name } => {
                // 6. Prevent reading a variable in its own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.report(LoxError::resolve(
                            ErrorKind::NO_ERROR,
                            name.line,
                            name.lexeme.clone(),
                            "Can't read local variable in its own initializer".to_string(),
                        ));
                    }
                }

                // 7. Bind this variable occurrence at its lexical depth
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // 8. Resolve the right‑hand side first, then bind the assignment
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                // 9. Resolve the callee expression and each argument
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::This { id, keyword } => {
                // 10. 'this' only valid inside methods and initializers
                if self.current_function != FunctionType::Method
                    && self.current_function != FunctionType::Initializer
                {
                    self.report(LoxError::resolve(
                        ErrorKind::UNDEFINED_VARIABLE,
                        keyword.line,
                        keyword.lexeme.clone(),
                        "Cannot reference 'this' outside of a method".to_string(),
                    ));
                }

                // 11. Bind 'this' like a local variable
                self.resolve_local(*id, keyword);
            }

            Expr::Get { object, .. } => {
                // 12. Resolve the object whose property is being accessed
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                // 13. Resolve the target object then the value being assigned
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::Super { id, keyword, .. } => {
                // 1. Disallow outside any class
                if self.current_class == ClassType::None {
                    self.report(LoxError::resolve(
                        ErrorKind::NO_ERROR,
                        keyword.line,
                        keyword.lexeme.clone(),
                        "Cannot use 'super' outside of a class.".to_string(),
                    ));
                } else if self.current_class != ClassType::Subclass {
                    // 2. Disallow in a class with no superclass
                    self.report(LoxError::resolve(
                        ErrorKind::NO_ERROR,
                        keyword.line,
                        keyword.lexeme.clone(),
                        "Cannot use 'super' in a class with no superclass.".to_string(),
                    ));
                }

                // 3. Bind 'super' like a local variable.
                self.resolve_local(*id, keyword);
            }

            Expr::Lambda(decl) => {
                // 14. A lambda body is an ordinary function context
                self.resolve_lambda(decl);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_lambda(&mut self, decl: &FunctionDecl) {
        self.resolve_function(FunctionType::Function, &decl.params, &decl.body);
    }

    /// Enter a fresh scope for a function’s parameters + body.
    ///
    /// `kind` indicates whether this is a normal function, a method, or an
    /// initializer.
    fn resolve_function(&mut self, kind: FunctionType, params: &[Token], body: &[Stmt]) {
        // 1. Save the enclosing function context so we can restore it later.
        let enclosing = self.current_function;

        // 2. Set the current function context to the passed‑in kind.
        self.current_function = kind;

        // 3. Begin a new lexical scope for the function parameters & body.
        self.begin_scope();

        // 4. Declare and immediately define each parameter in this new scope.
        for param in params {
            self.declare(param);
            self.define(&param.lexeme);
        }

        // 5. Resolve each statement in the function body under the current context.
        for stmt in body {
            self.resolve_stmt(stmt);
        }

        // 6. End the function’s parameter/body scope, popping all parameter bindings.
        self.end_scope();

        // 7. Restore the previous function context.
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        // 1. Push a new, empty scope map
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        // 2. Pop the innermost scope
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // 1. If in a local scope, ensure no duplicate declarations
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.report(LoxError::resolve(
                    ErrorKind::VAR_ALREADY_DEFINED,
                    name.line,
                    name.lexeme.clone(),
                    "Already a variable with this name".to_string(),
                ));

                return;
            }

            // 2. Mark the name as declared but not yet defined
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &str) {
        // 1. Mark the name as fully defined in the current scope
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn report(&mut self, err: LoxError) {
        debug!("Static error recorded: {}", err);

        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in any scope.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        // 1. Search each scope from innermost outward
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                // 2. Tell the interpreter about the local binding
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        // 3. Not found in any scope → it's a global
        debug!("Resolved '{}' as global", name.lexeme);
        self.interpreter.note_global(&name.lexeme);
    }
}
