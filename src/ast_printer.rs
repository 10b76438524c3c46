use crate::expr::{Expr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// Converts syntax trees to a parenthesized prefix form.  Test support:
/// grammar tests pin parser output against these strings.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.0}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            // ── binary operator ─────────────────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── logical operator ───────────────────────────────────────
            Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── ternary ────────────────────────────────────────────────
            Expr::Ternary {
                condition,
                true_branch,
                false_branch,
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(true_branch),
                Self::print(false_branch)
            ),

            // ── names and assignment ───────────────────────────────────
            Expr::Variable { name, .. } => format!("(var {})", name.lexeme),

            Expr::This { .. } => "(var this)".into(),

            Expr::Assign { name, value, .. } => {
                format!("(= (var {}) {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ───────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (get {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── lambda ─────────────────────────────────────────────────
            Expr::Lambda(decl) => format!(
                "(fun ({}) {})",
                Self::params(decl),
                Self::print_statements(&decl.body)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(def {} {})", name.lexeme, Self::print(init)),

                None => format!("(def {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::print_statements(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(eb)
                ),

                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(expr)),

                None => "(return)".into(),
            },

            Stmt::Function(decl) => Self::print_function(decl),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);

                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    s.push_str(&format!(" (< {})", super_name.lexeme));
                }

                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_function(method));
                }

                s.push(')');
                s
            }
        }
    }

    /// A whole program renders as one `(scope …)`.
    pub fn print_program(statements: &[Stmt]) -> String {
        Self::print_statements(statements)
    }

    fn print_statements(statements: &[Stmt]) -> String {
        let mut s = String::from("(scope");

        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }

        s.push(')');
        s
    }

    fn print_function(decl: &FunctionDecl) -> String {
        format!(
            "(fun {} ({}) {})",
            decl.name.lexeme,
            Self::params(decl),
            Self::print_statements(&decl.body)
        )
    }

    fn params(decl: &FunctionDecl) -> String {
        decl.params
            .iter()
            .map(|p: &Token| p.lexeme.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}
