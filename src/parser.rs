//! Recursive-descent parser from a token sequence to the syntax tree.
//!
//! Errors are accumulated rather than fatal: each failed production records
//! a diagnostic, the parser re-synchronizes past the next `;`, and the
//! top-level loop keeps going so a single mistake does not hide the rest of
//! the program.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! program      = declaration* EOF
//! declaration  = classDecl | funDecl | varDecl | statement
//! classDecl    = "class" IDENT ("<" IDENT)? "{" (funDecl)* "}"
//! funDecl      = "fun" IDENT function
//! function     = "(" params? ")" block
//! varDecl      = "var" IDENT ("=" expression)? ";"
//! statement    = exprStmt | printStmt | block | ifStmt
//!              | whileStmt | forStmt | returnStmt
//!
//! expression   = assignment
//! assignment   = (call ".")? IDENT "=" assignment | ternary
//! ternary      = logic_or ("?" expression ":" expression)?
//! logic_or     = logic_and ("or" logic_and)*
//! logic_and    = equality ("and" equality)*
//! equality     = comparison (("!=" | "==") comparison)*
//! comparison   = term (("<" | "<=" | ">" | ">=") term)*
//! term         = factor (("+" | "-") factor)*
//! factor       = unary (("*" | "/") unary)*
//! unary        = ("!" | "-") unary | call
//! call         = primary (("(" arguments? ")") | ("." IDENT))*
//! primary      = NUMBER | STRING | "true" | "false" | "nil" | IDENT
//!              | "this" | "super" "." IDENT | "(" expression ")" | lambda
//! lambda       = "fun" function
//! ```
//!
//! `for` loops are desugared here into `while` loops, so later passes never
//! see a `for` node.

use std::rc::Rc;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// Hard limit on arguments at a call site.  Exceeding it is reported but
/// does not abort the parse.
const MAX_ARGUMENTS: usize = 255;

pub struct Parser {
    tokens: Vec<Token>,
    errors: Vec<LoxError>,
    current: usize,
}

impl Parser {
    /// The token list must be terminated by an EOF token, as produced by
    /// the scanner.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            errors: Vec::new(),
            current: 0,
        }
    }

    /// Parses a whole program.  Statements that failed to parse are dropped
    /// after synchronization; inspect [`Parser::has_error`] before trusting
    /// the result.
    pub fn parse(&mut self) -> Vec<Stmt> {
        self.errors.clear();
        self.current = 0;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),

                Err(_) => self.synchronize(),
            }
        }

        statements
    }

    /// Parses a single expression (the REPL's expression mode).
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.errors.clear();
        self.current = 0;

        self.expression().ok()
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

    // ─────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Result<Stmt, LoxError> {
        if self.match_types(&[TokenType::CLASS]) {
            return self.class_declaration();
        }

        // 'fun' starts a declaration only when a name follows; a bare
        // 'fun (' is a lambda expression and falls through to statement().
        if self.check(&TokenType::FUN) && self.check_next(&TokenType::IDENTIFIER) {
            self.advance();

            let decl = self.function("function")?;
            return Ok(Stmt::Function(decl));
        }

        if self.match_types(&[TokenType::VAR]) {
            return self.var_declaration();
        }

        self.statement()
    }

    fn class_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name: Token = self.consume(&TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass: Option<Expr> = if self.match_types(&[TokenType::LESS]) {
            let super_name: Token =
                self.consume(&TokenType::IDENTIFIER, "Expect superclass name.")?;

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(&TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            self.consume(&TokenType::FUN, "Expect 'fun' before method name.")?;

            methods.push(self.function("method")?);
        }

        let _ = self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after class body.");

        debug!(
            "Parsed class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>, LoxError> {
        let name: Token =
            self.consume(&TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.finish_function(name, kind)
    }

    /// Parses the parameter list and body shared by named functions,
    /// methods and lambdas.
    fn finish_function(&mut self, name: Token, kind: &str) -> Result<Rc<FunctionDecl>, LoxError> {
        self.consume(
            &TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                params.push(self.consume(&TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_types(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            &TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block_statements();

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name: Token = self.consume(&TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_types(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        let _ = self.consume(
            &TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        );

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if self.match_types(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_types(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block_statements()));
        }

        if self.match_types(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_types(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_types(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_types(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        self.expression_statement()
    }

    /// Collects declarations up to the closing brace.  Statements inside the
    /// block that fail to parse are dropped after synchronization, the rest
    /// of the block is kept.
    fn block_statements(&mut self) -> Vec<Stmt> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),

                Err(_) => self.synchronize(),
            }
        }

        let _ = self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after block.");

        statements
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr: Expr = self.expression()?;

        let _ = self.consume(&TokenType::SEMICOLON, "Expect ';' after value.");

        Ok(Stmt::Print(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;

        let condition: Expr = self.expression()?;

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_types(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;

        let condition: Expr = self.expression()?;

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`, dropping whichever clauses
    /// are absent.
    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_types(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_types(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if self.check(&TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(&TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if self.check(&TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }

        // 'for (;;)' loops forever
        let condition: Expr = condition.unwrap_or(Expr::Literal(LiteralValue::True));

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> Result<Stmt, LoxError> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if self.check(&TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        let _ = self.consume(&TokenType::SEMICOLON, "Expect ';' after return value.");

        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr: Expr = self.expression()?;

        let _ = self.consume(&TokenType::SEMICOLON, "Expect ';' after value.");

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr: Expr = self.ternary()?;

        if self.match_types(&[TokenType::EQUAL]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                // Report but keep the left-hand side so parsing continues.
                _ => {
                    self.error(&equals, "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr, LoxError> {
        let expr: Expr = self.or()?;

        if self.match_types(&[TokenType::QUESTION]) {
            let true_branch: Expr = self.expression()?;

            let _ = self.consume(&TokenType::COLON, "Expect ':' after true expression.");

            let false_branch: Expr = self.expression()?;

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                true_branch: Box::new(true_branch),
                false_branch: Box::new(false_branch),
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.and()?;

        while self.match_types(&[TokenType::OR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.equality()?;

        while self.match_types(&[TokenType::AND]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.comparison()?;

        while self.match_types(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.term()?;

        while self.match_types(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.factor()?;

        while self.match_types(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.unary()?;

        while self.match_types(&[TokenType::SLASH, TokenType::STAR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.match_types(&[TokenType::BANG, TokenType::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, LoxError> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.match_types(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_types(&[TokenType::DOT]) {
                let name: Token =
                    self.consume(&TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, LoxError> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    // Reported without aborting; the call node is still built.
                    let token: Token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_types(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        if self.match_types(&[TokenType::FALSE]) {
            return Ok(Expr::Literal(LiteralValue::False));
        }

        if self.match_types(&[TokenType::TRUE]) {
            return Ok(Expr::Literal(LiteralValue::True));
        }

        if self.match_types(&[TokenType::NIL]) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.match_types(&[TokenType::NUMBER(0.0), TokenType::STRING(String::new())]) {
            let literal: LiteralValue = match &self.previous().token_type {
                TokenType::NUMBER(n) => LiteralValue::Number(*n),

                TokenType::STRING(s) => LiteralValue::Str(s.clone()),

                _ => unreachable!("literal token changed type"),
            };

            return Ok(Expr::Literal(literal));
        }

        if self.match_types(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: self.previous().clone(),
            });
        }

        if self.match_types(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_types(&[TokenType::SUPER]) {
            let keyword: Token = self.previous().clone();

            self.consume(&TokenType::DOT, "Expect '.' after 'super'.")?;

            let method: Token =
                self.consume(&TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword,
                method,
            });
        }

        if self.match_types(&[TokenType::LEFT_PAREN]) {
            let expr: Expr = self.expression()?;

            let _ = self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after expression.");

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.match_types(&[TokenType::FUN]) {
            let line: usize = self.previous().line;
            let name = Token::new(TokenType::IDENTIFIER, "lambda".to_string(), line);

            let decl = self.finish_function(name, "lambda")?;

            return Ok(Expr::Lambda(decl));
        }

        let token: Token = self.peek().clone();
        Err(self.error(&token, "Expected expression."))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Token plumbing
    // ─────────────────────────────────────────────────────────────────────

    /// Records a diagnostic at `token` and returns a copy for propagation.
    fn error(&mut self, token: &Token, msg: &str) -> LoxError {
        let err = LoxError::parse(token.line, error_location(token), msg.to_string());

        debug!("Parse error recorded: {}", err);

        self.errors
            .push(LoxError::parse(token.line, error_location(token), msg));

        err
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        match self.tokens.get(self.current + 1) {
            Some(token) if token.token_type != TokenType::EOF => {
                &token.token_type == token_type
            }

            _ => false,
        }
    }

    fn consume(&mut self, token_type: &TokenType, msg: &str) -> Result<Token, LoxError> {
        if self.check(token_type) {
            return Ok(self.advance().clone());
        }

        let token: Token = self.peek().clone();
        Err(self.error(&token, msg))
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Panic-mode recovery: discard tokens until just past the next `;`.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let token_type: TokenType = self.advance().token_type.clone();

            if token_type == TokenType::SEMICOLON {
                return;
            }
        }
    }
}

fn error_location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}
