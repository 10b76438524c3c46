//! Tree-walking evaluator.
//!
//! Statements and expressions are executed by direct recursion over the
//! syntax tree.  Three pieces of state persist across REPL lines: the
//! globals frame, the resolution map (expression identity → hop distance,
//! filled in by the resolver), and the call stack of function names used to
//! catch stray `return`s at runtime.
//!
//! Non-local exits ride the `Err` channel as an [`Interrupt`]: a `return`
//! unwinds to the nearest call boundary, a runtime failure unwinds all the
//! way out.  Statement lists stop at the first non-normal outcome.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::callable::{Function, NativeFunction};
use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{ErrorKind, LoxError};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Sink for `print` output.
pub type PrintFn = Box<dyn FnMut(String)>;

/// Host configuration: where `print` goes and which globals to override.
/// Tests substitute a buffering sink and a deterministic `clock`.
pub struct InterpreterConfig {
    pub print: PrintFn,
    pub global_overrides: HashMap<String, Value>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            print: Box::new(|s| println!("{}", s)),
            global_overrides: HashMap::new(),
        }
    }
}

/// Why evaluation stopped early.
pub enum Interrupt {
    /// A `return` statement is unwinding towards its call boundary.
    Return(Value),

    /// A runtime error is unwinding to the top.
    Failure(LoxError),
}

impl From<LoxError> for Interrupt {
    fn from(err: LoxError) -> Self {
        Interrupt::Failure(err)
    }
}

/// Internal result: `Ok` is normal completion, `Err` an [`Interrupt`].
type Flow<T> = Result<T, Interrupt>;

pub struct Interpreter {
    config: InterpreterConfig,
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    callstack: Vec<String>,
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals
            .borrow_mut()
            .define("clock", Value::NativeFunction(clock_native()));

        for (name, value) in &config.global_overrides {
            info!("Overriding global '{}'", name);

            globals.borrow_mut().define(name, value.clone());
        }

        let environment: Rc<RefCell<Environment>> = Rc::clone(&globals);

        Interpreter {
            config,
            globals,
            environment,
            callstack: Vec::new(),
            locals: HashMap::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution bookkeeping (filled in by the resolver)
    // ─────────────────────────────────────────────────────────────────────

    /// Records that the expression `id` binds `hops` frames up from the
    /// environment current at its evaluation.
    pub fn note_local(&mut self, id: ExprId, hops: usize) {
        debug!("Noting local {:?} at depth {}", id, hops);

        self.locals.insert(id, hops);
    }

    /// A name with no recorded depth lives in the globals frame; nothing to
    /// remember.
    pub fn note_global(&self, name: &str) {
        debug!("Noting global '{}'", name);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a whole program in the persistent global environment.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Interrupt::Failure(e)) => return Err(e),

                // A stray return is caught statically and at runtime; if one
                // still unwinds this far, the program simply ends.
                Err(Interrupt::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    /// Evaluates a single expression (the REPL's expression mode).
    pub fn interpret_expr(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),

            Err(Interrupt::Return(value)) => Ok(value),

            Err(Interrupt::Failure(e)) => Err(e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Flow<()> {
        debug!("Executing stmt: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                (self.config.print)(value.to_string());

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Return { keyword, value } => {
                // The resolver rejects stray returns statically; the call
                // stack check covers expressions resolved in isolation.
                if self.callstack.is_empty() {
                    return Err(self.error(
                        ErrorKind::UNEXPECTED_RETURN,
                        keyword,
                        "unexpected return in current scope",
                    ));
                }

                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(function));

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass_value: Option<Rc<Class>> = match superclass {
                    Some(expr) => {
                        let value: Value = self.evaluate(expr)?;

                        match value {
                            Value::Class(class) => Some(class),

                            _ => {
                                let super_name: &Token = superclass_name(expr).unwrap_or(name);

                                return Err(self.error(
                                    ErrorKind::INVALID_CLASS,
                                    super_name,
                                    "Invalid super class",
                                ));
                            }
                        }
                    }

                    None => None,
                };

                let class: Rc<Class> = Class::new(
                    name.clone(),
                    methods,
                    Rc::clone(&self.environment),
                    superclass_value,
                );

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Class(class));

                Ok(())
            }
        }
    }

    /// Runs `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Flow<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = environment;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(interrupt) => {
                    self.environment = previous;
                    return Err(interrupt);
                }
            }
        }

        self.environment = previous;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Flow<Value> {
        match expr {
            Expr::Literal(literal) => Ok(evaluate_literal(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                true_branch,
                false_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(true_branch)
                } else {
                    self.evaluate(false_branch)
                }
            }

            Expr::Variable { id, name } => {
                self.lookup_variable(name, *id).map_err(Interrupt::from)
            }

            Expr::This { id, keyword } => {
                self.lookup_variable(keyword, *id).map_err(Interrupt::from)
            }

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(self.error(
                        ErrorKind::UNDEFINED_VARIABLE,
                        name,
                        "Undefined variable",
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                let instance: Rc<Instance> = match object {
                    Value::Instance(instance) => instance,

                    _ => {
                        return Err(self.error(
                            ErrorKind::NOT_AN_OBJECT,
                            name,
                            "Expression does not evaluate to an object",
                        ));
                    }
                };

                match Instance::get(&instance, &name.lexeme) {
                    Some(value) => Ok(value),

                    None => Err(self.error(
                        ErrorKind::UNDEFINED_OBJECT_PROPERTY,
                        name,
                        "Property is not defined on object",
                    )),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                let value: Value = self.evaluate(value)?;

                match object {
                    Value::Instance(instance) => {
                        instance.set(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(self.error(
                        ErrorKind::NOT_AN_OBJECT,
                        name,
                        "Expression does not evaluate to an object",
                    )),
                }
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda(decl) => Ok(Value::Function(Function::new(
                Rc::clone(decl),
                Rc::clone(&self.environment),
                false,
            ))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Flow<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(self.error(
                    ErrorKind::UNEXPECTED_TYPE,
                    operator,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(self.error(
                ErrorKind::UNEXPECTED_OPERATOR,
                operator,
                "Invalid unary operator",
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Flow<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => {
                // String concatenation wins if either side is a string; the
                // other side is coerced through its display form.
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    return Ok(Value::String(format!("{}{}", left, right)));
                }

                self.arithmetic(operator, &left, &right, |l, r| l + r)
            }

            TokenType::MINUS => self.arithmetic(operator, &left, &right, |l, r| l - r),

            TokenType::STAR => self.arithmetic(operator, &left, &right, |l, r| l * r),

            TokenType::SLASH => {
                if matches!(right, Value::Number(n) if n == 0.0) {
                    return Err(self.error(
                        ErrorKind::DIVIDE_BY_ZERO,
                        operator,
                        "Cannot divide by zero.",
                    ));
                }

                self.arithmetic(operator, &left, &right, |l, r| l / r)
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            TokenType::GREATER => {
                self.comparison(operator, &left, &right, |l, r| l > r, |l, r| l > r)
            }

            TokenType::GREATER_EQUAL => {
                self.comparison(operator, &left, &right, |l, r| l >= r, |l, r| l >= r)
            }

            TokenType::LESS => self.comparison(operator, &left, &right, |l, r| l < r, |l, r| l < r),

            TokenType::LESS_EQUAL => {
                self.comparison(operator, &left, &right, |l, r| l <= r, |l, r| l <= r)
            }

            _ => Err(self.error(
                ErrorKind::UNEXPECTED_OPERATOR,
                operator,
                "Invalid binary operator",
            )),
        }
    }

    fn arithmetic(
        &self,
        operator: &Token,
        left: &Value,
        right: &Value,
        f: fn(f64, f64) -> f64,
    ) -> Flow<Value> {
        let l: f64 = match left {
            Value::Number(n) => *n,

            _ => {
                return Err(self.error(
                    ErrorKind::UNEXPECTED_TYPE,
                    operator,
                    "Left operand must be a number.",
                ));
            }
        };

        let r: f64 = match right {
            Value::Number(n) => *n,

            _ => {
                return Err(self.error(
                    ErrorKind::UNEXPECTED_TYPE,
                    operator,
                    "Right operand must be a number.",
                ));
            }
        };

        Ok(Value::Number(f(l, r)))
    }

    /// Ordering comparison: strings compare lexicographically when the left
    /// operand is a string, otherwise both operands must be numbers.
    fn comparison(
        &self,
        operator: &Token,
        left: &Value,
        right: &Value,
        num_cmp: fn(f64, f64) -> bool,
        str_cmp: fn(&str, &str) -> bool,
    ) -> Flow<Value> {
        if let Value::String(l) = left {
            let r: &str = match right {
                Value::String(r) => r,

                _ => {
                    return Err(self.error(
                        ErrorKind::UNEXPECTED_TYPE,
                        operator,
                        "Right operand must be a string.",
                    ));
                }
            };

            return Ok(Value::Bool(str_cmp(l, r)));
        }

        let l: f64 = match left {
            Value::Number(n) => *n,

            _ => {
                return Err(self.error(
                    ErrorKind::UNEXPECTED_TYPE,
                    operator,
                    "Left operand must be a number.",
                ));
            }
        };

        let r: f64 = match right {
            Value::Number(n) => *n,

            _ => {
                return Err(self.error(
                    ErrorKind::UNEXPECTED_TYPE,
                    operator,
                    "Right operand must be a number.",
                ));
            }
        };

        Ok(Value::Bool(num_cmp(l, r)))
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Flow<Value> {
        let left: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if is_truthy(&left) {
                    return Ok(Value::Bool(true));
                }

                let right: Value = self.evaluate(right)?;

                Ok(Value::Bool(is_truthy(&right)))
            }

            TokenType::AND => {
                if !is_truthy(&left) {
                    return Ok(Value::Bool(false));
                }

                let right: Value = self.evaluate(right)?;

                Ok(Value::Bool(is_truthy(&right)))
            }

            _ => Err(self.error(
                ErrorKind::UNEXPECTED_OPERATOR,
                operator,
                "Invalid logical operator",
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Flow<Value> {
        let callee: Value = self.evaluate(callee)?;

        // Arity is checked before any argument is evaluated.
        let arity: usize = match &callee {
            Value::NativeFunction(native) => native.arity,

            Value::Function(function) => function.arity(),

            Value::Class(class) => class.arity(),

            _ => {
                return Err(self.error(
                    ErrorKind::CANNOT_CALL,
                    paren,
                    "Can only call functions or classes",
                ));
            }
        };

        if arity != arguments.len() {
            return Err(self.error(
                ErrorKind::INVALID_ARGUMENTS,
                paren,
                "Provided arguments do not match function definition",
            ));
        }

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        match callee {
            Value::NativeFunction(native) => {
                debug!("Calling native '{}'", native.name);

                (native.func)(&args).map_err(Interrupt::from)
            }

            Value::Function(function) => self
                .call_function(&function, args)
                .map_err(Interrupt::from),

            Value::Class(class) => self.call_class(&class, args).map_err(Interrupt::from),

            _ => unreachable!("arity check admits only callables"),
        }
    }

    /// Invokes a user function: fresh frame over the captured closure,
    /// parameters bound left to right, body run as a block.  A `return`
    /// unwinding out of the body stops here.
    pub(crate) fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
    ) -> Result<Value, LoxError> {
        info!("Calling function '{}'", function.name());

        let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &function.closure,
        ))));

        for (param, arg) in function.decl.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        self.callstack.push(function.name().to_string());

        let outcome: Flow<()> = self.execute_block(&function.decl.body, env);

        self.callstack.pop();

        let returned: Value = match outcome {
            Ok(()) => Value::Nil,

            Err(Interrupt::Return(value)) => value,

            Err(Interrupt::Failure(e)) => return Err(e),
        };

        // Initializers always yield the constructed instance, whatever the
        // body returned.
        if function.is_initializer {
            return Environment::get_at(&function.closure, 0, "this").ok_or_else(|| {
                LoxError::runtime(
                    ErrorKind::UNDEFINED_VARIABLE,
                    function.decl.name.line,
                    function.decl.name.lexeme.clone(),
                    "Undefined variable".to_string(),
                )
            });
        }

        Ok(returned)
    }

    /// Calling a class constructs an instance and runs `init` when the
    /// class chain defines one.  The instance is returned regardless of
    /// what the initializer body does.
    fn call_class(&mut self, class: &Rc<Class>, args: Vec<Value>) -> Result<Value, LoxError> {
        info!("Instantiating class '{}'", class.name.lexeme);

        let instance: Rc<Instance> = Instance::new(Rc::clone(class));

        if let Some((defining, init)) = Class::find_method(class, "init") {
            if let Value::Function(bound) = Class::bind(&defining, &init, &instance) {
                self.call_function(&bound, args)?;
            }
        }

        Ok(Value::Instance(instance))
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Flow<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(self.error(
                    ErrorKind::UNDEFINED_VARIABLE,
                    keyword,
                    "Undefined variable",
                ));
            }
        };

        let superclass: Rc<Class> = match Environment::get_at(&self.environment, distance, "super")
        {
            Some(Value::Class(class)) => class,

            _ => {
                return Err(self.error(
                    ErrorKind::NOT_AN_OBJECT,
                    keyword,
                    "super variable is not an object",
                ));
            }
        };

        // `this` lives one frame below the `super` frame.
        let this_distance: usize = distance.saturating_sub(1);

        let instance: Rc<Instance> =
            match Environment::get_at(&self.environment, this_distance, "this") {
                Some(Value::Instance(instance)) => instance,

                _ => {
                    return Err(self.error(
                        ErrorKind::UNDEFINED_VARIABLE,
                        keyword,
                        "Undefined variable",
                    ));
                }
            };

        match Class::find_method(&superclass, &method.lexeme) {
            Some((defining, decl)) => Ok(Class::bind(&defining, &decl, &instance)),

            None => Err(self.error(
                ErrorKind::UNDEFINED_OBJECT_PROPERTY,
                method,
                "Method does not exist on super",
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Variable access
    // ─────────────────────────────────────────────────────────────────────

    /// Reads a name: resolved locals walk exactly their recorded hop count,
    /// everything else goes to the globals frame.
    fn lookup_variable(&self, name: &Token, id: ExprId) -> Result<Value, LoxError> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            LoxError::runtime(
                ErrorKind::UNDEFINED_VARIABLE,
                name.line,
                name.lexeme.clone(),
                "Undefined variable".to_string(),
            )
        })
    }

    fn error(&self, kind: ErrorKind, token: &Token, message: &str) -> Interrupt {
        Interrupt::Failure(LoxError::runtime(
            kind,
            token.line,
            token.lexeme.clone(),
            message.to_string(),
        ))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(InterpreterConfig::default())
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),

        LiteralValue::Str(s) => Value::String(s.clone()),

        LiteralValue::True => Value::Bool(true),

        LiteralValue::False => Value::Bool(false),

        LiteralValue::Nil => Value::Nil,
    }
}

/// `nil` and `false` are falsy; everything else, including `0` and `""`,
/// is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}

fn superclass_name(expr: &Expr) -> Option<&Token> {
    match expr {
        Expr::Variable { name, .. } => Some(name),

        _ => None,
    }
}

fn clock_native() -> Rc<NativeFunction> {
    NativeFunction::new("clock", 0, |_args| {
        let timestamp: f64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| {
                LoxError::runtime(
                    ErrorKind::UNEXPECTED_TYPE,
                    0,
                    "clock".to_string(),
                    format!("Clock error: {}", e),
                )
            })?
            .as_secs_f64();

        Ok(Value::Number(timestamp))
    })
}
