use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::LoxError;
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A host-provided builtin.  Boxed so overrides supplied through the
/// interpreter config can carry state (tests use this to make `clock`
/// deterministic).
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: Box<dyn Fn(&[Value]) -> Result<Value, LoxError>>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, arity: usize, func: F) -> Rc<Self>
    where
        F: Fn(&[Value]) -> Result<Value, LoxError> + 'static,
    {
        Rc::new(NativeFunction {
            name: name.to_string(),
            arity,
            func: Box::new(func),
        })
    }
}

// Closure environments reach back into the value graph; printing the name
// keeps Debug from chasing the cycle.
impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

/// A user function: a declaration paired with the environment captured at
/// its definition site.  Bound methods are the same shape with a closure
/// that additionally binds `this` (and `super` through the class chain).
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        decl: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Rc<Self> {
        Rc::new(Function {
            decl,
            closure,
            is_initializer,
        })
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    pub fn name(&self) -> &str {
        &self.decl.name.lexeme
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name())
    }
}
