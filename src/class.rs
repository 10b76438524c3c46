use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::Function;
use crate::environment::Environment;
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// A class value: the method table, the environment captured at the
/// definition site, and the superclass, if any.
///
/// When a superclass exists the captured environment is wrapped in an extra
/// frame that binds `super`, so every method body resolves `super` to the
/// defining class's superclass regardless of the receiver's actual class.
pub struct Class {
    pub name: Token,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<FunctionDecl>>,
    env: Rc<RefCell<Environment>>,
}

impl Class {
    pub fn new(
        name: Token,
        method_decls: &[Rc<FunctionDecl>],
        env: Rc<RefCell<Environment>>,
        superclass: Option<Rc<Class>>,
    ) -> Rc<Self> {
        let mut methods: HashMap<String, Rc<FunctionDecl>> = HashMap::new();

        for method in method_decls {
            methods.insert(method.name.lexeme.clone(), Rc::clone(method));
        }

        let env: Rc<RefCell<Environment>> = match &superclass {
            Some(sup) => {
                let wrapper = Rc::new(RefCell::new(Environment::with_enclosing(env)));

                wrapper
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(sup)));

                wrapper
            }

            None => env,
        };

        debug!(
            "Creating class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Rc::new(Class {
            name,
            superclass,
            methods,
            env,
        })
    }

    /// Number of arguments a call to the class takes: the arity of `init`
    /// anywhere on the ancestor chain, zero when no initializer exists.
    pub fn arity(&self) -> usize {
        let mut class: &Class = self;

        loop {
            if let Some(init) = class.methods.get("init") {
                return init.params.len();
            }

            match &class.superclass {
                Some(sup) => class = sup,

                None => return 0,
            }
        }
    }

    /// Walks the ancestor chain for `name`.  Returns the *defining* class
    /// alongside the declaration: binding must close over the definer's
    /// environment, not the receiver's class.
    pub fn find_method(class: &Rc<Class>, name: &str) -> Option<(Rc<Class>, Rc<FunctionDecl>)> {
        let mut class: Rc<Class> = Rc::clone(class);

        loop {
            if let Some(method) = class.methods.get(name) {
                let method: Rc<FunctionDecl> = Rc::clone(method);

                return Some((Rc::clone(&class), method));
            }

            let superclass: Option<Rc<Class>> = class.superclass.clone();

            match superclass {
                Some(sup) => class = sup,

                None => return None,
            }
        }
    }

    /// Produces a bound method: the declaration closed over a fresh frame
    /// that binds `this` to the instance, enclosed by the defining class's
    /// environment.  Bindings are created on every lookup and never cached
    /// on the instance, so instances do not own closures that reference
    /// them back.
    pub fn bind(defining: &Rc<Class>, decl: &Rc<FunctionDecl>, instance: &Rc<Instance>) -> Value {
        let method_env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &defining.env,
        ))));

        method_env
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        let is_initializer: bool = decl.name.lexeme == "init";

        Value::Function(Function::new(Rc::clone(decl), method_env, is_initializer))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name.lexeme)
    }
}

/// An object: a pointer to its class plus a mutable field map.  Fields
/// shadow methods on reads.
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Self> {
        Rc::new(Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class.name.lexeme
    }

    /// Property read: fields first, then a freshly bound method.
    pub fn get(instance: &Rc<Instance>, name: &str) -> Option<Value> {
        if let Some(value) = instance.fields.borrow().get(name) {
            return Some(value.clone());
        }

        let (defining, method) = Class::find_method(&instance.class, name)?;

        Some(Class::bind(&defining, &method, instance))
    }

    /// Property write: stores the field, shadowing any method of the same
    /// name on subsequent reads.
    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class.name.lexeme)
    }
}
