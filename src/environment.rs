use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

/// One lexical frame: a name→value map plus an optional enclosing frame.
///
/// Frames are shared by reference (`Rc<RefCell<_>>`): every closure created
/// in a scope captures the same frame object, so writes made through one
/// closure are visible to the others.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}' in current frame", name);

        self.values.insert(name.to_string(), value);
    }

    /// Reads `name`, walking the enclosing chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Writes `name` where it is already bound, walking the enclosing
    /// chain.  Returns false when no frame binds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// The frame exactly `distance` hops up the enclosing chain, or `None`
    /// when the chain is shorter than the resolved depth.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let next: Option<Rc<RefCell<Environment>>> = frame.borrow().enclosing.clone();

            frame = next?;
        }

        Some(frame)
    }

    /// Reads `name` from the frame `distance` hops up, without walking
    /// further.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        debug!("Reading '{}' at depth {}", name, distance);

        Environment::ancestor(env, distance)?
            .borrow()
            .values
            .get(name)
            .cloned()
    }

    /// Writes `name` in the frame `distance` hops up.  Returns false when
    /// that frame does not bind it.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        debug!("Writing '{}' at depth {}", name, distance);

        let Some(frame) = Environment::ancestor(env, distance) else {
            return false;
        };

        let mut frame = frame.borrow_mut();

        if frame.values.contains_key(name) {
            frame.values.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
