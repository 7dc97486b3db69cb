// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::{RuntimeError, Signal};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk parent chain). Also
    /// used for redefinition, which Lox permits at global scope.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a symbol in THIS scope and parent scopes recursively. Used
    /// only for globals, which the resolver never annotates with a hop
    /// distance.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    pub fn get_or_error(&self, name: &Token) -> Result<Value, Signal> {
        self.get(&name.lexeme).ok_or_else(|| {
            Signal::Error(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        })
    }

    /// Walks exactly `distance` parent links, per the resolver's hop count.
    fn ancestor(self: &Rc<Self>, distance: usize) -> Rc<Environment> {
        let mut env = self.clone();
        for _ in 0..distance {
            env = env
                .parent
                .clone()
                .expect("resolver hop distance exceeds environment chain depth");
        }
        env
    }

    pub fn get_at(self: &Rc<Self>, distance: usize, name: &str) -> Value {
        self.ancestor(distance)
            .bindings
            .borrow()
            .get(name)
            .cloned()
            .expect("resolved variable missing from its resolved scope")
    }

    pub fn assign_at(self: &Rc<Self>, distance: usize, name: &str, value: Value) {
        self.ancestor(distance)
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Updates an existing binding in this scope or an enclosing one;
    /// assigning to a name that has never been declared anywhere is a
    /// runtime error, used for global assignment the resolver leaves
    /// unannotated.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), Signal> {
        if self.bindings.borrow().contains_key(&name.lexeme) {
            self.bindings.borrow_mut().insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(ref parent) = self.parent {
            return parent.assign(name, value);
        }

        Err(Signal::Error(RuntimeError::new(
            name,
            format!("Undefined variable '{}'.", name.lexeme),
        )))
    }
}
