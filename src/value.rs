// ABOUTME: Runtime value types — primitives plus user functions, classes, and instances

use crate::ast::FunctionStmt;
use crate::environment::Environment;
use crate::error::{EvalResult, RuntimeError, Signal};
use crate::token::Token;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<LoxFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    /// Lox truthiness: `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::Function(f) => Some(f.declaration.params.len()),
            Value::Native(n) => Some(n.arity),
            Value::Class(c) => Some(c.find_method("init").map_or(0, |m| m.declaration.params.len())),
            _ => None,
        }
    }
}

/// Literal equality per spec §3: same tag and same payload only; different
/// tags (including callables) are simply unequal, never an error.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "<fn {}>", func.declaration.name.lexeme),
            Value::Native(native) => write!(f, "<native fn {}>", native.name),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

/// A native (Rust-implemented) callable, e.g. `clock`.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> EvalResult<Value>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// A user-defined function, capturing the environment live when its
/// declaration was executed (its closure). A method's bound form is a
/// fresh `LoxFunction` sharing the same declaration but wrapping a closure
/// with an extra `this` (and, for subclass methods, `super`) scope — see
/// `bind`.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionStmt>,
    pub closure: Rc<Environment>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionStmt>, closure: Rc<Environment>, is_initializer: bool) -> Rc<Self> {
        Rc::new(LoxFunction {
            declaration,
            closure,
            is_initializer,
        })
    }

    /// Produces the method bound to `instance`: a new closure environment,
    /// parented on this function's own closure, holding a single `this`
    /// binding — per spec §4.4/SPEC_FULL §4.4.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> Rc<LoxFunction> {
        let env = Environment::with_parent(self.closure.clone());
        env.define("this".to_string(), Value::Instance(instance));
        Rc::new(LoxFunction {
            declaration: self.declaration.clone(),
            closure: env,
            is_initializer: self.is_initializer,
        })
    }

    /// The bound instance an initializer implicitly returns. Only valid to
    /// call on a function produced by `bind`.
    pub fn closure_this(&self) -> Value {
        self.closure
            .get("this")
            .expect("closure_this called on an unbound function")
    }
}

/// A class's runtime representation: its own method table plus an optional
/// link to its superclass for inherited lookup.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass.as_ref().and_then(|s| s.find_method(name))
    }
}

/// A class instance: a class back-reference plus a mutable field map.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Rc<Self> {
        Rc::new(LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    /// Reads a field first, falling back to a bound method; missing name is
    /// a runtime error per spec §4.4.
    pub fn get(self: &Rc<Self>, name: &Token) -> EvalResult<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(method.bind(self.clone())));
        }

        Err(Signal::Error(RuntimeError::new(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        )))
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}
