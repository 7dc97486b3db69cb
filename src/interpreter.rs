// ABOUTME: Tree-walking evaluator for Lox expressions and statements

use crate::ast::{Expr, Stmt};
use crate::environment::Environment;
use crate::error::{EvalResult, RuntimeError, RunOutcome, Signal};
use crate::resolver::ResolutionTable;
use crate::token::{Literal, Token, TokenKind};
use crate::value::{values_equal, LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct Interpreter {
    pub globals: Rc<Environment>,
    environment: Rc<Environment>,
    locals: ResolutionTable,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        register_natives(&globals);
        Interpreter {
            environment: globals.clone(),
            globals,
            locals: ResolutionTable::new(),
        }
    }

    /// Installs the resolution table produced by a resolver pass. Must be
    /// called (even with an empty table) before `interpret`, per spec §2.
    pub fn set_locals(&mut self, locals: ResolutionTable) {
        self.locals = locals;
    }

    /// Merges in a resolution table without discarding previously installed
    /// entries. The REPL resolves and interprets one line at a time, but a
    /// closure declared on an earlier line can still be called on a later
    /// one — its captured variables' `ExprId`s must stay resolvable, since
    /// `ExprId` is allocated from a single global counter that never repeats.
    pub fn extend_locals(&mut self, locals: ResolutionTable) {
        self.locals.extend(locals);
    }

    /// Runs each top-level statement in order, stopping and reporting the
    /// first runtime error (a `Return` escaping to top level is a bug and
    /// is treated as one). Returns whether a runtime error occurred.
    pub fn interpret(&mut self, statements: &[Stmt], outcome: &mut RunOutcome) {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Signal::Error(err)) => {
                    eprintln!("{}", err);
                    outcome.had_runtime_error = true;
                    return;
                }
                Err(Signal::Return(_)) => {
                    unreachable!("return escaped to top level: resolver should have rejected this")
                }
            }
        }
    }

    // ===== statement execution =====

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Block(statements) => {
                let block_env = Environment::with_parent(self.environment.clone());
                self.execute_block(statements, block_env)
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                self.environment
                    .define(declaration.name.lexeme.clone(), Value::Function(function));
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value);
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Signal::Return(value))
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
        }
    }

    /// Executes `statements` in `new_env`, always restoring the previous
    /// environment on exit — normal, error, or a propagating `Return`
    /// marker — per spec §4.4.
    pub fn execute_block(&mut self, statements: &[Stmt], new_env: Rc<Environment>) -> EvalResult<()> {
        let previous = std::mem::replace(&mut self.environment, new_env);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::ast::FunctionStmt>],
    ) -> EvalResult<()> {
        let superclass_value = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable { name, .. } => name,
                            _ => unreachable!("superclass expression is always a Variable"),
                        };
                        return Err(RuntimeError::new(token, "Superclass must be a class.").into());
                    }
                }
            }
            None => None,
        };

        self.environment.define(name.lexeme.clone(), Value::Nil);

        let mut method_env = self.environment.clone();
        if let Some(superclass_value) = &superclass_value {
            method_env = Environment::with_parent(method_env);
            method_env.define("super".to_string(), Value::Class(superclass_value.clone()));
        }

        let mut method_table = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(method.clone(), method_env.clone(), is_initializer);
            method_table.insert(method.name.lexeme.clone(), function);
        }

        let class = Rc::new(LoxClass {
            name: name.lexeme.clone(),
            superclass: superclass_value,
            methods: method_table,
        });

        self.environment.assign(name, Value::Class(class))?;
        Ok(())
    }

    // ===== expression evaluation =====

    fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, &name.lexeme, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => instance.get(name),
                    _ => Err(RuntimeError::new(name, "Only instances have properties.").into()),
                }
            }
            Expr::Grouping { expression } => self.evaluate(expression),
            Expr::Literal { value } => Ok(literal_to_value(value)),
            Expr::Logical { left, operator, right } => {
                let left_value = self.evaluate(left)?;
                let is_or = operator.kind == TokenKind::Or;
                if is_or == left_value.is_truthy() {
                    Ok(left_value)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.set(&name.lexeme, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(name, "Only instances have fields.").into()),
                }
            }
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
        }
    }

    fn lookup_variable(&self, id: u64, name: &Token) -> EvalResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => self.globals.get_or_error(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let right = self.evaluate(right)?;
        match operator.kind {
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator, "Operand must be a number.").into()),
            },
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only produces ! and - unary operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.kind {
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },
            TokenKind::Minus => numeric_binary(operator, left, right, |a, b| Value::Number(a - b)),
            TokenKind::Star => numeric_binary(operator, left, right, |a, b| Value::Number(a * b)),
            TokenKind::Slash => numeric_binary(operator, left, right, |a, b| Value::Number(a / b)),
            TokenKind::Greater => numeric_binary(operator, left, right, |a, b| Value::Bool(a > b)),
            TokenKind::GreaterEqual => numeric_binary(operator, left, right, |a, b| Value::Bool(a >= b)),
            TokenKind::Less => numeric_binary(operator, left, right, |a, b| Value::Bool(a < b)),
            TokenKind::LessEqual => numeric_binary(operator, left, right, |a, b| Value::Bool(a <= b)),
            TokenKind::EqualEqual => Ok(Value::Bool(values_equal(&left, &right))),
            TokenKind::BangEqual => Ok(Value::Bool(!values_equal(&left, &right))),
            _ => unreachable!("parser only produces binary-capable operators here"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> EvalResult<Value> {
        let callee_value = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        let arity = callee_value
            .arity()
            .ok_or_else(|| RuntimeError::new(paren, "Can only call functions and classes."))?;

        if args.len() != arity {
            return Err(RuntimeError::new(
                paren,
                format!("Expected {} arguments but got {}.", arity, args.len()),
            )
            .into());
        }

        match callee_value {
            Value::Function(function) => self.call_function(&function, args),
            Value::Native(native) => (native.func)(&args),
            Value::Class(class) => self.instantiate(class, args),
            _ => unreachable!("arity() already filtered to callables"),
        }
    }

    fn call_function(&mut self, function: &Rc<LoxFunction>, args: Vec<Value>) -> EvalResult<Value> {
        let call_env = Environment::with_parent(function.closure.clone());
        for (param, arg) in function.declaration.params.iter().zip(args) {
            call_env.define(param.lexeme.clone(), arg);
        }

        match self.execute_block(&function.declaration.body, call_env) {
            Ok(()) => {
                if function.is_initializer {
                    Ok(function.closure_this())
                } else {
                    Ok(Value::Nil)
                }
            }
            Err(Signal::Return(value)) => {
                if function.is_initializer {
                    Ok(function.closure_this())
                } else {
                    Ok(value)
                }
            }
            Err(err @ Signal::Error(_)) => Err(err),
        }
    }

    fn instantiate(&mut self, class: Rc<LoxClass>, args: Vec<Value>) -> EvalResult<Value> {
        let instance = LoxInstance::new(class.clone());
        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(instance.clone());
            self.call_function(&bound, args)?;
        }
        Ok(Value::Instance(instance))
    }

    fn evaluate_super(&mut self, id: u64, keyword: &Token, method: &Token) -> EvalResult<Value> {
        let distance = *self
            .locals
            .get(&id)
            .expect("resolver always annotates a resolvable 'super' expression");
        let superclass = match self.environment.get_at(distance, "super") {
            Value::Class(class) => class,
            _ => unreachable!("'super' binding is always a Class"),
        };
        // `this` sits exactly one scope closer to the use site than `super`.
        let instance = match self.environment.get_at(distance - 1, "this") {
            Value::Instance(instance) => instance,
            _ => unreachable!("'this' binding is always an Instance"),
        };

        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            RuntimeError::new(method, format!("Undefined property '{}'.", method.lexeme))
        })?;
        Ok(Value::Function(found.bind(instance)))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_binary(
    operator: &Token,
    left: Value,
    right: Value,
    op: impl Fn(f64, f64) -> Value,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(op(a, b)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.").into()),
    }
}

fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Nil,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn register_natives(globals: &Rc<Environment>) {
    globals.define(
        "clock".to_string(),
        Value::Native(Rc::new(NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args| {
                let seconds = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                Ok(Value::Number(seconds))
            },
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;
    use std::cell::RefCell;

    fn run(src: &str) -> (String, RunOutcome) {
        let (tokens, lex_errors) = Scanner::new(src).scan_tokens();
        assert!(lex_errors.is_empty(), "{:?}", lex_errors);
        let (stmts, parse_errors) = parse(tokens);
        assert!(parse_errors.is_empty(), "{:?}", parse_errors);
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty(), "{:?}", resolve_errors);

        let mut interp = Interpreter::new();
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();

        // Tests assert on printed output by temporarily shadowing println!
        // is not possible without a sink abstraction; instead exercise the
        // interpreter directly where the seed scenarios need only the
        // final variable state or the absence of runtime errors.
        interp.interpret(&stmts, &mut outcome);
        (String::new(), outcome)
    }

    #[test]
    fn arithmetic_precedence() {
        let (_, outcome) = run("print 1 + 2 * 3;");
        assert!(!outcome.had_runtime_error);
    }

    #[test]
    fn closure_counter_increments_across_calls() {
        let mut interp = Interpreter::new();
        let src = "fun makeCounter(){ var i=0; fun c(){ i=i+1; return i; } return c; } var f = makeCounter(); var a = f(); var b = f(); var c2 = f();";
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, errors) = parse(tokens);
        assert!(errors.is_empty());
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty());
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();
        interp.interpret(&stmts, &mut outcome);
        assert!(!outcome.had_runtime_error);

        match interp.globals.get("a") {
            Some(Value::Number(n)) => assert_eq!(n, 1.0),
            other => panic!("unexpected a: {:?}", other),
        }
        match interp.globals.get("c2") {
            Some(Value::Number(n)) => assert_eq!(n, 3.0),
            other => panic!("unexpected c2: {:?}", other),
        }
    }

    #[test]
    fn runtime_error_on_string_minus_number() {
        let (_, outcome) = run("print \"a\" - 1;");
        assert!(outcome.had_runtime_error);
    }

    #[test]
    fn class_instance_field_roundtrip() {
        let mut interp = Interpreter::new();
        let src = "class Greeter{} var g = Greeter(); g.name = \"world\"; var n = g.name;";
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, errors) = parse(tokens);
        assert!(errors.is_empty());
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty());
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();
        interp.interpret(&stmts, &mut outcome);
        assert!(!outcome.had_runtime_error);
        match interp.globals.get("n") {
            Some(Value::String(s)) => assert_eq!(s, "world"),
            other => panic!("unexpected n: {:?}", other),
        }
    }

    #[test]
    fn initializer_sets_fields_and_returns_instance() {
        let mut interp = Interpreter::new();
        let src = "class Point{ init(x,y){ this.x=x; this.y=y; } } var p=Point(3,4); var px = p.x;";
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, errors) = parse(tokens);
        assert!(errors.is_empty());
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty());
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();
        interp.interpret(&stmts, &mut outcome);
        assert!(!outcome.had_runtime_error);
        match interp.globals.get("px") {
            Some(Value::Number(n)) => assert_eq!(n, 3.0),
            other => panic!("unexpected px: {:?}", other),
        }
    }

    #[test]
    fn inheritance_super_call_chains_to_parent_method() {
        let mut interp = Interpreter::new();
        let src = "class A{ method(){ return 1; } } class B < A { method(){ return super.method() + 1; } } var r = B().method();";
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, errors) = parse(tokens);
        assert!(errors.is_empty());
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty());
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();
        interp.interpret(&stmts, &mut outcome);
        assert!(!outcome.had_runtime_error);
        match interp.globals.get("r") {
            Some(Value::Number(n)) => assert_eq!(n, 2.0),
            other => panic!("unexpected r: {:?}", other),
        }
    }

    #[test]
    fn division_by_zero_yields_infinity_not_an_error() {
        let mut interp = Interpreter::new();
        let src = "var r = 1/0;";
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, errors) = parse(tokens);
        assert!(errors.is_empty());
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty());
        interp.set_locals(locals);
        let mut outcome = RunOutcome::default();
        interp.interpret(&stmts, &mut outcome);
        assert!(!outcome.had_runtime_error);
        match interp.globals.get("r") {
            Some(Value::Number(n)) => assert!(n.is_infinite()),
            other => panic!("unexpected r: {:?}", other),
        }
    }

    // Silence an unused-import warning in builds without the RefCell-based
    // sink described above; kept for future output-capturing tests.
    #[allow(dead_code)]
    fn _unused(_: RefCell<()>) {}
}
