// ABOUTME: Static resolution pass computing lexical hop distances for variable references

use crate::ast::{Expr, ExprId, FunctionStmt, Stmt};
use crate::error::ResolveError;
use crate::token::Token;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Maps each `Variable`/`Assign`/`This`/`Super` node's identity to the
/// number of environment hops between its use site and its binding scope.
/// Absence means "look it up in globals" per spec §3.
pub type ResolutionTable = HashMap<ExprId, usize>;

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: ResolutionTable,
    errors: Vec<ResolveError>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            locals: ResolutionTable::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Resolves a whole program, returning the resolution table alongside
    /// any static errors found. The interpreter must not run if `errors` is
    /// non-empty, per spec §4.3/§7.
    pub fn resolve(mut self, statements: &[Stmt]) -> (ResolutionTable, Vec<ResolveError>) {
        self.resolve_stmts(statements);
        (self.locals, self.errors)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Adds `name` to the innermost scope as "not yet ready", catching
    /// redeclaration in the same local scope (global scope, which is never
    /// pushed, permits redeclaration).
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.errors.push(ResolveError::at(
                    name,
                    "Already a variable with this name in this scope.",
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.locals.insert(id, depth);
                return;
            }
        }
        // Unresolved: falls through to globals at interpretation time.
    }

    fn resolve_function(&mut self, declaration: &FunctionStmt, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors
                        .push(ResolveError::at(keyword, "Can't return from top-level code."));
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.errors.push(ResolveError::at(
                            keyword,
                            "Can't return a value from an initializer.",
                        ));
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: Option<&Expr>, methods: &[std::rc::Rc<FunctionStmt>]) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable { name: super_name, .. }) = superclass {
            if super_name.lexeme == name.lexeme {
                self.errors
                    .push(ResolveError::at(super_name, "A class can't inherit from itself."));
            }
            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass.unwrap());

            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("scope just pushed")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("scope just pushed")
            .insert("this".to_string(), true);

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Grouping { expression } => self.resolve_expr(expression),
            Expr::Literal { .. } => {}
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => self
                    .errors
                    .push(ResolveError::at(keyword, "Can't use 'super' outside of a class.")),
                ClassType::Class => self.errors.push(ResolveError::at(
                    keyword,
                    "Can't use 'super' in a class with no superclass.",
                )),
                ClassType::Subclass => self.resolve_local(*id, "super"),
            },
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.errors
                        .push(ResolveError::at(keyword, "Can't use 'this' outside of a class."));
                } else {
                    self.resolve_local(*id, "this");
                }
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.errors.push(ResolveError::at(
                            name,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::scanner::Scanner;

    fn resolve_src(src: &str) -> (ResolutionTable, Vec<ResolveError>) {
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let (stmts, parse_errors) = parse(tokens);
        assert!(parse_errors.is_empty(), "{:?}", parse_errors);
        Resolver::new().resolve(&stmts)
    }

    #[test]
    fn rejects_self_referencing_initializer() {
        let (_, errors) = resolve_src("{ var a = a; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("own initializer"));
    }

    #[test]
    fn allows_shadowing_at_top_level() {
        let (_, errors) = resolve_src("var a = 1; { var a = a + 1; print a; } print a;");
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_redeclaration_in_same_local_scope() {
        let (_, errors) = resolve_src("{ var a = 1; var a = 2; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Already a variable"));
    }

    #[test]
    fn rejects_top_level_return() {
        let (_, errors) = resolve_src("return 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("top-level"));
    }

    #[test]
    fn rejects_value_return_from_initializer() {
        let (_, errors) = resolve_src("class C { init() { return 1; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("initializer"));
    }

    #[test]
    fn rejects_self_inheriting_class() {
        let (_, errors) = resolve_src("class Oops < Oops {}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("inherit from itself"));
    }

    #[test]
    fn rejects_this_outside_class() {
        let (_, errors) = resolve_src("print this;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'this' outside"));
    }

    #[test]
    fn closure_hop_distance_is_zero_for_enclosing_function_local() {
        let (table, errors) = resolve_src(
            "fun makeCounter(){ var i=0; fun c(){ i=i+1; return i; } return c; }",
        );
        assert!(errors.is_empty());
        // At least one Assign/Variable reference to `i` resolves with a
        // non-global hop distance.
        assert!(!table.is_empty());
    }
}
