// ABOUTME: Debug pretty-printer for parsed Lox syntax trees, used by --pretty-print

use crate::ast::{Expr, Stmt};

/// Renders a parenthesized Lisp-like form for a single expression, in the
/// style of `Display for Value`'s recursive `write!` composition.
pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Assign { name, value, .. } => parenthesize(&format!("= {}", name.lexeme), &[value]),
        Expr::Binary { left, operator, right } => parenthesize(&operator.lexeme, &[left, right]),
        Expr::Call { callee, arguments, .. } => {
            let mut parts = vec![print_expr(callee)];
            parts.extend(arguments.iter().map(print_expr));
            format!("(call {})", parts.join(" "))
        }
        Expr::Get { object, name } => format!("(. {} {})", print_expr(object), name.lexeme),
        Expr::Grouping { expression } => parenthesize("group", &[expression]),
        Expr::Literal { value } => value.to_string(),
        Expr::Logical { left, operator, right } => parenthesize(&operator.lexeme, &[left, right]),
        Expr::Set { object, name, value } => {
            format!("(set {} {} {})", print_expr(object), name.lexeme, print_expr(value))
        }
        Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        Expr::This { .. } => "this".to_string(),
        Expr::Unary { operator, right } => parenthesize(&operator.lexeme, &[right]),
        Expr::Variable { name, .. } => name.lexeme.clone(),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut parts = vec![name.to_string()];
    parts.extend(exprs.iter().map(|e| print_expr(e)));
    format!("({})", parts.join(" "))
}

/// Renders one top-level form per statement, indented by nesting depth.
pub fn print_program(statements: &[Stmt]) -> String {
    statements.iter().map(|s| print_stmt(s, 0)).collect::<Vec<_>>().join("\n")
}

fn print_stmt(stmt: &Stmt, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    match stmt {
        Stmt::Block(statements) => {
            let inner = statements
                .iter()
                .map(|s| print_stmt(s, depth + 1))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}(block\n{}\n{})", indent, inner, indent)
        }
        Stmt::Class {
            name, superclass, methods, ..
        } => {
            let super_part = superclass
                .as_ref()
                .map(|s| format!(" < {}", print_expr(s)))
                .unwrap_or_default();
            let method_names = methods
                .iter()
                .map(|m| m.name.lexeme.clone())
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}(class {}{} ({}))", indent, name.lexeme, super_part, method_names)
        }
        Stmt::Expression(expr) => format!("{}{}", indent, print_expr(expr)),
        Stmt::Function(declaration) => {
            let params = declaration
                .params
                .iter()
                .map(|p| p.lexeme.clone())
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}(fun {} ({}))", indent, declaration.name.lexeme, params)
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let then_part = print_stmt(then_branch, depth + 1);
            match else_branch {
                Some(else_branch) => format!(
                    "{}(if {}\n{}\n{})",
                    indent,
                    print_expr(condition),
                    then_part,
                    print_stmt(else_branch, depth + 1)
                ),
                None => format!("{}(if {}\n{})", indent, print_expr(condition), then_part),
            }
        }
        Stmt::Print(expr) => format!("{}(print {})", indent, print_expr(expr)),
        Stmt::Return { value, .. } => match value {
            Some(expr) => format!("{}(return {})", indent, print_expr(expr)),
            None => format!("{}(return)", indent),
        },
        Stmt::Var { name, initializer } => match initializer {
            Some(expr) => format!("{}(var {} {})", indent, name.lexeme, print_expr(expr)),
            None => format!("{}(var {})", indent, name.lexeme),
        },
        Stmt::While { condition, body } => {
            format!("{}(while {}\n{})", indent, print_expr(condition), print_stmt(body, depth + 1))
        }
    }
}
