// ABOUTME: Whole-program behavior tests driving the built CLI binary end-to-end

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// A temp script file that outlives the `Command` invocation (its path is
/// passed as an argument, so it must exist on disk for the duration of the
/// child process) but is removed once dropped.
struct TempScript {
    path: std::path::PathBuf,
}

impl TempScript {
    fn new(source: &str) -> Self {
        let mut path = std::env::temp_dir();
        let unique = format!(
            "lox-it-{}-{:p}.lox",
            std::process::id(),
            &path as *const _
        );
        path.push(unique);
        std::fs::write(&path, source).expect("failed to write temp script");
        TempScript { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempScript {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn run_source(source: &str) -> Output {
    let script = TempScript::new(source);
    Command::new(env!("CARGO_BIN_EXE_lox-interpreter"))
        .arg(script.path())
        .output()
        .expect("failed to run lox-interpreter")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn arithmetic_precedence() {
    let out = run_source("print 1+2*3;");
    assert_eq!(stdout_of(&out), "7\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn block_scoping_shadows_then_restores() {
    let out = run_source(r#"var a="g"; { var a="l"; print a; } print a;"#);
    assert_eq!(stdout_of(&out), "l\ng\n");
}

#[test]
fn fibonacci_recursion() {
    let out = run_source("fun fib(n){ if (n<2) return n; return fib(n-1)+fib(n-2); } print fib(10);");
    assert_eq!(stdout_of(&out), "55\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn closure_captures_enclosing_variable_by_reference() {
    let out = run_source(
        r#"fun outer(){ var x="outer"; fun inner(){ print x; } x="changed"; inner(); } outer();"#,
    );
    assert_eq!(stdout_of(&out), "changed\n");
}

#[test]
fn closure_counter_increments_across_separate_calls() {
    let out = run_source(
        "fun makeCounter(){ var i=0; fun c(){ i=i+1; return i; } return c; } \
         var f = makeCounter(); print f(); print f(); print f();",
    );
    assert_eq!(stdout_of(&out), "1\n2\n3\n");
}

#[test]
fn class_instance_field_assignment_and_read() {
    let out = run_source(r#"class Greeter{} var g = Greeter(); g.name = "world"; print g.name;"#);
    assert_eq!(stdout_of(&out), "world\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_property_is_a_runtime_error_with_exit_70() {
    let out = run_source("class Greeter{} var g = Greeter(); print g.missing;");
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr_of(&out).contains("Undefined property 'missing'"));
}

#[test]
fn short_circuit_or_never_evaluates_the_right_operand() {
    let out = run_source(r#"print nil or "x"; print "x" or (1/0);"#);
    assert_eq!(stdout_of(&out), "x\nx\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn truthiness_table_matches_spec() {
    let out = run_source(r#"print !nil; print !false; print !0; print !"";"#);
    assert_eq!(stdout_of(&out), "true\ntrue\nfalse\nfalse\n");
}

#[test]
fn literal_equality_requires_matching_tag() {
    let out = run_source(r#"print nil == nil; print nil == false; print 1 == "1";"#);
    assert_eq!(stdout_of(&out), "true\nfalse\nfalse\n");
}

#[test]
fn for_loop_desugars_to_equivalent_while_behavior() {
    let out = run_source("for(var i=0; i<3; i=i+1) print i;");
    assert_eq!(stdout_of(&out), "0\n1\n2\n");
}

#[test]
fn division_by_zero_is_infinity_not_a_runtime_error() {
    let out = run_source("print 1/0; print -1/0;");
    assert_eq!(stdout_of(&out), "inf\n-inf\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn string_minus_number_is_a_runtime_error_with_exit_70() {
    let out = run_source(r#"print "a" - 1;"#);
    assert_eq!(out.status.code(), Some(70));
    let err = stderr_of(&out);
    assert!(err.contains("Operands must be numbers."));
    assert!(err.contains("[line 1]"));
}

#[test]
fn self_initializing_local_is_a_resolve_error_with_exit_65() {
    let out = run_source("{ var a=a; }");
    assert_eq!(out.status.code(), Some(65));
    assert!(stderr_of(&out).contains("Can't read local variable in its own initializer."));
}

#[test]
fn top_level_shadowing_is_allowed_but_local_redeclaration_is_not() {
    let allowed = run_source("var a=1; { var a=a+1; print a; } print a;");
    assert_eq!(stdout_of(&allowed), "2\n1\n");
    assert_eq!(allowed.status.code(), Some(0));

    let rejected = run_source("{ var a = 1; var a = 2; }");
    assert_eq!(rejected.status.code(), Some(65));
    assert!(stderr_of(&rejected).contains("Already a variable with this name in this scope."));
}

#[test]
fn inheritance_super_dispatch_and_this_binding() {
    let out = run_source(
        "class Doughnut { cook() { print \"Fry until golden.\"; } } \
         class BostonCream < Doughnut { cook() { super.cook(); print \"Pipe full of custard.\"; } } \
         BostonCream().cook();",
    );
    assert_eq!(stdout_of(&out), "Fry until golden.\nPipe full of custard.\n");
}

#[test]
fn initializer_implicitly_returns_the_instance() {
    let out = run_source(
        "class Point{ init(x,y){ this.x=x; this.y=y; } } \
         var p=Point(3,4); print p.x; print p.y;",
    );
    assert_eq!(stdout_of(&out), "3\n4\n");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let out = run_source("var n = 1; n();");
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr_of(&out).contains("Can only call functions and classes."));
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    let out = run_source("fun f(a,b){ return a+b; } f(1);");
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr_of(&out).contains("Expected 2 arguments but got 1."));
}

#[test]
fn parse_error_sets_static_error_exit_code() {
    let out = run_source("var a = 1 var b = 2; print b;");
    assert_eq!(out.status.code(), Some(65));
    assert!(stderr_of(&out).contains("Error"));
}

#[test]
fn pretty_print_flag_runs_scan_and_parse_only() {
    let script = TempScript::new("print 1 + 2;");
    let out = Command::new(env!("CARGO_BIN_EXE_lox-interpreter"))
        .arg("--pretty-print")
        .arg(script.path())
        .output()
        .expect("failed to run lox-interpreter");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout_of(&out).trim(), "(print (+ 1 2))");
}

#[test]
fn clock_native_is_callable_and_returns_a_number() {
    let out = run_source("var t = clock(); print t > 0;");
    assert_eq!(stdout_of(&out), "true\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn help_flag_exits_zero() {
    let out = Command::new(env!("CARGO_BIN_EXE_lox-interpreter"))
        .arg("--help")
        .output()
        .expect("failed to run lox-interpreter");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_script_file_is_not_a_successful_run() {
    let out = Command::new(env!("CARGO_BIN_EXE_lox-interpreter"))
        .arg("/nonexistent/path/does-not-exist.lox")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run lox-interpreter");
    assert_ne!(out.status.code(), Some(0));
}
