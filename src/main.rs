mod config;

use clap::Parser;
use config::{HELP_TEXT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use lox_interpreter::ast_printer;
use lox_interpreter::error::RunOutcome;
use lox_interpreter::highlighter::LoxHelper;
use lox_interpreter::interpreter::Interpreter;
use lox_interpreter::parser::parse;
use lox_interpreter::resolver::Resolver;
use lox_interpreter::scanner::Scanner;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

/// A tree-walking interpreter for the Lox language
#[derive(Parser, Debug)]
#[command(name = "lox-interpreter")]
#[command(version = VERSION)]
#[command(about = "A tree-walking interpreter for the Lox language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the parsed AST instead of running the program
    #[arg(short = 'p', long = "pretty-print")]
    pretty_print: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let outcome = match args.script {
        Some(path) => run_file(&path, args.pretty_print),
        None => {
            run_repl(args.pretty_print);
            RunOutcome::default()
        }
    };

    ExitCode::from(outcome.exit_code() as u8)
}

/// Scans, parses, and resolves `source`; returns the parsed program and
/// whether any static error occurred. Diagnostics are printed to stderr as
/// they're found, matching the book's "report but keep going" batching.
fn compile(source: &str) -> (Vec<lox_interpreter::ast::Stmt>, lox_interpreter::resolver::ResolutionTable, bool) {
    let (tokens, lex_errors) = Scanner::new(source).scan_tokens();
    for err in &lex_errors {
        eprintln!("{}", err);
    }

    let (statements, parse_errors) = parse(tokens);
    for err in &parse_errors {
        eprintln!("{}", err);
    }

    let (locals, resolve_errors) = Resolver::new().resolve(&statements);
    for err in &resolve_errors {
        eprintln!("{}", err);
    }

    let had_static_error = !lex_errors.is_empty() || !parse_errors.is_empty() || !resolve_errors.is_empty();
    (statements, locals, had_static_error)
}

fn run_file(path: &PathBuf, pretty_print: bool) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Cannot read script file {}: {}", path.display(), e);
            outcome.had_static_error = true;
            return outcome;
        }
    };

    let (statements, locals, had_static_error) = compile(&source);
    if had_static_error {
        outcome.had_static_error = true;
        return outcome;
    }

    if pretty_print {
        println!("{}", ast_printer::print_program(&statements));
        return outcome;
    }

    let mut interpreter = Interpreter::new();
    interpreter.set_locals(locals);
    interpreter.interpret(&statements, &mut outcome);
    outcome
}

fn run_repl(pretty_print: bool) {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {}", e);
            return;
        }
    };
    rl.set_helper(Some(LoxHelper::new()));

    let history_file = ".lox_history";
    let _ = rl.load_history(history_file);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);

    let mut interpreter = Interpreter::new();

    loop {
        let readline = rl.readline(">>> ");

        match readline {
            Ok(line) => {
                match line.trim() {
                    "" => continue,
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "clear" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    "help" => {
                        println!("{}", HELP_TEXT);
                        continue;
                    }
                    _ => {}
                }

                let (statements, locals, had_static_error) = compile(&line);
                if had_static_error {
                    continue;
                }

                if pretty_print {
                    println!("{}", ast_printer::print_program(&statements));
                    continue;
                }

                interpreter.extend_locals(locals);
                let mut outcome = RunOutcome::default();
                interpreter.interpret(&statements, &mut outcome);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}
