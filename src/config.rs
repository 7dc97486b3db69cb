// ABOUTME: Version and REPL banner constants for the Lox interpreter

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Lox Interpreter v1.0";
pub const WELCOME_SUBTITLE: &str = "A tree-walking interpreter for the Lox language";

pub const HELP_TEXT: &str = r#"
Available REPL commands:
  exit, quit   - Exit the REPL (Ctrl-D also works)
  clear        - Clear the screen

Type any Lox statement to execute it. Results aren't auto-printed; use `print`.
"#;
