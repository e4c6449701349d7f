use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::env::EnvRef;
use crate::error::Result;
use crate::{eval, parser};

const PROMPT: &str = "lispy> ";

/// Runs the interactive read-eval-print loop against `env` until `.exit`,
/// Ctrl-C, or Ctrl-D.
pub fn run(env: EnvRef) -> Result<()> {
    println!("A small Lisp. Press Ctrl+D or type .exit to quit, .help for help.");

    let mut rl = DefaultEditor::new().expect("failed to initialize line editor");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed).ok();

                match trimmed {
                    ".exit" => break,
                    ".help" => print_help(),
                    ".env" => print_env(&env),
                    _ => run_line(&env, trimmed),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    Ok(())
}

fn run_line(env: &EnvRef, line: &str) {
    match parser::parse(line) {
        Ok(parsed) => {
            debug!("parsed {line:?} -> {parsed:?}");
            let result = eval::eval(env.clone(), parsed);
            println!("{result}");
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn print_help() {
    println!(".exit   leave the REPL");
    println!(".help   show this message");
    println!(".env    list every binding in the global environment");
}

fn print_env(env: &EnvRef) {
    println!("{{");
    for (name, value) in env.borrow().local_bindings() {
        println!("  {name}: {value}");
    }
    println!("}}");
}
