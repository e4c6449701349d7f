use clap::Parser;

/// A small homoiconic Lisp-style interpreter.
///
/// With no FILES, starts an interactive REPL. With one or more FILES, loads
/// each in order via the `load` builtin and exits.
#[derive(Debug, Parser)]
#[command(name = "lispy", version, about)]
pub struct Cli {
    /// Source files to load and run, in order.
    pub files: Vec<String>,

    /// Raise the log level from info to debug.
    #[arg(short, long)]
    pub verbose: bool,
}
