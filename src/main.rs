use clap::Parser;
use log::LevelFilter;

use lispy::cli::Cli;
use lispy::error::Result;
use lispy::value::Value;
use lispy::{builtins, env::Environment, eval, repl};

fn main() -> Result<()> {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init()
        .expect("failed to initialize logger");

    let root_env = Environment::new_global();
    builtins::populate(&root_env);

    if cli.files.is_empty() {
        repl::run(root_env)
    } else {
        for path in &cli.files {
            let call = Value::SExpr(vec![
                Value::Symbol("load".to_string()),
                Value::String(path.clone()),
            ]);
            let result = eval::eval(root_env.clone(), call);
            if let Value::Error(_) = &result {
                eprintln!("{result}");
            }
        }
        Ok(())
    }
}
