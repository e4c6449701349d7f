use lispy::env::Environment;
use lispy::value::Value;
use lispy::{builtins, eval, parser};

fn root() -> lispy::env::EnvRef {
    let env = Environment::new_global();
    builtins::populate(&env);
    env
}

fn run(env: &lispy::env::EnvRef, line: &str) -> Value {
    let parsed = parser::parse(line).expect("parse should succeed");
    eval::eval(env.clone(), parsed)
}

#[test]
fn addition() {
    let env = root();
    assert_eq!(run(&env, "+ 1 2 3").to_string(), "6");
}

#[test]
fn eval_of_head_of_a_list_of_sexprs() {
    let env = root();
    assert_eq!(run(&env, "eval (head {(+ 1 2) (+ 10 20)})").to_string(), "3");
}

#[test]
fn defining_and_calling_a_named_function() {
    let env = root();
    run(&env, "def {sq} (\\ {x} {* x x})");
    assert_eq!(run(&env, "sq 7").to_string(), "49");
}

#[test]
fn currying_a_named_function() {
    let env = root();
    run(&env, "def {add-mul} (\\ {x y} {+ x (* x y)})");
    assert_eq!(run(&env, "(add-mul 10) 20").to_string(), "210");
}

#[test]
fn fun_defines_named_functions_via_a_helper() {
    let env = root();
    run(
        &env,
        "def {fun} (\\ {args body} {def (head args) (\\ (tail args) body)})",
    );
    run(&env, "fun {f x y} {+ x y}");
    assert_eq!(run(&env, "f 2 3").to_string(), "5");
}

#[test]
fn unbound_symbol_surfaces_as_an_error_value() {
    let env = root();
    let result = run(&env, "never-defined");
    assert_eq!(result.to_string(), "Error: unbound symbol never-defined");
}

#[test]
fn error_short_circuits_a_surrounding_call() {
    let env = root();
    let result = run(&env, "+ 1 (/ 1 0)");
    assert_eq!(result.to_string(), "Error: division by zero");
}

#[test]
fn if_true_branch_prints_via_println_and_yields_unit() {
    let env = root();
    let result = run(&env, "if (> 10 5) {println \"yes\"} {println \"no\"}");
    assert!(matches!(result, Value::SExpr(c) if c.is_empty()));
}
