use log::trace;

use crate::env::{self, EnvRef};
use crate::error::{InterpError, Result};
use crate::eval;
use crate::value::{BuiltinFn, Value};

macro_rules! arity_exact {
    ($name:expr, $args:expr, $n:expr) => {
        if $args.len() != $n {
            return Err(InterpError::Arity {
                func: $name.to_string(),
                got: $args.len(),
                expected: $n.to_string(),
            });
        }
    };
}

macro_rules! arity_one_of {
    ($name:expr, $args:expr, $a:expr, $b:expr) => {
        if $args.len() != $a && $args.len() != $b {
            return Err(InterpError::Arity {
                func: $name.to_string(),
                got: $args.len(),
                expected: format!("{} or {}", $a, $b),
            });
        }
    };
}

macro_rules! arity_at_least {
    ($name:expr, $args:expr, $n:expr) => {
        if $args.len() < $n {
            return Err(InterpError::Arity {
                func: $name.to_string(),
                got: $args.len(),
                expected: format!("at least {}", $n),
            });
        }
    };
}

fn require_integer(name: &str, args: &[Value], index: usize) -> Result<i64> {
    match &args[index] {
        Value::Integer(n) => Ok(*n),
        other => Err(InterpError::Type {
            func: name.to_string(),
            index,
            got: other.type_name().to_string(),
            expected: "Number".to_string(),
        }),
    }
}

fn require_string<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    match &args[index] {
        Value::String(s) => Ok(s.as_str()),
        other => Err(InterpError::Type {
            func: name.to_string(),
            index,
            got: other.type_name().to_string(),
            expected: "String".to_string(),
        }),
    }
}

fn require_qexpr<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a [Value]> {
    match &args[index] {
        Value::QExpr(children) => Ok(children),
        other => Err(InterpError::Type {
            func: name.to_string(),
            index,
            got: other.type_name().to_string(),
            expected: "Q-Expression".to_string(),
        }),
    }
}

fn require_non_empty(name: &str, children: &[Value], index: usize) -> Result<()> {
    if children.is_empty() {
        return Err(InterpError::EmptyList {
            func: name.to_string(),
            index,
        });
    }
    Ok(())
}

// --- 4.5.1 Arithmetic ---

fn check_all_integers(name: &str, args: &[Value]) -> Result<()> {
    for (i, a) in args.iter().enumerate() {
        if !matches!(a, Value::Integer(_)) {
            return Err(InterpError::Type {
                func: name.to_string(),
                index: i,
                got: a.type_name().to_string(),
                expected: "Number".to_string(),
            });
        }
    }
    Ok(())
}

fn add(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("+", args, 1);
    check_all_integers("+", &args)?;
    let sum = args.iter().map(|v| match v {
        Value::Integer(n) => *n,
        _ => unreachable!("checked above"),
    }).sum();
    Ok(Value::Integer(sum))
}

fn sub(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("-", args, 1);
    check_all_integers("-", &args)?;
    let first = require_integer("-", &args, 0)?;
    if args.len() == 1 {
        return Ok(Value::Integer(-first));
    }
    let mut acc = first;
    for i in 1..args.len() {
        acc -= require_integer("-", &args, i)?;
    }
    Ok(Value::Integer(acc))
}

fn mul(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("*", args, 1);
    check_all_integers("*", &args)?;
    let product = args.iter().map(|v| match v {
        Value::Integer(n) => *n,
        _ => unreachable!("checked above"),
    }).product();
    Ok(Value::Integer(product))
}

fn div(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("/", args, 1);
    check_all_integers("/", &args)?;
    let mut acc = require_integer("/", &args, 0)?;
    for i in 1..args.len() {
        let divisor = require_integer("/", &args, i)?;
        if divisor == 0 {
            return Err(InterpError::DivisionByZero);
        }
        acc /= divisor;
    }
    Ok(Value::Integer(acc))
}

// --- 4.5.2 Order ---

fn order(name: &str, args: Vec<Value>, cmp: fn(i64, i64) -> bool) -> Result<Value> {
    arity_exact!(name, args, 2);
    let a = require_integer(name, &args, 0)?;
    let b = require_integer(name, &args, 1)?;
    Ok(Value::Integer(cmp(a, b) as i64))
}

fn gt(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    order(">", args, |a, b| a > b)
}
fn gte(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    order(">=", args, |a, b| a >= b)
}
fn lt(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    order("<", args, |a, b| a < b)
}
fn lte(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    order("<=", args, |a, b| a <= b)
}

// --- 4.5.3 Equality ---

fn eq(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_exact!("=?", args, 2);
    Ok(Value::Integer(args[0].value_eq(&args[1]) as i64))
}

fn neq(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_exact!("!=", args, 2);
    Ok(Value::Integer(!args[0].value_eq(&args[1]) as i64))
}

// --- 4.5.4 List primitives ---

fn list(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    Ok(Value::QExpr(args))
}

fn head(_env: EnvRef, mut args: Vec<Value>) -> Result<Value> {
    arity_exact!("head", args, 1);
    require_qexpr("head", &args, 0)?;
    let Value::QExpr(children) = args.remove(0) else {
        unreachable!("checked above")
    };
    require_non_empty("head", &children, 0)?;
    Ok(Value::QExpr(vec![children.into_iter().next().unwrap()]))
}

fn tail(_env: EnvRef, mut args: Vec<Value>) -> Result<Value> {
    arity_exact!("tail", args, 1);
    require_qexpr("tail", &args, 0)?;
    let Value::QExpr(children) = args.remove(0) else {
        unreachable!("checked above")
    };
    require_non_empty("tail", &children, 0)?;
    Ok(Value::QExpr(children.into_iter().skip(1).collect()))
}

fn join(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    let mut result = Vec::new();
    for (i, a) in args.into_iter().enumerate() {
        match a {
            Value::QExpr(children) => result.extend(children),
            other => {
                return Err(InterpError::Type {
                    func: "join".to_string(),
                    index: i,
                    got: other.type_name().to_string(),
                    expected: "Q-Expression".to_string(),
                });
            }
        }
    }
    Ok(Value::QExpr(result))
}

fn builtin_eval(env: EnvRef, mut args: Vec<Value>) -> Result<Value> {
    arity_exact!("eval", args, 1);
    require_qexpr("eval", &args, 0)?;
    let Value::QExpr(children) = args.remove(0) else {
        unreachable!("checked above")
    };
    Ok(eval::eval(env, Value::SExpr(children)))
}

// --- 4.5.5 Definition ---

fn bind_definitions(env: &EnvRef, name: &str, first: Value, rest: Vec<Value>, is_global: bool) -> Result<Value> {
    match first {
        Value::QExpr(syms) => {
            for (i, s) in syms.iter().enumerate() {
                if !matches!(s, Value::Symbol(_)) {
                    return Err(InterpError::Type {
                        func: name.to_string(),
                        index: i,
                        got: s.type_name().to_string(),
                        expected: "Symbol".to_string(),
                    });
                }
            }
            if syms.len() != rest.len() {
                return Err(InterpError::Arity {
                    func: name.to_string(),
                    got: rest.len(),
                    expected: syms.len().to_string(),
                });
            }
            for (sym, val) in syms.into_iter().zip(rest.into_iter()) {
                let Value::Symbol(sym_name) = sym else {
                    unreachable!("checked above")
                };
                if is_global {
                    env::define_global(env, sym_name, val);
                } else {
                    env.borrow_mut().put(sym_name, val);
                }
            }
            Ok(Value::sexpr())
        }
        Value::Symbol(sym_name) => {
            arity_exact!(name, rest, 1);
            let val = rest.into_iter().next().unwrap();
            if is_global {
                env::define_global(env, sym_name, val);
            } else {
                env.borrow_mut().put(sym_name, val);
            }
            Ok(Value::sexpr())
        }
        other => Err(InterpError::Type {
            func: name.to_string(),
            index: 0,
            got: other.type_name().to_string(),
            expected: "Symbol".to_string(),
        }),
    }
}

fn def(env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("def", args, 2);
    let mut args = args;
    let first = args.remove(0);
    bind_definitions(&env, "def", first, args, true)
}

fn local_def(env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_at_least!("=", args, 2);
    let mut args = args;
    let first = args.remove(0);
    bind_definitions(&env, "=", first, args, false)
}

// --- 4.5.6 Lambda ---

fn lambda(_env: EnvRef, mut args: Vec<Value>) -> Result<Value> {
    arity_exact!("\\", args, 2);
    require_qexpr("\\", &args, 0)?;
    require_qexpr("\\", &args, 1)?;
    let Value::QExpr(body) = args.remove(1) else {
        unreachable!("checked above")
    };
    let Value::QExpr(formals) = args.remove(0) else {
        unreachable!("checked above")
    };
    for (i, f) in formals.iter().enumerate() {
        if !matches!(f, Value::Symbol(_)) {
            return Err(InterpError::Type {
                func: "\\".to_string(),
                index: i,
                got: f.type_name().to_string(),
                expected: "Symbol".to_string(),
            });
        }
    }
    trace!("constructing lambda with {} formal(s)", formals.len());
    // The captured environment starts fresh and parentless (§4.1); the
    // calling environment is only linked in at call time.
    let captured = crate::env::Environment::new_global();
    Ok(Value::lambda(formals, Value::QExpr(body), captured))
}

// --- 4.5.7 Conditional ---

fn if_builtin(env: EnvRef, mut args: Vec<Value>) -> Result<Value> {
    arity_one_of!("if", args, 2, 3);
    let cond = require_integer("if", &args, 0)?;
    require_qexpr("if", &args, 1)?;
    if args.len() == 3 {
        require_qexpr("if", &args, 2)?;
    }

    if cond != 0 {
        let Value::QExpr(then_branch) = args.remove(1) else {
            unreachable!("checked above")
        };
        Ok(eval::eval(env, Value::SExpr(then_branch)))
    } else if args.len() == 3 {
        let Value::QExpr(else_branch) = args.remove(2) else {
            unreachable!("checked above")
        };
        Ok(eval::eval(env, Value::SExpr(else_branch)))
    } else {
        Ok(Value::sexpr())
    }
}

// --- 4.5.8 load ---

fn load(env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_exact!("load", args, 1);
    let path = require_string("load", &args, 0)?;
    let contents = std::fs::read_to_string(path).map_err(|_| InterpError::LoadFailed(path.to_string()))?;
    let parsed = crate::parser::parse(&contents).map_err(|_| InterpError::LoadFailed(path.to_string()))?;
    let Value::SExpr(forms) = parsed else {
        unreachable!("parse always returns a top-level SExpr")
    };
    for form in forms {
        let result = eval::eval(env.clone(), form);
        if let Value::Error(_) = &result {
            println!("{result}");
        }
    }
    Ok(Value::sexpr())
}

// --- 4.5.9 print / println ---

fn print_values(args: &[Value]) {
    for (i, v) in args.iter().enumerate() {
        if i > 0 {
            print!(" ");
        }
        match v {
            Value::String(s) => print!("{s}"),
            other => print!("{other}"),
        }
    }
}

fn print(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    print_values(&args);
    Ok(Value::sexpr())
}

fn println_fn(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    print_values(&args);
    println!();
    Ok(Value::sexpr())
}

// --- 4.5.10 error ---

fn error_builtin(_env: EnvRef, args: Vec<Value>) -> Result<Value> {
    arity_exact!("error", args, 1);
    let msg = require_string("error", &args, 0)?;
    Err(InterpError::UserRaised(msg.to_string()))
}

/// Registers every builtin under its reserved symbol (§6.3) in the root
/// environment.
pub fn populate(env: &EnvRef) {
    let entries: &[(&str, BuiltinFn)] = &[
        ("+", add),
        ("-", sub),
        ("*", mul),
        ("/", div),
        (">", gt),
        (">=", gte),
        ("<", lt),
        ("<=", lte),
        ("=?", eq),
        ("!=", neq),
        ("list", list),
        ("head", head),
        ("tail", tail),
        ("join", join),
        ("eval", builtin_eval),
        ("def", def),
        ("=", local_def),
        ("\\", lambda),
        ("if", if_builtin),
        ("load", load),
        ("print", print),
        ("println", println_fn),
        ("error", error_builtin),
    ];

    let mut e = env.borrow_mut();
    for (name, func) in entries {
        e.put(*name, Value::builtin(name, *func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;

    fn root() -> EnvRef {
        let env = Environment::new_global();
        populate(&env);
        env
    }

    #[test]
    fn division_by_zero_message() {
        let err = div(root(), vec![Value::Integer(1), Value::Integer(0)]).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn head_and_tail_on_empty_list_report_empty_list_error() {
        let env = root();
        let err = head(env.clone(), vec![Value::qexpr()]).unwrap_err();
        assert_eq!(err.to_string(), "function 'head' passed {} for argument 0");
        let err = tail(env, vec![Value::qexpr()]).unwrap_err();
        assert_eq!(err.to_string(), "function 'tail' passed {} for argument 0");
    }

    #[test]
    fn unary_minus_negates() {
        let v = sub(root(), vec![Value::Integer(5)]).unwrap();
        assert!(matches!(v, Value::Integer(-5)));
    }

    #[test]
    fn head_tail_join_list_law() {
        let q = Value::QExpr(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let env = root();
        let h = head(env.clone(), vec![q.clone()]).unwrap();
        let t = tail(env.clone(), vec![q.clone()]).unwrap();
        let joined = join(env, vec![h, t]).unwrap();
        assert!(joined.value_eq(&q));
    }

    #[test]
    fn list_promotes_arguments_to_qexpr() {
        let v = list(root(), vec![Value::Integer(1), Value::Integer(2)]).unwrap();
        assert!(matches!(v, Value::QExpr(c) if c.len() == 2));
    }

    #[test]
    fn def_binds_multiple_symbols_form_b() {
        let env = root();
        let syms = Value::QExpr(vec![Value::Symbol("a".into()), Value::Symbol("b".into())]);
        def(env.clone(), vec![syms, Value::Integer(1), Value::Integer(2)]).unwrap();
        assert!(matches!(env.borrow().get("a"), Value::Integer(1)));
        assert!(matches!(env.borrow().get("b"), Value::Integer(2)));
    }

    #[test]
    fn def_reports_mismatched_counts() {
        let env = root();
        let syms = Value::QExpr(vec![Value::Symbol("a".into()), Value::Symbol("b".into())]);
        let err = def(env, vec![syms, Value::Integer(1)]).unwrap_err();
        assert!(err.to_string().contains("incorrect number of arguments"));
    }

    #[test]
    fn if_false_without_else_yields_empty_sexpr() {
        let env = root();
        let result = if_builtin(
            env,
            vec![Value::Integer(0), Value::QExpr(vec![Value::Symbol("a".into())])],
        )
        .unwrap();
        assert!(matches!(result, Value::SExpr(c) if c.is_empty()));
    }

    #[test]
    fn error_builtin_wraps_message() {
        let err = error_builtin(root(), vec![Value::String("boom".into())]).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
