use std::collections::VecDeque;

use crate::env::EnvRef;
use crate::error::InterpError;
use crate::value::{Function, Value, REST_MARKER};

/// Reduces `v` to a `Value` under `env` (§4.3). Symbols resolve through the
/// environment chain; SExprs are reduced via `eval_sexpr`; everything else
/// (Integer, String, QExpr, Function, Error) passes through unchanged.
pub fn eval(env: EnvRef, v: Value) -> Value {
    match v {
        Value::Symbol(s) => env.borrow().get(&s),
        Value::SExpr(children) => eval_sexpr(env, children),
        other => other,
    }
}

fn is_definition_head(children: &[Value]) -> bool {
    matches!(children.first(), Some(Value::Symbol(s)) if s == "def" || s == "=")
}

/// Reduces the children of an SExpr left to right, then dispatches the call
/// (§4.3 step 1-6). `def sym value` / `= sym value` skip evaluating `sym`
/// when it is a bare Symbol, so that `def {a b} v1 v2` can bind
/// yet-unbound names.
fn eval_sexpr(env: EnvRef, mut children: Vec<Value>) -> Value {
    let isdef = is_definition_head(&children);

    for i in 0..children.len() {
        if isdef && i == 1 && matches!(children[1], Value::Symbol(_)) {
            continue;
        }
        let evaluated = eval(env.clone(), std::mem::replace(&mut children[i], Value::sexpr()));
        if evaluated.is_error() {
            return evaluated;
        }
        children[i] = evaluated;
    }

    if children.is_empty() {
        return Value::SExpr(children);
    }
    if children.len() == 1 {
        return children.pop().unwrap();
    }

    let mut rest = children;
    let head = rest.remove(0);
    let Value::Function(func) = head else {
        return InterpError::NotAFunction(head.type_name().to_string()).into_value();
    };

    call(env, func, rest)
}

/// The calling convention (§4.4). `args` are already-evaluated.
pub fn call(caller_env: EnvRef, f: Function, args: Vec<Value>) -> Value {
    match f {
        Function::Builtin { func, .. } => match func(caller_env, args) {
            Ok(v) => v,
            Err(e) => e.into_value(),
        },
        Function::Lambda {
            formals,
            body,
            env: captured,
        } => call_lambda(caller_env, formals, body, captured, args),
    }
}

fn call_lambda(
    caller_env: EnvRef,
    formals: Vec<Value>,
    body: Box<Value>,
    captured: EnvRef,
    args: Vec<Value>,
) -> Value {
    let given = args.len();
    let total = formals.len();
    let mut formals: VecDeque<Value> = formals.into();
    let mut args: VecDeque<Value> = args.into();

    while !args.is_empty() {
        let Some(sym) = formals.pop_front() else {
            return InterpError::TooManyArguments {
                got: given,
                expected: total,
            }
            .into_value();
        };
        let Value::Symbol(sym_name) = sym else {
            return InterpError::InvalidFormals.into_value();
        };

        if sym_name == REST_MARKER {
            if formals.len() != 1 {
                return InterpError::InvalidFormals.into_value();
            }
            let Some(Value::Symbol(rest_name)) = formals.pop_front() else {
                return InterpError::InvalidFormals.into_value();
            };
            let rest_args: Vec<Value> = args.into_iter().collect();
            captured.borrow_mut().put(rest_name, Value::QExpr(rest_args));
            args = VecDeque::new();
            break;
        }

        let val = args.pop_front().unwrap();
        captured.borrow_mut().put(sym_name, val);
    }

    // Exactly the positional arity was supplied: the trailing rest pair binds
    // to an empty list (§4.4 step 2).
    if let Some(Value::Symbol(s)) = formals.front() {
        if s == REST_MARKER {
            if formals.len() != 2 {
                return InterpError::InvalidFormals.into_value();
            }
            formals.pop_front();
            let Some(Value::Symbol(rest_name)) = formals.pop_front() else {
                return InterpError::InvalidFormals.into_value();
            };
            captured.borrow_mut().put(rest_name, Value::qexpr());
        }
    }

    if formals.is_empty() {
        captured.borrow_mut().set_parent(caller_env);
        let body_children = match *body {
            Value::QExpr(c) => c,
            other => vec![other],
        };
        eval(captured, Value::SExpr(body_children))
    } else {
        // Partial application: `captured` already carries the bindings made
        // so far; the returned Lambda continues from the remaining formals.
        Value::Function(Function::Lambda {
            formals: formals.into(),
            body,
            env: captured,
        })
    }
}
