use std::fmt;

/// Symbol used as the formals-list rest-marker: `{x : xs}` binds `xs` to
/// every argument past `x`.
pub const REST_MARKER: &str = ":";

/// A runtime value. `SExpr` is evaluable; `QExpr` is a literal list and is
/// never reduced by the evaluator except where explicitly promoted.
#[derive(Clone, Debug)]
pub enum Value {
    Integer(i64),
    Error(String),
    Symbol(String),
    String(String),
    SExpr(Vec<Value>),
    QExpr(Vec<Value>),
    Function(Function),
}

/// Native entry point for a builtin. Takes the already-evaluated argument
/// list and the environment the call happened in.
pub type BuiltinFn = fn(crate::env::EnvRef, Vec<Value>) -> crate::error::Result<Value>;

#[derive(Clone)]
pub enum Function {
    Builtin {
        name: String,
        func: BuiltinFn,
    },
    Lambda {
        formals: Vec<Value>,
        body: Box<Value>,
        env: crate::env::EnvRef,
    },
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin { name, .. } => write!(f, "Builtin({name})"),
            Function::Lambda { formals, body, .. } => write!(f, "Lambda({formals:?} {body:?})"),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::String(_) => "String",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }

    pub fn error(msg: impl Into<String>) -> Value {
        Value::Error(msg.into())
    }

    pub fn sexpr() -> Value {
        Value::SExpr(Vec::new())
    }

    pub fn qexpr() -> Value {
        Value::QExpr(Vec::new())
    }

    pub fn builtin(name: &str, func: BuiltinFn) -> Value {
        Value::Function(Function::Builtin {
            name: name.to_string(),
            func,
        })
    }

    pub fn lambda(formals: Vec<Value>, body: Value, env: crate::env::EnvRef) -> Value {
        Value::Function(Function::Lambda {
            formals,
            body: Box::new(body),
            env,
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Deep copy, as required at an environment-lookup boundary (§3.4):
    /// ordinary `Clone` shares a Lambda's captured environment (an `Rc`) by
    /// reference, which is correct for short-lived internal copies but
    /// would let two independent calls of the same looked-up Lambda
    /// trample each other's parameter bindings. `deep_copy` instead gives a
    /// Lambda a freshly cloned captured environment (bindings copied,
    /// parent pointer shared, matching the original's `lenv_copy`), so that
    /// every `Environment::get` observably hands back an independent value.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::SExpr(children) => {
                Value::SExpr(children.iter().map(Value::deep_copy).collect())
            }
            Value::QExpr(children) => {
                Value::QExpr(children.iter().map(Value::deep_copy).collect())
            }
            Value::Function(Function::Lambda { formals, body, env }) => Value::Function(Function::Lambda {
                formals: formals.iter().map(Value::deep_copy).collect(),
                body: Box::new(body.deep_copy()),
                env: crate::env::Environment::deep_copy_keeping_parent(env),
            }),
            other => other.clone(),
        }
    }

    /// Children of an SExpr/QExpr, or `None` for atomic values.
    pub fn children(&self) -> Option<&[Value]> {
        match self {
            Value::SExpr(c) | Value::QExpr(c) => Some(c),
            _ => None,
        }
    }

    /// Structural equality (§3.2 / §4.1). Builtins compare by name (a
    /// stand-in for the native entry-point identity the source compares by
    /// pointer); Lambdas compare formals and body only, never the captured
    /// environment.
    pub fn value_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::SExpr(a), Value::SExpr(b)) | (Value::QExpr(a), Value::QExpr(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.value_eq(y))
            }
            (Value::Function(a), Value::Function(b)) => match (a, b) {
                (Function::Builtin { name: n1, .. }, Function::Builtin { name: n2, .. }) => {
                    n1 == n2
                }
                (
                    Function::Lambda {
                        formals: f1,
                        body: b1,
                        ..
                    },
                    Function::Lambda {
                        formals: f2,
                        body: b2,
                        ..
                    },
                ) => {
                    f1.len() == f2.len()
                        && f1.iter().zip(f2.iter()).all(|(x, y)| x.value_eq(y))
                        && b1.value_eq(b2)
                }
                _ => false,
            },
            _ => false,
        }
    }
}

fn write_expr(
    f: &mut fmt::Formatter<'_>,
    children: &[Value],
    open: char,
    close: char,
) -> fmt::Result {
    if children.is_empty() {
        return Ok(());
    }
    write!(f, "{open}")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, "{close}")
}

fn write_escaped_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\\' => write!(f, "\\\\")?,
            '"' => write!(f, "\\\"")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Error(e) => write!(f, "Error: {e}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::String(s) => write_escaped_string(f, s),
            Value::SExpr(children) => write_expr(f, children, '(', ')'),
            Value::QExpr(children) => write_expr(f, children, '{', '}'),
            Value::Function(Function::Builtin { .. }) => write!(f, "<builtin>"),
            Value::Function(Function::Lambda { formals, body, .. }) => {
                write!(f, "(\\ ")?;
                write_expr(f, formals, '{', '}')?;
                write!(f, " {body})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_print_as_decimal() {
        assert_eq!(Value::Integer(-7).to_string(), "-7");
    }

    #[test]
    fn errors_print_with_prefix() {
        assert_eq!(Value::error("oops").to_string(), "Error: oops");
    }

    #[test]
    fn strings_print_quoted_with_escapes() {
        assert_eq!(Value::String("a\nb".to_string()).to_string(), "\"a\\nb\"");
    }

    #[test]
    fn sexpr_and_qexpr_use_distinct_delimiters() {
        let s = Value::SExpr(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(s.to_string(), "(1 2)");
        let q = Value::QExpr(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(q.to_string(), "{1 2}");
    }

    #[test]
    fn empty_sexpr_prints_as_nothing() {
        assert_eq!(Value::sexpr().to_string(), "");
    }

    #[test]
    fn empty_qexpr_prints_as_nothing() {
        assert_eq!(Value::qexpr().to_string(), "");
    }

    #[test]
    fn structural_equality_ignores_captured_env_identity() {
        let env_a = crate::env::Environment::new_global();
        let env_b = crate::env::Environment::new_global();
        let formals = vec![Value::Symbol("x".to_string())];
        let body = Value::QExpr(vec![Value::Symbol("x".to_string())]);
        let lam_a = Value::lambda(formals.clone(), body.clone(), env_a);
        let lam_b = Value::lambda(formals, body, env_b);
        assert!(lam_a.value_eq(&lam_b));
    }

    #[test]
    fn equality_is_an_equivalence_relation() {
        let a = Value::Integer(3);
        let b = Value::Integer(3);
        let c = Value::Integer(3);
        assert!(a.value_eq(&a));
        assert_eq!(a.value_eq(&b), b.value_eq(&a));
        assert!(a.value_eq(&b) && b.value_eq(&c) && a.value_eq(&c));
    }

    #[test]
    fn copy_independence() {
        let mut original = Value::QExpr(vec![Value::Integer(1)]);
        let mut copy = original.clone();
        if let Value::QExpr(children) = &mut copy {
            children.push(Value::Integer(2));
        }
        if let Value::QExpr(children) = &mut original {
            assert_eq!(children.len(), 1);
        } else {
            panic!("expected QExpr");
        }
    }
}
