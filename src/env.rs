use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::InterpError;
use crate::value::Value;

/// Shared handle to an `Environment`. Lambdas own their captured
/// environment through this handle (§3.4); the call convention repoints
/// `parent` at call time rather than cloning the whole chain.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A named binding table with an optional parent. Lookups walk the chain
/// leaf-to-root; the chain terminates at the global environment, which has
/// no parent.
#[derive(Debug)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new_global() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: None,
        }))
    }

    pub fn new_child(parent: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }))
    }

    /// Re-points this environment's parent. Used by the calling convention
    /// (§4.4 step 3) once a Lambda's formals are fully bound.
    pub fn set_parent(&mut self, parent: EnvRef) {
        self.parent = Some(parent);
    }

    /// Binds `name` in this environment only.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Looks up `name`, walking to the root if necessary, returning an
    /// independent copy. Never fails: an unbound symbol yields an Error
    /// value rather than a `Result` error, matching §4.2.
    pub fn get(&self, name: &str) -> Value {
        if let Some(v) = self.bindings.get(name) {
            return v.deep_copy();
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => InterpError::UnboundSymbol(name.to_string()).into_value(),
        }
    }

    /// All bindings visible from this environment only (no parent walk),
    /// used by the `.env` REPL meta-command.
    pub fn local_bindings(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    /// Deep-copies `env`'s own bindings into a fresh environment, keeping
    /// the same parent pointer (a shared, read-mostly reference). Mirrors
    /// the source's `lenv_copy`: used whenever a Lambda value is copied, so
    /// that two copies never share mutable binding state.
    pub fn deep_copy_keeping_parent(env: &EnvRef) -> EnvRef {
        let borrowed = env.borrow();
        let bindings = borrowed
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_copy()))
            .collect();
        Rc::new(RefCell::new(Environment {
            bindings,
            parent: borrowed.parent.clone(),
        }))
    }
}

/// Defines `name` to `value` in the root of `env`'s parent chain (global
/// definition, §4.2 `def`).
pub fn define_global(env: &EnvRef, name: impl Into<String>, value: Value) {
    let mut root = Rc::clone(env);
    loop {
        let next = root.borrow().parent.clone();
        match next {
            Some(parent) => root = parent,
            None => break,
        }
    }
    root.borrow_mut().put(name, value);
}
