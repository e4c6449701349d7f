use thiserror::Error;

/// The error taxonomy from the specification (§7). Every variant renders to
/// exactly the message template named there, because these strings become
/// `Value::Error` payloads observed by callers and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpError {
    #[error("{0}")]
    Parse(String),

    #[error("unbound symbol {0}")]
    UnboundSymbol(String),

    #[error("function '{func}' passed incorrect type for argument {index}. got '{got}', expected '{expected}'")]
    Type {
        func: String,
        index: usize,
        got: String,
        expected: String,
    },

    #[error("function '{func}' passed incorrect number of arguments. got {got}, expected {expected}")]
    Arity {
        func: String,
        got: usize,
        expected: String,
    },

    #[error("function '{func}' passed {{}} for argument {index}")]
    EmptyList { func: String, index: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0} does not start with a function")]
    NotAFunction(String),

    #[error("function format invalid. symbol ':' not followed by single symbol")]
    InvalidFormals,

    #[error("too many arguments: got {got}, expected {expected}")]
    TooManyArguments { got: usize, expected: usize },

    #[error("{0}")]
    UserRaised(String),

    #[error("could not load {0}")]
    LoadFailed(String),
}

pub type Result<T> = std::result::Result<T, InterpError>;

impl InterpError {
    /// Every error surfaces to the language as a first-class `Value::Error`.
    pub fn into_value(self) -> crate::value::Value {
        crate::value::Value::error(self.to_string())
    }
}