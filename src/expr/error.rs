//! Errors raised by the built-in expression engine

use thiserror::Error;

/// A problem found while parsing an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {column}: {message}")]
pub struct ParseError {
    /// 1-based character column the problem starts at
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(column: usize, message: impl Into<String>) -> Self {
        Self {
            column,
            message: message.into(),
        }
    }
}

/// A problem found while evaluating a parsed expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("'{op}' expects a boolean, got {got}")]
    ExpectedBool { op: &'static str, got: &'static str },

    #[error("cannot apply '{op}' to {got}")]
    InvalidOperand { op: &'static str, got: &'static str },

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("invalid regex '{pattern}': {message}")]
    Regex { pattern: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::new(7, "unexpected ')'");
        assert_eq!(error.to_string(), "column 7: unexpected ')'");
    }

    #[test]
    fn test_eval_error_display() {
        let error = EvalError::TypeMismatch {
            op: "<",
            left: "int",
            right: "string",
        };
        assert_eq!(error.to_string(), "cannot apply '<' to int and string");
    }
}
