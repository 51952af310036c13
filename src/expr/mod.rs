//! Filter expression language
//!
//! A small boolean language over integers, strings, booleans and arrays:
//!
//! ```text
//! incomplete and size > 1_000_000_000
//! tracker ~ "^foo" or "tracker.example.org" in trackers
//! not (status == "Seeding") && name !~ "(?i)sample"
//! ```
//!
//! The filter evaluator only depends on [`ExpressionEngine`], so a different
//! language can be plugged in; [`Engine`] is the built-in one.

pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

use std::fmt;

pub use error::{EvalError, ParseError};
pub use value::{Environment, Value};

/// A parse-then-evaluate expression language
pub trait ExpressionEngine {
    /// Parsed, reusable form of one expression
    type Program;

    /// Parse `source` once for repeated evaluation
    ///
    /// # Errors
    ///
    /// Returns every diagnostic the engine produced.
    fn parse(&self, source: &str) -> Result<Self::Program, Vec<ParseError>>;

    /// Evaluate a parsed program against one set of bindings
    ///
    /// # Errors
    ///
    /// Returns `EvalError` if evaluation fails.
    fn evaluate(&self, program: &Self::Program, env: &Environment) -> Result<Value, EvalError>;

    /// Variables the program reads, if the engine can tell
    fn variables(&self, _program: &Self::Program) -> Option<Vec<String>> {
        None
    }
}

/// A parsed expression of the built-in language
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    root: parser::Expr,
}

impl Program {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variables referenced, in first-use order
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        self.root.variables()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The built-in expression engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine;

impl ExpressionEngine for Engine {
    type Program = Program;

    fn parse(&self, source: &str) -> Result<Program, Vec<ParseError>> {
        let tokens = lexer::tokenize(source)?;
        let root = parser::parse(&tokens, source.chars().count())?;
        Ok(Program {
            source: source.to_string(),
            root,
        })
    }

    fn evaluate(&self, program: &Program, env: &Environment) -> Result<Value, EvalError> {
        eval::evaluate(&program.root, env)
    }

    fn variables(&self, program: &Program) -> Option<Vec<String>> {
        Some(program.variables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_evaluate() {
        let engine = Engine;
        let program = engine.parse("size > 10 and name ~ \"iso$\"").unwrap();
        assert_eq!(program.to_string(), "size > 10 and name ~ \"iso$\"");

        let mut env = Environment::new();
        env.set("size", 11_i64);
        env.set("name", "debian.iso");
        assert_eq!(engine.evaluate(&program, &env), Ok(Value::Bool(true)));

        env.set("size", 10_i64);
        assert_eq!(engine.evaluate(&program, &env), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_empty_expression_is_an_error() {
        let errors = Engine.parse("   ").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected a value"));
    }

    #[test]
    fn test_lexer_errors_surface_from_parse() {
        let errors = Engine.parse("size > 1 $ @").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_variables() {
        let program = Engine.parse("incomplete and tracker ~ \"x\"").unwrap();
        assert_eq!(
            Engine.variables(&program),
            Some(vec!["incomplete".to_string(), "tracker".to_string()])
        );
    }
}
