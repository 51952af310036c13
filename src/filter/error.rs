//! Error types for filter evaluation
//!
//! Every variant is a configuration problem: the filter itself is wrong.
//! None of them means "this torrent does not match".

use thiserror::Error;

use crate::expr::{EvalError, ParseError};

/// Errors that can occur while compiling or applying filters
#[derive(Debug, Error)]
pub enum FilterError {
    /// The expression did not parse
    #[error("Filter parser error(s) in '{expr}':{}", render(.errors))]
    Syntax { expr: String, errors: Vec<ParseError> },

    /// The expression parsed but failed at runtime
    #[error("Filter '{expr}' failed on torrent {id}: {source}")]
    Eval {
        expr: String,
        id: i64,
        source: EvalError,
    },

    /// The expression produced something other than a boolean
    #[error("Filter '{expr}' produced {got} for torrent {id}, expected true or false")]
    NotBoolean { expr: String, id: i64, got: String },
}

fn render(errors: &[ParseError]) -> String {
    errors.iter().map(|e| format!("\n\t{e}")).collect()
}
