//! Area script: the query language accepted by `POST /execute`.
//!
//! A script is a list of assignments whose right-hand sides are pipelines
//! over JSON values:
//!
//! ```text
//! let free = areas | where occupancy == "available"
//! output = free | sort area_name | pluck area_name
//! ```
//!
//! Scripts see the dataset as `areas` and report back through `output`.
//! They have no access to anything outside the values bound before the run.

pub mod eval;
pub mod lexer;
pub mod parser;

use serde_json::Value;
use thiserror::Error;

use crate::models::area::Dataset;

pub use eval::Environment;
pub use parser::{Program, Stage};

/// Name scripts use for the dataset rows.
pub const AREAS_VAR: &str = "areas";
/// Name whose final value becomes the script's result.
pub const OUTPUT_VAR: &str = "output";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("script is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("name '{0}' is not defined")]
    UnknownVariable(String),

    #[error("{stage}: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let (tokens, end) = lexer::Lexer::new(source).tokenize()?;
    parser::Parser::new(tokens, end).parse()
}

/// Runs `source` against `dataset` and returns the final value of `output`.
pub fn execute(source: &str, dataset: &Dataset, max_len: usize) -> Result<Value, ScriptError> {
    if source.len() > max_len {
        return Err(ScriptError::TooLong {
            len: source.len(),
            max: max_len,
        });
    }

    let program = parse(source)?;

    let mut env = Environment::new();
    env.bind(AREAS_VAR, dataset.to_rows());
    env.bind(OUTPUT_VAR, Value::String(String::new()));
    env.run(&program)?;

    Ok(env.take(OUTPUT_VAR).unwrap_or(Value::Null))
}
