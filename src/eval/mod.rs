//! Sandboxed query evaluation.
//!
//! `evaluate` runs a query string against a document inside a closed
//! interpreter: the expression is parsed into a purpose-built AST and
//! walked over [`Value`]s. The only visible data identifier is the root
//! symbol `_`; the only callables are the fixed builtin allowlist and
//! lambdas written in the query. No operation can reach the process,
//! filesystem, or network, because no AST node or builtin exposes them.
//!
//! Failures come back as a classified [`QueryError`]; a successful
//! evaluation returns the value unchanged, leaving display formatting to
//! the caller.

pub mod ast;
pub mod builtins;
mod interp;
mod lexer;
mod parser;
pub mod value;

pub use value::{RangeValue, SliceValue, Value};

use crate::document::DocumentValue;
use crate::error::QueryError;

/// Evaluate `query` against `document`.
pub fn evaluate(query: &str, document: &DocumentValue) -> Result<Value, QueryError> {
    if query.trim().is_empty() {
        return Err(QueryError::Empty);
    }
    let expr = parser::Parser::parse(query)?;
    interp::Interpreter::new(document).eval(&expr)
}
