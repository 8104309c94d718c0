//! Error handling module for docq.
//!
//! This module defines the error types used throughout the crate:
//! - `DocumentLoadError`: fatal problems while reading and decoding a document
//! - `QueryError`: classified, recoverable evaluation failures
//! - `ConfigError`: configuration file problems (never fatal, defaults apply)
//! - `DocqError`: top-level wrapper used by the crate-wide `Result` alias
//!
//! Query errors are produced with a typed kind directly at the point of
//! failure inside the evaluator, never reconstructed by matching on message
//! text.

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, DocqError, DocumentLoadError, QueryError, Result};
