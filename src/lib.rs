//! docq - interactive document query library
//!
//! This library provides the core functionality for docq, an interactive
//! query tool for JSON, YAML, XML, and TOML documents.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and mode selection
//! - `completion`: Depth-aware path completion
//! - `config`: Configuration management
//! - `document`: Document model, decoding, and the path index
//! - `error`: Error types and handling
//! - `eval`: Sandboxed expression evaluation
//! - `formatter`: Output formatting and display
//! - `repl`: Interactive terminal session
//! - `session`: Session state machine
//!
//! # Example
//!
//! ```
//! use docq::document::{Format, load_content};
//! use docq::eval::evaluate;
//!
//! let document = load_content(
//!     r#"{"items": [1, 2, 3]}"#,
//!     Format::Json,
//!     "example",
//! )
//! .unwrap();
//! let value = evaluate("len(_['items'])", &document).unwrap();
//! assert_eq!(value, docq::eval::Value::Int(3));
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod eval;
pub mod formatter;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use document::{DocumentValue, PathIndex};
pub use error::{DocqError, DocumentLoadError, QueryError, Result};
pub use eval::{Value, evaluate};
pub use formatter::Formatter;
pub use session::{Session, SessionStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
