use std::{fmt, io};

/// Crate-wide `Result` type using [`DocqError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, DocqError>;

/// Top-level error type for docq operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum DocqError {
    /// Document loading errors (fatal at session start).
    Load(DocumentLoadError),

    /// Query evaluation errors (recoverable while editing).
    Query(QueryError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Command-line usage errors.
    Usage(String),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Document loading errors.
///
/// Surfaced once at session start and fatal to that invocation; the
/// session never begins with a document that failed to load.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentLoadError {
    /// Input file does not exist.
    FileNotFound(String),

    /// Input exceeds the maximum accepted size.
    TooLarge { size: u64, limit: u64 },

    /// File extension (or flag) does not name a supported format.
    UnknownFormat(String),

    /// Source text failed to decode.
    InvalidSource {
        format: &'static str,
        source: String,
        message: String,
    },

    /// Decoded document is not a mapping at the top level.
    NotAMapping {
        format: &'static str,
        found: &'static str,
    },
}

/// Classified query evaluation failure.
///
/// Every failure mode of the evaluator maps to exactly one of these kinds
/// at the point where it occurs. None of them is fatal: the interactive
/// session shows the message and keeps editing.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Blank or whitespace-only query.
    Empty,

    /// Malformed expression, with the byte offset of the offending token.
    Syntax { message: String, position: usize },

    /// Identifier outside the root symbol and the builtin allowlist.
    UnknownName { name: String },

    /// Operation applied to an incompatible value kind.
    TypeMismatch { message: String },

    /// Mapping key absent.
    KeyNotFound { key: String },

    /// Attribute-style access attempted on a value.
    InvalidAttributeAccess { name: String },

    /// Malformed argument to an allowed operation.
    InvalidValue { message: String },

    /// Sequence index out of bounds.
    IndexOutOfRange { index: i64, len: usize },

    /// Catch-all for failures outside the other kinds.
    Other { message: String },
}

/// Configuration-specific errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Config file could not be read.
    Unreadable(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl QueryError {
    /// A `TypeMismatch` for a value that cannot be indexed with brackets.
    pub fn not_indexable(kind: &str) -> Self {
        QueryError::TypeMismatch {
            message: format!("value of type '{kind}' is not indexable"),
        }
    }

    /// A `TypeMismatch` for a value that cannot be iterated.
    pub fn not_iterable(kind: &str) -> Self {
        QueryError::TypeMismatch {
            message: format!("value of type '{kind}' is not iterable"),
        }
    }

    /// A generic `TypeMismatch` with a prebuilt message.
    pub fn mismatch(message: impl Into<String>) -> Self {
        QueryError::TypeMismatch {
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error kind, used by tests and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Empty => "empty",
            QueryError::Syntax { .. } => "syntax",
            QueryError::UnknownName { .. } => "unknown-name",
            QueryError::TypeMismatch { .. } => "type-mismatch",
            QueryError::KeyNotFound { .. } => "key-not-found",
            QueryError::InvalidAttributeAccess { .. } => "invalid-attribute-access",
            QueryError::InvalidValue { .. } => "invalid-value",
            QueryError::IndexOutOfRange { .. } => "index-out-of-range",
            QueryError::Other { .. } => "other",
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for DocqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocqError::Load(e) => write!(f, "{e}"),
            DocqError::Query(e) => write!(f, "{e}"),
            DocqError::Config(e) => write!(f, "Configuration error: {e}"),
            DocqError::Io(e) => write!(f, "I/O error: {e}"),
            DocqError::Usage(msg) => write!(f, "{msg}"),
            DocqError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for DocumentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLoadError::FileNotFound(path) => write!(f, "File not found: {path}"),
            DocumentLoadError::TooLarge { size, limit } => {
                let gib = 1024.0 * 1024.0 * 1024.0;
                write!(
                    f,
                    "File too large ({:.2}GB). Maximum size is {:.0}GB",
                    *size as f64 / gib,
                    *limit as f64 / gib
                )
            }
            DocumentLoadError::UnknownFormat(ext) => {
                write!(f, "'{ext}' is not a supported format (json, yaml, xml, toml)")
            }
            DocumentLoadError::InvalidSource {
                format,
                source,
                message,
            } => write!(f, "Invalid {format} in {source}: {message}"),
            DocumentLoadError::NotAMapping { format, found } => write!(
                f,
                "Document must be a {format} object (mapping), got {found}"
            ),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Empty => write!(
                f,
                "Empty query. Try '_', \"_['key']\", or \"len(_)\" to get started"
            ),
            QueryError::Syntax { message, position } => {
                write!(f, "Syntax error at position {position}: {message}")
            }
            QueryError::UnknownName { name } => write!(
                f,
                "Name '{name}' is not defined. Available: _, {}",
                crate::eval::builtins::allowlist().join(", ")
            ),
            QueryError::TypeMismatch { message } => write!(f, "Type error: {message}"),
            QueryError::KeyNotFound { key } => write!(
                f,
                "Key '{key}' not found. Use completion to discover valid keys"
            ),
            QueryError::InvalidAttributeAccess { name } => write!(
                f,
                "Attribute access '.{name}' is not supported. Use bracket addressing like \
                 _['{name}'] instead"
            ),
            QueryError::InvalidValue { message } => write!(f, "Value error: {message}"),
            QueryError::IndexOutOfRange { index, len } => write!(
                f,
                "Index {index} out of range: the sequence has only {len} element(s)"
            ),
            QueryError::Other { message } => write!(f, "Evaluation error: {message}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable(path) => write!(f, "Config file unreadable: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for DocqError {}
impl std::error::Error for DocumentLoadError {}
impl std::error::Error for QueryError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to DocqError ========================= */

impl From<io::Error> for DocqError {
    fn from(err: io::Error) -> Self {
        DocqError::Io(err)
    }
}

impl From<DocumentLoadError> for DocqError {
    fn from(err: DocumentLoadError) -> Self {
        DocqError::Load(err)
    }
}

impl From<QueryError> for DocqError {
    fn from(err: QueryError) -> Self {
        DocqError::Query(err)
    }
}

impl From<ConfigError> for DocqError {
    fn from(err: ConfigError) -> Self {
        DocqError::Config(err)
    }
}

impl From<String> for DocqError {
    fn from(msg: String) -> Self {
        DocqError::Generic(msg)
    }
}

impl From<&str> for DocqError {
    fn from(msg: &str) -> Self {
        DocqError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_kinds_are_distinct() {
        let errors = [
            QueryError::Empty,
            QueryError::Syntax {
                message: "x".into(),
                position: 0,
            },
            QueryError::UnknownName { name: "open".into() },
            QueryError::mismatch("bad"),
            QueryError::KeyNotFound { key: "k".into() },
            QueryError::InvalidAttributeAccess { name: "keys".into() },
            QueryError::InvalidValue { message: "v".into() },
            QueryError::IndexOutOfRange { index: 5, len: 2 },
            QueryError::Other { message: "m".into() },
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_unknown_name_lists_root_and_allowlist() {
        let msg = QueryError::UnknownName { name: "open".into() }.to_string();
        assert!(msg.contains("'open'"));
        assert!(msg.contains("_,"));
        assert!(msg.contains("len"));
        assert!(msg.contains("zip"));
    }

    #[test]
    fn test_type_mismatch_distinguishes_indexable_and_iterable() {
        let a = QueryError::not_indexable("int").to_string();
        let b = QueryError::not_iterable("int").to_string();
        assert!(a.contains("not indexable"));
        assert!(b.contains("not iterable"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_not_found_suggests_completion() {
        let msg = QueryError::KeyNotFound { key: "nme".into() }.to_string();
        assert!(msg.contains("'nme'"));
        assert!(msg.contains("completion"));
    }

    #[test]
    fn test_index_out_of_range_mentions_length() {
        let msg = QueryError::IndexOutOfRange { index: 5, len: 2 }.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_load_error_display() {
        let err = DocumentLoadError::NotAMapping {
            format: "JSON",
            found: "sequence",
        };
        assert!(err.to_string().contains("JSON object"));
    }
}
