//! Document model for docq.
//!
//! A decoded document is represented as a [`DocumentValue`] tree, the only
//! data structure the completion engine and the evaluator operate on. The
//! tree is finite and acyclic because it is always produced by decoding
//! linear source text; nothing in this crate mutates it afterwards.

pub mod loader;
pub mod path;
mod xml;

pub use loader::{Format, load_content, load_file};
pub use path::{Accessor, PathIndex, depth_of};

/// Numeric value preserving the integer/float distinction of the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Canonical in-memory representation of a decoded document.
///
/// Mappings keep their entries in document order with unique keys;
/// sequences keep element order.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Sequence(Vec<DocumentValue>),
    Mapping(Vec<(String, DocumentValue)>),
}

impl DocumentValue {
    /// Human-readable name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentValue::Null => "null",
            DocumentValue::Boolean(_) => "bool",
            DocumentValue::Number(Number::Int(_)) => "int",
            DocumentValue::Number(Number::Float(_)) => "float",
            DocumentValue::String(_) => "str",
            DocumentValue::Sequence(_) => "sequence",
            DocumentValue::Mapping(_) => "mapping",
        }
    }

    /// Whether this value is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self, DocumentValue::Mapping(_))
    }

    /// Look up a mapping entry by key.
    pub fn get(&self, key: &str) -> Option<&DocumentValue> {
        match self {
            DocumentValue::Mapping(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Look up a sequence element by index.
    pub fn at(&self, index: usize) -> Option<&DocumentValue> {
        match self {
            DocumentValue::Sequence(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<i64> for DocumentValue {
    fn from(n: i64) -> Self {
        DocumentValue::Number(Number::Int(n))
    }
}

impl From<f64> for DocumentValue {
    fn from(n: f64) -> Self {
        DocumentValue::Number(Number::Float(n))
    }
}

impl From<&str> for DocumentValue {
    fn from(s: &str) -> Self {
        DocumentValue::String(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DocumentValue::Null.kind(), "null");
        assert_eq!(DocumentValue::Boolean(true).kind(), "bool");
        assert_eq!(DocumentValue::from(1).kind(), "int");
        assert_eq!(DocumentValue::from(1.5).kind(), "float");
        assert_eq!(DocumentValue::from("a").kind(), "str");
        assert_eq!(DocumentValue::Sequence(vec![]).kind(), "sequence");
        assert_eq!(DocumentValue::Mapping(vec![]).kind(), "mapping");
    }

    #[test]
    fn test_mapping_lookup_preserves_order() {
        let doc = DocumentValue::Mapping(vec![
            ("b".into(), DocumentValue::from(1)),
            ("a".into(), DocumentValue::from(2)),
        ]);
        assert_eq!(doc.get("b"), Some(&DocumentValue::from(1)));
        assert_eq!(doc.get("a"), Some(&DocumentValue::from(2)));
        assert_eq!(doc.get("c"), None);
        if let DocumentValue::Mapping(entries) = &doc {
            assert_eq!(entries[0].0, "b");
        }
    }

    #[test]
    fn test_sequence_lookup() {
        let doc = DocumentValue::Sequence(vec![DocumentValue::from("x")]);
        assert_eq!(doc.at(0), Some(&DocumentValue::from("x")));
        assert_eq!(doc.at(1), None);
        assert_eq!(DocumentValue::Null.at(0), None);
    }
}
