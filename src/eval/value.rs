//! Runtime values for the query evaluator.
//!
//! [`Value`] is a superset of the document model: everything a document can
//! hold, plus the kinds only the evaluator can produce (tuples, sets,
//! ranges, slices, lambdas, and first-class builtins). Every operation in
//! the interpreter pattern-matches over this closed union.

use std::rc::Rc;

use super::ast::Expr;
use super::builtins::Builtin;
use crate::document::{DocumentValue, Number};
use crate::error::QueryError;

/// A value produced by evaluating a query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Mapping(Vec<(String, Value)>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Range(RangeValue),
    Slice(SliceValue),
    Lambda(LambdaValue),
    Builtin(Builtin),
}

/// An integer range produced by `range(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    /// Number of elements the range yields.
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            self.stop.saturating_sub(self.start)
        } else {
            self.start.saturating_sub(self.stop)
        };
        if span <= 0 {
            0
        } else {
            let step = self.step.unsigned_abs() as i128;
            ((span as i128 + step - 1) / step) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at position `i`, if in range.
    pub fn at(&self, i: usize) -> Option<i64> {
        if i < self.len() {
            Some(self.start + self.step * i as i64)
        } else {
            None
        }
    }

    /// Materialize the range into values.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len())
            .map(|i| Value::Int(self.start + self.step * i as i64))
            .collect()
    }
}

/// A slice object produced by `slice(...)` or written as `a:b:c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceValue {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

/// A lambda together with the bindings captured where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaValue {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub captured: Vec<(String, Value)>,
}

impl Value {
    /// Human-readable name of this value's type.
    ///
    /// Sequence-like document values use the query language's own naming
    /// ("list", "dict") rather than the document model's.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Mapping(_) => "dict",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Range(_) => "range",
            Value::Slice(_) => "slice",
            Value::Lambda(_) => "lambda",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Convert a document subtree into a runtime value.
    pub fn from_document(doc: &DocumentValue) -> Value {
        match doc {
            DocumentValue::Null => Value::Null,
            DocumentValue::Boolean(b) => Value::Bool(*b),
            DocumentValue::Number(Number::Int(i)) => Value::Int(*i),
            DocumentValue::Number(Number::Float(f)) => Value::Float(*f),
            DocumentValue::String(s) => Value::Str(s.clone()),
            DocumentValue::Sequence(items) => {
                Value::List(items.iter().map(Value::from_document).collect())
            }
            DocumentValue::Mapping(entries) => Value::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_document(v)))
                    .collect(),
            ),
        }
    }

    /// Python-style truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => !v.is_empty(),
            Value::Mapping(m) => !m.is_empty(),
            Value::Range(r) => !r.is_empty(),
            Value::Slice(_) | Value::Lambda(_) | Value::Builtin(_) => true,
        }
    }

    /// Elements of this value in iteration order.
    ///
    /// Strings iterate as one-character strings, mappings as their keys,
    /// matching the reference semantics. Non-iterable kinds produce a
    /// `TypeMismatch` naming the kind.
    pub fn iter_values(&self) -> Result<Vec<Value>, QueryError> {
        match self {
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => Ok(v.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Mapping(m) => Ok(m.iter().map(|(k, _)| Value::Str(k.clone())).collect()),
            Value::Range(r) => Ok(r.values()),
            other => Err(QueryError::not_iterable(other.kind())),
        }
    }

    /// Mapping entry lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Compact single-line rendering of a value, used by the `str` builtin and
/// as the fallback for kinds that have no JSON form.
pub fn repr(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => render_float(*f),
        Value::Str(s) => format!("{:?}", s),
        Value::List(items) => format!("[{}]", join_reprs(items)),
        Value::Tuple(items) => match items.len() {
            1 => format!("({},)", repr(&items[0])),
            _ => format!("({})", join_reprs(items)),
        },
        Value::Set(items) => {
            if items.is_empty() {
                "set()".to_string()
            } else {
                format!("{{{}}}", join_reprs(items))
            }
        }
        Value::Mapping(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{:?}: {}", k, repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Range(r) => {
            if r.step == 1 {
                format!("range({}, {})", r.start, r.stop)
            } else {
                format!("range({}, {}, {})", r.start, r.stop, r.step)
            }
        }
        Value::Slice(s) => format!(
            "slice({}, {}, {})",
            opt_repr(s.start),
            opt_repr(s.stop),
            opt_repr(s.step)
        ),
        Value::Lambda(l) => format!("<lambda ({})>", l.params.join(", ")),
        Value::Builtin(b) => format!("<builtin '{}'>", b.name()),
    }
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(repr).collect::<Vec<_>>().join(", ")
}

fn opt_repr(part: Option<i64>) -> String {
    part.map(|i| i.to_string()).unwrap_or_else(|| "null".to_string())
}

/// Render a float the way JSON output does, keeping a trailing `.0` so the
/// float/int distinction stays visible.
pub fn render_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_len_and_at() {
        let r = RangeValue {
            start: 0,
            stop: 5,
            step: 1,
        };
        assert_eq!(r.len(), 5);
        assert_eq!(r.at(4), Some(4));
        assert_eq!(r.at(5), None);

        let r = RangeValue {
            start: 1,
            stop: 10,
            step: 3,
        };
        assert_eq!(r.len(), 3); // 1, 4, 7
        assert_eq!(r.at(2), Some(7));

        let r = RangeValue {
            start: 5,
            stop: 0,
            step: -2,
        };
        assert_eq!(r.len(), 3); // 5, 3, 1
        assert_eq!(r.at(1), Some(3));

        let r = RangeValue {
            start: 3,
            stop: 3,
            step: 1,
        };
        assert!(r.is_empty());
    }

    #[test]
    fn test_from_document_round_trip_shape() {
        let doc = DocumentValue::Mapping(vec![
            (
                "items".into(),
                DocumentValue::Sequence(vec![DocumentValue::from(1), DocumentValue::from("x")]),
            ),
            ("flag".into(), DocumentValue::Boolean(true)),
        ]);
        let value = Value::from_document(&doc);
        assert_eq!(
            value.get("items"),
            Some(&Value::List(vec![Value::Int(1), Value::Str("x".into())]))
        );
        assert_eq!(value.get("flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(!Value::List(vec![]).truthy());
        assert!(Value::List(vec![Value::Null]).truthy());
        assert!(!Value::Mapping(vec![]).truthy());
        assert!(
            !Value::Range(RangeValue {
                start: 0,
                stop: 0,
                step: 1
            })
            .truthy()
        );
    }

    #[test]
    fn test_iteration_semantics() {
        let m = Value::Mapping(vec![
            ("a".into(), Value::Int(1)),
            ("b".into(), Value::Int(2)),
        ]);
        assert_eq!(
            m.iter_values().unwrap(),
            vec![Value::Str("a".into()), Value::Str("b".into())]
        );

        let s = Value::Str("ab".into());
        assert_eq!(
            s.iter_values().unwrap(),
            vec![Value::Str("a".into()), Value::Str("b".into())]
        );

        let err = Value::Int(3).iter_values().unwrap_err();
        assert!(err.to_string().contains("not iterable"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Mapping(vec![]).kind(), "dict");
        assert_eq!(Value::List(vec![]).kind(), "list");
        assert_eq!(Value::Tuple(vec![]).kind(), "tuple");
    }
}
