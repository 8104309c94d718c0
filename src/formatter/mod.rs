//! Output formatting for query results.
//!
//! Canonical rendering: `null` for Null, JSON literals for scalars, and
//! pretty-printed structural JSON for mappings and sequences. Values the
//! evaluator alone can produce (tuples, sets, ranges, slices, lambdas,
//! builtins) have no JSON form and render in shell style instead.
//!
//! Colored output is applied only to the pretty structural case, so plain
//! scalars stay pipe-friendly.

use std::io::{self, Write};

use colored_json::prelude::*;

use crate::eval::Value;
use crate::eval::value::{render_float, repr};

/// Result formatter with configurable indentation and coloring.
pub struct Formatter {
    /// Indentation width for structural output
    indent: usize,

    /// Enable colored output
    use_colors: bool,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `indent` - Indentation width for mappings and sequences
    /// * `use_colors` - Enable colored output
    pub fn new(indent: usize, use_colors: bool) -> Self {
        Self { indent, use_colors }
    }

    /// Format a value with the canonical rendering rules.
    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => render_float(*f),
            Value::Str(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}")),
            Value::List(_) | Value::Mapping(_) => match to_json(value) {
                Some(json) => {
                    let text = self
                        .to_pretty_string(&json)
                        .unwrap_or_else(|_| json.to_string());
                    if self.use_colors {
                        text.to_colored_json_auto().unwrap_or(text)
                    } else {
                        text
                    }
                }
                // structures holding non-JSON values fall back to shell style
                None => repr(value),
            },
            other => repr(other),
        }
    }

    /// Write a formatted value to stdout with a trailing newline.
    pub fn print_to_stdout(&self, value: &Value) -> io::Result<()> {
        let output = self.format(value);
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()
    }

    /// Serialize with the configured indentation width.
    fn to_pretty_string(
        &self,
        value: &serde_json::Value,
    ) -> std::result::Result<String, serde_json::Error> {
        use serde::Serialize;
        let mut buf = Vec::new();
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8(buf).expect("serde_json writes utf-8"))
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(2, false)
    }
}

/// Convert a value to JSON, or `None` if it (or a descendant) has no JSON
/// representation.
fn to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Null => Some(serde_json::Value::Null),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Int(i) => Some(serde_json::Value::from(*i)),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
        Value::Str(s) => Some(serde_json::Value::String(s.clone())),
        Value::List(items) => items
            .iter()
            .map(to_json)
            .collect::<Option<Vec<_>>>()
            .map(serde_json::Value::Array),
        Value::Mapping(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, v) in entries {
                map.insert(key.clone(), to_json(v)?);
            }
            Some(serde_json::Value::Object(map))
        }
        _ => None,
    }
}
