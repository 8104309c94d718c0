//! Document loading and validation.
//!
//! Decodes JSON, YAML, XML, and TOML source text into the [`DocumentValue`]
//! model. The format is detected from the file extension, or forced by a
//! CLI flag when reading stdin. Whatever the format, the decoded top level
//! must be a mapping; anything else is rejected before a session starts.

use std::fs;
use std::path::Path;

use super::xml;
use super::{DocumentValue, Number};
use crate::error::DocumentLoadError;

/// Maximum accepted input size (2 GiB), matching the size guard applied
/// before any decoding work starts.
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Xml,
    Toml,
}

impl Format {
    /// Detect the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "xml" => Some(Format::Xml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Detect the format from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Display name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Xml => "XML",
            Format::Toml => "TOML",
        }
    }
}

/// Read a document file, returning its content and detected format.
///
/// Fails when the file is missing, oversized, or carries an extension that
/// does not name a supported format.
pub fn content_from_file(path: &Path) -> Result<(String, Format), DocumentLoadError> {
    let format = Format::from_path(path).ok_or_else(|| {
        DocumentLoadError::UnknownFormat(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        )
    })?;
    let content = read_to_string(path)?;
    Ok((content, format))
}

/// Read a document file with the existence and size guards applied, without
/// requiring a recognizable extension (used when a format flag decides).
pub fn read_to_string(path: &Path) -> Result<String, DocumentLoadError> {
    if !path.exists() {
        return Err(DocumentLoadError::FileNotFound(path.display().to_string()));
    }

    let size = fs::metadata(path)
        .map_err(|e| DocumentLoadError::FileNotFound(format!("{}: {e}", path.display())))?
        .len();
    if size > MAX_FILE_SIZE {
        return Err(DocumentLoadError::TooLarge {
            size,
            limit: MAX_FILE_SIZE,
        });
    }

    fs::read_to_string(path).map_err(|e| DocumentLoadError::FileNotFound(format!(
        "{}: {e}",
        path.display()
    )))
}

/// Load and validate a document file.
pub fn load_file(path: &Path) -> Result<DocumentValue, DocumentLoadError> {
    let (content, format) = content_from_file(path)?;
    load_content(&content, format, &path.display().to_string())
}

/// Decode `content` using the parser for `format`.
///
/// `source` names the origin (file path or "stdin") for error messages.
pub fn load_content(
    content: &str,
    format: Format,
    source: &str,
) -> Result<DocumentValue, DocumentLoadError> {
    let value = match format {
        Format::Json => parse_json(content, source)?,
        Format::Yaml => parse_yaml(content, source)?,
        Format::Xml => xml::parse(content, source)?,
        Format::Toml => parse_toml(content, source)?,
    };
    validate_mapping(value, format)
}

/// Reject documents whose outermost value is not a mapping.
fn validate_mapping(
    value: DocumentValue,
    format: Format,
) -> Result<DocumentValue, DocumentLoadError> {
    if value.is_mapping() {
        Ok(value)
    } else {
        Err(DocumentLoadError::NotAMapping {
            format: format.name(),
            found: value.kind(),
        })
    }
}

fn parse_json(content: &str, source: &str) -> Result<DocumentValue, DocumentLoadError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| DocumentLoadError::InvalidSource {
            format: "JSON",
            source: source.to_string(),
            // serde_json's message already carries "at line N column M"
            message: e.to_string(),
        })?;
    Ok(from_json(value))
}

fn from_json(value: serde_json::Value) -> DocumentValue {
    match value {
        serde_json::Value::Null => DocumentValue::Null,
        serde_json::Value::Bool(b) => DocumentValue::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DocumentValue::Number(Number::Int(i))
            } else {
                DocumentValue::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => DocumentValue::String(s),
        serde_json::Value::Array(items) => {
            DocumentValue::Sequence(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => {
            DocumentValue::Mapping(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

fn parse_yaml(content: &str, source: &str) -> Result<DocumentValue, DocumentLoadError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| DocumentLoadError::InvalidSource {
            format: "YAML",
            source: source.to_string(),
            message: e.to_string(),
        })?;
    from_yaml(value, source)
}

fn from_yaml(value: serde_yaml::Value, source: &str) -> Result<DocumentValue, DocumentLoadError> {
    Ok(match value {
        serde_yaml::Value::Null => DocumentValue::Null,
        serde_yaml::Value::Bool(b) => DocumentValue::Boolean(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DocumentValue::Number(Number::Int(i))
            } else {
                DocumentValue::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_yaml::Value::String(s) => DocumentValue::String(s),
        serde_yaml::Value::Sequence(items) => DocumentValue::Sequence(
            items
                .into_iter()
                .map(|v| from_yaml(v, source))
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, v) in map {
                entries.push((yaml_key(key, source)?, from_yaml(v, source)?));
            }
            DocumentValue::Mapping(entries)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value, source)?,
    })
}

/// YAML permits scalar non-string keys; render them to their textual form.
fn yaml_key(key: serde_yaml::Value, source: &str) -> Result<String, DocumentLoadError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        other => Err(DocumentLoadError::InvalidSource {
            format: "YAML",
            source: source.to_string(),
            message: format!("unsupported non-scalar mapping key: {other:?}"),
        }),
    }
}

fn parse_toml(content: &str, source: &str) -> Result<DocumentValue, DocumentLoadError> {
    let doc: toml_edit::DocumentMut =
        content
            .parse()
            .map_err(|e: toml_edit::TomlError| DocumentLoadError::InvalidSource {
                format: "TOML",
                source: source.to_string(),
                message: e.to_string(),
            })?;
    Ok(from_toml_table(doc.as_table()))
}

fn from_toml_table(table: &toml_edit::Table) -> DocumentValue {
    let entries = table
        .iter()
        .filter_map(|(key, item)| from_toml_item(item).map(|v| (key.to_string(), v)))
        .collect();
    DocumentValue::Mapping(entries)
}

fn from_toml_item(item: &toml_edit::Item) -> Option<DocumentValue> {
    match item {
        toml_edit::Item::None => None,
        toml_edit::Item::Value(value) => Some(from_toml_value(value)),
        toml_edit::Item::Table(table) => Some(from_toml_table(table)),
        toml_edit::Item::ArrayOfTables(tables) => Some(DocumentValue::Sequence(
            tables.iter().map(from_toml_table).collect(),
        )),
    }
}

fn from_toml_value(value: &toml_edit::Value) -> DocumentValue {
    match value {
        toml_edit::Value::String(s) => DocumentValue::String(s.value().clone()),
        toml_edit::Value::Integer(i) => DocumentValue::Number(Number::Int(*i.value())),
        toml_edit::Value::Float(f) => DocumentValue::Number(Number::Float(*f.value())),
        toml_edit::Value::Boolean(b) => DocumentValue::Boolean(*b.value()),
        toml_edit::Value::Datetime(dt) => DocumentValue::String(dt.value().to_string()),
        toml_edit::Value::Array(items) => {
            DocumentValue::Sequence(items.iter().map(from_toml_value).collect())
        }
        toml_edit::Value::InlineTable(table) => DocumentValue::Mapping(
            table
                .iter()
                .map(|(k, v)| (k.to_string(), from_toml_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_extension("json"), Some(Format::Json));
        assert_eq!(Format::from_extension("YAML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("yml"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("xml"), Some(Format::Xml));
        assert_eq!(Format::from_extension("toml"), Some(Format::Toml));
        assert_eq!(Format::from_extension("csv"), None);
    }

    #[test]
    fn test_parse_json_document() {
        let doc = load_content(
            r#"{"items": [1, 2.5, "x", null, true], "count": 2}"#,
            Format::Json,
            "test",
        )
        .unwrap();
        assert_eq!(
            doc.get("count"),
            Some(&DocumentValue::Number(Number::Int(2)))
        );
        let items = doc.get("items").unwrap();
        assert_eq!(items.at(0), Some(&DocumentValue::from(1)));
        assert_eq!(items.at(1), Some(&DocumentValue::from(2.5)));
        assert_eq!(items.at(3), Some(&DocumentValue::Null));
    }

    #[test]
    fn test_json_preserves_key_order() {
        let doc = load_content(r#"{"z": 1, "a": 2, "m": 3}"#, Format::Json, "test").unwrap();
        if let DocumentValue::Mapping(entries) = doc {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["z", "a", "m"]);
        } else {
            panic!("expected mapping");
        }
    }

    #[test]
    fn test_json_error_carries_position() {
        let err = load_content("{\n  \"a\": ,\n}", Format::Json, "bad.json").unwrap_err();
        match err {
            DocumentLoadError::InvalidSource {
                format, message, ..
            } => {
                assert_eq!(format, "JSON");
                assert!(message.contains("line 2"));
            }
            other => panic!("expected InvalidSource, got {other:?}"),
        }
    }

    #[test]
    fn test_non_mapping_top_level_rejected() {
        let err = load_content("[1, 2, 3]", Format::Json, "test").unwrap_err();
        assert!(matches!(
            err,
            DocumentLoadError::NotAMapping {
                format: "JSON",
                found: "sequence"
            }
        ));

        let err = load_content("42", Format::Json, "test").unwrap_err();
        assert!(matches!(err, DocumentLoadError::NotAMapping { .. }));
    }

    #[test]
    fn test_parse_yaml_document() {
        let doc = load_content("key: value\nitems:\n  - 1\n  - 2\n", Format::Yaml, "test").unwrap();
        assert_eq!(doc.get("key"), Some(&DocumentValue::from("value")));
        let items = doc.get("items").unwrap();
        assert_eq!(items.at(1), Some(&DocumentValue::from(2)));
    }

    #[test]
    fn test_yaml_scalar_keys_are_stringified() {
        let doc = load_content("1: one\ntrue: yes\n", Format::Yaml, "test").unwrap();
        assert_eq!(doc.get("1"), Some(&DocumentValue::from("one")));
        assert!(doc.get("true").is_some());
    }

    #[test]
    fn test_parse_toml_document() {
        let doc = load_content(
            "title = \"demo\"\n\n[owner]\nname = \"amy\"\nage = 7\npi = 3.25\n",
            Format::Toml,
            "test",
        )
        .unwrap();
        assert_eq!(doc.get("title"), Some(&DocumentValue::from("demo")));
        let owner = doc.get("owner").unwrap();
        assert_eq!(owner.get("age"), Some(&DocumentValue::from(7)));
        assert_eq!(owner.get("pi"), Some(&DocumentValue::from(3.25)));
    }

    #[test]
    fn test_parse_toml_array_of_tables() {
        let doc = load_content(
            "[[servers]]\nname = \"a\"\n\n[[servers]]\nname = \"b\"\n",
            Format::Toml,
            "test",
        )
        .unwrap();
        let servers = doc.get("servers").unwrap();
        assert_eq!(
            servers.at(1).unwrap().get("name"),
            Some(&DocumentValue::from("b"))
        );
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = load_content("a = ", Format::Toml, "bad.toml").unwrap_err();
        assert!(matches!(
            err,
            DocumentLoadError::InvalidSource { format: "TOML", .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/file.json")).unwrap_err();
        assert!(matches!(err, DocumentLoadError::FileNotFound(_)));
    }
}
