//! XML decoding into the document model.
//!
//! XML has no native mapping/sequence distinction, so elements are folded
//! into mappings the same way `xmltodict` does it:
//! - attributes become `@name` keys,
//! - element text becomes a `#text` key (or the whole value when the
//!   element has neither attributes nor children),
//! - repeated sibling elements collapse into a sequence under one key.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::DocumentValue;
use crate::error::DocumentLoadError;

/// Parse XML source text into a [`DocumentValue`] mapping.
pub fn parse(content: &str, source: &str) -> Result<DocumentValue, DocumentLoadError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = vec![Node::new(String::new())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let mut node = Node::new(element_name(&start));
                read_attributes(&start, &mut node, &reader, source)?;
                stack.push(node);
            }
            Ok(Event::Empty(start)) => {
                let mut node = Node::new(element_name(&start));
                read_attributes(&start, &mut node, &reader, source)?;
                let (name, value) = node.finish();
                insert_child(stack.last_mut().expect("root frame"), name, value);
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().expect("balanced tags");
                let (name, value) = node.finish();
                insert_child(stack.last_mut().expect("root frame"), name, value);
            }
            Ok(Event::Text(text)) => {
                let decoded = text
                    .decode()
                    .map_err(|e| invalid(source, &e.to_string(), &reader))?;
                let text = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| invalid(source, &e.to_string(), &reader))?;
                stack.last_mut().expect("root frame").push_text(&text);
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                stack.last_mut().expect("root frame").push_text(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declaration, comments, processing instructions, doctype
            Err(e) => return Err(invalid(source, &e.to_string(), &reader)),
        }
    }

    let root = stack.pop().expect("root frame");
    if root.children.is_empty() {
        return Err(DocumentLoadError::InvalidSource {
            format: "XML",
            source: source.to_string(),
            message: "document has no root element".to_string(),
        });
    }
    Ok(DocumentValue::Mapping(root.children))
}

/// Accumulator for one element while its subtree is being read.
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, DocumentValue)>,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text.trim());
    }

    /// Collapse the accumulated pieces into this element's final value.
    fn finish(self) -> (String, DocumentValue) {
        let value = if self.attributes.is_empty() && self.children.is_empty() {
            if self.text.is_empty() {
                DocumentValue::Null
            } else {
                DocumentValue::String(self.text)
            }
        } else {
            let mut entries: Vec<(String, DocumentValue)> = self
                .attributes
                .into_iter()
                .map(|(k, v)| (format!("@{k}"), DocumentValue::String(v)))
                .collect();
            entries.extend(self.children);
            if !self.text.is_empty() {
                entries.push(("#text".to_string(), DocumentValue::String(self.text)));
            }
            DocumentValue::Mapping(entries)
        };
        (self.name, value)
    }
}

/// Insert a finished child, collapsing repeated sibling names into a sequence.
fn insert_child(parent: &mut Node, name: String, value: DocumentValue) {
    if let Some((_, existing)) = parent.children.iter_mut().find(|(k, _)| *k == name) {
        match existing {
            DocumentValue::Sequence(items) => items.push(value),
            _ => {
                let first = std::mem::replace(existing, DocumentValue::Null);
                *existing = DocumentValue::Sequence(vec![first, value]);
            }
        }
    } else {
        parent.children.push((name, value));
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn read_attributes(
    start: &BytesStart<'_>,
    node: &mut Node,
    reader: &Reader<&[u8]>,
    source: &str,
) -> Result<(), DocumentLoadError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| invalid(source, &e.to_string(), reader))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| invalid(source, &e.to_string(), reader))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(())
}

fn invalid(source: &str, message: &str, reader: &Reader<&[u8]>) -> DocumentLoadError {
    DocumentLoadError::InvalidSource {
        format: "XML",
        source: source.to_string(),
        message: format!("{message} at byte offset {}", reader.buffer_position()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element_tree() {
        let doc = parse("<root><name>amy</name><age>7</age></root>", "test").unwrap();
        let root = doc.get("root").unwrap();
        assert_eq!(root.get("name"), Some(&DocumentValue::from("amy")));
        assert_eq!(root.get("age"), Some(&DocumentValue::from("7")));
    }

    #[test]
    fn test_attributes_become_at_keys() {
        let doc = parse(r#"<root><item id="1">x</item></root>"#, "test").unwrap();
        let item = doc.get("root").unwrap().get("item").unwrap();
        assert_eq!(item.get("@id"), Some(&DocumentValue::from("1")));
        assert_eq!(item.get("#text"), Some(&DocumentValue::from("x")));
    }

    #[test]
    fn test_repeated_elements_collapse_to_sequence() {
        let doc = parse("<root><i>a</i><i>b</i><i>c</i></root>", "test").unwrap();
        let items = doc.get("root").unwrap().get("i").unwrap();
        match items {
            DocumentValue::Sequence(values) => {
                assert_eq!(values.len(), 3);
                assert_eq!(values[2], DocumentValue::from("c"));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_element_is_null() {
        let doc = parse("<root><nothing/></root>", "test").unwrap();
        assert_eq!(
            doc.get("root").unwrap().get("nothing"),
            Some(&DocumentValue::Null)
        );
    }

    #[test]
    fn test_malformed_xml_is_reported_with_offset() {
        let err = parse("<root><open></root>", "bad.xml").unwrap_err();
        match err {
            DocumentLoadError::InvalidSource {
                format, message, ..
            } => {
                assert_eq!(format, "XML");
                assert!(message.contains("byte offset"));
            }
            other => panic!("expected InvalidSource, got {other:?}"),
        }
    }
}
