//! Path addressing and the path index.
//!
//! Every addressable node in a document has a canonical textual path rooted
//! at the query symbol `_`, e.g. `_['items'][0]['name']`. The index of all
//! such paths is built once per document by a single pre-order traversal and
//! stays immutable for the whole session.

use super::DocumentValue;

/// The root symbol paths (and queries) are anchored at.
pub const ROOT_SYMBOL: &str = "_";

/// One step into the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Mapping access by key.
    Key(String),
    /// Sequence access by position.
    Index(usize),
}

impl Accessor {
    /// Render this accessor as one canonical bracket segment.
    ///
    /// Keys containing `'` or `\` are escaped so the rendered path parses
    /// back in the evaluator.
    pub fn render(&self) -> String {
        match self {
            Accessor::Key(key) => {
                let escaped = key.replace('\\', "\\\\").replace('\'', "\\'");
                format!("['{escaped}']")
            }
            Accessor::Index(i) => format!("[{i}]"),
        }
    }
}

/// One valid path: its canonical text plus the accessor sequence it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    text: String,
    accessors: Vec<Accessor>,
}

impl PathEntry {
    /// Canonical textual form of the path.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Accessor sequence from the root.
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Number of accessor segments.
    pub fn depth(&self) -> usize {
        self.accessors.len()
    }
}

/// Ordered enumeration of every valid path in a document.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: Vec<PathEntry>,
}

impl PathIndex {
    /// Build the index with a pre-order traversal of the document.
    ///
    /// For each mapping, one path per key is appended (in document order)
    /// before descending; for each sequence, one path per index. The result
    /// is closed under prefix: every proper prefix of an entry is itself an
    /// entry. Scalars and empty containers simply contribute nothing.
    pub fn build(document: &DocumentValue) -> Self {
        let mut entries = Vec::new();
        let mut trail = Vec::new();
        collect(document, ROOT_SYMBOL, &mut trail, &mut entries);
        Self { entries }
    }

    /// All entries in document order.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// Number of paths in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no paths (scalar or empty top level).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the canonical text `path` is a member of this index.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.text == path)
    }
}

fn collect(
    value: &DocumentValue,
    prefix: &str,
    trail: &mut Vec<Accessor>,
    entries: &mut Vec<PathEntry>,
) {
    match value {
        DocumentValue::Mapping(pairs) => {
            for (key, child) in pairs {
                let accessor = Accessor::Key(key.clone());
                let text = format!("{prefix}{}", accessor.render());
                trail.push(accessor);
                entries.push(PathEntry {
                    text: text.clone(),
                    accessors: trail.clone(),
                });
                collect(child, &text, trail, entries);
                trail.pop();
            }
        }
        DocumentValue::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                let accessor = Accessor::Index(i);
                let text = format!("{prefix}{}", accessor.render());
                trail.push(accessor);
                entries.push(PathEntry {
                    text: text.clone(),
                    accessors: trail.clone(),
                });
                collect(child, &text, trail, entries);
                trail.pop();
            }
        }
        _ => {}
    }
}

/// Count the complete bracketed segments in a canonical path or query text.
///
/// Walks the text tracking quote state, so brackets inside key strings do
/// not count. An unterminated trailing segment is not counted.
pub fn depth_of(text: &str) -> usize {
    let mut depth = 0usize;
    let mut nesting = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '\'' => in_string = !in_string,
            '[' if !in_string => nesting += 1,
            ']' if !in_string => {
                if nesting > 0 {
                    nesting -= 1;
                    if nesting == 0 {
                        depth += 1;
                    }
                }
            }
            _ => {}
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> DocumentValue {
        // {"items": [{"name": "a"}, {"name": "b"}], "metadata": {"count": 2}}
        DocumentValue::Mapping(vec![
            (
                "items".into(),
                DocumentValue::Sequence(vec![
                    DocumentValue::Mapping(vec![("name".into(), DocumentValue::from("a"))]),
                    DocumentValue::Mapping(vec![("name".into(), DocumentValue::from("b"))]),
                ]),
            ),
            (
                "metadata".into(),
                DocumentValue::Mapping(vec![("count".into(), DocumentValue::from(2))]),
            ),
        ])
    }

    #[test]
    fn test_build_preorder_document_order() {
        let index = PathIndex::build(&sample_document());
        let texts: Vec<&str> = index.entries().iter().map(|e| e.text()).collect();
        assert_eq!(
            texts,
            vec![
                "_['items']",
                "_['items'][0]",
                "_['items'][0]['name']",
                "_['items'][1]",
                "_['items'][1]['name']",
                "_['metadata']",
                "_['metadata']['count']",
            ]
        );
    }

    #[test]
    fn test_prefix_closure() {
        let index = PathIndex::build(&sample_document());
        for entry in index.entries() {
            let mut prefix = String::from(ROOT_SYMBOL);
            for accessor in &entry.accessors()[..entry.depth() - 1] {
                prefix.push_str(&accessor.render());
                assert!(index.contains(&prefix), "missing prefix {prefix}");
            }
        }
    }

    #[test]
    fn test_scalar_and_empty_documents_index_empty() {
        assert!(PathIndex::build(&DocumentValue::from(1)).is_empty());
        assert!(PathIndex::build(&DocumentValue::Mapping(vec![])).is_empty());
        assert!(PathIndex::build(&DocumentValue::Sequence(vec![])).is_empty());
    }

    #[test]
    fn test_depth_of_counts_segments() {
        assert_eq!(depth_of("_"), 0);
        assert_eq!(depth_of("_['items']"), 1);
        assert_eq!(depth_of("_['items'][0]"), 2);
        assert_eq!(depth_of("_['items'][0]['name']"), 3);
        // unterminated trailing segments do not count
        assert_eq!(depth_of("_['items'][0]['na"), 2);
        assert_eq!(depth_of("_['ite"), 0);
    }

    #[test]
    fn test_depth_of_ignores_brackets_inside_keys() {
        assert_eq!(depth_of("_['a[0]b']"), 1);
    }

    #[test]
    fn test_entry_depth_agrees_with_textual_depth() {
        let index = PathIndex::build(&sample_document());
        for entry in index.entries() {
            assert_eq!(entry.depth(), depth_of(entry.text()));
        }
    }

    #[test]
    fn test_key_escaping_renders_parseable_segment() {
        let accessor = Accessor::Key("it's".into());
        assert_eq!(accessor.render(), "['it\\'s']");
    }
}
