//! Query cursor analysis.
//!
//! Splits the raw query text into its completed portion and, when the user
//! is in the middle of typing a key (an opening `['` with no matching
//! `']`), the partial key typed so far. Bracket and quote state is tracked
//! character by character, so brackets inside quoted keys are not
//! miscounted.

use crate::document::depth_of;

/// Analysis of the user's in-progress query text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCursor {
    completed: String,
    depth: usize,
    partial_key: Option<String>,
}

impl QueryCursor {
    /// Analyze `query`, locating the last unterminated bracket segment.
    pub fn parse(query: &str) -> Self {
        let mut nesting = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        // byte offset of the outermost '[' of the currently open segment
        let mut open_at: Option<usize> = None;

        for (pos, ch) in query.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' if in_string => escaped = true,
                '\'' => in_string = !in_string,
                '[' if !in_string => {
                    if nesting == 0 {
                        open_at = Some(pos);
                    }
                    nesting += 1;
                }
                ']' if !in_string => {
                    if nesting > 0 {
                        nesting -= 1;
                        if nesting == 0 {
                            open_at = None;
                        }
                    }
                }
                _ => {}
            }
        }

        match open_at {
            Some(pos) if nesting > 0 => {
                let completed = query[..pos].to_string();
                let inside = &query[pos + 1..];
                let partial_key = inside.strip_prefix('\'').map(|rest| {
                    // a trailing quote belongs to the key delimiter, not the key
                    rest.strip_suffix('\'').unwrap_or(rest).to_string()
                });
                let depth = depth_of(&completed);
                Self {
                    completed,
                    depth,
                    partial_key,
                }
            }
            _ => {
                let depth = depth_of(query);
                Self {
                    completed: query.to_string(),
                    depth,
                    partial_key: None,
                }
            }
        }
    }

    /// The syntactically complete portion of the query (everything before
    /// an open bracket, or the whole text).
    pub fn completed(&self) -> &str {
        &self.completed
    }

    /// Depth of the completed portion in bracketed segments.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The partial key typed inside an open `['` segment, if any.
    pub fn partial_key(&self) -> Option<&str> {
        self.partial_key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_query_has_no_partial() {
        let cursor = QueryCursor::parse("_['items']");
        assert_eq!(cursor.completed(), "_['items']");
        assert_eq!(cursor.depth(), 1);
        assert_eq!(cursor.partial_key(), None);
    }

    #[test]
    fn test_bare_root() {
        let cursor = QueryCursor::parse("_");
        assert_eq!(cursor.completed(), "_");
        assert_eq!(cursor.depth(), 0);
        assert_eq!(cursor.partial_key(), None);
    }

    #[test]
    fn test_open_key_segment() {
        let cursor = QueryCursor::parse("_['ite");
        assert_eq!(cursor.completed(), "_");
        assert_eq!(cursor.depth(), 0);
        assert_eq!(cursor.partial_key(), Some("ite"));
    }

    #[test]
    fn test_open_key_with_closing_quote_only() {
        let cursor = QueryCursor::parse("_['items'");
        assert_eq!(cursor.completed(), "_");
        assert_eq!(cursor.partial_key(), Some("items"));
    }

    #[test]
    fn test_nested_open_key_segment() {
        let cursor = QueryCursor::parse("_['items'][0]['n");
        assert_eq!(cursor.completed(), "_['items'][0]");
        assert_eq!(cursor.depth(), 2);
        assert_eq!(cursor.partial_key(), Some("n"));
    }

    #[test]
    fn test_open_index_segment_has_no_partial_key() {
        let cursor = QueryCursor::parse("_['items'][1");
        assert_eq!(cursor.completed(), "_['items']");
        assert_eq!(cursor.depth(), 1);
        assert_eq!(cursor.partial_key(), None);
    }

    #[test]
    fn test_empty_open_bracket() {
        let cursor = QueryCursor::parse("_[");
        assert_eq!(cursor.completed(), "_");
        assert_eq!(cursor.depth(), 0);
        assert_eq!(cursor.partial_key(), None);

        let cursor = QueryCursor::parse("_['");
        assert_eq!(cursor.partial_key(), Some(""));
    }

    #[test]
    fn test_brackets_inside_keys_do_not_open_segments() {
        let cursor = QueryCursor::parse("_['a[b']");
        assert_eq!(cursor.completed(), "_['a[b']");
        assert_eq!(cursor.depth(), 1);
        assert_eq!(cursor.partial_key(), None);
    }
}
