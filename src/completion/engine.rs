//! Depth-aware path suggestion.
//!
//! Candidates always sit exactly one level below the user's completed
//! position, so suggestion lists stay small on deep documents. Completed
//! queries match by literal prefix; an open partial key matches by
//! case-insensitive substring against the key of the next segment. This
//! asymmetry is deliberate and preserved from the reference behavior.

use super::cursor::QueryCursor;
use crate::document::path::ROOT_SYMBOL;
use crate::document::{Accessor, PathIndex};

/// Maximum number of suggestions returned.
pub const MAX_RESULTS: usize = 10;

/// Propose next-level paths for the in-progress `query`.
///
/// Results are members of `index` in document order, truncated to
/// [`MAX_RESULTS`]. An empty query (or the bare root symbol) yields all
/// depth-1 paths. Queries addressing nothing yield an empty list.
pub fn suggest(index: &PathIndex, query: &str) -> Vec<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() || trimmed == ROOT_SYMBOL {
        return index
            .entries()
            .iter()
            .filter(|e| e.depth() == 1)
            .take(MAX_RESULTS)
            .map(|e| e.text().to_string())
            .collect();
    }

    let cursor = QueryCursor::parse(query);
    let want_depth = cursor.depth() + 1;
    let partial_lower = cursor.partial_key().map(str::to_lowercase);

    let mut matches = Vec::new();
    for entry in index.entries() {
        if entry.depth() != want_depth {
            continue;
        }
        let hit = match &partial_lower {
            Some(partial) => {
                entry.text().starts_with(cursor.completed())
                    && match &entry.accessors()[cursor.depth()] {
                        Accessor::Key(key) => key.to_lowercase().contains(partial),
                        Accessor::Index(_) => false,
                    }
            }
            None => entry.text().starts_with(query),
        };
        if hit {
            matches.push(entry.text().to_string());
            if matches.len() == MAX_RESULTS {
                break;
            }
        }
    }
    matches
}
