//! Path completion for partially typed queries.
//!
//! The engine looks at the raw query text the user has typed so far,
//! figures out how much of it is a completed path prefix (and whether a
//! key segment is still open mid-typing), and proposes member paths of the
//! [`PathIndex`](crate::document::PathIndex) exactly one level deeper.
//!
//! Completion is advisory: queries that address nothing simply produce an
//! empty suggestion list, never an error.

mod cursor;
mod engine;

pub use cursor::QueryCursor;
pub use engine::{MAX_RESULTS, suggest};
