//! Interactive session state machine.
//!
//! A [`Session`] owns the document, its path index, and the mutable
//! [`QueryState`], and advances through three states: `Editing` (the only
//! state that reacts to input), and the terminal `Accepted` and
//! `Cancelled`. Every edit synchronously refreshes suggestions and
//! re-evaluates the query; there is no background work, so the state can
//! never be observed mid-update.
//!
//! What a session ultimately emits on accept is the last *successfully
//! evaluated* query text, not whatever happened to be in the input buffer.

use tracing::debug;

use crate::completion;
use crate::document::{DocumentValue, PathIndex};
use crate::error::{DocumentLoadError, QueryError};
use crate::eval::{self, Value};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Query text may change; suggestions and results update live.
    Editing,
    /// Terminal: the accepted query text is available.
    Accepted,
    /// Terminal: the user bailed out, nothing is exposed.
    Cancelled,
}

/// The session's mutable state, owned exclusively by [`Session`].
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Current raw query text.
    pub query_text: String,
    /// Current candidate suggestions.
    pub suggestions: Vec<String>,
    /// Outcome of evaluating `query_text`, if it was evaluated.
    pub outcome: Option<Result<Value, QueryError>>,
    /// The latest query text that evaluated successfully.
    pub accepted_query: Option<String>,
}

/// Orchestrates the edit → evaluate → display loop for one document.
#[derive(Debug)]
pub struct Session {
    document: DocumentValue,
    index: PathIndex,
    state: QueryState,
    status: SessionStatus,
}

impl Session {
    /// Start a session over a decoded document.
    ///
    /// The top level must be a mapping; this is the last line of defense
    /// for decoders that let something else through.
    pub fn new(document: DocumentValue) -> Result<Self, DocumentLoadError> {
        if !document.is_mapping() {
            return Err(DocumentLoadError::NotAMapping {
                format: "decoded",
                found: document.kind(),
            });
        }
        let index = PathIndex::build(&document);
        debug!(paths = index.len(), "session started");
        Ok(Self {
            document,
            index,
            state: QueryState::default(),
            status: SessionStatus::Editing,
        })
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Read-only view of the query state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// The document this session explores.
    pub fn document(&self) -> &DocumentValue {
        &self.document
    }

    /// The path index built at session start.
    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Apply an edit event: replace the query text, refresh suggestions,
    /// and re-evaluate. Ignored outside `Editing`.
    pub fn edit(&mut self, new_text: &str) {
        if self.status != SessionStatus::Editing {
            return;
        }
        self.state.query_text = new_text.to_string();

        if new_text.trim().is_empty() {
            // nothing to evaluate, clear the derived state
            self.state.suggestions.clear();
            self.state.outcome = None;
            return;
        }

        self.state.suggestions = completion::suggest(&self.index, new_text);

        let outcome = eval::evaluate(new_text, &self.document);
        if outcome.is_ok() {
            self.state.accepted_query = Some(new_text.to_string());
        } else {
            debug!(query = new_text, error = ?outcome, "evaluation failed");
        }
        self.state.outcome = Some(outcome);
    }

    /// Apply the accept event.
    ///
    /// Transitions to `Accepted` only when some query text has evaluated
    /// successfully during this session; otherwise the event is a no-op
    /// and the session stays in `Editing`.
    pub fn accept(&mut self) -> bool {
        if self.status != SessionStatus::Editing {
            return false;
        }
        if self.state.accepted_query.is_none() {
            return false;
        }
        self.status = SessionStatus::Accepted;
        true
    }

    /// Apply the cancel event. Always available from `Editing`.
    pub fn cancel(&mut self) {
        if self.status == SessionStatus::Editing {
            self.status = SessionStatus::Cancelled;
        }
    }

    /// The emitted query text; present once the session is `Accepted`.
    pub fn accepted_query(&self) -> Option<&str> {
        match self.status {
            SessionStatus::Accepted => self.state.accepted_query.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Number;

    fn sample_document() -> DocumentValue {
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
                DocumentValue::Mapping(vec![(
                    "count".into(),
                    DocumentValue::Number(Number::Int(2)),
                )]),
            ),
        ])
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        let err = Session::new(DocumentValue::Sequence(vec![])).unwrap_err();
        assert!(matches!(err, DocumentLoadError::NotAMapping { .. }));
    }

    #[test]
    fn test_edit_updates_suggestions_and_result() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_['items']");
        let state = session.state();
        assert_eq!(state.query_text, "_['items']");
        assert_eq!(
            state.suggestions,
            vec!["_['items'][0]".to_string(), "_['items'][1]".to_string()]
        );
        assert!(matches!(state.outcome, Some(Ok(Value::List(_)))));
        assert_eq!(state.accepted_query.as_deref(), Some("_['items']"));
    }

    #[test]
    fn test_blank_edit_clears_without_evaluating() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_");
        session.edit("   ");
        let state = session.state();
        assert!(state.suggestions.is_empty());
        assert!(state.outcome.is_none());
        // the last good query is kept for accept
        assert_eq!(state.accepted_query.as_deref(), Some("_"));
    }

    #[test]
    fn test_failed_edit_keeps_last_successful_query() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_['items']");
        session.edit("_['items'][5]");
        let state = session.state();
        assert!(matches!(
            state.outcome,
            Some(Err(QueryError::IndexOutOfRange { .. }))
        ));
        assert_eq!(state.accepted_query.as_deref(), Some("_['items']"));
    }

    #[test]
    fn test_accept_emits_last_successful_query() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_['items']");
        session.edit("_['items'][5]"); // fails, in-progress text
        assert!(session.accept());
        assert_eq!(session.status(), SessionStatus::Accepted);
        assert_eq!(session.accepted_query(), Some("_['items']"));
    }

    #[test]
    fn test_accept_without_success_is_noop() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_['nope']");
        assert!(!session.accept());
        assert_eq!(session.status(), SessionStatus::Editing);
        assert_eq!(session.accepted_query(), None);
    }

    #[test]
    fn test_cancel_discards_everything() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_");
        session.cancel();
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert_eq!(session.accepted_query(), None);
        // terminal states ignore further events
        session.edit("_['items']");
        assert_eq!(session.state().query_text, "_");
        assert!(!session.accept());
        assert_eq!(session.status(), SessionStatus::Cancelled);
    }

    #[test]
    fn test_no_transition_leaves_accepted() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_");
        assert!(session.accept());
        session.cancel();
        assert_eq!(session.status(), SessionStatus::Accepted);
        session.edit("x");
        assert_eq!(session.state().query_text, "_");
    }

    #[test]
    fn test_error_display_is_recoverable() {
        let mut session = Session::new(sample_document()).unwrap();
        session.edit("_[");
        assert!(matches!(
            session.state().outcome,
            Some(Err(QueryError::Syntax { .. }))
        ));
        // correcting the text recovers
        session.edit("_['metadata']['count']");
        assert!(matches!(session.state().outcome, Some(Ok(Value::Int(2)))));
    }
}
