//! Error taxonomy for the document session store.
//!
//! Every variant is recoverable at the calling surface. Undo or redo with an
//! empty stack is a silent no-op and never produces an error.

use thiserror::Error;

use crate::types::DocumentId;

/// Errors returned by [`SessionStore`](crate::store::SessionStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The id does not resolve to a document in the session.
    #[error("document '{0}' not found")]
    NotFound(DocumentId),

    /// Deleting the document would leave the session empty.
    #[error("cannot delete '{0}': it is the last remaining document")]
    LastDocument(DocumentId),

    /// The document already has a stream in flight.
    #[error("document '{0}' already has an active stream")]
    StreamAlreadyActive(DocumentId),

    /// A chunk or finalization arrived for a document with no active stream.
    #[error("document '{0}' has no active stream")]
    NoActiveStream(DocumentId),

    /// A cursor position or selection does not fit the document's content.
    #[error("range {start}..{end} is outside document '{id}' ({len} chars)")]
    InvalidRange {
        id: DocumentId,
        start: usize,
        end: usize,
        len: usize,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
