//! Core model for the quill writing agent.
//!
//! [`SessionStore`] owns the open documents, their chat transcripts and their
//! bounded undo/redo histories, and applies streamed text from a generation
//! backend as single undoable edits. Terminal code lives in the `quill` crate.

pub mod detector;
pub mod error;
pub mod generation;
pub mod history;
pub mod store;
pub mod stream;
pub mod text;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::{ContentOrigin, SessionStore, StoreEvent};
pub use stream::{AbortPolicy, InsertionMode, StreamSummary};
pub use types::{CardData, Document, DocumentId, DocumentSeed, Message, MessageKind, Role, TextRange};
