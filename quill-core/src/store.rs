//! The document session store.
//!
//! Single source of truth for the open documents, the active selection, each
//! document's chat transcript and undo/redo history, and any stream insertion
//! in flight. All operations run to completion synchronously; observers learn
//! about completed mutations through [`SessionStore::subscribe`].

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::history::EditHistory;
use crate::stream::{AbortPolicy, ActiveStream, InsertionMode, StreamSummary};
use crate::text::char_len;
use crate::types::{Document, DocumentId, DocumentSeed, Message};

/// Why a document's content changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    /// A recorded forward edit.
    Edit,
    /// A history-silent replace requested by the caller.
    Silent,
    Undo,
    Redo,
    /// A stream chunk was applied.
    Stream,
    /// An aborted stream restored its pre-stream content.
    Rollback,
}

/// Notification broadcast after a mutation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    DocumentCreated(DocumentId),
    DocumentSelected(DocumentId),
    DocumentDeleted { id: DocumentId, active: DocumentId },
    DocumentRenamed(DocumentId),
    ContentChanged { id: DocumentId, origin: ContentOrigin },
    ChatChanged(DocumentId),
    StreamStarted { id: DocumentId, mode: InsertionMode },
    StreamFinished { id: DocumentId, summary: StreamSummary },
    StreamAborted { id: DocumentId, summary: StreamSummary, policy: AbortPolicy },
}

/// Everything the session tracks for one document.
#[derive(Debug)]
struct DocumentEntry {
    doc: Document,
    chat: Vec<Message>,
    history: EditHistory,
    stream: Option<ActiveStream>,
}

impl DocumentEntry {
    fn new(doc: Document) -> Self {
        Self { doc, chat: Vec::new(), history: EditHistory::new(), stream: None }
    }

    /// Rejects content mutations while a stream owns the document.
    fn ensure_idle(&self) -> StoreResult<()> {
        if self.stream.is_some() {
            return Err(StoreError::StreamAlreadyActive(self.doc.id.clone()));
        }
        Ok(())
    }
}

/// In-memory session of documents.
///
/// Invariants:
/// - at least one document always exists;
/// - the active id always resolves to an existing document;
/// - documents are ordered most-recently-created first.
pub struct SessionStore {
    entries: Vec<DocumentEntry>,
    active: DocumentId,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl SessionStore {
    /// Creates a session holding one empty untitled document.
    pub fn new() -> Self {
        Self::from_seeds(std::iter::empty())
    }

    /// Creates a session from seed documents.
    ///
    /// Seeds are created in iteration order, so the last seed ends up first in
    /// the list and active. An empty iterator yields one untitled document.
    pub fn from_seeds(seeds: impl IntoIterator<Item = DocumentSeed>) -> Self {
        let mut entries: Vec<DocumentEntry> = Vec::new();
        for seed in seeds {
            entries.insert(0, DocumentEntry::new(Document::from_seed(seed)));
        }
        if entries.is_empty() {
            entries.push(DocumentEntry::new(Document::from_seed(DocumentSeed::default())));
        }
        let active = entries[0].doc.id.clone();
        Self { entries, active, subscribers: Vec::new() }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Registers an observer. Every completed mutation sends one event.
    ///
    /// Dropping the receiver unsubscribes; the sender is pruned on the next send.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.doc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_id(&self) -> &DocumentId {
        &self.active
    }

    pub fn active_document(&self) -> &Document {
        self.entries
            .iter()
            .find(|e| e.doc.id == self.active)
            .map(|e| &e.doc)
            .unwrap_or(&self.entries[0].doc)
    }

    /// Position of `id` in display order.
    pub fn position(&self, id: &DocumentId) -> Option<usize> {
        self.entries.iter().position(|e| &e.doc.id == id)
    }

    pub fn document(&self, id: &DocumentId) -> StoreResult<&Document> {
        self.entry(id).map(|e| &e.doc)
    }

    pub fn content(&self, id: &DocumentId) -> StoreResult<&str> {
        self.entry(id).map(|e| e.doc.content.as_str())
    }

    pub fn history(&self, id: &DocumentId) -> StoreResult<&EditHistory> {
        self.entry(id).map(|e| &e.history)
    }

    pub fn chat_transcript(&self, id: &DocumentId) -> StoreResult<&[Message]> {
        self.entry(id).map(|e| e.chat.as_slice())
    }

    /// The insertion mode of the stream in flight on `id`, if any.
    pub fn active_stream(&self, id: &DocumentId) -> Option<InsertionMode> {
        self.entry(id).ok()?.stream.as_ref().map(ActiveStream::mode)
    }

    pub fn is_streaming(&self, id: &DocumentId) -> bool {
        self.active_stream(id).is_some()
    }

    fn entry(&self, id: &DocumentId) -> StoreResult<&DocumentEntry> {
        self.entries
            .iter()
            .find(|e| &e.doc.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn entry_mut(&mut self, id: &DocumentId) -> StoreResult<&mut DocumentEntry> {
        self.entries
            .iter_mut()
            .find(|e| &e.doc.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    // -----------------------------------------------------------------------
    // Document set
    // -----------------------------------------------------------------------

    /// Creates an empty untitled document, prepends it and makes it active.
    pub fn create_document(&mut self) -> DocumentId {
        self.create_document_from(DocumentSeed::default())
    }

    /// Creates a document from `seed`. Seed content is not undoable.
    pub fn create_document_from(&mut self, seed: DocumentSeed) -> DocumentId {
        let doc = Document::from_seed(seed);
        let id = doc.id.clone();
        self.entries.insert(0, DocumentEntry::new(doc));
        self.active = id.clone();
        info!(document = %id, "document created");
        self.emit(StoreEvent::DocumentCreated(id.clone()));
        id
    }

    /// Makes `id` the active document. Touches no content or history.
    pub fn select_document(&mut self, id: &DocumentId) -> StoreResult<()> {
        self.entry(id)?;
        self.active = id.clone();
        self.emit(StoreEvent::DocumentSelected(id.clone()));
        Ok(())
    }

    /// Deletes `id` with its transcript, history and any stream in flight.
    ///
    /// If `id` was active, the first remaining document becomes active.
    /// Returns the active id after deletion.
    pub fn delete_document(&mut self, id: &DocumentId) -> StoreResult<DocumentId> {
        let idx = self.position(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if self.entries.len() == 1 {
            return Err(StoreError::LastDocument(id.clone()));
        }
        let removed = self.entries.remove(idx);
        if removed.stream.is_some() {
            warn!(document = %id, "deleting document with a stream in flight");
        }
        if self.active == *id {
            self.active = self.entries[0].doc.id.clone();
        }
        info!(document = %id, active = %self.active, "document deleted");
        let active = self.active.clone();
        self.emit(StoreEvent::DocumentDeleted { id: id.clone(), active: active.clone() });
        Ok(active)
    }

    pub fn rename_document(&mut self, id: &DocumentId, title: impl Into<String>) -> StoreResult<()> {
        let entry = self.entry_mut(id)?;
        entry.doc.title = title.into();
        entry.doc.touch();
        self.emit(StoreEvent::DocumentRenamed(id.clone()));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Content and history
    // -----------------------------------------------------------------------

    /// Replaces the content of `id`.
    ///
    /// With `record_history` and a changed value the previous content becomes
    /// an undo entry and redo is cleared. Without it the replace is
    /// history-silent. Returns whether the content changed.
    pub fn update_content(
        &mut self,
        id: &DocumentId,
        new_content: impl Into<String>,
        record_history: bool,
    ) -> StoreResult<bool> {
        let new_content = new_content.into();
        let entry = self.entry_mut(id)?;
        entry.ensure_idle()?;
        if entry.doc.content == new_content {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut entry.doc.content, new_content);
        if record_history {
            entry.history.record(previous);
        }
        entry.doc.touch();
        let origin = if record_history { ContentOrigin::Edit } else { ContentOrigin::Silent };
        self.emit(StoreEvent::ContentChanged { id: id.clone(), origin });
        Ok(true)
    }

    /// Appends `text` as its own block, separated from existing content by a
    /// blank line. Recorded as one edit.
    pub fn insert_block(&mut self, id: &DocumentId, text: &str) -> StoreResult<bool> {
        let current = self.content(id)?;
        let next = if current.is_empty() {
            text.to_owned()
        } else {
            format!("{current}\n\n{text}")
        };
        self.update_content(id, next, true)
    }

    /// Restores the latest undo snapshot. Returns `false` when there is none.
    pub fn undo(&mut self, id: &DocumentId) -> StoreResult<bool> {
        let entry = self.entry_mut(id)?;
        entry.ensure_idle()?;
        let Some(snapshot) = entry.history.undo(entry.doc.content.clone()) else {
            return Ok(false);
        };
        entry.doc.content = snapshot;
        entry.doc.touch();
        debug!(document = %id, undo = entry.history.undo_depth(), "undo");
        self.emit(StoreEvent::ContentChanged { id: id.clone(), origin: ContentOrigin::Undo });
        Ok(true)
    }

    /// Re-applies the snapshot most recently displaced by undo. Returns `false`
    /// when redo is empty or was invalidated by a forward edit.
    pub fn redo(&mut self, id: &DocumentId) -> StoreResult<bool> {
        let entry = self.entry_mut(id)?;
        entry.ensure_idle()?;
        let Some(snapshot) = entry.history.redo(entry.doc.content.clone()) else {
            return Ok(false);
        };
        entry.doc.content = snapshot;
        entry.doc.touch();
        debug!(document = %id, redo = entry.history.redo_depth(), "redo");
        self.emit(StoreEvent::ContentChanged { id: id.clone(), origin: ContentOrigin::Redo });
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Chat transcripts
    // -----------------------------------------------------------------------

    pub fn append_chat_message(&mut self, id: &DocumentId, message: Message) -> StoreResult<()> {
        self.entry_mut(id)?.chat.push(message);
        self.emit(StoreEvent::ChatChanged(id.clone()));
        Ok(())
    }

    pub fn replace_chat_transcript(
        &mut self,
        id: &DocumentId,
        messages: Vec<Message>,
    ) -> StoreResult<()> {
        self.entry_mut(id)?.chat = messages;
        self.emit(StoreEvent::ChatChanged(id.clone()));
        Ok(())
    }

    /// Removes one message by id. Returns whether anything was removed.
    pub fn remove_chat_message(&mut self, id: &DocumentId, message_id: &str) -> StoreResult<bool> {
        let chat = &mut self.entry_mut(id)?.chat;
        let before = chat.len();
        chat.retain(|m| m.id != message_id);
        let removed = chat.len() != before;
        if removed {
            self.emit(StoreEvent::ChatChanged(id.clone()));
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Stream insertion
    // -----------------------------------------------------------------------

    /// Declares an incoming stream of chunks for `id`.
    ///
    /// Positions in `mode` are validated against the current content and then
    /// fixed for the lifetime of the stream. Only one stream may be active per
    /// document; a second one is rejected.
    pub fn begin_stream_insertion(&mut self, id: &DocumentId, mode: InsertionMode) -> StoreResult<()> {
        let entry = self.entry_mut(id)?;
        entry.ensure_idle()?;

        let len = char_len(&entry.doc.content);
        let out_of_range = match mode {
            InsertionMode::Append => None,
            InsertionMode::InsertAtCursor(pos) => (pos > len).then_some((pos, pos)),
            InsertionMode::ReplaceSelection(r) => {
                (r.start > r.end || r.end > len).then_some((r.start, r.end))
            }
        };
        if let Some((start, end)) = out_of_range {
            return Err(StoreError::InvalidRange { id: id.clone(), start, end, len });
        }

        entry.stream = Some(ActiveStream::new(mode, entry.doc.content.clone()));
        debug!(document = %id, mode = mode.label(), "stream started");
        self.emit(StoreEvent::StreamStarted { id: id.clone(), mode });
        Ok(())
    }

    /// Applies one chunk under the active stream's mode. History-silent.
    pub fn apply_stream_chunk(&mut self, id: &DocumentId, chunk: &str) -> StoreResult<()> {
        let entry = self.entry_mut(id)?;
        let Some(stream) = entry.stream.as_mut() else {
            return Err(StoreError::NoActiveStream(id.clone()));
        };
        let next = stream.apply(&entry.doc.content, chunk);
        if next == entry.doc.content {
            return Ok(());
        }
        entry.doc.content = next;
        entry.doc.touch();
        self.emit(StoreEvent::ContentChanged { id: id.clone(), origin: ContentOrigin::Stream });
        Ok(())
    }

    /// Finalizes the stream as exactly one undoable edit.
    ///
    /// The pre-stream content is recorded only if the stream changed anything,
    /// so an empty stream leaves history untouched.
    pub fn end_stream_insertion(&mut self, id: &DocumentId) -> StoreResult<StreamSummary> {
        let summary = self.finish_stream(id)?;
        debug!(
            document = %id,
            chunks = summary.chunks_applied,
            chars = summary.chars_inserted,
            "stream finished"
        );
        self.emit(StoreEvent::StreamFinished { id: id.clone(), summary });
        Ok(summary)
    }

    /// Abandons the stream without waiting for further chunks.
    ///
    /// `KeepApplied` keeps what arrived as one undoable edit; `Rollback`
    /// restores the pre-stream content without recording history.
    pub fn abort_stream_insertion(
        &mut self,
        id: &DocumentId,
        policy: AbortPolicy,
    ) -> StoreResult<StreamSummary> {
        let summary = match policy {
            AbortPolicy::KeepApplied => self.finish_stream(id)?,
            AbortPolicy::Rollback => {
                let entry = self.entry_mut(id)?;
                let Some(stream) = entry.stream.take() else {
                    return Err(StoreError::NoActiveStream(id.clone()));
                };
                let applied = stream.summary(&entry.doc.content);
                if applied.changed {
                    entry.doc.content = stream.into_pre_stream();
                    entry.doc.touch();
                    self.emit(StoreEvent::ContentChanged {
                        id: id.clone(),
                        origin: ContentOrigin::Rollback,
                    });
                }
                StreamSummary { changed: false, ..applied }
            }
        };
        info!(document = %id, ?policy, chunks = summary.chunks_applied, "stream aborted");
        self.emit(StoreEvent::StreamAborted { id: id.clone(), summary, policy });
        Ok(summary)
    }

    /// Clears the stream marker and records the pre-stream snapshot if needed.
    fn finish_stream(&mut self, id: &DocumentId) -> StoreResult<StreamSummary> {
        let entry = self.entry_mut(id)?;
        let Some(stream) = entry.stream.take() else {
            return Err(StoreError::NoActiveStream(id.clone()));
        };
        let summary = stream.summary(&entry.doc.content);
        if summary.changed {
            entry.history.record(stream.into_pre_stream());
        }
        Ok(summary)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
