//! Streamed insertion of externally generated text into a document.
//!
//! A stream is declared with an [`InsertionMode`], fed chunk by chunk, and
//! finalized as a single logical edit. Insertion positions are captured when
//! the stream starts; later chunks continue right after the text inserted so
//! far rather than following a live cursor.

use crate::text::{byte_offset, char_len};
use crate::types::TextRange;

/// Where streamed chunks land in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    /// Every chunk is concatenated at the end of the current content.
    Append,
    /// Chunks are inserted starting at this char position.
    InsertAtCursor(usize),
    /// The first non-empty chunk replaces this char range; later chunks follow it.
    ReplaceSelection(TextRange),
}

impl InsertionMode {
    pub fn label(&self) -> &'static str {
        match self {
            InsertionMode::Append => "append",
            InsertionMode::InsertAtCursor(_) => "insert-at-cursor",
            InsertionMode::ReplaceSelection(_) => "replace-selection",
        }
    }
}

/// What to do with already-applied chunks when a stream is abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbortPolicy {
    /// Keep whatever arrived and record it as one undoable edit.
    #[default]
    KeepApplied,
    /// Restore the pre-stream content; no history entry is recorded.
    Rollback,
}

/// Totals reported when a stream is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks_applied: usize,
    pub chars_inserted: usize,
    /// Whether the document ended up different from its pre-stream content.
    pub changed: bool,
}

/// Per-document marker for a stream in flight.
#[derive(Debug, Clone)]
pub(crate) struct ActiveStream {
    mode: InsertionMode,
    pre_stream: String,
    /// Char position of the next insertion (unused for `Append`).
    next_pos: usize,
    /// Selection still waiting to be deleted by the first chunk.
    pending_delete: Option<TextRange>,
    chunks_applied: usize,
    chars_inserted: usize,
}

impl ActiveStream {
    pub(crate) fn new(mode: InsertionMode, pre_stream: String) -> Self {
        let (next_pos, pending_delete) = match mode {
            InsertionMode::Append => (0, None),
            InsertionMode::InsertAtCursor(pos) => (pos, None),
            InsertionMode::ReplaceSelection(range) => (range.start, Some(range)),
        };
        Self {
            mode,
            pre_stream,
            next_pos,
            pending_delete,
            chunks_applied: 0,
            chars_inserted: 0,
        }
    }

    pub(crate) fn mode(&self) -> InsertionMode {
        self.mode
    }

    pub(crate) fn into_pre_stream(self) -> String {
        self.pre_stream
    }

    /// Applies `chunk` to `content` and returns the new content.
    ///
    /// Empty chunks change nothing, including a pending selection delete.
    /// Positions are clamped to the current content length.
    pub(crate) fn apply(&mut self, content: &str, chunk: &str) -> String {
        if chunk.is_empty() {
            return content.to_owned();
        }
        let inserted = char_len(chunk);
        self.chunks_applied += 1;
        self.chars_inserted += inserted;

        if let InsertionMode::Append = self.mode {
            let mut out = String::with_capacity(content.len() + chunk.len());
            out.push_str(content);
            out.push_str(chunk);
            return out;
        }

        let len = char_len(content);
        let (start, end) = match self.pending_delete.take() {
            Some(range) => (range.start.min(len), range.end.min(len)),
            None => {
                let at = self.next_pos.min(len);
                (at, at)
            }
        };
        let from = clamped_byte_offset(content, start);
        let to = clamped_byte_offset(content, end);

        let mut out = String::with_capacity(content.len() + chunk.len());
        out.push_str(&content[..from]);
        out.push_str(chunk);
        out.push_str(&content[to..]);

        self.next_pos = start + inserted;
        out
    }

    pub(crate) fn summary(&self, final_content: &str) -> StreamSummary {
        StreamSummary {
            chunks_applied: self.chunks_applied,
            chars_inserted: self.chars_inserted,
            changed: final_content != self.pre_stream,
        }
    }
}

fn clamped_byte_offset(text: &str, char_idx: usize) -> usize {
    byte_offset(text, char_idx).unwrap_or(text.len())
}
