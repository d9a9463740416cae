//! Cursor and selection over a document's plain-text content.
//!
//! The store owns the text; this module only tracks where the caret is and
//! computes the next content for an edit. Every position is a char index so it
//! can be handed straight to the store's stream insertion modes.

use quill_core::text::{byte_offset, char_len, splice};
use quill_core::TextRange;

/// Row/column of a char index, both counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Caret plus optional selection anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorCursor {
    cursor: usize,
    anchor: Option<usize>,
}

impl EditorCursor {
    pub fn at(cursor: usize) -> Self {
        Self { cursor, anchor: None }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The selected range, if the selection is non-empty.
    pub fn selection(&self) -> Option<TextRange> {
        let anchor = self.anchor?;
        let range = TextRange::new(anchor, self.cursor);
        (!range.is_empty()).then_some(range)
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Selects the whole of `content`, caret at the end.
    pub fn select_all(&mut self, content: &str) {
        self.anchor = Some(0);
        self.cursor = char_len(content);
    }

    /// Pulls the caret and anchor back inside `content` after an external change.
    pub fn clamp(&mut self, content: &str) {
        let len = char_len(content);
        self.cursor = self.cursor.min(len);
        self.anchor = self.anchor.map(|a| a.min(len));
    }

    pub fn selected_text(&self, content: &str) -> Option<String> {
        let range = self.selection()?;
        let from = byte_offset(content, range.start)?;
        let to = byte_offset(content, range.end)?;
        Some(content[from..to].to_owned())
    }

    pub fn position(&self, content: &str) -> Position {
        position_of(content, self.cursor)
    }

    // ---------------------------------------------------------------------
    // Movement
    // ---------------------------------------------------------------------

    fn move_to(&mut self, target: usize, extend: bool) {
        if extend {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
        self.cursor = target;
    }

    pub fn move_left(&mut self, extend: bool) {
        self.move_to(self.cursor.saturating_sub(1), extend);
    }

    pub fn move_right(&mut self, content: &str, extend: bool) {
        let target = (self.cursor + 1).min(char_len(content));
        self.move_to(target, extend);
    }

    pub fn move_up(&mut self, content: &str, extend: bool) {
        let pos = position_of(content, self.cursor);
        let target = if pos.row == 0 {
            0
        } else {
            index_of(content, Position::new(pos.row - 1, pos.col))
        };
        self.move_to(target, extend);
    }

    pub fn move_down(&mut self, content: &str, extend: bool) {
        let pos = position_of(content, self.cursor);
        let target = if pos.row + 1 >= line_count(content) {
            char_len(content)
        } else {
            index_of(content, Position::new(pos.row + 1, pos.col))
        };
        self.move_to(target, extend);
    }

    pub fn move_line_start(&mut self, content: &str, extend: bool) {
        let pos = position_of(content, self.cursor);
        self.move_to(index_of(content, Position::new(pos.row, 0)), extend);
    }

    pub fn move_line_end(&mut self, content: &str, extend: bool) {
        let pos = position_of(content, self.cursor);
        self.move_to(index_of(content, Position::new(pos.row, usize::MAX)), extend);
    }

    // ---------------------------------------------------------------------
    // Edits: each returns the next content, or None when nothing changes
    // ---------------------------------------------------------------------

    /// Inserts `text` at the caret, replacing the selection if there is one.
    pub fn insert(&mut self, content: &str, text: &str) -> Option<String> {
        let range = self.selection().unwrap_or(TextRange::new(self.cursor, self.cursor));
        let next = splice(content, range.start, range.end, text)?;
        self.cursor = range.start + char_len(text);
        self.anchor = None;
        Some(next)
    }

    /// Deletes the selection or the char before the caret.
    pub fn backspace(&mut self, content: &str) -> Option<String> {
        if let Some(range) = self.selection() {
            return self.remove(content, range);
        }
        if self.cursor == 0 {
            return None;
        }
        self.remove(content, TextRange::new(self.cursor - 1, self.cursor))
    }

    /// Deletes the selection or the char under the caret.
    pub fn delete(&mut self, content: &str) -> Option<String> {
        if let Some(range) = self.selection() {
            return self.remove(content, range);
        }
        if self.cursor >= char_len(content) {
            return None;
        }
        self.remove(content, TextRange::new(self.cursor, self.cursor + 1))
    }

    fn remove(&mut self, content: &str, range: TextRange) -> Option<String> {
        let next = splice(content, range.start, range.end, "")?;
        self.cursor = range.start;
        self.anchor = None;
        Some(next)
    }
}

fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

/// Row/column of char index `idx`, clamped to the end of `content`.
pub fn position_of(content: &str, idx: usize) -> Position {
    let mut pos = Position::new(0, 0);
    for ch in content.chars().take(idx) {
        if ch == '\n' {
            pos.row += 1;
            pos.col = 0;
        } else {
            pos.col += 1;
        }
    }
    pos
}

/// Char index of `pos`, with the column clamped to the line's length and the
/// row clamped to the last line.
pub fn index_of(content: &str, pos: Position) -> usize {
    let mut idx = 0;
    let lines: Vec<&str> = content.split('\n').collect();
    let row = pos.row.min(lines.len().saturating_sub(1));
    for line in &lines[..row] {
        idx += char_len(line) + 1;
    }
    idx + pos.col.min(char_len(lines[row]))
}
