//! Plain-text helpers shared by the store and the editor surface.
//!
//! Positions are char indices throughout; these helpers do the byte mapping.

use similar::{ChangeTag, TextDiff};

/// Number of chars (Unicode scalar values) in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of char index `char_idx`, or `None` past the end.
///
/// `char_idx == char_len(text)` maps to `text.len()`.
pub fn byte_offset(text: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(char_idx)
}

/// Replaces chars `[start, end)` of `text` with `insert`.
///
/// Returns `None` if the range falls outside `text` or is inverted.
pub fn splice(text: &str, start: usize, end: usize, insert: &str) -> Option<String> {
    if start > end {
        return None;
    }
    let from = byte_offset(text, start)?;
    let to = byte_offset(text, end)?;
    let mut out = String::with_capacity(text.len() - (to - from) + insert.len());
    out.push_str(&text[..from]);
    out.push_str(insert);
    out.push_str(&text[to..]);
    Some(out)
}

/// Whitespace-separated word count, as shown in the editor toolbar.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word-level delta between two versions of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub words_inserted: usize,
    pub words_deleted: usize,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.words_inserted == 0 && self.words_deleted == 0
    }
}

/// Counts words inserted and deleted going from `old` to `new`.
///
/// Whitespace-only tokens are ignored so re-wrapping a paragraph does not count
/// as a change.
pub fn change_summary(old: &str, new: &str) -> ChangeSummary {
    let diff = TextDiff::from_words(old, new);
    let mut summary = ChangeSummary::default();
    for change in diff.iter_all_changes() {
        if change.value().trim().is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Insert => summary.words_inserted += 1,
            ChangeTag::Delete => summary.words_deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    summary
}
