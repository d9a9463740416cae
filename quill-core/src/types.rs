use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Title given to documents created without one.
pub const UNTITLED: &str = "Untitled Document";

/// Opaque identifier of a document, stable for the document's lifetime.
///
/// Backed by UUID v4 text so ids never collide across sessions, even though
/// sessions are not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// A single editable text artifact.
///
/// `content` is opaque to the store: it is replaced wholesale and never parsed.
/// `created_at` / `updated_at` are display metadata only (Unix seconds) and
/// play no part in ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    pub(crate) fn from_seed(seed: DocumentSeed) -> Self {
        let now = now_secs();
        Self {
            id: DocumentId::new(),
            title: seed.title,
            content: seed.content,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

/// Initial title and content for a document created from a seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSeed {
    pub title: String,
    pub content: String,
}

impl DocumentSeed {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { title: title.into(), content: content.into() }
    }
}

impl Default for DocumentSeed {
    fn default() -> Self {
        Self::new(UNTITLED, "")
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// How a chat message is presented.
///
/// `Confirmation` cards carry content the user may insert into the document;
/// `Quote` cards echo a passage quoted from the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Card,
    Confirmation,
    Quote,
}

/// Structured payload shown inside a card message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardData {
    pub title: String,
    pub content: String,
}

/// One entry in a document's chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String, // UUID v4 text
    pub role: Role,
    pub content: String,
    pub kind: MessageKind,
    pub card: Option<CardData>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Builds a user message that quotes a passage ahead of the request.
    ///
    /// The quote is rendered as a Markdown blockquote followed by a blank line,
    /// so `("World", "make it louder")` becomes `"> World\n\nmake it louder"`.
    pub fn user_with_quote(quote: &str, content: &str) -> Self {
        Self::user(format!("> {quote}\n\n{content}"))
    }

    /// An assistant card the user can confirm to insert `card.content`.
    pub fn confirmation(card: CardData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: String::new(),
            kind: MessageKind::Confirmation,
            card: Some(card),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            kind: MessageKind::Text,
            card: None,
        }
    }
}

/// A half-open range of char positions `[start, end)` within a document.
///
/// Positions count Unicode scalar values, not bytes, so ranges captured from the
/// editor cursor stay valid for multi-byte text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Builds a range from two positions in either order.
    pub fn new(a: usize, b: usize) -> Self {
        Self { start: a.min(b), end: a.max(b) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Returns the current Unix timestamp in seconds.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
