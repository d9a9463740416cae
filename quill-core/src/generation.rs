//! Boundary to the text generation backend.
//!
//! The writer's persona and tone travel with every request. Backends return the
//! whole response as an ordered list of chunks; pacing and delivery are the
//! caller's business. [`ScriptedGenerator`] is the placeholder backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// The student level the generator writes as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentLevel {
    Freshman,
    #[default]
    Junior,
    Grad,
}

impl StudentLevel {
    pub fn label(self) -> &'static str {
        match self {
            StudentLevel::Freshman => "Freshman",
            StudentLevel::Junior => "Junior",
            StudentLevel::Grad => "Grad",
        }
    }

    /// Next level in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            StudentLevel::Freshman => StudentLevel::Junior,
            StudentLevel::Junior => StudentLevel::Grad,
            StudentLevel::Grad => StudentLevel::Freshman,
        }
    }
}

impl fmt::Display for StudentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formality dial from 0 (casual) to 100 (academic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8")]
pub struct Tone(u8);

impl Tone {
    pub const CASUAL: Tone = Tone(0);
    pub const STANDARD: Tone = Tone(50);
    pub const ACADEMIC: Tone = Tone(100);

    /// Builds a tone, clamping to 100.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> ToneBand {
        match self.0 {
            v if v < 30 => ToneBand::Casual,
            v if v > 70 => ToneBand::Academic,
            _ => ToneBand::Standard,
        }
    }

    /// Steps through the presets: Casual, Standard, Academic.
    pub fn next_preset(self) -> Self {
        match self.band() {
            ToneBand::Casual => Tone::STANDARD,
            ToneBand::Standard => Tone::ACADEMIC,
            ToneBand::Academic => Tone::CASUAL,
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::STANDARD
    }
}

impl From<u8> for Tone {
    fn from(value: u8) -> Self {
        Tone::new(value)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.band().label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneBand {
    Casual,
    Standard,
    Academic,
}

impl ToneBand {
    pub fn label(self) -> &'static str {
        match self {
            ToneBand::Casual => "Casual",
            ToneBand::Standard => "Standard",
            ToneBand::Academic => "Academic",
        }
    }

    /// Phrase used when instructing a backend.
    pub fn description(self) -> &'static str {
        match self {
            ToneBand::Casual => "very casual and simple",
            ToneBand::Standard => "standard student tone",
            ToneBand::Academic => "academic and formal",
        }
    }
}

/// What the backend is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationKind {
    /// Write new text on a topic.
    Generate { topic: String, requirements: String },
    /// Rewrite a draft so it reads like the persona wrote it.
    Refine { draft: String, requirements: String },
    /// Revise existing content following a chat instruction.
    ChatEdit { current_content: String, instruction: String },
}

impl GenerationKind {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationKind::Generate { .. } => "generate",
            GenerationKind::Refine { .. } => "refine",
            GenerationKind::ChatEdit { .. } => "chat-edit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub level: StudentLevel,
    pub tone: Tone,
}

impl GenerationRequest {
    pub fn new(kind: GenerationKind, level: StudentLevel, tone: Tone) -> Self {
        Self { kind, level, tone }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRequest {
    pub topic: String,
    pub requirements: String,
    pub level: StudentLevel,
}

/// One section of an essay outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl OutlineItem {
    fn new(id: &str, title: &str, content: impl Into<String>) -> Self {
        Self { id: id.to_owned(), title: title.to_owned(), content: content.into() }
    }
}

/// Renders an outline as the plain text inserted into a document.
pub fn outline_text(items: &[OutlineItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}. {}\n{}", item.id, item.title, item.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("nothing to generate from: {0} is empty")]
    EmptyInput(&'static str),

    #[error("generation backend failed: {0}")]
    Backend(String),
}

/// A text generation backend.
pub trait Generator: Send {
    /// Produces the response to `request` as ordered chunks.
    fn stream(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError>;

    /// Produces an essay outline.
    fn outline(&self, request: &OutlineRequest) -> Result<Vec<OutlineItem>, GenerationError>;
}

/// Deterministic placeholder backend.
///
/// Responses are canned text mentioning the persona and tone, split on spaces
/// the way a token stream would arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedGenerator;

impl Generator for ScriptedGenerator {
    fn stream(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        let persona = request.level.label();
        let tone = request.tone.band().label();
        match &request.kind {
            GenerationKind::Generate { topic, .. } => {
                if topic.trim().is_empty() {
                    return Err(GenerationError::EmptyInput("topic"));
                }
                let text = format!(
                    "[Direct Generation for \"{topic}\"]\n\nThis content is being streamed \
                     directly to your document editor. It reflects the {persona} persona and \
                     {tone} tone you selected."
                );
                Ok(word_chunks(&text, "\n\n"))
            }
            GenerationKind::ChatEdit { instruction, .. } => {
                if instruction.trim().is_empty() {
                    return Err(GenerationError::EmptyInput("instruction"));
                }
                let text = format!(
                    "This content is being streamed directly to your document editor based on \
                     your request. It reflects the {persona} persona and {tone} tone you \
                     selected. The arguments are structured to be persuasive yet balanced."
                );
                Ok(word_chunks(&text, "\n\n"))
            }
            GenerationKind::Refine { draft, .. } => {
                if draft.trim().is_empty() {
                    return Err(GenerationError::EmptyInput("draft"));
                }
                Ok(loosen(draft).split_inclusive(' ').map(str::to_owned).collect())
            }
        }
    }

    fn outline(&self, request: &OutlineRequest) -> Result<Vec<OutlineItem>, GenerationError> {
        if request.topic.trim().is_empty() {
            return Err(GenerationError::EmptyInput("topic"));
        }
        let raw = format!(
            "```json\n[{{\"id\":\"1\",\"title\":\"Introduction\",\"content\":\"Why {topic} matters to a {level} student\"}},\
             {{\"id\":\"2\",\"title\":\"Key Point\",\"content\":\"The strongest argument about {topic}\"}},\
             {{\"id\":\"3\",\"title\":\"Conclusion\",\"content\":\"What we learned\"}}]\n```",
            topic = request.topic.replace('"', "'"),
            level = request.level.label().to_lowercase(),
        );
        Ok(parse_outline(&raw, &request.topic))
    }
}

/// Splits `text` on spaces, re-attaching the separator to each chunk.
/// The first chunk carries `lead` instead.
fn word_chunks(text: &str, lead: &str) -> Vec<String> {
    text.split(' ')
        .enumerate()
        .map(|(i, word)| {
            let sep = if i == 0 { lead } else { " " };
            format!("{sep}{word}")
        })
        .collect()
}

/// Placeholder humanizing pass: contracts a few stiff phrasings.
fn loosen(draft: &str) -> String {
    const CONTRACTIONS: [(&str, &str); 6] = [
        ("It is ", "It's "),
        ("it is ", "it's "),
        ("do not ", "don't "),
        ("does not ", "doesn't "),
        ("cannot ", "can't "),
        ("In conclusion, ", "All in all, "),
    ];
    CONTRACTIONS
        .iter()
        .fold(draft.to_owned(), |text, (from, to)| text.replace(from, to))
}

/// Parses an outline returned by a backend.
///
/// Accepts a bare JSON array or one wrapped in a ```` ```json ```` or
/// ```` ``` ```` fence. Anything unparseable yields a three-part default outline
/// about `topic`.
pub fn parse_outline(raw: &str, topic: &str) -> Vec<OutlineItem> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed);

    match serde_json::from_str::<Vec<OutlineItem>>(body.trim()) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "outline payload unparseable, using default outline");
            vec![
                OutlineItem::new("1", "Introduction", format!("Introduction to {topic}")),
                OutlineItem::new("2", "Body Paragraph", "Main arguments"),
                OutlineItem::new("3", "Conclusion", "Summary"),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(topic: &str) -> GenerationRequest {
        GenerationRequest::new(
            GenerationKind::Generate { topic: topic.into(), requirements: String::new() },
            StudentLevel::Grad,
            Tone::ACADEMIC,
        )
    }

    #[test]
    fn tone_bands() {
        assert_eq!(Tone::new(29).band(), ToneBand::Casual);
        assert_eq!(Tone::new(30).band(), ToneBand::Standard);
        assert_eq!(Tone::new(70).band(), ToneBand::Standard);
        assert_eq!(Tone::new(71).band(), ToneBand::Academic);
        assert_eq!(Tone::new(250).value(), 100);
        assert_eq!(Tone::default(), Tone::STANDARD);
    }

    #[test]
    fn presets_cycle() {
        assert_eq!(Tone::CASUAL.next_preset(), Tone::STANDARD);
        assert_eq!(Tone::new(90).next_preset(), Tone::CASUAL);
        assert_eq!(StudentLevel::Grad.next(), StudentLevel::Freshman);
        assert_eq!(StudentLevel::default(), StudentLevel::Junior);
    }

    #[test]
    fn scripted_chunks_mention_persona_and_tone() {
        let chunks = ScriptedGenerator.stream(&generate("Rust")).unwrap();
        assert!(chunks[0].starts_with("\n\n[Direct"));
        assert!(chunks[1..].iter().all(|c| c.starts_with(' ')));
        let text: String = chunks.concat();
        assert!(text.contains("Grad persona"));
        assert!(text.contains("Academic tone"));
    }

    #[test]
    fn refine_chunks_reassemble_to_rewrite() {
        let req = GenerationRequest::new(
            GenerationKind::Refine {
                draft: "It is true that we do not know.".into(),
                requirements: String::new(),
            },
            StudentLevel::Junior,
            Tone::default(),
        );
        let text: String = ScriptedGenerator.stream(&req).unwrap().concat();
        assert_eq!(text, "It's true that we don't know.");
    }

    #[test]
    fn empty_topic_is_rejected() {
        assert!(matches!(
            ScriptedGenerator.stream(&generate("  ")),
            Err(GenerationError::EmptyInput("topic"))
        ));
    }

    #[test]
    fn parse_outline_strips_fences() {
        let raw = "```json\n[{\"id\":\"1\",\"title\":\"Intro\",\"content\":\"Hi\"}]\n```";
        let items = parse_outline(raw, "x");
        assert_eq!(items, vec![OutlineItem::new("1", "Intro", "Hi")]);

        let bare = "```[{\"id\":\"2\",\"title\":\"A\",\"content\":\"B\"}]```";
        assert_eq!(parse_outline(bare, "x")[0].id, "2");
    }

    #[test]
    fn parse_outline_falls_back_on_garbage() {
        let items = parse_outline("not json at all", "Climate");
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Introduction", "Body Paragraph", "Conclusion"]);
        assert_eq!(items[0].content, "Introduction to Climate");
    }

    #[test]
    fn scripted_outline_parses() {
        let req = OutlineRequest {
            topic: "AI".into(),
            requirements: String::new(),
            level: StudentLevel::Freshman,
        };
        let items = ScriptedGenerator.outline(&req).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].content.contains("freshman"));
        assert!(outline_text(&items).starts_with("1. Introduction\n"));
    }
}
