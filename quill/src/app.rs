//! Central application state for quill.
//!
//! Owns the [`SessionStore`] plus everything the terminal shell layers on top of
//! it: mode, focus, the editor caret, the copilot input, writer settings and the
//! bookkeeping for generation jobs in flight. No rendering lives here; `ui/`
//! reads this state and `ui/keybindings.rs` mutates it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, info, warn};

use quill_core::detector::{AiDetector, AiRate};
use quill_core::generation::{
    outline_text, GenerationKind, GenerationRequest, OutlineRequest, StudentLevel, Tone,
};
use quill_core::text::{change_summary, char_len};
use quill_core::{
    AbortPolicy, CardData, DocumentId, InsertionMode, Message, MessageKind, SessionStore,
    StoreError, StoreEvent, TextRange,
};

use crate::editor::EditorCursor;
use crate::generation::types::{CancelFlag, GenerationEvent, GenerationJob, JobId, JobKind};

pub const GENERATING_INDICATOR: &str = "Generating content directly to the editor...";
pub const CONTENT_ADDED: &str = "✅ Content has been added to your document.";
pub const CARD_INSERTED: &str = "✅ Content added to document.";
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the editor or the copilot input, depending on focus.
    Insert,
    /// A modal prompt (AI Creation or Outline) is collecting a topic.
    Prompt,
    ConfirmDelete,
    ConfirmQuit,
    HelpOverlay,
}

/// Which panel currently has keyboard focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Documents,
    #[default]
    Editor,
    Copilot,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Documents => PanelFocus::Copilot,
            PanelFocus::Editor => PanelFocus::Documents,
            PanelFocus::Copilot => PanelFocus::Editor,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Documents => PanelFocus::Editor,
            PanelFocus::Editor => PanelFocus::Copilot,
            PanelFocus::Copilot => PanelFocus::Documents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Generate text at the editor caret.
    Create,
    /// Draft an outline and post it as a confirmation card.
    Outline,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::Create => " AI Creation ",
            PromptKind::Outline => " Outline ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptState {
    pub kind: PromptKind,
    pub input: String,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    at: Instant,
}

/// A job sent to the worker and not yet settled.
#[derive(Debug)]
struct PendingJob {
    doc: DocumentId,
    cancel: CancelFlag,
    /// Transient "Generating..." message to retract when the job settles.
    indicator: Option<String>,
    /// Content when the job started, for the change summary.
    before: String,
    outline_topic: Option<String>,
}

pub struct AppState {
    pub store: SessionStore,
    store_events: Receiver<StoreEvent>,

    pub mode: Mode,
    pub focus: PanelFocus,
    pub doc_list_state: ListState,

    pub editor: EditorCursor,
    /// First visible editor row; kept in view of the caret by the renderer.
    pub editor_scroll: u16,
    /// Lines scrolled up from the bottom of the copilot transcript.
    pub chat_scroll: u16,
    pub chat_input: String,
    /// Passage quoted from the editor, prefixed to the next chat message.
    pub pending_quote: Option<String>,
    pub prompt: Option<PromptState>,
    pub help_scroll: u16,

    pub persona: StudentLevel,
    pub tone: Tone,
    pub ai_rate: Option<AiRate>,
    detector: Box<dyn AiDetector>,

    pub status: Option<StatusMessage>,

    /// Outer rects of the three panels from the last frame, for mouse hit tests.
    pub panel_rects: [Rect; 3],

    generation_tx: Option<Sender<GenerationJob>>,
    jobs: HashMap<JobId, PendingJob>,
    /// The job feeding each document's open stream. Outline jobs never appear here.
    streams: HashMap<DocumentId, JobId>,
    next_job: JobId,
}

impl AppState {
    pub fn new(
        mut store: SessionStore,
        persona: StudentLevel,
        tone: Tone,
        detector: Box<dyn AiDetector>,
        generation_tx: Option<Sender<GenerationJob>>,
    ) -> Self {
        let store_events = store.subscribe();
        let mut state = Self {
            store,
            store_events,
            mode: Mode::default(),
            focus: PanelFocus::default(),
            doc_list_state: ListState::default(),
            editor: EditorCursor::default(),
            editor_scroll: 0,
            chat_scroll: 0,
            chat_input: String::new(),
            pending_quote: None,
            prompt: None,
            help_scroll: 0,
            persona,
            tone,
            ai_rate: None,
            detector,
            status: None,
            panel_rects: [Rect::default(); 3],
            generation_tx,
            jobs: HashMap::new(),
            streams: HashMap::new(),
            next_job: 1,
        };
        let ids: Vec<DocumentId> = state.store.documents().map(|d| d.id.clone()).collect();
        for id in &ids {
            state.greet(id);
        }
        // Greetings are setup, not user activity.
        state.store_events.try_iter().for_each(drop);
        state.on_active_changed();
        state
    }

    pub fn active_id(&self) -> DocumentId {
        self.store.active_id().clone()
    }

    pub fn active_content(&self) -> &str {
        &self.store.active_document().content
    }

    pub fn is_generating(&self) -> bool {
        !self.jobs.is_empty()
    }

    // -----------------------------------------------------------------------
    // Status bar messages
    // -----------------------------------------------------------------------

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), is_error: false, at: Instant::now() });
    }

    pub fn report(&mut self, err: impl std::fmt::Display) {
        warn!(error = %err, "operation rejected");
        self.status = Some(StatusMessage {
            text: err.to_string(),
            is_error: true,
            at: Instant::now(),
        });
    }

    /// Drops the status message once it has been visible long enough.
    pub fn on_tick(&mut self) {
        if self.status.as_ref().is_some_and(|s| s.at.elapsed() >= STATUS_TTL) {
            self.status = None;
        }
    }

    // -----------------------------------------------------------------------
    // Store observation
    // -----------------------------------------------------------------------

    /// Reacts to store mutations since the last call.
    ///
    /// Selection changes reset the caret; finished or aborted streams on the
    /// active document refresh the AI rate.
    pub fn sync_store_events(&mut self) {
        let events: Vec<StoreEvent> = self.store_events.try_iter().collect();
        let active = self.active_id();
        for event in events {
            match event {
                StoreEvent::DocumentCreated(_)
                | StoreEvent::DocumentSelected(_)
                | StoreEvent::DocumentDeleted { .. } => self.on_active_changed(),
                StoreEvent::ContentChanged { id, .. } if id == active => {
                    let content = &self.store.active_document().content;
                    self.editor.clamp(content);
                }
                StoreEvent::StreamFinished { id, .. } | StoreEvent::StreamAborted { id, .. }
                    if id == active =>
                {
                    self.refresh_ai_rate();
                }
                _ => {}
            }
        }
    }

    fn on_active_changed(&mut self) {
        let active = self.active_id();
        self.doc_list_state.select(self.store.position(&active));
        let content = self.active_content();
        self.editor = EditorCursor::at(char_len(content));
        self.editor_scroll = 0;
        self.chat_scroll = 0;
        self.pending_quote = None;
        self.refresh_ai_rate();
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub fn new_document(&mut self) {
        let id = self.store.create_document();
        self.greet(&id);
        self.focus = PanelFocus::Editor;
        self.set_status("New document");
    }

    /// Opens the document highlighted in the list.
    pub fn open_selected_document(&mut self) {
        let Some(idx) = self.doc_list_state.selected() else {
            return;
        };
        let Some(id) = self.store.documents().nth(idx).map(|d| d.id.clone()) else {
            return;
        };
        if let Err(e) = self.store.select_document(&id) {
            self.report(e);
            return;
        }
        self.focus = PanelFocus::Editor;
    }

    pub fn select_next_in_list(&mut self) {
        let last = self.store.len().saturating_sub(1);
        let next = self.doc_list_state.selected().map_or(0, |i| (i + 1).min(last));
        self.doc_list_state.select(Some(next));
    }

    pub fn select_prev_in_list(&mut self) {
        let prev = self.doc_list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.doc_list_state.select(Some(prev));
    }

    /// Asks for confirmation before deleting the active document.
    pub fn request_delete(&mut self) {
        if self.store.len() == 1 {
            self.report(StoreError::LastDocument(self.active_id()));
            return;
        }
        self.mode = Mode::ConfirmDelete;
    }

    /// Deletes the active document, cancelling any generation feeding it.
    pub fn delete_active_document(&mut self) {
        let id = self.active_id();
        for job in self.jobs.values().filter(|j| j.doc == id) {
            job.cancel.cancel();
        }
        self.streams.remove(&id);
        match self.store.delete_document(&id) {
            Ok(_) => self.set_status("Document deleted"),
            Err(e) => self.report(e),
        }
    }

    fn greet(&mut self, id: &DocumentId) {
        let text = format!(
            "I'm set to act as a **{}** student with a **{}** tone. What would you like to \
             write today? You can ask me to generate an outline, a paragraph, or a full essay.",
            self.persona, self.tone
        );
        if let Err(e) = self.store.append_chat_message(id, Message::assistant(text)) {
            debug!(error = %e, "greeting skipped");
        }
    }

    // -----------------------------------------------------------------------
    // Editor
    // -----------------------------------------------------------------------

    /// Applies one editor edit as a recorded history entry.
    fn edit_with(&mut self, f: impl FnOnce(&mut EditorCursor, &str) -> Option<String>) {
        let id = self.active_id();
        let mut cursor = self.editor;
        let Some(next) = f(&mut cursor, self.active_content()) else {
            return;
        };
        match self.store.update_content(&id, next, true) {
            Ok(_) => self.editor = cursor,
            Err(e) => self.report(e),
        }
    }

    pub fn editor_insert(&mut self, text: &str) {
        self.edit_with(|cursor, content| cursor.insert(content, text));
    }

    pub fn editor_backspace(&mut self) {
        self.edit_with(|cursor, content| cursor.backspace(content));
    }

    pub fn editor_delete(&mut self) {
        self.edit_with(|cursor, content| cursor.delete(content));
    }

    /// Moves the caret without touching content.
    pub fn move_cursor(&mut self, f: impl FnOnce(&mut EditorCursor, &str)) {
        let content = self.store.active_document().content.as_str();
        f(&mut self.editor, content);
    }

    pub fn undo(&mut self) {
        let id = self.active_id();
        match self.store.undo(&id) {
            Ok(true) => {}
            Ok(false) => self.set_status("Nothing to undo"),
            Err(e) => self.report(e),
        }
    }

    pub fn redo(&mut self) {
        let id = self.active_id();
        match self.store.redo(&id) {
            Ok(true) => {}
            Ok(false) => self.set_status("Nothing to redo"),
            Err(e) => self.report(e),
        }
    }

    /// Quotes the editor selection into the copilot input.
    pub fn quote_selection(&mut self) {
        let Some(quote) = self.editor.selected_text(self.active_content()) else {
            self.set_status("Select text to quote first (Shift+arrows)");
            return;
        };
        self.pending_quote = Some(quote);
        self.focus = PanelFocus::Copilot;
        self.mode = Mode::Insert;
    }

    // -----------------------------------------------------------------------
    // Writer settings
    // -----------------------------------------------------------------------

    pub fn cycle_persona(&mut self) {
        self.persona = self.persona.next();
        self.set_status(format!("Persona: {}", self.persona));
    }

    pub fn cycle_tone(&mut self) {
        self.tone = self.tone.next_preset();
        self.set_status(format!("Tone: {} ({})", self.tone, self.tone.value()));
    }

    pub fn refresh_ai_rate(&mut self) {
        self.ai_rate = self.detector.score(self.active_content());
    }

    // -----------------------------------------------------------------------
    // Copilot and generation
    // -----------------------------------------------------------------------

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(PromptState { kind, input: String::new() });
        self.mode = Mode::Prompt;
    }

    pub fn close_prompt(&mut self) {
        self.prompt = None;
        self.mode = Mode::Normal;
    }

    /// Submits the open prompt modal.
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        self.mode = Mode::Normal;
        let topic = prompt.input.trim().to_owned();
        if topic.is_empty() {
            return;
        }
        let id = self.active_id();
        match prompt.kind {
            PromptKind::Create => {
                let kind = GenerationKind::Generate { topic: topic.clone(), requirements: String::new() };
                let mode = InsertionMode::InsertAtCursor(self.editor.cursor());
                self.start_stream(&id, mode, kind, Message::user(topic));
            }
            PromptKind::Outline => self.request_outline(&id, topic),
        }
    }

    /// Sends the copilot input as a chat edit.
    ///
    /// With an editor selection the response replaces it; otherwise it is
    /// appended to the document.
    pub fn send_chat(&mut self) {
        let text = self.chat_input.trim().to_owned();
        if text.is_empty() {
            return;
        }
        let id = self.active_id();
        let message = match self.pending_quote.as_deref() {
            Some(quote) => Message::user_with_quote(quote, &text),
            None => Message::user(text.clone()),
        };
        let content = self.active_content().to_owned();
        let (mode, current_content) = match self.editor.selection() {
            Some(range) => {
                let selected = self.editor.selected_text(&content).unwrap_or_default();
                (InsertionMode::ReplaceSelection(range), selected)
            }
            None => (InsertionMode::Append, content),
        };
        let kind = GenerationKind::ChatEdit { current_content, instruction: text };
        if self.start_stream(&id, mode, kind, message) {
            self.chat_input.clear();
            self.pending_quote = None;
        }
    }

    /// Rewrites the whole document in the selected persona and tone.
    pub fn humanize(&mut self) {
        let id = self.active_id();
        let draft = self.active_content().to_owned();
        if draft.trim().is_empty() {
            self.set_status("Nothing to humanize");
            return;
        }
        let range = TextRange::new(0, char_len(&draft));
        let kind = GenerationKind::Refine { draft, requirements: String::new() };
        self.start_stream(
            &id,
            InsertionMode::ReplaceSelection(range),
            kind,
            Message::user("Humanize this document"),
        );
    }

    /// Starts a stream on `id` and hands the job to the worker.
    ///
    /// Returns whether the job was dispatched. On any failure the stream is
    /// rolled back so the document is left exactly as it was.
    fn start_stream(
        &mut self,
        id: &DocumentId,
        mode: InsertionMode,
        kind: GenerationKind,
        user_message: Message,
    ) -> bool {
        if let Err(e) = self.store.begin_stream_insertion(id, mode) {
            self.report(e);
            return false;
        }
        let before = self.store.content(id).map(str::to_owned).unwrap_or_default();
        let request = GenerationRequest::new(kind, self.persona, self.tone);
        let Some(job_id) = self.dispatch(JobKind::Stream(request), id) else {
            if let Err(e) = self.store.abort_stream_insertion(id, AbortPolicy::Rollback) {
                debug!(error = %e, "rollback after failed dispatch");
            }
            return false;
        };
        self.streams.insert(id.clone(), job_id);

        let indicator = Message::assistant(GENERATING_INDICATOR);
        let indicator_id = indicator.id.clone();
        let posted = self
            .store
            .append_chat_message(id, user_message)
            .and_then(|_| self.store.append_chat_message(id, indicator));
        if let Err(e) = posted {
            debug!(error = %e, "chat update skipped");
        }
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.indicator = Some(indicator_id);
            job.before = before;
        }
        self.editor.clear_selection();
        self.chat_scroll = 0;
        info!(job = job_id, document = %id, mode = mode.label(), "generation started");
        true
    }

    fn request_outline(&mut self, id: &DocumentId, topic: String) {
        let request = OutlineRequest {
            topic: topic.clone(),
            requirements: String::new(),
            level: self.persona,
        };
        if let Err(e) = self.store.append_chat_message(id, Message::user(format!("Outline: {topic}"))) {
            debug!(error = %e, "chat update skipped");
        }
        if let Some(job_id) = self.dispatch(JobKind::Outline(request), id) {
            if let Some(job) = self.jobs.get_mut(&job_id) {
                job.outline_topic = Some(topic);
            }
            self.set_status("Drafting outline...");
        }
    }

    fn dispatch(&mut self, kind: JobKind, doc: &DocumentId) -> Option<JobId> {
        let Some(tx) = &self.generation_tx else {
            self.report("generation worker is not running");
            return None;
        };
        let id = self.next_job;
        let cancel = CancelFlag::default();
        if tx.send(GenerationJob { id, kind, cancel: cancel.clone() }).is_err() {
            self.report("generation worker stopped");
            return None;
        }
        self.next_job += 1;
        self.jobs.insert(
            id,
            PendingJob {
                doc: doc.clone(),
                cancel,
                indicator: None,
                before: String::new(),
                outline_topic: None,
            },
        );
        Some(id)
    }

    /// Cancels the generation streaming into the active document, keeping
    /// whatever already arrived.
    pub fn cancel_stream(&mut self) {
        let active = self.active_id();
        let Some(job_id) = self.streams.get(&active).copied() else {
            self.set_status("No generation in progress");
            return;
        };
        if let Some(job) = self.take_stream_job(job_id) {
            job.cancel.cancel();
            self.settle_stream(job, AbortPolicy::KeepApplied, "Generation stopped.");
        }
    }

    /// Removes a stream job from the pending set.
    ///
    /// Returns it only while it still owns its document's stream; a job that was
    /// cancelled, or whose document was deleted, yields `None`.
    fn take_stream_job(&mut self, job: JobId) -> Option<PendingJob> {
        let pending = self.jobs.remove(&job)?;
        if self.streams.get(&pending.doc) != Some(&job) {
            debug!(job, "event for superseded stream ignored");
            return None;
        }
        self.streams.remove(&pending.doc);
        Some(pending)
    }

    /// Inserts the most recent unconfirmed card of the active document.
    pub fn confirm_latest_card(&mut self) {
        let id = self.active_id();
        let Ok(transcript) = self.store.chat_transcript(&id) else {
            return;
        };
        let mut messages = transcript.to_vec();
        let Some(msg) = messages
            .iter_mut()
            .rev()
            .find(|m| m.kind == MessageKind::Confirmation && m.card.is_some())
        else {
            self.set_status("No card to confirm");
            return;
        };
        let content = msg.card.as_ref().map(|c| c.content.clone()).unwrap_or_default();
        match self.store.insert_block(&id, &content) {
            Ok(_) => {
                msg.kind = MessageKind::Card;
                messages.push(Message::assistant(CARD_INSERTED));
                if let Err(e) = self.store.replace_chat_transcript(&id, messages) {
                    debug!(error = %e, "chat update skipped");
                }
            }
            Err(e) => self.report(e),
        }
    }

    /// Applies one event from the generation worker.
    ///
    /// Events for jobs that already settled, that no longer own their
    /// document's stream, or whose document was deleted are logged and dropped.
    pub fn apply_generation_event(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::Chunk { job, text } => {
                let Some(doc) = self.jobs.get(&job).map(|j| j.doc.clone()) else {
                    debug!(job, "late chunk for settled job ignored");
                    return;
                };
                if self.streams.get(&doc) != Some(&job) {
                    debug!(job, "chunk for superseded stream ignored");
                    return;
                }
                if let Err(e) = self.store.apply_stream_chunk(&doc, &text) {
                    debug!(job, error = %e, "chunk ignored");
                }
            }
            GenerationEvent::Finished { job } => {
                let Some(pending) = self.take_stream_job(job) else {
                    return;
                };
                match self.store.end_stream_insertion(&pending.doc) {
                    Ok(summary) => {
                        let delta = self
                            .store
                            .content(&pending.doc)
                            .map(|now| change_summary(&pending.before, now))
                            .unwrap_or_default();
                        info!(
                            job,
                            chunks = summary.chunks_applied,
                            words_inserted = delta.words_inserted,
                            words_deleted = delta.words_deleted,
                            "generation finished"
                        );
                        self.set_status(format!(
                            "+{} / -{} words",
                            delta.words_inserted, delta.words_deleted
                        ));
                        self.post_result(&pending, CONTENT_ADDED.to_owned());
                    }
                    Err(e) => debug!(job, error = %e, "finish ignored"),
                }
            }
            GenerationEvent::Cancelled { job } => {
                if let Some(pending) = self.take_stream_job(job) {
                    self.settle_stream(pending, AbortPolicy::KeepApplied, "Generation stopped.");
                }
            }
            GenerationEvent::Failed { job, error } => {
                let is_outline = self.jobs.get(&job).is_some_and(|j| j.outline_topic.is_some());
                if is_outline {
                    self.jobs.remove(&job);
                    self.report(format!("Generation failed: {error}"));
                    return;
                }
                let Some(pending) = self.take_stream_job(job) else {
                    return;
                };
                self.report(format!("Generation failed: {error}"));
                self.settle_stream(pending, AbortPolicy::KeepApplied, "⚠️ Generation failed.");
            }
            GenerationEvent::Outline { job, items } => {
                let Some(pending) = self.jobs.remove(&job) else {
                    return;
                };
                let topic = pending.outline_topic.clone().unwrap_or_default();
                let card = CardData { title: format!("Outline: {topic}"), content: outline_text(&items) };
                if let Err(e) = self.store.append_chat_message(&pending.doc, Message::confirmation(card)) {
                    debug!(job, error = %e, "outline dropped");
                    return;
                }
                self.set_status("Outline ready. Press c to insert it");
            }
        }
    }

    fn settle_stream(&mut self, pending: PendingJob, policy: AbortPolicy, note: &str) {
        match self.store.abort_stream_insertion(&pending.doc, policy) {
            Ok(_) => self.post_result(&pending, note.to_owned()),
            Err(e) => debug!(error = %e, "abort ignored"),
        }
    }

    /// Swaps the job's "Generating..." indicator for a closing message.
    fn post_result(&mut self, pending: &PendingJob, text: String) {
        if let Some(indicator) = &pending.indicator {
            if let Err(e) = self.store.remove_chat_message(&pending.doc, indicator) {
                debug!(error = %e, "indicator removal skipped");
            }
        }
        if let Err(e) = self.store.append_chat_message(&pending.doc, Message::assistant(text)) {
            debug!(error = %e, "chat update skipped");
        }
    }

    /// Cancels every job in flight. Called on shutdown.
    pub fn cancel_all(&mut self) {
        for job in self.jobs.values() {
            job.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::detector::PlaceholderDetector;
    use quill_core::DocumentSeed;

    fn state_with(content: &str) -> (AppState, crossbeam_channel::Receiver<GenerationJob>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let store = SessionStore::from_seeds([DocumentSeed::new("Essay", content)]);
        let state = AppState::new(
            store,
            StudentLevel::Junior,
            Tone::default(),
            Box::new(PlaceholderDetector),
            Some(tx),
        );
        (state, rx)
    }

    fn transcript(state: &AppState) -> Vec<String> {
        state
            .store
            .chat_transcript(state.store.active_id())
            .unwrap()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }

    #[test]
    fn typing_records_history_per_keystroke() {
        let (mut state, _rx) = state_with("");
        state.editor_insert("a");
        state.editor_insert("b");
        assert_eq!(state.active_content(), "ab");
        state.undo();
        assert_eq!(state.active_content(), "a");
        state.sync_store_events();
        assert_eq!(state.editor.cursor(), 1);
    }

    #[test]
    fn chat_send_appends_and_settles() {
        let (mut state, rx) = state_with("Intro.");
        state.chat_input = "expand".into();
        state.send_chat();
        assert!(state.chat_input.is_empty());
        let job = rx.try_recv().unwrap();
        assert!(state.store.is_streaming(state.store.active_id()));
        assert!(transcript(&state).iter().any(|m| m == GENERATING_INDICATOR));

        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: " More.".into() });
        state.apply_generation_event(GenerationEvent::Finished { job: job.id });

        assert_eq!(state.active_content(), "Intro. More.");
        let msgs = transcript(&state);
        assert!(!msgs.iter().any(|m| m == GENERATING_INDICATOR));
        assert_eq!(msgs.last().map(String::as_str), Some(CONTENT_ADDED));
        state.undo();
        assert_eq!(state.active_content(), "Intro.");
    }

    #[test]
    fn chat_send_with_selection_replaces_it() {
        let (mut state, rx) = state_with("Hello World");
        state.editor = EditorCursor::at(6);
        state.move_cursor(|c, text| c.move_line_end(text, true));
        state.chat_input = "louder".into();
        state.send_chat();
        let job = rx.try_recv().unwrap();
        match &job.kind {
            JobKind::Stream(req) => assert!(matches!(
                &req.kind,
                GenerationKind::ChatEdit { current_content, .. } if current_content == "World"
            )),
            other => panic!("unexpected job {other:?}"),
        }
        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: "WORLD".into() });
        state.apply_generation_event(GenerationEvent::Finished { job: job.id });
        assert_eq!(state.active_content(), "Hello WORLD");
    }

    #[test]
    fn quoted_message_is_prefixed() {
        let (mut state, _rx) = state_with("Hello World");
        state.editor = EditorCursor::at(0);
        state.move_cursor(|c, text| c.move_line_end(text, true));
        state.quote_selection();
        assert_eq!(state.mode, Mode::Insert);
        state.chat_input = "shorter".into();
        state.send_chat();
        assert!(transcript(&state).iter().any(|m| m == "> Hello World\n\nshorter"));
        assert!(state.pending_quote.is_none());
    }

    #[test]
    fn late_chunks_after_delete_are_ignored() {
        let (mut state, rx) = state_with("keep");
        state.new_document();
        let doomed = state.active_id();
        state.chat_input = "go".into();
        state.send_chat();
        let job = rx.try_recv().unwrap();

        state.delete_active_document();
        assert!(job.cancel.is_cancelled());
        assert_ne!(state.active_id(), doomed);

        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: "x".into() });
        state.apply_generation_event(GenerationEvent::Cancelled { job: job.id });
        assert_eq!(state.active_content(), "keep");
        assert!(!state.is_generating());
    }

    #[test]
    fn cancel_keeps_applied_text() {
        let (mut state, rx) = state_with("a");
        state.chat_input = "go".into();
        state.send_chat();
        let job = rx.try_recv().unwrap();
        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: "b".into() });
        state.cancel_stream();
        assert!(job.cancel.is_cancelled());
        assert_eq!(state.active_content(), "ab");
        assert!(!state.store.is_streaming(state.store.active_id()));
        // Worker's own cancellation notice arrives after the fact.
        state.apply_generation_event(GenerationEvent::Cancelled { job: job.id });
        assert_eq!(state.active_content(), "ab");
    }

    #[test]
    fn cancel_stops_stream_not_queued_outline() {
        let (mut state, rx) = state_with("a");
        state.chat_input = "go".into();
        state.send_chat();
        let stream = rx.try_recv().unwrap();
        state.open_prompt(PromptKind::Outline);
        if let Some(p) = state.prompt.as_mut() {
            p.input = "Cats".into();
        }
        state.submit_prompt();
        let outline = rx.try_recv().unwrap();

        state.cancel_stream();
        assert!(stream.cancel.is_cancelled());
        assert!(!outline.cancel.is_cancelled());
        assert!(!state.store.is_streaming(state.store.active_id()));

        // The outline still lands after the stream was stopped.
        let items = quill_core::generation::parse_outline("nope", "Cats");
        state.apply_generation_event(GenerationEvent::Outline { job: outline.id, items });
        let last = state.store.chat_transcript(state.store.active_id()).unwrap().last().cloned();
        assert!(last.is_some_and(|m| m.kind == MessageKind::Confirmation));
        assert!(!state.is_generating());
    }

    #[test]
    fn stale_chunks_do_not_reach_next_stream() {
        let (mut state, rx) = state_with("a");
        state.chat_input = "go".into();
        state.send_chat();
        let old = rx.try_recv().unwrap();
        state.open_prompt(PromptKind::Outline);
        if let Some(p) = state.prompt.as_mut() {
            p.input = "Cats".into();
        }
        state.submit_prompt();
        let _outline = rx.try_recv().unwrap();
        state.cancel_stream();

        state.chat_input = "again".into();
        state.send_chat();
        let new = rx.try_recv().unwrap();
        assert_ne!(old.id, new.id);

        state.apply_generation_event(GenerationEvent::Chunk { job: old.id, text: "STALE".into() });
        state.apply_generation_event(GenerationEvent::Finished { job: old.id });
        assert_eq!(state.active_content(), "a");
        assert!(state.store.is_streaming(state.store.active_id()));

        state.apply_generation_event(GenerationEvent::Chunk { job: new.id, text: "b".into() });
        state.apply_generation_event(GenerationEvent::Finished { job: new.id });
        assert_eq!(state.active_content(), "ab");
        assert!(!state.store.is_streaming(state.store.active_id()));
        assert!(!transcript(&state).iter().any(|m| m == GENERATING_INDICATOR));
    }

    #[test]
    fn editing_during_stream_is_rejected() {
        let (mut state, _rx) = state_with("a");
        state.chat_input = "go".into();
        state.send_chat();
        state.editor_insert("z");
        assert_eq!(state.active_content(), "a");
        assert!(state.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn outline_card_confirms_into_document() {
        let (mut state, rx) = state_with("Draft");
        state.open_prompt(PromptKind::Outline);
        if let Some(p) = state.prompt.as_mut() {
            p.input = "Cats".into();
        }
        state.submit_prompt();
        let job = rx.try_recv().unwrap();
        let items = quill_core::generation::parse_outline("nope", "Cats");
        state.apply_generation_event(GenerationEvent::Outline { job: job.id, items });

        state.confirm_latest_card();
        assert!(state.active_content().starts_with("Draft\n\n1. Introduction\nIntroduction to Cats"));
        assert_eq!(transcript(&state).last().map(String::as_str), Some(CARD_INSERTED));

        // The card is spent.
        state.confirm_latest_card();
        assert_eq!(state.store.history(state.store.active_id()).unwrap().undo_depth(), 1);
    }

    #[test]
    fn humanize_replaces_whole_document() {
        let (mut state, rx) = state_with("It is fine.");
        state.humanize();
        let job = rx.try_recv().unwrap();
        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: "It's ".into() });
        state.apply_generation_event(GenerationEvent::Chunk { job: job.id, text: "fine.".into() });
        state.apply_generation_event(GenerationEvent::Finished { job: job.id });
        assert_eq!(state.active_content(), "It's fine.");
    }

    #[test]
    fn deleting_last_document_is_refused() {
        let (mut state, _rx) = state_with("");
        state.request_delete();
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn failed_dispatch_rolls_back_stream() {
        let store = SessionStore::new();
        let mut state =
            AppState::new(store, StudentLevel::Junior, Tone::default(), Box::new(PlaceholderDetector), None);
        state.chat_input = "go".into();
        state.send_chat();
        assert!(!state.store.is_streaming(state.store.active_id()));
        assert_eq!(state.chat_input, "go");
    }
}
