//! Keybinding dispatcher for quill.
//!
//! Translates crossterm key, paste and mouse events into `AppState` calls and
//! tells the event loop whether to keep going. Dispatch branches first on
//! `state.mode` so every mode has an isolated handler.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus, PromptKind};

/// Control-flow signal returned from the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::ConfirmDelete => handle_confirm_delete(key, state),
        Mode::Prompt => handle_prompt(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let consumed = match state.focus {
        PanelFocus::Documents => handle_documents_key(key, state),
        PanelFocus::Editor => handle_caret_key(key, state),
        PanelFocus::Copilot => handle_copilot_key(key, state),
    };
    if consumed {
        return KeyAction::Continue;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        // Panel focus
        KeyCode::Char('H') | KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::Char('L') | KeyCode::Tab => state.focus = state.focus.next(),

        // Documents
        KeyCode::Char('n') => state.new_document(),
        KeyCode::Char('D') => state.request_delete(),

        // History
        KeyCode::Char('r') if ctrl => state.redo(),
        KeyCode::Char('u') => state.undo(),

        // Copilot actions
        KeyCode::Char('a') => state.open_prompt(PromptKind::Create),
        KeyCode::Char('O') => state.open_prompt(PromptKind::Outline),
        KeyCode::Char('c') => state.confirm_latest_card(),
        KeyCode::Char('R') => state.humanize(),
        KeyCode::Char('x') => state.cancel_stream(),
        KeyCode::Char('y') => state.quote_selection(),

        // Writer settings
        KeyCode::Char('p') => state.cycle_persona(),
        KeyCode::Char('t') => state.cycle_tone(),
        KeyCode::Char('r') => {
            state.refresh_ai_rate();
            match state.ai_rate {
                Some(rate) => state.set_status(format!("AI rate {rate}")),
                None => state.set_status("Nothing to check yet"),
            }
        }

        KeyCode::Char('i') => {
            if state.focus == PanelFocus::Documents {
                state.focus = PanelFocus::Editor;
            }
            state.mode = Mode::Insert;
        }
        KeyCode::Esc => state.editor.clear_selection(),
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') => {
            if state.is_generating() {
                state.mode = Mode::ConfirmQuit;
            } else {
                return KeyAction::Quit;
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// List navigation while the document panel has focus.
fn handle_documents_key(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.select_next_in_list(),
        KeyCode::Char('k') | KeyCode::Up => state.select_prev_in_list(),
        KeyCode::Enter => state.open_selected_document(),
        _ => return false,
    }
    true
}

/// Caret movement, shared by Normal and Insert mode in the editor.
fn handle_caret_key(key: KeyEvent, state: &mut AppState) -> bool {
    let extend = key.modifiers.contains(KeyModifiers::SHIFT);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let normal = state.mode == Mode::Normal;
    match key.code {
        KeyCode::Left => state.move_cursor(|c, _| c.move_left(extend)),
        KeyCode::Right => state.move_cursor(|c, t| c.move_right(t, extend)),
        KeyCode::Up => state.move_cursor(|c, t| c.move_up(t, extend)),
        KeyCode::Down => state.move_cursor(|c, t| c.move_down(t, extend)),
        KeyCode::Home => state.move_cursor(|c, t| c.move_line_start(t, extend)),
        KeyCode::End => state.move_cursor(|c, t| c.move_line_end(t, extend)),
        KeyCode::Char('a') if ctrl => state.move_cursor(|c, t| c.select_all(t)),
        KeyCode::Char('h') if normal => state.move_cursor(|c, _| c.move_left(false)),
        KeyCode::Char('l') if normal => state.move_cursor(|c, t| c.move_right(t, false)),
        KeyCode::Char('k') if normal => state.move_cursor(|c, t| c.move_up(t, false)),
        KeyCode::Char('j') if normal => state.move_cursor(|c, t| c.move_down(t, false)),
        _ => return false,
    }
    true
}

fn handle_copilot_key(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('k') | KeyCode::Up => state.chat_scroll = state.chat_scroll.saturating_add(1),
        KeyCode::Char('j') | KeyCode::Down => state.chat_scroll = state.chat_scroll.saturating_sub(1),
        KeyCode::Char('G') => state.chat_scroll = 0,
        KeyCode::Enter => state.mode = Mode::Insert,
        _ => return false,
    }
    true
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Esc {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    }
    match state.focus {
        PanelFocus::Copilot => handle_chat_input(key, state),
        PanelFocus::Editor | PanelFocus::Documents => handle_editor_input(key, state),
    }
    KeyAction::Continue
}

fn handle_editor_input(key: KeyEvent, state: &mut AppState) {
    if handle_caret_key(key, state) {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char(ch) if !ctrl => state.editor_insert(ch.encode_utf8(&mut [0; 4])),
        KeyCode::Enter => state.editor_insert("\n"),
        KeyCode::Tab => state.editor_insert("    "),
        KeyCode::Backspace => state.editor_backspace(),
        KeyCode::Delete => state.editor_delete(),
        _ => {}
    }
}

fn handle_chat_input(key: KeyEvent, state: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char(ch) if !ctrl => state.chat_input.push(ch),
        KeyCode::Backspace => {
            if state.chat_input.pop().is_none() {
                state.pending_quote = None;
            }
        }
        KeyCode::Enter => {
            state.send_chat();
            state.mode = Mode::Normal;
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Prompt and confirmation modes
// ---------------------------------------------------------------------------

fn handle_prompt(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.close_prompt(),
        KeyCode::Enter => state.submit_prompt(),
        KeyCode::Backspace => {
            if let Some(prompt) = state.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(prompt) = state.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_delete(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            state.mode = Mode::Normal;
            state.delete_active_document();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Paste and mouse
// ---------------------------------------------------------------------------

/// Routes a bracketed paste to whichever input is taking text.
///
/// A paste into the editor is one undoable edit.
pub fn handle_paste(text: &str, state: &mut AppState) {
    match (state.mode, state.focus) {
        (Mode::Insert, PanelFocus::Copilot) => state.chat_input.push_str(&text.replace('\n', " ")),
        (Mode::Insert, _) => state.editor_insert(text),
        (Mode::Prompt, _) => {
            if let Some(prompt) = state.prompt.as_mut() {
                prompt.input.push_str(&text.replace('\n', " "));
            }
        }
        _ => {}
    }
}

/// Click-to-focus and scroll wheel.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => focus_at(mouse.column, mouse.row, state),
        MouseEventKind::ScrollUp => scroll(state, true),
        MouseEventKind::ScrollDown => scroll(state, false),
        _ => {}
    }
    KeyAction::Continue
}

/// Collapsed (zero-width) panels never take focus.
fn focus_at(col: u16, row: u16, state: &mut AppState) {
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;
    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Documents;
    } else if center.contains(pos) {
        state.focus = PanelFocus::Editor;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Copilot;
    }
}

fn scroll(state: &mut AppState, up: bool) {
    const LINES: u16 = 3;
    if state.mode == Mode::HelpOverlay {
        state.help_scroll = if up {
            state.help_scroll.saturating_sub(LINES)
        } else {
            state.help_scroll.saturating_add(LINES)
        };
        return;
    }
    match state.focus {
        PanelFocus::Copilot if up => state.chat_scroll = state.chat_scroll.saturating_add(LINES),
        PanelFocus::Copilot => state.chat_scroll = state.chat_scroll.saturating_sub(LINES),
        PanelFocus::Documents if up => state.select_prev_in_list(),
        PanelFocus::Documents => state.select_next_in_list(),
        PanelFocus::Editor => {
            for _ in 0..LINES {
                if up {
                    state.move_cursor(|c, t| c.move_up(t, false));
                } else {
                    state.move_cursor(|c, t| c.move_down(t, false));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use quill_core::detector::PlaceholderDetector;
    use quill_core::generation::{StudentLevel, Tone};
    use quill_core::SessionStore;

    fn state() -> AppState {
        AppState::new(
            SessionStore::new(),
            StudentLevel::Junior,
            Tone::default(),
            Box::new(PlaceholderDetector),
            None,
        )
    }

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            press(state, KeyCode::Char(ch));
        }
    }

    #[test]
    fn insert_mode_types_into_editor() {
        let mut s = state();
        press(&mut s, KeyCode::Char('i'));
        type_str(&mut s, "hi");
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.active_content(), "hi\n");
        press(&mut s, KeyCode::Esc);
        press(&mut s, KeyCode::Char('u'));
        assert_eq!(s.active_content(), "hi");
    }

    #[test]
    fn ctrl_r_redoes() {
        let mut s = state();
        press(&mut s, KeyCode::Char('i'));
        type_str(&mut s, "a");
        press(&mut s, KeyCode::Esc);
        press(&mut s, KeyCode::Char('u'));
        assert_eq!(s.active_content(), "");
        handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL), &mut s);
        assert_eq!(s.active_content(), "a");
    }

    #[test]
    fn shift_arrows_select() {
        let mut s = state();
        press(&mut s, KeyCode::Char('i'));
        type_str(&mut s, "abc");
        let shift_left = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::SHIFT, KeyEventKind::Press);
        handle_key(shift_left, &mut s);
        handle_key(shift_left, &mut s);
        assert_eq!(s.editor.selected_text(s.active_content()).as_deref(), Some("bc"));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut s = state();
        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.store.len(), 2);
        press(&mut s, KeyCode::Char('D'));
        assert_eq!(s.mode, Mode::ConfirmDelete);
        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.store.len(), 2);
        press(&mut s, KeyCode::Char('D'));
        press(&mut s, KeyCode::Char('y'));
        assert_eq!(s.store.len(), 1);
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn document_list_enter_switches_active() {
        let mut s = state();
        let first = s.active_id();
        press(&mut s, KeyCode::Char('n'));
        assert_ne!(s.active_id(), first);
        s.sync_store_events();
        s.focus = PanelFocus::Documents;
        press(&mut s, KeyCode::Char('j'));
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.active_id(), first);
        assert_eq!(s.focus, PanelFocus::Editor);
    }

    #[test]
    fn prompt_collects_topic_and_escape_cancels() {
        let mut s = state();
        press(&mut s, KeyCode::Char('a'));
        assert_eq!(s.mode, Mode::Prompt);
        type_str(&mut s, "cats");
        assert_eq!(s.prompt.as_ref().map(|p| p.input.as_str()), Some("cats"));
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.mode, Mode::Normal);
        assert!(s.prompt.is_none());
    }

    #[test]
    fn paste_into_editor_is_one_edit() {
        let mut s = state();
        s.mode = Mode::Insert;
        handle_paste("one\ntwo", &mut s);
        assert_eq!(s.active_content(), "one\ntwo");
        assert_eq!(s.store.history(s.store.active_id()).unwrap().undo_depth(), 1);
    }

    #[test]
    fn quit_is_immediate_when_idle() {
        let mut s = state();
        assert_eq!(press(&mut s, KeyCode::Char('q')), KeyAction::Quit);
    }

    #[test]
    fn help_toggles() {
        let mut s = state();
        press(&mut s, KeyCode::Char('?'));
        assert_eq!(s.mode, Mode::HelpOverlay);
        press(&mut s, KeyCode::Char('j'));
        assert_eq!(s.help_scroll, 1);
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.mode, Mode::Normal);
    }
}
