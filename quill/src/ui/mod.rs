//! UI rendering for quill.
//!
//! `render()` is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

mod layout;
pub mod chat_view;
pub mod doc_list;
pub mod editor_view;
pub mod help;
pub mod keybindings;
pub mod prompt;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar};

/// Renders one complete frame.
///
/// Panel rects are cached in `state` for mouse hit-testing on the next event.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame.area());
    state.panel_rects = [left, center, right];

    if left.width > 0 {
        doc_list::render_doc_list(frame, left, state, theme);
    }
    editor_view::render_editor(frame, center, state, theme);
    if right.width > 0 {
        chat_view::render_chat(frame, right, state, theme);
    }
    render_status_bar(frame, status_bar, state, theme);

    // Overlays last so they sit on top.
    match state.mode {
        Mode::Prompt => prompt::render_prompt(frame, state, theme),
        Mode::ConfirmDelete | Mode::ConfirmQuit => prompt::render_confirm(frame, state, theme),
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Normal | Mode::Insert => {}
    }
}
