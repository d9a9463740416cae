//! Editor panel: the active document with caret and selection.
//!
//! Lines are soft-wrapped at the panel width by character so the caret row is
//! known exactly; `state.editor_scroll` is nudged each frame to keep it visible.

use std::ops::Range;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};

use quill_core::TextRange;

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

const PLACEHOLDER: &str = "Start writing, or press a for AI Creation...";

/// One visual row: char range into the document, excluding any newline.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VisualRow {
    chars: Range<usize>,
}

pub fn render_editor(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Editor;
    let title = {
        let doc = state.store.active_document();
        let mut t = format!(" {} ", doc.title);
        if state.store.is_streaming(&doc.id) {
            t.push_str("· generating ");
        }
        t
    };
    frame.render_widget(panel_block(title, is_focused, theme), area);

    let inner = inner_rect(area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let content = state.store.active_document().content.as_str();
    if content.is_empty() && !(is_focused && state.mode == Mode::Insert) {
        frame.render_widget(
            Paragraph::new(Line::styled(PLACEHOLDER, Style::default().fg(theme.muted))),
            inner,
        );
        return;
    }

    let chars: Vec<char> = content.chars().collect();
    let rows = wrap_rows(&chars, usize::from(inner.width));
    let caret = state.editor.cursor().min(chars.len());
    let caret_row = caret_row(&rows, caret);

    let height = usize::from(inner.height);
    let mut scroll = usize::from(state.editor_scroll);
    if caret_row < scroll {
        scroll = caret_row;
    } else if caret_row >= scroll + height {
        scroll = caret_row + 1 - height;
    }
    state.editor_scroll = u16::try_from(scroll).unwrap_or(u16::MAX);

    let show_caret = is_focused;
    let selection = state.editor.selection();
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(scroll)
        .take(height)
        .map(|(i, row)| {
            let caret_here = show_caret && i == caret_row;
            styled_row(&chars, row, selection, caret_here.then_some(caret), theme)
        })
        .collect();

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

/// Splits `chars` into visual rows at newlines and every `width` chars.
fn wrap_rows(chars: &[char], width: usize) -> Vec<VisualRow> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut start = 0;
    for (i, ch) in chars.iter().enumerate() {
        if *ch == '\n' {
            rows.push(VisualRow { chars: start..i });
            start = i + 1;
        } else if i - start == width {
            rows.push(VisualRow { chars: start..i });
            start = i;
        }
    }
    rows.push(VisualRow { chars: start..chars.len() });
    rows
}

/// Row holding `caret`. At a wrap boundary the caret belongs to the later row.
fn caret_row(rows: &[VisualRow], caret: usize) -> usize {
    rows.iter()
        .rposition(|row| row.chars.start <= caret && caret <= row.chars.end)
        .unwrap_or(0)
}

fn styled_row(
    chars: &[char],
    row: &VisualRow,
    selection: Option<TextRange>,
    caret: Option<usize>,
    theme: &Theme,
) -> Line<'static> {
    let base = Style::default().fg(theme.text);
    let selected = base.bg(theme.selection_bg);
    let caret_style = base.bg(theme.cursor_bg).add_modifier(Modifier::REVERSED);

    let style_at = |idx: usize| {
        if caret == Some(idx) {
            caret_style
        } else if selection.is_some_and(|r| r.start <= idx && idx < r.end) {
            selected
        } else {
            base
        }
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = base;
    for idx in row.chars.clone() {
        let style = style_at(idx);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(chars[idx]);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    if caret == Some(row.chars.end) {
        spans.push(Span::styled(" ", caret_style));
    }
    Line::from(spans)
}
